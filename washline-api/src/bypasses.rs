use axum::{
    extract::{Path, State},
    Extension, Json,
};
use serde::Deserialize;
use uuid::Uuid;

use washline_core::identity::Actor;
use washline_domain::bypass::BypassRequest;

use crate::error::AppError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ResolveBypassRequest {
    pub approve: bool,
    pub admin_note: String,
}

/// POST /v1/bypasses/:id/resolve
/// Outlet-admin decision on a pending bypass; the note is mandatory
pub async fn resolve_bypass(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(bypass_id): Path<Uuid>,
    Json(req): Json<ResolveBypassRequest>,
) -> Result<Json<BypassRequest>, AppError> {
    let request = state
        .machine
        .resolve_bypass(&actor, bypass_id, req.approve, req.admin_note)
        .await?;
    Ok(Json(request))
}
