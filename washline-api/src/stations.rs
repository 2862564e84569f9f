use axum::{
    extract::{Path, State},
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use washline_core::identity::Actor;
use washline_domain::bypass::BypassRequest;
use washline_domain::order::{OrderItem, OrderStatus};
use washline_domain::work::WorkerType;
use washline_order::stations::{StationReceipt, VerificationOutcome};

use crate::error::AppError;
use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct StartStationRequest {
    pub declared_items: Vec<OrderItem>,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CompleteStationRequest {
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ReverifyRequest {
    pub declared_items: Vec<OrderItem>,
}

#[derive(Debug, Deserialize)]
pub struct RequestBypassRequest {
    pub reason: String,
}

#[derive(Debug, Serialize)]
pub struct StationResponse {
    pub order_status: OrderStatus,
    pub process_id: Uuid,
    pub verification: VerificationOutcome,
}

impl From<StationReceipt> for StationResponse {
    fn from(receipt: StationReceipt) -> Self {
        Self {
            order_status: receipt.order.status,
            process_id: receipt.process.id,
            verification: receipt.verification,
        }
    }
}

fn parse_station(raw: &str) -> Result<WorkerType, AppError> {
    raw.parse()
        .map_err(|_| AppError::BadRequest(format!("unknown station: {}", raw)))
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /v1/orders/:id/stations/:station/start
/// Open a station; a count mismatch is reported back, not rejected
pub async fn start_station(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path((order_id, station)): Path<(Uuid, String)>,
    Json(req): Json<StartStationRequest>,
) -> Result<Json<StationResponse>, AppError> {
    let station = parse_station(&station)?;
    let receipt = state
        .machine
        .start_station(&actor, order_id, station, req.declared_items, req.notes)
        .await?;
    Ok(Json(receipt.into()))
}

/// POST /v1/orders/:id/stations/:station/complete
pub async fn complete_station(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path((order_id, station)): Path<(Uuid, String)>,
    Json(req): Json<CompleteStationRequest>,
) -> Result<Json<OrderStatus>, AppError> {
    let station = parse_station(&station)?;
    let order = state
        .machine
        .complete_station(&actor, order_id, station, req.notes)
        .await?;
    Ok(Json(order.status))
}

/// POST /v1/orders/:id/stations/:station/reverify
/// Recount after a rejected bypass; only a clean match is accepted
pub async fn reverify_station(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path((order_id, station)): Path<(Uuid, String)>,
    Json(req): Json<ReverifyRequest>,
) -> Result<Json<StationResponse>, AppError> {
    let station = parse_station(&station)?;
    let receipt = state
        .machine
        .reverify_station(&actor, order_id, station, req.declared_items)
        .await?;
    Ok(Json(receipt.into()))
}

/// POST /v1/orders/:id/stations/:station/bypass
pub async fn request_bypass(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path((order_id, station)): Path<(Uuid, String)>,
    Json(req): Json<RequestBypassRequest>,
) -> Result<Json<BypassRequest>, AppError> {
    let station = parse_station(&station)?;
    let request = state
        .machine
        .request_bypass(&actor, order_id, station, req.reason)
        .await?;
    Ok(Json(request))
}
