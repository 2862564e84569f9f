use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use washline_core::identity::{Actor, ActorRole};

use crate::state::AppState;

// ============================================================================
// JWT Claims
// ============================================================================

/// Claims minted by the external identity provider. The engine never issues
/// tokens; it only verifies the signature and lifts the verified identity
/// into an `Actor`.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject: the customer or employee UUID.
    pub sub: String,
    pub role: String,
    pub outlet_id: Option<Uuid>,
    pub exp: usize,
}

fn parse_role(role: &str) -> Option<ActorRole> {
    match role {
        "CUSTOMER" => Some(ActorRole::Customer),
        "WORKER" => Some(ActorRole::Worker),
        "DRIVER" => Some(ActorRole::Driver),
        "OUTLET_ADMIN" => Some(ActorRole::OutletAdmin),
        "ADMIN" => Some(ActorRole::Admin),
        "SYSTEM" => Some(ActorRole::System),
        _ => None,
    }
}

// ============================================================================
// Authentication Middleware
// ============================================================================

pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    // 1. Extract token from Authorization header
    let auth_header = req
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .ok_or(StatusCode::UNAUTHORIZED)?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or(StatusCode::UNAUTHORIZED)?;

    // 2. Decode and validate JWT
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(state.auth.secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|_| StatusCode::UNAUTHORIZED)?;

    // 3. Lift the verified identity into an Actor
    let claims = token_data.claims;
    let id = Uuid::parse_str(&claims.sub).map_err(|_| StatusCode::UNAUTHORIZED)?;
    let role = parse_role(&claims.role).ok_or(StatusCode::FORBIDDEN)?;

    let actor = Actor {
        id,
        role,
        outlet_id: claims.outlet_id,
    };

    // 4. Inject the actor into request extensions
    req.extensions_mut().insert(actor);

    Ok(next.run(req).await)
}
