use axum::{
    extract::{Path, State},
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use washline_core::identity::Actor;
use washline_domain::job::Job;
use washline_domain::order::{Order, OrderItem};
use washline_order::machine::CreatePickupOrder;

use crate::error::AppError;
use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct CreateOrderRequest {
    pub address_id: Uuid,
    pub outlet_id: Uuid,
    pub scheduled_pickup_at: DateTime<Utc>,
    #[serde(default)]
    pub scheduled_delivery_at: Option<DateTime<Utc>>,
    pub items: Vec<OrderItem>,
}

#[derive(Debug, Serialize)]
pub struct CreateOrderResponse {
    pub order: Order,
    pub pickup_job: Job,
}

#[derive(Debug, Deserialize)]
pub struct MeasurementRequest {
    pub weight_kg: f64,
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /v1/orders
/// Create a pickup order with its pending pickup job
pub async fn create_order(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Json(req): Json<CreateOrderRequest>,
) -> Result<Json<CreateOrderResponse>, AppError> {
    let (order, pickup_job) = state
        .machine
        .create_pickup_order(
            &actor,
            CreatePickupOrder {
                address_id: req.address_id,
                outlet_id: req.outlet_id,
                scheduled_pickup_at: req.scheduled_pickup_at,
                scheduled_delivery_at: req.scheduled_delivery_at,
                items: req.items,
            },
        )
        .await?;

    Ok(Json(CreateOrderResponse { order, pickup_job }))
}

/// GET /v1/orders/:id
pub async fn get_order(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(order_id): Path<Uuid>,
) -> Result<Json<Order>, AppError> {
    let order = state.machine.get_order(&actor, order_id).await?;
    Ok(Json(order))
}

/// GET /v1/orders
/// List the calling customer's orders
pub async fn list_orders(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
) -> Result<Json<Vec<Order>>, AppError> {
    let orders = state.machine.list_customer_orders(&actor).await?;
    Ok(Json(orders))
}

/// POST /v1/orders/:id/measurement
/// Outlet intake weighing; prices the order
pub async fn record_measurement(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(order_id): Path<Uuid>,
    Json(req): Json<MeasurementRequest>,
) -> Result<Json<Order>, AppError> {
    let order = state
        .machine
        .record_measurement(&actor, order_id, req.weight_kg)
        .await?;
    Ok(Json(order))
}

/// POST /v1/orders/:id/payment/confirm
/// Payment-gate callback; advances the order when it is waiting on payment
pub async fn confirm_payment(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(order_id): Path<Uuid>,
) -> Result<Json<Order>, AppError> {
    let order = state.machine.confirm_payment(&actor, order_id).await?;
    Ok(Json(order))
}

/// POST /v1/orders/:id/confirm
/// Customer confirms the delivery, closing the order
pub async fn confirm_delivery(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(order_id): Path<Uuid>,
) -> Result<Json<Order>, AppError> {
    let order = state.machine.confirm_delivery(&actor, order_id).await?;
    Ok(Json(order))
}
