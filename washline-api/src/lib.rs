use axum::{
    http::Method,
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub mod bypasses;
pub mod error;
pub mod jobs;
pub mod middleware;
pub mod orders;
pub mod state;
pub mod stations;
pub mod worker;

pub use state::AppState;

pub fn app(state: AppState) -> Router {
    // CORS Middleware
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
            axum::http::header::USER_AGENT,
        ]);

    Router::new()
        .route("/v1/orders", post(orders::create_order).get(orders::list_orders))
        .route("/v1/orders/{id}", get(orders::get_order))
        .route("/v1/orders/{id}/measurement", post(orders::record_measurement))
        .route("/v1/orders/{id}/payment/confirm", post(orders::confirm_payment))
        .route("/v1/orders/{id}/confirm", post(orders::confirm_delivery))
        .route("/v1/jobs", get(jobs::list_jobs))
        .route("/v1/jobs/{id}/claim", post(jobs::claim_job))
        .route("/v1/jobs/{id}/start", post(jobs::start_job))
        .route("/v1/jobs/{id}/arrive", post(jobs::arrive_job))
        .route("/v1/jobs/{id}/complete", post(jobs::complete_job))
        .route("/v1/jobs/{id}/cancel", post(jobs::cancel_job))
        .route(
            "/v1/orders/{id}/stations/{station}/start",
            post(stations::start_station),
        )
        .route(
            "/v1/orders/{id}/stations/{station}/complete",
            post(stations::complete_station),
        )
        .route(
            "/v1/orders/{id}/stations/{station}/reverify",
            post(stations::reverify_station),
        )
        .route(
            "/v1/orders/{id}/stations/{station}/bypass",
            post(stations::request_bypass),
        )
        .route("/v1/bypasses/{id}/resolve", post(bypasses::resolve_bypass))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::auth::auth_middleware,
        ))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
