use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use washline_core::identity::Actor;
use washline_domain::job::{Job, JobType};
use washline_domain::order::OrderStatus;

use crate::error::AppError;
use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ListJobsQuery {
    pub job_type: Option<JobType>,
}

#[derive(Debug, Serialize)]
pub struct JobResponse {
    pub job: Job,
    pub order_status: OrderStatus,
}

#[derive(Debug, Deserialize)]
pub struct CompleteJobRequest {
    #[serde(default)]
    pub photos: Vec<String>,
    pub notes: Option<String>,
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /v1/jobs
/// Claimable jobs for the driver board
pub async fn list_jobs(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Query(query): Query<ListJobsQuery>,
) -> Result<Json<Vec<Job>>, AppError> {
    let jobs = state
        .machine
        .list_claimable_jobs(&actor, query.job_type)
        .await?;
    Ok(Json(jobs))
}

/// POST /v1/jobs/:id/claim
/// Exclusive claim; exactly one of any concurrent callers wins
pub async fn claim_job(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(job_id): Path<Uuid>,
) -> Result<Json<JobResponse>, AppError> {
    let (job, order) = state.machine.claim_job(&actor, job_id).await?;
    Ok(Json(JobResponse {
        job,
        order_status: order.status,
    }))
}

/// POST /v1/jobs/:id/start
pub async fn start_job(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(job_id): Path<Uuid>,
) -> Result<Json<JobResponse>, AppError> {
    let (job, order) = state.machine.start_job(&actor, job_id).await?;
    Ok(Json(JobResponse {
        job,
        order_status: order.status,
    }))
}

/// POST /v1/jobs/:id/arrive
pub async fn arrive_job(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(job_id): Path<Uuid>,
) -> Result<Json<JobResponse>, AppError> {
    let (job, order) = state.machine.arrive_job(&actor, job_id).await?;
    Ok(Json(JobResponse {
        job,
        order_status: order.status,
    }))
}

/// POST /v1/jobs/:id/complete
pub async fn complete_job(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(job_id): Path<Uuid>,
    Json(req): Json<CompleteJobRequest>,
) -> Result<Json<JobResponse>, AppError> {
    let (job, order) = state
        .machine
        .complete_job(&actor, job_id, req.photos, req.notes)
        .await?;
    Ok(Json(JobResponse {
        job,
        order_status: order.status,
    }))
}

/// POST /v1/jobs/:id/cancel
/// Operational override, admin only
pub async fn cancel_job(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(job_id): Path<Uuid>,
) -> Result<Json<Job>, AppError> {
    let job = state.machine.cancel_job(&actor, job_id).await?;
    Ok(Json(job))
}
