use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use washline_dispatch::claims::ClaimError;
use washline_dispatch::fees::FeeError;
use washline_order::bypass::BypassError;
use washline_order::machine::WorkflowError;
use washline_order::stations::StationError;
use washline_order::transitions::TransitionError;

#[derive(Debug)]
pub enum AppError {
    BadRequest(String),
    Forbidden(String),
    NotFound(String),
    Conflict(String),
    UnprocessableEntity(String),
    Internal(anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            AppError::UnprocessableEntity(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg),
            AppError::Internal(err) => {
                tracing::error!("Internal Server Error: {}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal Server Error".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

fn from_transition(err: TransitionError) -> AppError {
    match err {
        TransitionError::NotAuthorized { .. } => AppError::Forbidden(err.to_string()),
        TransitionError::InvalidTransition { .. } | TransitionError::StationOutOfOrder { .. } => {
            AppError::Conflict(err.to_string())
        }
    }
}

fn from_claim(err: ClaimError) -> AppError {
    match err {
        ClaimError::NotFound(_) => AppError::NotFound(err.to_string()),
        ClaimError::NotAuthorized(_) => AppError::Forbidden(err.to_string()),
        ClaimError::AlreadyClaimed
        | ClaimError::NotAssignedToCaller
        | ClaimError::InvalidJobState { .. } => AppError::Conflict(err.to_string()),
        ClaimError::Storage(e) => AppError::Internal(anyhow::anyhow!(e)),
    }
}

fn from_station(err: StationError) -> AppError {
    match err {
        StationError::OrderNotFound(_) => AppError::NotFound(err.to_string()),
        StationError::NotAuthorized(_) => AppError::Forbidden(err.to_string()),
        StationError::AlreadyStarted(_)
        | StationError::NoOpenProcess(_)
        | StationError::BypassPending
        | StationError::VerificationStillMismatched
        | StationError::ReVerifyUnavailable => AppError::Conflict(err.to_string()),
        StationError::Transition(e) => from_transition(e),
        StationError::Storage(e) => AppError::Internal(anyhow::anyhow!(e)),
    }
}

fn from_bypass(err: BypassError) -> AppError {
    match err {
        BypassError::OrderNotFound(_) | BypassError::BypassNotFound(_) => {
            AppError::NotFound(err.to_string())
        }
        BypassError::NotAuthorized(_) => AppError::Forbidden(err.to_string()),
        BypassError::NoOpenProcess(_)
        | BypassError::NoDiscrepancy
        | BypassError::AlreadyPending
        | BypassError::NotPending => AppError::Conflict(err.to_string()),
        BypassError::Validation(msg) => AppError::BadRequest(msg),
        BypassError::Transition(e) => from_transition(e),
        BypassError::Storage(e) => AppError::Internal(anyhow::anyhow!(e)),
    }
}

impl From<WorkflowError> for AppError {
    fn from(err: WorkflowError) -> Self {
        match err {
            WorkflowError::OrderNotFound(_) => AppError::NotFound(err.to_string()),
            WorkflowError::Validation(msg) => AppError::BadRequest(msg),
            WorkflowError::NotAuthorized(_) => AppError::Forbidden(err.to_string()),
            WorkflowError::Transition(e) => from_transition(e),
            WorkflowError::Claim(e) => from_claim(e),
            WorkflowError::Station(e) => from_station(e),
            WorkflowError::Bypass(e) => from_bypass(e),
            WorkflowError::Fee(e @ FeeError::OutOfServiceRadius { .. }) => {
                AppError::UnprocessableEntity(e.to_string())
            }
            WorkflowError::Storage(e) => AppError::Internal(anyhow::anyhow!(e)),
        }
    }
}
