//! # REST API Interface Layer
//!
//! HTTP endpoints for the parish ledger. This layer handles request/response
//! serialization, translation of domain errors to HTTP status codes, and
//! request logging; business rules live in the domain services.
//!
//! Every response uses the `{success, data}` / `{success, error}` envelope.
//! Validation, not-found and conflict failures map to 400/404/409; anything
//! unexpected maps to 500 with a generic message.

pub mod dashboard_apis;
pub mod family_apis;
pub mod member_apis;
pub mod payment_apis;
pub mod unit_apis;

pub use dashboard_apis::*;
pub use family_apis::*;
pub use member_apis::*;
pub use payment_apis::*;
pub use unit_apis::*;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::error;

use crate::domain::DomainError;

/// Success envelope: `{"success": true, "data": ...}`
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn new(data: T) -> Json<Self> {
        Json(Self { success: true, data })
    }
}

/// Failure envelope: `{"success": false, "error": ...}`
#[derive(Debug, Serialize)]
struct ApiError {
    success: bool,
    error: String,
}

impl IntoResponse for DomainError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            DomainError::Validation(message) => (StatusCode::BAD_REQUEST, message.clone()),
            DomainError::NotFound(message) => (StatusCode::NOT_FOUND, message.clone()),
            DomainError::Conflict(message) => (StatusCode::CONFLICT, message.clone()),
            DomainError::Dependency(message) => (StatusCode::SERVICE_UNAVAILABLE, message.clone()),
            DomainError::Internal(err) => {
                error!("Unexpected error handling request: {err:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        (
            status,
            Json(ApiError {
                success: false,
                error: message,
            }),
        )
            .into_response()
    }
}
