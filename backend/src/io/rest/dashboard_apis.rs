use axum::{extract::State, response::IntoResponse};
use tracing::info;

use crate::domain::DomainError;
use crate::io::rest::ApiResponse;
use crate::AppState;

/// GET /api/dashboard/stats
pub async fn get_dashboard_stats(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, DomainError> {
    info!("GET /api/dashboard/stats");

    let stats = state.report_service.dashboard_stats().await?;
    Ok(ApiResponse::new(stats))
}
