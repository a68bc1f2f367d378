use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use axum::Json;
use tracing::info;

use crate::domain::DomainError;
use crate::io::rest::ApiResponse;
use crate::AppState;
use shared::{CreateUnitRequest, UpdateUnitRequest};

/// GET /api/units
pub async fn list_units(State(state): State<AppState>) -> Result<impl IntoResponse, DomainError> {
    info!("GET /api/units");

    let units = state.unit_service.list_units().await?;
    Ok(ApiResponse::new(units))
}

/// POST /api/units
pub async fn create_unit(
    State(state): State<AppState>,
    Json(request): Json<CreateUnitRequest>,
) -> Result<impl IntoResponse, DomainError> {
    info!("POST /api/units - name: {}", request.name);

    let unit = state.unit_service.create_unit(request).await?;
    Ok((StatusCode::CREATED, ApiResponse::new(unit)))
}

/// PUT /api/units/:id
pub async fn update_unit(
    State(state): State<AppState>,
    Path(unit_id): Path<String>,
    Json(request): Json<UpdateUnitRequest>,
) -> Result<impl IntoResponse, DomainError> {
    info!("PUT /api/units/{}", unit_id);

    let unit = state.unit_service.update_unit(&unit_id, request).await?;
    Ok(ApiResponse::new(unit))
}

/// DELETE /api/units/:id
pub async fn delete_unit(
    State(state): State<AppState>,
    Path(unit_id): Path<String>,
) -> Result<impl IntoResponse, DomainError> {
    info!("DELETE /api/units/{}", unit_id);

    let unit = state.unit_service.delete_unit(&unit_id).await?;
    Ok(ApiResponse::new(unit))
}
