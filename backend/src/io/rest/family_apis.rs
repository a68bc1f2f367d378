use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use tracing::info;

use crate::domain::DomainError;
use crate::io::rest::ApiResponse;
use crate::AppState;
use shared::{CreateFamilyRequest, FamilyListRequest, UpdateFamilyRequest};

/// Query parameters for the family list endpoint
#[derive(Deserialize, Debug)]
pub struct FamilyListQuery {
    pub unit_id: Option<String>,
    pub search: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

/// GET /api/families
pub async fn list_families(
    State(state): State<AppState>,
    Query(query): Query<FamilyListQuery>,
) -> Result<impl IntoResponse, DomainError> {
    info!("GET /api/families - query: {:?}", query);

    let request = FamilyListRequest {
        unit_id: query.unit_id,
        search: query.search,
        page: query.page,
        limit: query.limit,
    };
    let response = state.family_service.list_families(request).await?;
    Ok(ApiResponse::new(response))
}

/// POST /api/families
pub async fn create_family(
    State(state): State<AppState>,
    Json(request): Json<CreateFamilyRequest>,
) -> Result<impl IntoResponse, DomainError> {
    info!("POST /api/families - card_no: {}", request.card_no);

    let family = state.family_service.create_family(request).await?;
    Ok((StatusCode::CREATED, ApiResponse::new(family)))
}

/// GET /api/families/:id
pub async fn get_family(
    State(state): State<AppState>,
    Path(family_id): Path<String>,
) -> Result<impl IntoResponse, DomainError> {
    info!("GET /api/families/{}", family_id);

    let family = state.family_service.get_family(&family_id).await?;
    Ok(ApiResponse::new(family))
}

/// PUT /api/families/:id
pub async fn update_family(
    State(state): State<AppState>,
    Path(family_id): Path<String>,
    Json(request): Json<UpdateFamilyRequest>,
) -> Result<impl IntoResponse, DomainError> {
    info!("PUT /api/families/{}", family_id);

    let family = state.family_service.update_family(&family_id, request).await?;
    Ok(ApiResponse::new(family))
}

/// DELETE /api/families/:id
pub async fn delete_family(
    State(state): State<AppState>,
    Path(family_id): Path<String>,
) -> Result<impl IntoResponse, DomainError> {
    info!("DELETE /api/families/{}", family_id);

    let family = state.family_service.delete_family(&family_id).await?;
    Ok(ApiResponse::new(family))
}
