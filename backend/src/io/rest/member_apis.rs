use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use tracing::info;

use crate::domain::DomainError;
use crate::io::rest::ApiResponse;
use crate::AppState;
use shared::{CreateMemberRequest, UpdateMemberRequest};

/// GET /api/families/:id/members
pub async fn list_members(
    State(state): State<AppState>,
    Path(family_id): Path<String>,
) -> Result<impl IntoResponse, DomainError> {
    info!("GET /api/families/{}/members", family_id);

    let members = state.member_service.list_members(&family_id).await?;
    Ok(ApiResponse::new(members))
}

/// POST /api/families/:id/members
pub async fn create_member(
    State(state): State<AppState>,
    Path(family_id): Path<String>,
    Json(request): Json<CreateMemberRequest>,
) -> Result<impl IntoResponse, DomainError> {
    info!("POST /api/families/{}/members - name: {}", family_id, request.name);

    let member = state.member_service.create_member(&family_id, request).await?;
    Ok((StatusCode::CREATED, ApiResponse::new(member)))
}

/// PUT /api/families/:id/members/:member_id
pub async fn update_member(
    State(state): State<AppState>,
    Path((family_id, member_id)): Path<(String, String)>,
    Json(request): Json<UpdateMemberRequest>,
) -> Result<impl IntoResponse, DomainError> {
    info!("PUT /api/families/{}/members/{}", family_id, member_id);

    let member = state
        .member_service
        .update_member(&family_id, &member_id, request)
        .await?;
    Ok(ApiResponse::new(member))
}

/// DELETE /api/families/:id/members/:member_id
pub async fn delete_member(
    State(state): State<AppState>,
    Path((family_id, member_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, DomainError> {
    info!("DELETE /api/families/{}/members/{}", family_id, member_id);

    let member = state.member_service.delete_member(&family_id, &member_id).await?;
    Ok(ApiResponse::new(member))
}
