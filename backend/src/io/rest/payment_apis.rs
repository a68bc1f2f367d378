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
use shared::{MonthlyReportRequest, RecordPaymentRequest, UpdatePaymentRequest};

/// Query parameters for the monthly report endpoint
#[derive(Deserialize, Debug)]
pub struct MonthlyReportQuery {
    pub month: Option<String>,
    pub unit_id: Option<String>,
    pub status: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

/// GET /api/families/:id/payments
///
/// Returns the full subscription ledger for a family: one entry per
/// active month with its Paid/Pending status, plus totals.
pub async fn get_family_ledger(
    State(state): State<AppState>,
    Path(family_id): Path<String>,
) -> Result<impl IntoResponse, DomainError> {
    info!("GET /api/families/{}/payments", family_id);

    let ledger = state.payment_service.build_ledger(&family_id).await?;
    Ok(ApiResponse::new(ledger))
}

/// POST /api/families/:id/payments
pub async fn record_payment(
    State(state): State<AppState>,
    Path(family_id): Path<String>,
    Json(request): Json<RecordPaymentRequest>,
) -> Result<impl IntoResponse, DomainError> {
    info!(
        "POST /api/families/{}/payments - month: {}",
        family_id, request.month
    );

    let payment = state.payment_service.record_payment(&family_id, request).await?;
    Ok((StatusCode::CREATED, ApiResponse::new(payment)))
}

/// PUT /api/families/:id/payments/:payment_id
pub async fn update_payment(
    State(state): State<AppState>,
    Path((family_id, payment_id)): Path<(String, String)>,
    Json(request): Json<UpdatePaymentRequest>,
) -> Result<impl IntoResponse, DomainError> {
    info!("PUT /api/families/{}/payments/{}", family_id, payment_id);

    let payment = state
        .payment_service
        .update_payment(&family_id, &payment_id, request)
        .await?;
    Ok(ApiResponse::new(payment))
}

/// DELETE /api/families/:id/payments/:payment_id
pub async fn delete_payment(
    State(state): State<AppState>,
    Path((family_id, payment_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, DomainError> {
    info!("DELETE /api/families/{}/payments/{}", family_id, payment_id);

    let payment = state.payment_service.delete_payment(&family_id, &payment_id).await?;
    Ok(ApiResponse::new(payment))
}

/// GET /api/payments
///
/// Parish-wide monthly collection report, filterable by unit and
/// Paid/Pending status, paginated in memory.
pub async fn monthly_report(
    State(state): State<AppState>,
    Query(query): Query<MonthlyReportQuery>,
) -> Result<impl IntoResponse, DomainError> {
    info!("GET /api/payments - query: {:?}", query);

    let month = query
        .month
        .ok_or_else(|| DomainError::validation("Month is required"))?;
    let request = MonthlyReportRequest {
        unit_id: query.unit_id,
        month,
        status: query.status,
        page: query.page,
        limit: query.limit,
    };
    let report = state.report_service.monthly_report(request).await?;
    Ok(ApiResponse::new(report))
}
