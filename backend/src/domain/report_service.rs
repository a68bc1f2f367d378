use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::month_policy::MonthPolicy;
use crate::storage::DbConnection;
use shared::{
    DashboardStats, MonthlyReportRequest, MonthlyReportResponse, MonthlyReportRow,
    PaginationMeta, PaymentStatus, ReportPaymentCell,
};

const DEFAULT_PAGE_SIZE: u32 = 50;
const RECENT_FAMILIES: i64 = 5;

/// Cross-family reporting: the monthly paid/pending report and the dashboard
/// aggregate counts
#[derive(Clone)]
pub struct ReportService {
    db: Arc<DbConnection>,
    policy: MonthPolicy,
}

impl ReportService {
    pub fn new(db: Arc<DbConnection>, policy: MonthPolicy) -> Self {
        Self { db, policy }
    }

    /// One row per family for a given month, with computed payment status.
    /// Optional unit filter and paid/pending status filter; paginated after
    /// filtering so totals reflect the filtered set.
    pub async fn monthly_report(&self, request: MonthlyReportRequest) -> DomainResult<MonthlyReportResponse> {
        if !self.policy.is_valid_month(&request.month) {
            return Err(DomainError::validation(
                "Invalid month. Must be from July 2025 onwards and not in the future.",
            ));
        }
        let status_filter = match request.status.as_deref() {
            None | Some("") | Some("all") => None,
            Some("paid") => Some(PaymentStatus::Paid),
            Some("pending") => Some(PaymentStatus::Pending),
            Some(other) => {
                return Err(DomainError::validation(format!(
                    "Invalid status filter: {other}. Use \"paid\" or \"pending\"."
                )))
            }
        };

        let unit_filter = match request.unit_id.as_deref() {
            None | Some("all") | Some("") => String::new(),
            Some(id) => id.to_string(),
        };

        info!("Building monthly report: month={}, unit={:?}", request.month, request.unit_id);

        let families = self.db.list_families_for_report(&unit_filter).await?;
        let payments = self.db.list_payments_for_month(&request.month).await?;
        let payment_map: HashMap<&str, &shared::Payment> =
            payments.iter().map(|p| (p.family_id.as_str(), p)).collect();

        let mut rows: Vec<MonthlyReportRow> = families
            .iter()
            .map(|f| {
                let payment = payment_map.get(f.family.id.as_str());
                MonthlyReportRow {
                    family_id: f.family.id.clone(),
                    card_no: f.family.card_no.clone(),
                    head_name: f.family.head_name.clone(),
                    unit_name: f.unit_name.clone(),
                    member_count: f.family.member_count,
                    month: request.month.clone(),
                    payment: match payment {
                        Some(p) => ReportPaymentCell {
                            status: PaymentStatus::Paid,
                            payment_id: Some(p.id.clone()),
                            amount_paid: Some(p.amount_paid),
                            payment_date: Some(p.payment_date.clone()),
                            remarks: p.remarks.clone(),
                        },
                        None => ReportPaymentCell {
                            status: PaymentStatus::Pending,
                            payment_id: None,
                            amount_paid: None,
                            payment_date: None,
                            remarks: None,
                        },
                    },
                }
            })
            .collect();

        if let Some(wanted) = status_filter {
            rows.retain(|row| row.payment.status == wanted);
        }

        let page = request.page.unwrap_or(1).max(1);
        let limit = request.limit.unwrap_or(DEFAULT_PAGE_SIZE).max(1);
        let total = rows.len() as u64;
        let start = ((page - 1) as usize) * limit as usize;
        let rows = if start >= rows.len() {
            Vec::new()
        } else {
            rows.drain(start..).take(limit as usize).collect()
        };

        Ok(MonthlyReportResponse {
            rows,
            pagination: PaginationMeta::new(page, limit, total),
        })
    }

    /// Aggregate counts plus the most recently registered families
    pub async fn dashboard_stats(&self) -> DomainResult<DashboardStats> {
        let total_units = self.db.count_units().await?;
        let total_families = self.db.count_families().await?;
        let total_members = self.db.count_all_members().await?;
        let recent_families = self.db.recent_families(RECENT_FAMILIES).await?;

        Ok(DashboardStats {
            total_units,
            total_families,
            total_members,
            recent_families,
        })
    }
}
