//! Monthly subscription ledger.
//!
//! One payment record per (family, month); recording the same month again
//! overwrites the existing record in place. The reconciled ledger joins the
//! active month window against stored payments, marking months with no
//! record as Pending.

use chrono::{NaiveDate, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

use crate::domain::errors::{conflict_on_unique, DomainError, DomainResult};
use crate::domain::month_policy::{format_month, parse_month_token, MonthPolicy};
use crate::domain::notification::{NotificationEvent, Notifier};
use crate::storage::DbConnection;
use shared::{
    Family, FamilyLedgerResponse, FamilySummary, LedgerEntry, LedgerSummary, Payment,
    PaymentStatus, RecordPaymentRequest, UpdatePaymentRequest,
};

/// Minimum monthly subscription amount in rupees
pub const MIN_PAYMENT_AMOUNT: i64 = 25;

/// Service for recording payments and building per-family ledgers
#[derive(Clone)]
pub struct PaymentService {
    db: Arc<DbConnection>,
    policy: MonthPolicy,
    notifier: Option<Notifier>,
}

impl PaymentService {
    pub fn new(db: Arc<DbConnection>, policy: MonthPolicy, notifier: Option<Notifier>) -> Self {
        Self { db, policy, notifier }
    }

    /// Record a family's payment for one month, overwriting any existing
    /// record for that month. Emits a confirmation notification when the
    /// family has an email on file; notification failures never affect the
    /// stored payment.
    pub async fn record_payment(
        &self,
        family_id: &str,
        request: RecordPaymentRequest,
    ) -> DomainResult<Payment> {
        if parse_month_token(&request.month).is_none() {
            return Err(DomainError::validation("Invalid month format. Use YYYY-MM"));
        }
        if !self.policy.is_valid_month(&request.month) {
            return Err(DomainError::validation(
                "Invalid month. Must be from July 2025 onwards and not in the future.",
            ));
        }
        validate_amount(request.amount_paid)?;
        let family = self.get_existing_family(family_id).await?;
        validate_payment_date(&request.payment_date)?;

        info!(
            "Recording payment: family={}, month={}, amount={}",
            family_id, request.month, request.amount_paid
        );

        let now = Utc::now().to_rfc3339();
        let candidate = Payment {
            id: Payment::generate_id(),
            family_id: family_id.to_string(),
            month: request.month.clone(),
            amount_paid: request.amount_paid,
            payment_date: request.payment_date.clone(),
            remarks: trimmed_remarks(request.remarks),
            created_at: now.clone(),
            updated_at: now,
        };

        let stored = self
            .db
            .upsert_payment(&candidate)
            .await
            .map_err(|e| conflict_on_unique(e, "Payment for this month already exists"))?;

        if let (Some(notifier), Some(email)) = (&self.notifier, &family.email) {
            notifier.send(NotificationEvent::PaymentConfirmation {
                email: email.clone(),
                head_name: family.head_name.clone(),
                card_no: family.card_no.clone(),
                month_name: format_month(&stored.month),
                amount_paid: stored.amount_paid,
                payment_date: stored.payment_date.clone(),
                remarks: stored.remarks.clone(),
            });
        }

        Ok(stored)
    }

    /// Edit an existing payment record in place; the month key is not changed
    pub async fn update_payment(
        &self,
        family_id: &str,
        payment_id: &str,
        request: UpdatePaymentRequest,
    ) -> DomainResult<Payment> {
        validate_amount(request.amount_paid)?;
        validate_payment_date(&request.payment_date)?;
        self.get_existing_family(family_id).await?;

        let mut payment = self
            .db
            .get_payment(family_id, payment_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Payment not found"))?;

        payment.amount_paid = request.amount_paid;
        payment.payment_date = request.payment_date;
        payment.remarks = trimmed_remarks(request.remarks);
        payment.updated_at = Utc::now().to_rfc3339();

        self.db.update_payment(&payment).await?;
        Ok(payment)
    }

    /// Delete a payment record, but only if it belongs to the given family
    pub async fn delete_payment(&self, family_id: &str, payment_id: &str) -> DomainResult<Payment> {
        self.get_existing_family(family_id).await?;

        let payment = self
            .db
            .get_payment(family_id, payment_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Payment not found"))?;

        self.db.delete_payment(family_id, payment_id).await?;
        info!("Deleted payment: {} for family {}", payment.id, family_id);
        Ok(payment)
    }

    /// All payment records for a family, most recent month first
    pub async fn list_payments(&self, family_id: &str) -> DomainResult<Vec<Payment>> {
        self.get_existing_family(family_id).await?;
        Ok(self.db.list_payments(family_id).await?)
    }

    /// Build the full reconciled ledger for a family.
    ///
    /// Deterministic in (current wall-clock month, stored payments): one
    /// entry per active month, Paid iff a record exists, ordered most recent
    /// first.
    pub async fn build_ledger(&self, family_id: &str) -> DomainResult<FamilyLedgerResponse> {
        let family = self.get_existing_family(family_id).await?;

        let payments = self.db.list_payments(family_id).await?;
        let mut by_month: HashMap<&str, &Payment> =
            payments.iter().map(|p| (p.month.as_str(), p)).collect();

        let mut history: Vec<LedgerEntry> = self
            .policy
            .active_months()
            .into_iter()
            .map(|month| {
                let payment = by_month.remove(month.as_str()).cloned();
                LedgerEntry {
                    month_name: format_month(&month),
                    is_current_month: self.policy.is_current_month(&month),
                    status: if payment.is_some() {
                        PaymentStatus::Paid
                    } else {
                        PaymentStatus::Pending
                    },
                    payment,
                    month,
                }
            })
            .collect();
        // Display order is most recent first
        history.reverse();

        let summary = summarize(&history);

        Ok(FamilyLedgerResponse {
            family: FamilySummary {
                id: family.id,
                card_no: family.card_no,
                head_name: family.head_name,
            },
            payment_history: history,
            all_payments: payments,
            summary,
        })
    }

    async fn get_existing_family(&self, family_id: &str) -> DomainResult<Family> {
        self.db
            .get_family(family_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Family not found"))
    }
}

fn summarize(history: &[LedgerEntry]) -> LedgerSummary {
    let paid_months = history.iter().filter(|e| e.status == PaymentStatus::Paid).count();
    LedgerSummary {
        total_months: history.len(),
        paid_months,
        pending_months: history.len() - paid_months,
        total_amount_paid: history
            .iter()
            .filter_map(|e| e.payment.as_ref())
            .map(|p| p.amount_paid)
            .sum(),
    }
}

fn validate_amount(amount: i64) -> DomainResult<()> {
    if amount < MIN_PAYMENT_AMOUNT {
        return Err(DomainError::validation(format!(
            "Amount must be at least ₹{MIN_PAYMENT_AMOUNT}"
        )));
    }
    Ok(())
}

fn validate_payment_date(date: &str) -> DomainResult<()> {
    NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .map(|_| ())
        .map_err(|_| DomainError::validation("Invalid payment date"))
}

fn trimmed_remarks(remarks: Option<String>) -> Option<String> {
    match remarks.map(|r| r.trim().to_string()) {
        None => None,
        Some(r) if r.is_empty() => None,
        Some(r) => Some(r),
    }
}
