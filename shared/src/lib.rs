use serde::{Deserialize, Serialize};

/// An organizational unit grouping families in the parish.
///
/// Unit names are stored upper-cased and must be unique. `family_count` is
/// denormalized and maintained by the family CRUD operations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Unit {
    pub id: String,
    pub name: String,
    pub description: String,
    pub family_count: i64,
    /// RFC 3339 timestamp
    pub created_at: String,
    pub updated_at: String,
}

impl Unit {
    /// Generate a unit ID in format: "unit::<uuid>"
    pub fn generate_id() -> String {
        format!("unit::{}", uuid::Uuid::new_v4())
    }
}

/// A household tracked by a unique family card number.
///
/// Card numbers are stored upper-cased and must be unique across all
/// families. `member_count` is denormalized and kept equal to the number of
/// members registered under the family.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Family {
    pub id: String,
    pub unit_id: String,
    pub card_no: String,
    pub head_name: String,
    pub address: String,
    pub phone: String,
    /// Stored lower-cased; used for payment confirmation emails
    pub email: Option<String>,
    pub pincode: String,
    pub member_count: i64,
    pub created_at: String,
    pub updated_at: String,
}

impl Family {
    /// Generate a family ID in format: "family::<uuid>"
    pub fn generate_id() -> String {
        format!("family::{}", uuid::Uuid::new_v4())
    }
}

/// A family row joined with its unit name for listings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FamilyWithUnit {
    #[serde(flatten)]
    pub family: Family,
    pub unit_name: String,
}

/// Gender of a family member
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "Male",
            Gender::Female => "Female",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Male" => Some(Gender::Male),
            "Female" => Some(Gender::Female),
            _ => None,
        }
    }
}

/// Relationship of a member to the head of the family
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Relationship {
    Head,
    Wife,
    Son,
    Daughter,
    Father,
    Mother,
    #[serde(rename = "Daughter-in-law")]
    DaughterInLaw,
    #[serde(rename = "Son-in-law")]
    SonInLaw,
    Granddaughter,
    Grandson,
    Brother,
    Sister,
    Other,
}

impl Relationship {
    pub fn as_str(&self) -> &'static str {
        match self {
            Relationship::Head => "Head",
            Relationship::Wife => "Wife",
            Relationship::Son => "Son",
            Relationship::Daughter => "Daughter",
            Relationship::Father => "Father",
            Relationship::Mother => "Mother",
            Relationship::DaughterInLaw => "Daughter-in-law",
            Relationship::SonInLaw => "Son-in-law",
            Relationship::Granddaughter => "Granddaughter",
            Relationship::Grandson => "Grandson",
            Relationship::Brother => "Brother",
            Relationship::Sister => "Sister",
            Relationship::Other => "Other",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Head" => Some(Relationship::Head),
            "Wife" => Some(Relationship::Wife),
            "Son" => Some(Relationship::Son),
            "Daughter" => Some(Relationship::Daughter),
            "Father" => Some(Relationship::Father),
            "Mother" => Some(Relationship::Mother),
            "Daughter-in-law" => Some(Relationship::DaughterInLaw),
            "Son-in-law" => Some(Relationship::SonInLaw),
            "Granddaughter" => Some(Relationship::Granddaughter),
            "Grandson" => Some(Relationship::Grandson),
            "Brother" => Some(Relationship::Brother),
            "Sister" => Some(Relationship::Sister),
            "Other" => Some(Relationship::Other),
            _ => None,
        }
    }
}

/// An individual belonging to a family.
///
/// Member names are unique within a family (case-insensitive). All dates are
/// ISO 8601 (YYYY-MM-DD).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Member {
    pub id: String,
    pub family_id: String,
    pub name: String,
    pub dob: Option<String>,
    pub gender: Gender,
    pub relationship: Relationship,
    pub baptism_date: Option<String>,
    pub communion_date: Option<String>,
    pub confirmation_date: Option<String>,
    pub marriage_date: Option<String>,
    pub education: Option<String>,
    pub occupation: Option<String>,
    pub remarks: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl Member {
    /// Generate a member ID in format: "member::<uuid>"
    pub fn generate_id() -> String {
        format!("member::{}", uuid::Uuid::new_v4())
    }
}

/// One family's recorded contribution for one calendar month.
///
/// At most one payment exists per (family, month) pair; re-recording the same
/// month overwrites amount, payment date and remarks in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payment {
    pub id: String,
    pub family_id: String,
    /// Month token in YYYY-MM format
    pub month: String,
    /// Whole rupees
    pub amount_paid: i64,
    /// The real-world date the payment was made (YYYY-MM-DD), distinct from
    /// record creation time
    pub payment_date: String,
    pub remarks: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl Payment {
    /// Generate a payment ID in format: "payment::<uuid>"
    pub fn generate_id() -> String {
        format!("payment::{}", uuid::Uuid::new_v4())
    }
}

/// Paid/Pending marker for a ledger month
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum PaymentStatus {
    Paid,
    Pending,
}

/// One month of a family's reconciled payment history.
///
/// Derived, never stored: a month with no payment record is Pending.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub month: String,
    /// Display name, e.g. "July 2025"
    pub month_name: String,
    pub is_current_month: bool,
    pub status: PaymentStatus,
    pub payment: Option<Payment>,
}

/// Simple folds over a family's ledger entries
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerSummary {
    pub total_months: usize,
    pub paid_months: usize,
    pub pending_months: usize,
    pub total_amount_paid: i64,
}

/// Family identity carried alongside its ledger
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FamilySummary {
    pub id: String,
    pub card_no: String,
    pub head_name: String,
}

/// Full payment history view for one family.
///
/// `payment_history` covers every active month, most recent first;
/// `all_payments` carries the raw stored records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FamilyLedgerResponse {
    pub family: FamilySummary,
    pub payment_history: Vec<LedgerEntry>,
    pub all_payments: Vec<Payment>,
    pub summary: LedgerSummary,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateUnitRequest {
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateUnitRequest {
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateFamilyRequest {
    pub unit_id: String,
    pub card_no: String,
    pub head_name: String,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub pincode: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateFamilyRequest {
    pub unit_id: String,
    pub card_no: String,
    pub head_name: String,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub pincode: Option<String>,
}

/// Query parameters accepted by the family list endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FamilyListRequest {
    pub unit_id: Option<String>,
    /// Case-insensitive match against head name, card number or address
    pub search: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FamilyListResponse {
    pub families: Vec<FamilyWithUnit>,
    pub pagination: PaginationMeta,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateMemberRequest {
    pub name: String,
    pub dob: Option<String>,
    pub gender: Gender,
    pub relationship: Relationship,
    pub baptism_date: Option<String>,
    pub communion_date: Option<String>,
    pub confirmation_date: Option<String>,
    pub marriage_date: Option<String>,
    pub education: Option<String>,
    pub occupation: Option<String>,
    pub remarks: Option<String>,
}

/// Partial update; absent fields are left unchanged
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpdateMemberRequest {
    pub name: Option<String>,
    pub dob: Option<String>,
    pub gender: Option<Gender>,
    pub relationship: Option<Relationship>,
    pub baptism_date: Option<String>,
    pub communion_date: Option<String>,
    pub confirmation_date: Option<String>,
    pub marriage_date: Option<String>,
    pub education: Option<String>,
    pub occupation: Option<String>,
    pub remarks: Option<String>,
}

/// Record (or overwrite) a family's payment for one month
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordPaymentRequest {
    /// Month token in YYYY-MM format
    pub month: String,
    /// Whole rupees; must meet the minimum subscription amount
    pub amount_paid: i64,
    /// YYYY-MM-DD
    pub payment_date: String,
    pub remarks: Option<String>,
}

/// Edit an existing payment record in place (month is not changed)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdatePaymentRequest {
    pub amount_paid: i64,
    pub payment_date: String,
    pub remarks: Option<String>,
}

/// Query parameters for the cross-family monthly report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyReportRequest {
    pub unit_id: Option<String>,
    /// Month token in YYYY-MM format, required
    pub month: String,
    /// "paid" or "pending"; omit for both
    pub status: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

/// Payment cell for one family in the monthly report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportPaymentCell {
    pub status: PaymentStatus,
    pub payment_id: Option<String>,
    pub amount_paid: Option<i64>,
    pub payment_date: Option<String>,
    pub remarks: Option<String>,
}

/// One family row in the cross-family monthly report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyReportRow {
    pub family_id: String,
    pub card_no: String,
    pub head_name: String,
    pub unit_name: String,
    pub member_count: i64,
    pub month: String,
    pub payment: ReportPaymentCell,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyReportResponse {
    pub rows: Vec<MonthlyReportRow>,
    pub pagination: PaginationMeta,
}

/// Page/limit/total bookkeeping for paginated listings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaginationMeta {
    pub page: u32,
    pub limit: u32,
    pub total: u64,
    pub pages: u32,
}

impl PaginationMeta {
    pub fn new(page: u32, limit: u32, total: u64) -> Self {
        let pages = if limit == 0 {
            0
        } else {
            ((total + limit as u64 - 1) / limit as u64) as u32
        };
        Self { page, limit, total, pages }
    }
}

/// Recently registered family as shown on the dashboard
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecentFamily {
    pub id: String,
    pub head_name: String,
    pub unit_name: String,
    pub member_count: i64,
    pub created_at: String,
}

/// Aggregate counts for the admin dashboard
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardStats {
    pub total_units: i64,
    pub total_families: i64,
    pub total_members: i64,
    pub recent_families: Vec<RecentFamily>,
}
