//! # Domain Module
//!
//! Business logic for the parish ledger, independent of HTTP and storage
//! details.
//!
//! ## Module Organization
//!
//! - **month_policy**: the active subscription month window and month token
//!   parsing/validation/formatting, with an injectable clock
//! - **payment_service**: the monthly payment ledger. Per-(family, month)
//!   upserts, payment deletion, and the reconciled Paid/Pending history view
//! - **report_service**: cross-family monthly report and dashboard counts
//! - **unit_service** / **family_service** / **member_service**: directory
//!   CRUD with denormalized counts kept consistent
//! - **notification**: channel-fed email worker for payment confirmations
//!   and welcome messages; always best effort
//! - **errors**: the shared error taxonomy mapped to HTTP at the REST layer
//!
//! ## Business Rules
//!
//! - At most one payment per family per month; re-recording overwrites
//! - Payment months must fall within [subscription start, current month]
//! - Payments must meet the minimum subscription amount
//! - A family's member count always equals its stored member records
//! - Unit family counts follow family create/move/delete
//! - Notification failures never fail or roll back a write

pub mod errors;
pub mod family_service;
pub mod member_service;
pub mod month_policy;
pub mod notification;
pub mod payment_service;
pub mod report_service;
pub mod unit_service;

pub use errors::*;
pub use family_service::*;
pub use member_service::*;
pub use month_policy::*;
pub use notification::*;
pub use payment_service::*;
pub use report_service::*;
pub use unit_service::*;
