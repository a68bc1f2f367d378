//! # Storage Module
//!
//! Handles all data persistence for the parish ledger.
//!
//! Backed by SQLite through SQLx. The `UNIQUE(family_id, month)` constraint
//! on the payments table is what guarantees at most one payment per family
//! per month; upserts delegate to the store's native
//! `INSERT .. ON CONFLICT DO UPDATE` so concurrent submissions for the same
//! month can never create duplicates.

pub mod db;

pub use db::DbConnection;
