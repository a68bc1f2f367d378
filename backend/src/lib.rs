//! # Parish Ledger Backend
//!
//! Contains all server-side logic for the parish subscription ledger.
//!
//! This crate is the orchestration layer that brings together:
//! - **Domain**: Business rules for units, families, members and payments
//! - **Storage**: SQLite persistence behind a single connection wrapper
//! - **IO**: REST API layer that exposes the domain over HTTP
//!
//! ## Architecture
//!
//! The backend follows a layered architecture:
//! ```text
//! HTTP clients
//!     ↓
//! IO Layer (REST API, handlers)
//!     ↓
//! Domain Layer (Business logic, services)
//!     ↓
//! Storage Layer (Database, persistence)
//! ```
//!
//! ## Key Responsibilities
//!
//! - Initialize configuration, database and the notification worker
//! - Build the application state that all services share
//! - Set up the REST API router with CORS configuration

pub mod config;
pub mod domain;
pub mod io;
pub mod storage;

use std::sync::Arc;

use anyhow::Result;
use axum::{
    http::Method,
    routing::get,
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use crate::config::Config;
use crate::domain::{
    spawn_notification_worker, FamilyService, MemberService, MonthPolicy, PaymentService,
    ReportService, UnitService,
};
use crate::storage::DbConnection;

/// Main application state that holds all services
#[derive(Clone)]
pub struct AppState {
    pub unit_service: UnitService,
    pub family_service: FamilyService,
    pub member_service: MemberService,
    pub payment_service: PaymentService,
    pub report_service: ReportService,
}

/// Initialize the backend with all required services
pub async fn initialize_backend(config: &Config) -> Result<AppState> {
    info!("Setting up database");
    let db = Arc::new(DbConnection::new(&config.database_url).await?);

    info!("Setting up notification worker");
    let notifier = spawn_notification_worker(config.smtp.clone());

    info!("Setting up domain services");
    let policy = MonthPolicy::system();
    let app_state = AppState {
        unit_service: UnitService::new(db.clone()),
        family_service: FamilyService::new(db.clone(), Some(notifier.clone())),
        member_service: MemberService::new(db.clone()),
        payment_service: PaymentService::new(db.clone(), policy.clone(), Some(notifier)),
        report_service: ReportService::new(db, policy),
    };

    Ok(app_state)
}

/// Create the Axum router with all routes configured
pub fn create_router(app_state: AppState) -> Router {
    // CORS setup to allow browser frontends to make requests
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers(Any);

    let api_routes = Router::new()
        .route("/units", get(io::list_units).post(io::create_unit))
        .route(
            "/units/:unit_id",
            axum::routing::put(io::update_unit).delete(io::delete_unit),
        )
        .route("/families", get(io::list_families).post(io::create_family))
        .route(
            "/families/:family_id",
            get(io::get_family)
                .put(io::update_family)
                .delete(io::delete_family),
        )
        .route(
            "/families/:family_id/members",
            get(io::list_members).post(io::create_member),
        )
        .route(
            "/families/:family_id/members/:member_id",
            axum::routing::put(io::update_member).delete(io::delete_member),
        )
        .route(
            "/families/:family_id/payments",
            get(io::get_family_ledger).post(io::record_payment),
        )
        .route(
            "/families/:family_id/payments/:payment_id",
            axum::routing::put(io::update_payment).delete(io::delete_payment),
        )
        .route("/payments", get(io::monthly_report))
        .route("/dashboard/stats", get(io::get_dashboard_stats));

    Router::new()
        .nest("/api", api_routes)
        .layer(cors)
        .with_state(app_state)
}
