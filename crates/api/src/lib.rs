//! HTTP API layer for the Saldo wallet.
//!
//! This crate provides:
//! - REST API routes for balances, top-ups, transfers, withdrawals, and
//!   subscriptions
//! - The caller-id extractor (identity arrives pre-authenticated from the
//!   surrounding platform)
//! - Error-to-response mapping

pub mod error;
pub mod extractors;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use sea_orm::DatabaseConnection;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use saldo_gateway::GatewayRegistry;
use saldo_shared::config::BillingConfig;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub db: Arc<DatabaseConnection>,
    /// Payment gateway registry.
    pub gateways: Arc<GatewayRegistry>,
    /// Billing policy configuration.
    pub billing: BillingConfig,
}

/// Creates the main application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .nest("/api/v1", routes::api_routes())
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
