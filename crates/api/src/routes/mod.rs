//! REST API routes.

pub mod health;
pub mod subscription;
pub mod wallet;

use axum::Router;

use crate::AppState;

/// All `/api/v1` routes.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .merge(health::routes())
        .merge(wallet::routes())
        .merge(subscription::routes())
}
