//! Subscription routes: purchase, extension, current status.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Duration;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use saldo_core::subscription::SubscriptionStatus;
use saldo_db::entities::subscriptions;
use saldo_db::repositories::effective_status_of;
use saldo_db::SubscriptionRepository;
use saldo_shared::types::SubscriptionId;
use saldo_shared::AppError;

use crate::error::ApiError;
use crate::extractors::Caller;
use crate::AppState;

/// Creates the subscription routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/subscriptions", post(create_subscription))
        .route("/subscriptions/current", get(current_subscription))
        .route("/subscriptions/{id}/extend", post(extend_subscription))
}

fn subscription_repo(state: &AppState) -> SubscriptionRepository {
    SubscriptionRepository::new((*state.db).clone())
}

/// Request body for purchasing a subscription.
#[derive(Debug, Deserialize)]
pub struct CreateSubscriptionRequest {
    /// Plan name.
    pub plan: String,
    /// Charge amount, in major units.
    pub amount: Decimal,
    /// 3-letter currency code.
    pub currency: String,
    /// Subscription length in days.
    pub duration_days: i64,
}

/// Request body for extending a subscription.
#[derive(Debug, Deserialize)]
pub struct ExtendSubscriptionRequest {
    /// Extension length in days.
    pub duration_days: i64,
}

/// A subscription as rendered to callers.
#[derive(Debug, Serialize)]
pub struct SubscriptionResponse {
    /// Subscription id.
    pub id: Uuid,
    /// Plan name.
    pub plan: String,
    /// Status after lazy recomputation against the clock.
    pub status: &'static str,
    /// Billing amount, in major units.
    pub amount: String,
    /// Billing currency.
    pub currency: String,
    /// Start timestamp (RFC 3339).
    pub started_at: String,
    /// Expiry timestamp (RFC 3339).
    pub expires_at: String,
}

impl From<subscriptions::Model> for SubscriptionResponse {
    fn from(model: subscriptions::Model) -> Self {
        let status: SubscriptionStatus = effective_status_of(&model);

        Self {
            id: model.id,
            plan: model.plan,
            status: status.as_str(),
            amount: model.amount.to_string(),
            currency: model.currency,
            started_at: model.started_at.to_rfc3339(),
            expires_at: model.expires_at.to_rfc3339(),
        }
    }
}

/// POST `/subscriptions` - purchase a subscription, charging the wallet.
async fn create_subscription(
    State(state): State<AppState>,
    caller: Caller,
    Json(request): Json<CreateSubscriptionRequest>,
) -> Result<(StatusCode, Json<serde_json::Value>), ApiError> {
    let currency = saldo_core::wallet::parse_currency(&request.currency)?;

    let model = subscription_repo(&state)
        .create(
            caller.user_id(),
            &request.plan,
            request.amount,
            currency,
            Duration::days(request.duration_days),
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({
            "subscription": SubscriptionResponse::from(model),
        })),
    ))
}

/// GET `/subscriptions/current` - the caller's subscription, lazily lapsed.
async fn current_subscription(
    State(state): State<AppState>,
    caller: Caller,
) -> Result<Json<serde_json::Value>, ApiError> {
    let model = subscription_repo(&state)
        .check_and_update_status(caller.user_id())
        .await?
        .ok_or_else(|| AppError::NotFound("no subscription for this account".to_string()))?;

    Ok(Json(serde_json::json!({
        "subscription": SubscriptionResponse::from(model),
    })))
}

/// POST `/subscriptions/{id}/extend` - push an active subscription forward.
async fn extend_subscription(
    State(state): State<AppState>,
    _caller: Caller,
    Path(id): Path<Uuid>,
    Json(request): Json<ExtendSubscriptionRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let model = subscription_repo(&state)
        .extend(
            SubscriptionId::from_uuid(id),
            Duration::days(request.duration_days),
        )
        .await?;

    Ok(Json(serde_json::json!({
        "success": true,
        "subscription": SubscriptionResponse::from(model),
    })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal_macros::dec;
    use saldo_db::entities::sea_orm_active_enums;

    #[test]
    fn test_response_recomputes_status_lazily() {
        let now = Utc::now();
        let model = subscriptions::Model {
            id: Uuid::now_v7(),
            user_id: Uuid::now_v7(),
            plan: "premium".to_string(),
            status: sea_orm_active_enums::SubscriptionStatus::Active,
            amount: dec!(9.99),
            currency: "USD".to_string(),
            started_at: (now - Duration::days(60)).into(),
            expires_at: (now - Duration::days(30)).into(),
            charge_transaction_id: Uuid::now_v7(),
            created_at: (now - Duration::days(60)).into(),
            updated_at: (now - Duration::days(60)).into(),
        };

        // Stored active, but a month past expiry: render as expired.
        let response = SubscriptionResponse::from(model);
        assert_eq!(response.status, "expired");
        assert_eq!(response.amount, "9.99");
    }
}
