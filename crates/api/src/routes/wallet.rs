//! Wallet routes: balance, top-up, transfer, withdrawal, statement.

use axum::extract::{Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use saldo_core::wallet::{self, TransactionStatus, TransactionType};
use saldo_db::entities::transactions;
use saldo_db::WalletRepository;
use saldo_shared::types::{PageRequest, PageResponse, UserId};

use crate::error::ApiError;
use crate::extractors::Caller;
use crate::AppState;

/// Creates the wallet routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/wallet/balance", get(get_balance))
        .route("/wallet/topup", post(top_up))
        .route("/wallet/transfer", post(transfer))
        .route("/wallet/withdraw", post(withdraw))
        .route("/wallet/transactions", get(list_transactions))
}

fn wallet_repo(state: &AppState) -> WalletRepository {
    WalletRepository::new((*state.db).clone(), state.billing.clone())
}

/// Query parameters for the balance endpoint.
#[derive(Debug, Deserialize)]
pub struct BalanceQuery {
    /// 3-letter currency code.
    pub currency: String,
}

/// Response for the balance endpoint.
#[derive(Debug, Serialize)]
pub struct BalanceResponse {
    /// Current spendable amount.
    pub balance: String,
    /// The queried currency.
    pub currency: String,
}

/// Request body for a top-up.
#[derive(Debug, Deserialize)]
pub struct TopUpRequest {
    /// Amount to fund, in major units.
    pub amount: Decimal,
    /// 3-letter currency code.
    pub currency: String,
    /// Gateway name (e.g. "midtrans").
    pub gateway: String,
}

/// Request body for a transfer.
#[derive(Debug, Deserialize)]
pub struct TransferRequest {
    /// Recipient's user id.
    pub recipient_id: Uuid,
    /// Amount to move, in major units.
    pub amount: Decimal,
    /// 3-letter currency code.
    pub currency: String,
}

/// Request body for a withdrawal.
#[derive(Debug, Deserialize)]
pub struct WithdrawRequest {
    /// Amount to pay out, in major units.
    pub amount: Decimal,
    /// 3-letter currency code.
    pub currency: String,
    /// Gateway name (e.g. "midtrans").
    pub gateway: String,
}

/// A journal transaction as rendered to callers.
#[derive(Debug, Serialize)]
pub struct TransactionResponse {
    /// Transaction id.
    pub id: Uuid,
    /// Event kind.
    #[serde(rename = "type")]
    pub tx_type: &'static str,
    /// Unsigned amount; sign implied by the type.
    pub amount: String,
    /// Signed amount relative to the owning balance.
    pub signed_amount: String,
    /// Currency code.
    pub currency: String,
    /// Lifecycle status.
    pub status: &'static str,
    /// Gateway name, for gateway-driven transactions.
    pub gateway: Option<String>,
    /// Provider fee, if any.
    pub fee: Option<String>,
    /// Counterparty user id, for transfer legs.
    pub counterparty_id: Option<Uuid>,
    /// Correlation id shared by the two legs of a transfer.
    pub correlation_id: Option<Uuid>,
    /// Failure reason for failed transactions.
    pub failure_reason: Option<String>,
    /// Creation timestamp (RFC 3339).
    pub created_at: String,
}

impl From<transactions::Model> for TransactionResponse {
    fn from(model: transactions::Model) -> Self {
        let tx_type: TransactionType = model.tx_type.into();
        let status: TransactionStatus = model.status.into();

        Self {
            id: model.id,
            tx_type: tx_type.as_str(),
            amount: model.amount.to_string(),
            signed_amount: tx_type.signed_amount(model.amount).to_string(),
            currency: model.currency,
            status: status.as_str(),
            gateway: model.gateway,
            fee: model.fee.map(|fee| fee.to_string()),
            counterparty_id: model.counterparty_id,
            correlation_id: model.correlation_id,
            failure_reason: model.failure_reason,
            created_at: model.created_at.to_rfc3339(),
        }
    }
}

/// Response for a committed transfer.
#[derive(Debug, Serialize)]
pub struct TransferResponse {
    /// Always true on the success path.
    pub success: bool,
    /// The two linked legs.
    pub transfer: TransferBody,
}

/// The two legs of a transfer.
#[derive(Debug, Serialize)]
pub struct TransferBody {
    /// Shared correlation id.
    pub correlation_id: Option<Uuid>,
    /// Sender leg.
    pub outgoing: TransactionResponse,
    /// Recipient leg.
    pub incoming: TransactionResponse,
}

/// GET `/wallet/balance?currency=USD` - current balance in one currency.
///
/// 404 when the account has never held the currency.
async fn get_balance(
    State(state): State<AppState>,
    caller: Caller,
    Query(query): Query<BalanceQuery>,
) -> Result<Json<BalanceResponse>, ApiError> {
    let currency = wallet::parse_currency(&query.currency)?;

    let money = wallet_repo(&state)
        .balance(caller.user_id(), currency)
        .await?
        .ok_or(saldo_core::wallet::WalletError::CurrencyNotFound {
            currency: currency.to_string(),
        })?;

    Ok(Json(BalanceResponse {
        balance: money.amount.to_string(),
        currency: money.currency.to_string(),
    }))
}

/// POST `/wallet/topup` - fund the balance through a payment gateway.
async fn top_up(
    State(state): State<AppState>,
    caller: Caller,
    Json(request): Json<TopUpRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let currency = wallet::parse_currency(&request.currency)?;
    let gateway = state.gateways.resolve(&request.gateway)?;

    let row = wallet_repo(&state)
        .top_up(caller.user_id(), request.amount, currency, gateway.as_ref())
        .await?;

    Ok(Json(serde_json::json!({
        "success": true,
        "topup": TransactionResponse::from(row),
    })))
}

/// POST `/wallet/transfer` - move funds to another user.
async fn transfer(
    State(state): State<AppState>,
    caller: Caller,
    Json(request): Json<TransferRequest>,
) -> Result<Json<TransferResponse>, ApiError> {
    let currency = wallet::parse_currency(&request.currency)?;

    let record = wallet_repo(&state)
        .transfer(
            caller.user_id(),
            UserId::from_uuid(request.recipient_id),
            request.amount,
            currency,
        )
        .await?;

    Ok(Json(TransferResponse {
        success: true,
        transfer: TransferBody {
            correlation_id: record.outgoing.correlation_id,
            outgoing: record.outgoing.into(),
            incoming: record.incoming.into(),
        },
    }))
}

/// POST `/wallet/withdraw` - pay the balance out through a gateway.
async fn withdraw(
    State(state): State<AppState>,
    caller: Caller,
    Json(request): Json<WithdrawRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let currency = wallet::parse_currency(&request.currency)?;
    let gateway = state.gateways.resolve(&request.gateway)?;

    let row = wallet_repo(&state)
        .withdraw(caller.user_id(), request.amount, currency, gateway.as_ref())
        .await?;

    Ok(Json(serde_json::json!({
        "success": true,
        "withdrawal": TransactionResponse::from(row),
    })))
}

/// GET `/wallet/transactions` - the caller's journal, newest first.
async fn list_transactions(
    State(state): State<AppState>,
    caller: Caller,
    Query(page): Query<PageRequest>,
) -> Result<Json<PageResponse<TransactionResponse>>, ApiError> {
    let rows = wallet_repo(&state)
        .transactions(caller.user_id(), &page)
        .await?;

    Ok(Json(PageResponse {
        data: rows.data.into_iter().map(TransactionResponse::from).collect(),
        meta: rows.meta,
    }))
}
