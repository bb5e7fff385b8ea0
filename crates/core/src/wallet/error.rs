//! Wallet error types for validation, business-rule, and state errors.

use rust_decimal::Decimal;
use thiserror::Error;

use saldo_shared::types::{SubscriptionId, TransactionId, UserId};

use crate::gateway::GatewayFailure;

/// Errors that can occur during wallet operations.
#[derive(Debug, Error)]
pub enum WalletError {
    // ========== Validation Errors ==========
    /// Currency code is not a supported ISO 4217 code.
    #[error("Invalid currency code: {0}")]
    InvalidCurrency(String),

    /// Amount must be positive and fit the currency's minor units.
    #[error("Invalid amount: {0}")]
    InvalidAmount(Decimal),

    /// Subscription duration must be strictly positive.
    #[error("Invalid duration: {days} days")]
    InvalidDuration {
        /// Requested duration in days.
        days: i64,
    },

    // ========== Business Rule Errors ==========
    /// Debit would drive the balance negative.
    #[error("Insufficient funds: available {available}, requested {requested}")]
    InsufficientFunds {
        /// Balance available before the operation.
        available: Decimal,
        /// Amount the operation asked for.
        requested: Decimal,
    },

    /// Transfer sender and recipient are the same account.
    #[error("Cannot transfer to the same account")]
    SameAccount,

    /// Transfer recipient is not known to the wallet.
    #[error("Recipient not found: {0}")]
    RecipientNotFound(UserId),

    /// The account has never held the requested currency.
    #[error("No {currency} balance for this account")]
    CurrencyNotFound {
        /// The requested currency code.
        currency: String,
    },

    // ========== Gateway Errors ==========
    /// No gateway is registered under the requested name.
    #[error("Payment gateway not supported: {0}")]
    GatewayNotSupported(String),

    /// The payment provider reported or caused a failure.
    #[error("Gateway error: {0}")]
    Gateway(#[from] GatewayFailure),

    // ========== Subscription Errors ==========
    /// An unexpired active subscription already exists.
    #[error("User already has an active subscription: {0}")]
    SubscriptionActive(SubscriptionId),

    /// Subscription not found.
    #[error("Subscription not found: {0}")]
    SubscriptionNotFound(SubscriptionId),

    /// Operation requires an active subscription.
    #[error("Subscription {0} is not active")]
    SubscriptionNotActive(SubscriptionId),

    // ========== Journal Errors ==========
    /// Transaction not found.
    #[error("Transaction not found: {0}")]
    TransactionNotFound(TransactionId),

    // ========== Concurrency Errors ==========
    /// Concurrent modification detected.
    #[error("Concurrent modification detected, please retry")]
    ConcurrentModification,

    // ========== Infrastructure Errors ==========
    /// Database error.
    #[error("Database error: {0}")]
    Database(String),

    /// Internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl WalletError {
    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidCurrency(_) => "INVALID_CURRENCY",
            Self::InvalidAmount(_) => "INVALID_AMOUNT",
            Self::InvalidDuration { .. } => "INVALID_DURATION",
            Self::InsufficientFunds { .. } => "INSUFFICIENT_FUNDS",
            Self::SameAccount => "SAME_ACCOUNT",
            Self::RecipientNotFound(_) => "RECIPIENT_NOT_FOUND",
            Self::CurrencyNotFound { .. } => "CURRENCY_NOT_FOUND",
            Self::GatewayNotSupported(_) => "GATEWAY_NOT_SUPPORTED",
            Self::Gateway(_) => "GATEWAY_ERROR",
            Self::SubscriptionActive(_) => "SUBSCRIPTION_ACTIVE",
            Self::SubscriptionNotFound(_) => "SUBSCRIPTION_NOT_FOUND",
            Self::SubscriptionNotActive(_) => "SUBSCRIPTION_NOT_ACTIVE",
            Self::TransactionNotFound(_) => "TRANSACTION_NOT_FOUND",
            Self::ConcurrentModification => "CONCURRENT_MODIFICATION",
            Self::Database(_) => "DATABASE_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn http_status_code(&self) -> u16 {
        match self {
            // 400 Bad Request - validation errors
            Self::InvalidCurrency(_)
            | Self::InvalidAmount(_)
            | Self::InvalidDuration { .. }
            | Self::GatewayNotSupported(_) => 400,

            // 404 Not Found
            Self::RecipientNotFound(_)
            | Self::CurrencyNotFound { .. }
            | Self::SubscriptionNotFound(_)
            | Self::TransactionNotFound(_) => 404,

            // 409 Conflict
            Self::SubscriptionActive(_) | Self::ConcurrentModification => 409,

            // 422 Unprocessable - business rule violations
            Self::InsufficientFunds { .. } | Self::SameAccount | Self::SubscriptionNotActive(_) => {
                422
            }

            // 502 Bad Gateway - provider-side failures
            Self::Gateway(_) => 502,

            // 500 Internal Server Error
            Self::Database(_) | Self::Internal(_) => 500,
        }
    }

    /// Returns true if this error is retryable.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::ConcurrentModification | Self::Gateway(GatewayFailure::Timeout)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_error_codes() {
        assert_eq!(
            WalletError::InvalidCurrency("ABC".into()).error_code(),
            "INVALID_CURRENCY"
        );
        assert_eq!(
            WalletError::InsufficientFunds {
                available: dec!(10),
                requested: dec!(50),
            }
            .error_code(),
            "INSUFFICIENT_FUNDS"
        );
        assert_eq!(WalletError::SameAccount.error_code(), "SAME_ACCOUNT");
        assert_eq!(
            WalletError::GatewayNotSupported("paypal".into()).error_code(),
            "GATEWAY_NOT_SUPPORTED"
        );
    }

    #[test]
    fn test_http_status_codes() {
        assert_eq!(
            WalletError::InvalidAmount(dec!(-1)).http_status_code(),
            400
        );
        assert_eq!(
            WalletError::RecipientNotFound(UserId::new()).http_status_code(),
            404
        );
        assert_eq!(
            WalletError::SubscriptionActive(SubscriptionId::new()).http_status_code(),
            409
        );
        assert_eq!(
            WalletError::InsufficientFunds {
                available: dec!(0),
                requested: dec!(1),
            }
            .http_status_code(),
            422
        );
        assert_eq!(
            WalletError::Gateway(GatewayFailure::Timeout).http_status_code(),
            502
        );
        assert_eq!(
            WalletError::Database("down".into()).http_status_code(),
            500
        );
    }

    #[test]
    fn test_retryable_errors() {
        assert!(WalletError::ConcurrentModification.is_retryable());
        assert!(WalletError::Gateway(GatewayFailure::Timeout).is_retryable());
        assert!(!WalletError::Gateway(GatewayFailure::Declined {
            reason: "card expired".into()
        })
        .is_retryable());
        assert!(!WalletError::SameAccount.is_retryable());
    }

    #[test]
    fn test_error_display() {
        let err = WalletError::InsufficientFunds {
            available: dec!(20.00),
            requested: dec!(50.00),
        };
        assert_eq!(
            err.to_string(),
            "Insufficient funds: available 20.00, requested 50.00"
        );
    }
}
