//! Error-to-response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use saldo_core::wallet::WalletError;
use saldo_shared::AppError;

/// Error type returned by API handlers.
///
/// Every failure renders as `{ "error": <message>, "code": <ERROR_CODE> }`
/// with the status the domain error dictates.
#[derive(Debug)]
pub enum ApiError {
    /// A wallet domain error.
    Wallet(WalletError),
    /// A request plumbing error.
    App(AppError),
}

impl From<WalletError> for ApiError {
    fn from(err: WalletError) -> Self {
        Self::Wallet(err)
    }
}

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        Self::App(err)
    }
}

impl ApiError {
    /// HTTP status for this error.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        let code = match self {
            Self::Wallet(err) => err.http_status_code(),
            Self::App(err) => err.status_code(),
        };
        StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    /// Machine-readable error code for the response body.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Wallet(err) => err.error_code(),
            Self::App(err) => err.error_code(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let message = match &self {
            Self::Wallet(err) => err.to_string(),
            Self::App(err) => err.to_string(),
        };

        if self.status().is_server_error() {
            tracing::error!(code = self.code(), %message, "request failed");
        }

        (
            self.status(),
            Json(json!({
                "error": message,
                "code": self.code(),
            })),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_wallet_error_statuses() {
        assert_eq!(
            ApiError::from(WalletError::InvalidAmount(dec!(-1))).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::from(WalletError::InsufficientFunds {
                available: dec!(0),
                requested: dec!(1),
            })
            .status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            ApiError::from(WalletError::CurrencyNotFound {
                currency: "EUR".into()
            })
            .status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::from(WalletError::GatewayNotSupported("paypal".into())).status(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_app_error_statuses() {
        assert_eq!(
            ApiError::from(AppError::Validation("missing header".into())).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::from(AppError::Internal("boom".into())).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_error_codes_surface() {
        assert_eq!(
            ApiError::from(WalletError::SameAccount).code(),
            "SAME_ACCOUNT"
        );
        assert_eq!(
            ApiError::from(AppError::Validation(String::new())).code(),
            "VALIDATION_ERROR"
        );
    }
}
