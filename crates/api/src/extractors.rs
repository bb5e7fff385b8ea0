//! Request extractors.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use std::str::FromStr;

use saldo_shared::types::UserId;
use saldo_shared::AppError;

use crate::error::ApiError;

/// Header carrying the authenticated caller's opaque user id.
///
/// Authentication itself is the surrounding platform's concern; by the time
/// a request reaches the wallet, the gateway in front of it has verified
/// the session and injected this header.
pub const CALLER_HEADER: &str = "x-user-id";

/// The authenticated caller, extracted from [`CALLER_HEADER`].
#[derive(Debug, Clone, Copy)]
pub struct Caller(pub UserId);

impl Caller {
    /// The caller's user id.
    #[must_use]
    pub const fn user_id(&self) -> UserId {
        self.0
    }
}

impl<S> FromRequestParts<S> for Caller
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get(CALLER_HEADER)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| {
                AppError::Validation(format!("missing {CALLER_HEADER} header"))
            })?;

        let user_id = UserId::from_str(raw).map_err(|_| {
            AppError::Validation(format!("malformed {CALLER_HEADER} header"))
        })?;

        Ok(Self(user_id))
    }
}
