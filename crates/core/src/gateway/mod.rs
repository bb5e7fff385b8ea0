//! Payment gateway abstraction.
//!
//! External payment providers are reached through the [`PaymentGateway`]
//! trait: one implementation per provider, resolved by name through a
//! registry in `saldo-gateway`. Adapters compute their own fees, return a
//! stable external reference, and never touch the ledger.

pub mod fee;

use async_trait::async_trait;
use rust_decimal::Decimal;
use thiserror::Error;

use saldo_shared::types::Currency;

pub use fee::{FeeBreakdown, FeeSchedule};

/// Normalized provider failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayFailure {
    /// The provider rejected the operation.
    #[error("provider declined: {reason}")]
    Declined {
        /// Provider-supplied decline reason.
        reason: String,
    },

    /// The provider did not answer in time. The caller must NOT treat this
    /// as success or failure; reconciliation decides later.
    #[error("provider timed out")]
    Timeout,

    /// Transport-level failure talking to the provider.
    #[error("provider unreachable: {0}")]
    Transport(String),
}

/// Normalized outcome of a provider charge or payout, as reported by the
/// provider's own status query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettlementStatus {
    /// The provider settled the operation.
    Settled,
    /// The provider rejected or reversed the operation.
    Failed,
    /// The provider is still processing.
    Pending,
}

/// Result of a successful provider authorization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayReceipt {
    /// Stable external reference; part of the idempotency key.
    pub reference: String,
    /// Gross amount the provider processed.
    pub gross: Decimal,
    /// Provider fee for this operation.
    pub fee: Decimal,
    /// Net amount after the fee (`gross - fee`).
    pub net: Decimal,
    /// Currency of all three amounts.
    pub currency: Currency,
}

impl GatewayReceipt {
    /// Builds a receipt from a gross amount and a fee schedule.
    #[must_use]
    pub fn from_schedule(
        reference: String,
        gross: Decimal,
        currency: Currency,
        schedule: &FeeSchedule,
    ) -> Self {
        let breakdown = schedule.assess(gross, currency);
        Self {
            reference,
            gross: breakdown.gross,
            fee: breakdown.fee,
            net: breakdown.net,
            currency,
        }
    }
}

/// Resolves gateways by caller-supplied name.
///
/// Implemented by the registry in `saldo-gateway`; threaded into
/// reconciliation so stuck transactions can be re-checked against whichever
/// provider recorded them.
pub trait GatewayResolver: Send + Sync {
    /// Looks up a gateway, failing closed on unknown names.
    ///
    /// # Errors
    ///
    /// Returns `GatewayNotSupported` for unknown names.
    fn resolve(
        &self,
        name: &str,
    ) -> Result<std::sync::Arc<dyn PaymentGateway>, crate::wallet::error::WalletError>;
}

/// Uniform interface to one external payment provider.
///
/// Implementations report success/failure and compute fees; they do not
/// touch the ledger or the journal.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Registry name of this provider.
    fn name(&self) -> &str;

    /// The provider's fee schedule.
    fn fee_schedule(&self) -> FeeSchedule;

    /// Authorizes and confirms an inbound funding charge, returning the
    /// provider's reference and fee.
    async fn authorize_top_up(
        &self,
        amount: Decimal,
        currency: Currency,
    ) -> Result<GatewayReceipt, GatewayFailure>;

    /// Initiates an outbound payout. `reference` is our stable identifier
    /// for the payout; providers treat a repeated reference as the same
    /// payout, which keeps retries safe.
    async fn initiate_payout(
        &self,
        amount: Decimal,
        currency: Currency,
        reference: &str,
    ) -> Result<GatewayReceipt, GatewayFailure>;

    /// Queries the provider's own view of an operation; used by
    /// reconciliation for transactions stuck in `pending`.
    async fn query_status(&self, reference: &str) -> Result<SettlementStatus, GatewayFailure>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_receipt_from_schedule() {
        let schedule = FeeSchedule::new(dec!(2), dec!(0.30));
        let receipt = GatewayReceipt::from_schedule(
            "ref-1".into(),
            dec!(100.00),
            Currency::Usd,
            &schedule,
        );

        assert_eq!(receipt.gross, dec!(100.00));
        assert_eq!(receipt.fee, dec!(2.30));
        assert_eq!(receipt.net, dec!(97.70));
        assert_eq!(receipt.gross, receipt.fee + receipt.net);
    }

    #[test]
    fn test_failure_display() {
        assert_eq!(
            GatewayFailure::Declined {
                reason: "limit exceeded".into()
            }
            .to_string(),
            "provider declined: limit exceeded"
        );
        assert_eq!(GatewayFailure::Timeout.to_string(), "provider timed out");
    }
}
