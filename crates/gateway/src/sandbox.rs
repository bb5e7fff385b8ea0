//! In-process sandbox provider.
//!
//! Used in development and in tests that need a gateway without network
//! access. The outcome of every call is fixed at construction time, so
//! failure paths (declines, timeouts, stuck-pending reconciliation) can be
//! driven deterministically.

use async_trait::async_trait;
use rust_decimal::Decimal;
use uuid::Uuid;

use saldo_core::gateway::{
    FeeSchedule, GatewayFailure, GatewayReceipt, PaymentGateway, SettlementStatus,
};
use saldo_shared::types::Currency;

/// What the sandbox does with every authorization or payout call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Approve,
    Decline,
    TimeOut,
}

/// A deterministic in-process payment provider.
pub struct SandboxGateway {
    name: String,
    schedule: FeeSchedule,
    outcome: Outcome,
    settlement: SettlementStatus,
    pinned_reference: Option<String>,
}

impl SandboxGateway {
    /// Registry name of this provider.
    pub const NAME: &'static str = "sandbox";

    /// A sandbox that approves everything and reports `Settled` on status
    /// queries.
    #[must_use]
    pub fn approving(schedule: FeeSchedule) -> Self {
        Self {
            name: Self::NAME.to_string(),
            schedule,
            outcome: Outcome::Approve,
            settlement: SettlementStatus::Settled,
            pinned_reference: None,
        }
    }

    /// A sandbox that declines everything.
    #[must_use]
    pub fn declining(schedule: FeeSchedule) -> Self {
        Self {
            outcome: Outcome::Decline,
            settlement: SettlementStatus::Failed,
            ..Self::approving(schedule)
        }
    }

    /// A sandbox whose calls time out, leaving transactions `pending` for
    /// reconciliation.
    #[must_use]
    pub fn timing_out(schedule: FeeSchedule) -> Self {
        Self {
            outcome: Outcome::TimeOut,
            settlement: SettlementStatus::Pending,
            ..Self::approving(schedule)
        }
    }

    /// Overrides what `query_status` reports; lets reconciliation tests
    /// decide the provider's eventual verdict.
    #[must_use]
    pub fn with_settlement(mut self, settlement: SettlementStatus) -> Self {
        self.settlement = settlement;
        self
    }

    /// Registers the sandbox under a different name, so tests can isolate
    /// their own provider.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Pins the charge reference, making every authorization look like a
    /// replay of the same provider operation.
    #[must_use]
    pub fn with_pinned_reference(mut self, reference: impl Into<String>) -> Self {
        self.pinned_reference = Some(reference.into());
        self
    }

    fn settle(&self) -> Result<(), GatewayFailure> {
        match self.outcome {
            Outcome::Approve => Ok(()),
            Outcome::Decline => Err(GatewayFailure::Declined {
                reason: "sandbox declined".to_string(),
            }),
            Outcome::TimeOut => Err(GatewayFailure::Timeout),
        }
    }
}

#[async_trait]
impl PaymentGateway for SandboxGateway {
    fn name(&self) -> &str {
        &self.name
    }

    fn fee_schedule(&self) -> FeeSchedule {
        self.schedule
    }

    async fn authorize_top_up(
        &self,
        amount: Decimal,
        currency: Currency,
    ) -> Result<GatewayReceipt, GatewayFailure> {
        self.settle()?;
        let reference = self
            .pinned_reference
            .clone()
            .unwrap_or_else(|| format!("sandbox-{}", Uuid::new_v4()));
        Ok(GatewayReceipt::from_schedule(
            reference,
            amount,
            currency,
            &self.schedule,
        ))
    }

    async fn initiate_payout(
        &self,
        amount: Decimal,
        currency: Currency,
        reference: &str,
    ) -> Result<GatewayReceipt, GatewayFailure> {
        self.settle()?;
        Ok(GatewayReceipt::from_schedule(
            reference.to_string(),
            amount,
            currency,
            &self.schedule,
        ))
    }

    async fn query_status(&self, _reference: &str) -> Result<SettlementStatus, GatewayFailure> {
        Ok(self.settlement)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn test_approving_sandbox_issues_receipts() {
        let gateway = SandboxGateway::approving(FeeSchedule::new(dec!(2), dec!(0.30)));

        let receipt = gateway
            .authorize_top_up(dec!(100.00), Currency::Usd)
            .await
            .unwrap();

        assert!(receipt.reference.starts_with("sandbox-"));
        assert_eq!(receipt.gross, dec!(100.00));
        assert_eq!(receipt.fee, dec!(2.30));
        assert_eq!(receipt.net, dec!(97.70));
    }

    #[tokio::test]
    async fn test_references_are_unique_per_charge() {
        let gateway = SandboxGateway::approving(FeeSchedule::free());

        let a = gateway
            .authorize_top_up(dec!(10), Currency::Usd)
            .await
            .unwrap();
        let b = gateway
            .authorize_top_up(dec!(10), Currency::Usd)
            .await
            .unwrap();

        assert_ne!(a.reference, b.reference);
    }

    #[tokio::test]
    async fn test_declining_sandbox() {
        let gateway = SandboxGateway::declining(FeeSchedule::free());

        let err = gateway
            .authorize_top_up(dec!(10), Currency::Usd)
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayFailure::Declined { .. }));
    }

    #[tokio::test]
    async fn test_timing_out_sandbox() {
        let gateway = SandboxGateway::timing_out(FeeSchedule::free());

        let err = gateway
            .initiate_payout(dec!(10), Currency::Usd, "ref-1")
            .await
            .unwrap_err();
        assert_eq!(err, GatewayFailure::Timeout);
    }

    #[tokio::test]
    async fn test_settlement_override() {
        let gateway = SandboxGateway::timing_out(FeeSchedule::free())
            .with_settlement(SettlementStatus::Settled);

        assert_eq!(
            gateway.query_status("ref-1").await.unwrap(),
            SettlementStatus::Settled
        );
    }

    #[tokio::test]
    async fn test_pinned_reference_replays() {
        let gateway = SandboxGateway::approving(FeeSchedule::free())
            .with_pinned_reference("ch_fixed")
            .with_name("sandbox-a");

        let a = gateway
            .authorize_top_up(dec!(10), Currency::Usd)
            .await
            .unwrap();
        let b = gateway
            .authorize_top_up(dec!(10), Currency::Usd)
            .await
            .unwrap();

        assert_eq!(a.reference, "ch_fixed");
        assert_eq!(a.reference, b.reference);
        assert_eq!(gateway.name(), "sandbox-a");
    }

    #[tokio::test]
    async fn test_payout_echoes_reference() {
        let gateway = SandboxGateway::approving(FeeSchedule::free());

        let receipt = gateway
            .initiate_payout(dec!(25.00), Currency::Eur, "txn-123")
            .await
            .unwrap();
        assert_eq!(receipt.reference, "txn-123");
    }
}
