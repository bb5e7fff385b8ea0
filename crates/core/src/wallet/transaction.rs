//! Journal transaction domain types.
//!
//! The journal is append-only: every balance-affecting event is recorded as
//! a transaction that starts `pending` and ends in exactly one terminal
//! state. Terminal rows are immutable.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use saldo_shared::types::{CorrelationId, Currency, TransactionId, UserId};

use super::idempotency::IdempotencyKey;
use crate::gateway::GatewayReceipt;

/// The kind of balance-affecting event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
    /// External funding credited to the ledger.
    Topup,
    /// External payout debited from the ledger.
    Withdrawal,
    /// Sender leg of a user-to-user transfer.
    TransferOut,
    /// Recipient leg of a user-to-user transfer.
    TransferIn,
    /// One-off purchase debit.
    Purchase,
    /// Periodic subscription billing debit.
    SubscriptionCharge,
}

/// Whether a transaction type moves funds into or out of the balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Funds flow into the balance.
    Credit,
    /// Funds flow out of the balance.
    Debit,
}

impl TransactionType {
    /// The direction the type implies for the owning user's balance.
    #[must_use]
    pub const fn direction(self) -> Direction {
        match self {
            Self::Topup | Self::TransferIn => Direction::Credit,
            Self::Withdrawal | Self::TransferOut | Self::Purchase | Self::SubscriptionCharge => {
                Direction::Debit
            }
        }
    }

    /// Signs an unsigned amount according to the type's direction.
    #[must_use]
    pub fn signed_amount(self, amount: Decimal) -> Decimal {
        match self.direction() {
            Direction::Credit => amount,
            Direction::Debit => -amount,
        }
    }

    /// Gateway-driven types must carry an idempotency key so provider
    /// retries are detected instead of reapplied.
    #[must_use]
    pub const fn requires_idempotency_key(self) -> bool {
        matches!(self, Self::Topup | Self::Withdrawal)
    }

    /// Snake-case name, as stored and serialized.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Topup => "topup",
            Self::Withdrawal => "withdrawal",
            Self::TransferOut => "transfer_out",
            Self::TransferIn => "transfer_in",
            Self::Purchase => "purchase",
            Self::SubscriptionCharge => "subscription_charge",
        }
    }
}

/// Lifecycle state of a journal transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionStatus {
    /// Recorded, not yet settled.
    Pending,
    /// Settled successfully. Terminal.
    Completed,
    /// Settled unsuccessfully. Terminal.
    Failed,
}

impl TransactionStatus {
    /// Terminal states admit no further transitions.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    /// Snake-case name, as stored and serialized.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    /// Whether a transition from `self` to `to` is legal. Only
    /// `pending -> completed` and `pending -> failed` are.
    #[must_use]
    pub const fn can_transition_to(self, to: Self) -> bool {
        matches!(
            (self, to),
            (Self::Pending, Self::Completed) | (Self::Pending, Self::Failed)
        )
    }
}

/// Input for recording a new journal transaction.
///
/// The id is generated at draft time so callers can reference the
/// transaction (e.g. as a payout reference) before it is persisted.
#[derive(Debug, Clone)]
pub struct TransactionDraft {
    /// Pre-generated transaction id (UUID v7, time-ordered).
    pub id: TransactionId,
    /// Owning user.
    pub user_id: UserId,
    /// Event kind.
    pub tx_type: TransactionType,
    /// Unsigned amount; the sign is implied by `tx_type`.
    pub amount: Decimal,
    /// Currency of the amount.
    pub currency: Currency,
    /// Gateway name for gateway-driven types.
    pub gateway: Option<String>,
    /// Provider reference for gateway-driven types.
    pub gateway_reference: Option<String>,
    /// Idempotency key for gateway-driven types.
    pub idempotency_key: Option<IdempotencyKey>,
    /// Provider fee, recorded as metadata.
    pub fee: Option<Decimal>,
    /// The other party of a transfer leg.
    pub counterparty_id: Option<UserId>,
    /// Shared id linking the two legs of one transfer.
    pub correlation_id: Option<CorrelationId>,
}

impl TransactionDraft {
    fn new(user_id: UserId, tx_type: TransactionType, amount: Decimal, currency: Currency) -> Self {
        Self {
            id: TransactionId::new(),
            user_id,
            tx_type,
            amount,
            currency,
            gateway: None,
            gateway_reference: None,
            idempotency_key: None,
            fee: None,
            counterparty_id: None,
            correlation_id: None,
        }
    }

    /// Draft for a confirmed top-up, keyed by the provider's reference.
    #[must_use]
    pub fn topup(user_id: UserId, gateway: &str, receipt: &GatewayReceipt) -> Self {
        let mut draft = Self::new(user_id, TransactionType::Topup, receipt.gross, receipt.currency);
        draft.gateway = Some(gateway.to_string());
        draft.gateway_reference = Some(receipt.reference.clone());
        draft.idempotency_key = Some(IdempotencyKey::for_topup(gateway, &receipt.reference));
        draft.fee = Some(receipt.fee);
        draft
    }

    /// Draft for a top-up attempt the provider rejected before issuing a
    /// reference. Recorded `failed` for audit; carries no idempotency key.
    #[must_use]
    pub fn topup_attempt(
        user_id: UserId,
        amount: Decimal,
        currency: Currency,
        gateway: &str,
    ) -> Self {
        let mut draft = Self::new(user_id, TransactionType::Topup, amount, currency);
        draft.gateway = Some(gateway.to_string());
        draft
    }

    /// Draft for a withdrawal. The payout reference is our own transaction
    /// id, so the idempotency key is known before the provider is called.
    #[must_use]
    pub fn withdrawal(
        user_id: UserId,
        amount: Decimal,
        currency: Currency,
        gateway: &str,
    ) -> Self {
        let mut draft = Self::new(user_id, TransactionType::Withdrawal, amount, currency);
        draft.gateway = Some(gateway.to_string());
        draft.gateway_reference = Some(draft.id.to_string());
        draft.idempotency_key = Some(IdempotencyKey::for_withdrawal(gateway, draft.id));
        draft
    }

    /// Linked drafts for the two legs of a transfer, sharing a fresh
    /// correlation id. Both legs settle together or not at all.
    #[must_use]
    pub fn transfer_pair(
        sender: UserId,
        recipient: UserId,
        amount: Decimal,
        currency: Currency,
    ) -> (Self, Self) {
        let correlation = CorrelationId::new();

        let mut out = Self::new(sender, TransactionType::TransferOut, amount, currency);
        out.counterparty_id = Some(recipient);
        out.correlation_id = Some(correlation);

        let mut incoming = Self::new(recipient, TransactionType::TransferIn, amount, currency);
        incoming.counterparty_id = Some(sender);
        incoming.correlation_id = Some(correlation);

        (out, incoming)
    }

    /// Draft for a subscription billing debit.
    #[must_use]
    pub fn subscription_charge(user_id: UserId, amount: Decimal, currency: Currency) -> Self {
        Self::new(user_id, TransactionType::SubscriptionCharge, amount, currency)
    }

    /// Draft for a one-off purchase debit.
    #[must_use]
    pub fn purchase(user_id: UserId, amount: Decimal, currency: Currency) -> Self {
        Self::new(user_id, TransactionType::Purchase, amount, currency)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_type_directions() {
        assert_eq!(TransactionType::Topup.direction(), Direction::Credit);
        assert_eq!(TransactionType::TransferIn.direction(), Direction::Credit);
        assert_eq!(TransactionType::Withdrawal.direction(), Direction::Debit);
        assert_eq!(TransactionType::TransferOut.direction(), Direction::Debit);
        assert_eq!(TransactionType::Purchase.direction(), Direction::Debit);
        assert_eq!(
            TransactionType::SubscriptionCharge.direction(),
            Direction::Debit
        );
    }

    #[test]
    fn test_signed_amount() {
        assert_eq!(
            TransactionType::Topup.signed_amount(dec!(40.00)),
            dec!(40.00)
        );
        assert_eq!(
            TransactionType::TransferOut.signed_amount(dec!(40.00)),
            dec!(-40.00)
        );
    }

    #[test]
    fn test_idempotency_key_requirement() {
        assert!(TransactionType::Topup.requires_idempotency_key());
        assert!(TransactionType::Withdrawal.requires_idempotency_key());
        assert!(!TransactionType::TransferOut.requires_idempotency_key());
        assert!(!TransactionType::SubscriptionCharge.requires_idempotency_key());
    }

    #[test]
    fn test_status_transitions() {
        use TransactionStatus::{Completed, Failed, Pending};

        assert!(Pending.can_transition_to(Completed));
        assert!(Pending.can_transition_to(Failed));
        assert!(!Pending.can_transition_to(Pending));
        assert!(!Completed.can_transition_to(Failed));
        assert!(!Completed.can_transition_to(Pending));
        assert!(!Failed.can_transition_to(Completed));
    }

    #[test]
    fn test_terminal_states() {
        assert!(!TransactionStatus::Pending.is_terminal());
        assert!(TransactionStatus::Completed.is_terminal());
        assert!(TransactionStatus::Failed.is_terminal());
    }

    #[test]
    fn test_transfer_pair_is_linked() {
        let sender = UserId::new();
        let recipient = UserId::new();
        let (out, incoming) = TransactionDraft::transfer_pair(
            sender,
            recipient,
            dec!(40.00),
            Currency::Usd,
        );

        assert_eq!(out.tx_type, TransactionType::TransferOut);
        assert_eq!(incoming.tx_type, TransactionType::TransferIn);
        assert_eq!(out.correlation_id, incoming.correlation_id);
        assert!(out.correlation_id.is_some());
        assert_eq!(out.counterparty_id, Some(recipient));
        assert_eq!(incoming.counterparty_id, Some(sender));
        assert_eq!(out.amount, incoming.amount);
        assert_ne!(out.id, incoming.id);
    }

    #[test]
    fn test_withdrawal_reference_is_own_id() {
        let draft =
            TransactionDraft::withdrawal(UserId::new(), dec!(10), Currency::Usd, "midtrans");
        assert_eq!(draft.gateway_reference, Some(draft.id.to_string()));
        assert!(draft.idempotency_key.is_some());
    }

    #[test]
    fn test_topup_attempt_has_no_key() {
        let draft =
            TransactionDraft::topup_attempt(UserId::new(), dec!(10), Currency::Usd, "midtrans");
        assert!(draft.idempotency_key.is_none());
        assert!(draft.gateway_reference.is_none());
        assert_eq!(draft.gateway.as_deref(), Some("midtrans"));
    }

    proptest! {
        /// Terminal states never admit a transition, whatever the target.
        #[test]
        fn prop_terminal_states_are_sinks(
            from in prop_oneof![
                Just(TransactionStatus::Completed),
                Just(TransactionStatus::Failed),
            ],
            to in prop_oneof![
                Just(TransactionStatus::Pending),
                Just(TransactionStatus::Completed),
                Just(TransactionStatus::Failed),
            ],
        ) {
            prop_assert!(!from.can_transition_to(to));
        }
    }
}
