//! Idempotency keys for gateway-driven operations.
//!
//! Providers deliver confirmations at-least-once and clients retry, so
//! top-ups and withdrawals are keyed by a deterministic identifier derived
//! from the external reference. The journal's unique index on
//! (type, key) makes the database the final arbiter when two retries race.

use serde::{Deserialize, Serialize};

use saldo_shared::types::TransactionId;

/// A deterministic identifier detecting replays of one logical operation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IdempotencyKey(String);

impl IdempotencyKey {
    /// Key for a top-up, derived from the provider's charge reference.
    #[must_use]
    pub fn for_topup(gateway: &str, reference: &str) -> Self {
        Self(format!("topup:{gateway}:{reference}"))
    }

    /// Key for a withdrawal, derived from our payout reference (the
    /// transaction id we hand to the provider).
    #[must_use]
    pub fn for_withdrawal(gateway: &str, transaction_id: TransactionId) -> Self {
        Self(format!("withdrawal:{gateway}:{transaction_id}"))
    }

    /// The key as stored in the journal.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for IdempotencyKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
