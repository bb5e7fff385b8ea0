//! Subscription billing state machine.
//!
//! States: `active`, `expired`, `inactive`. A subscription is created
//! `active` (backed by a completed ledger debit), lapses to `expired` once
//! its expiry passes, and can be canceled to `inactive`. Terminal states
//! are sinks: the only way back is a brand-new subscription.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use saldo_shared::types::SubscriptionId;

use crate::wallet::error::WalletError;

/// Lifecycle state of a subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    /// Paid up and unexpired.
    Active,
    /// Lapsed because the expiry passed. Terminal.
    Expired,
    /// Canceled. Terminal.
    Inactive,
}

impl SubscriptionStatus {
    /// Terminal states admit no transition except creating a new
    /// subscription.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Expired | Self::Inactive)
    }

    /// Snake-case name, as stored and serialized.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Expired => "expired",
            Self::Inactive => "inactive",
        }
    }
}

/// Recomputes a subscription's status against the clock.
///
/// Idempotent, and monotone: an `active` subscription whose expiry has
/// passed becomes `expired`; terminal states are returned unchanged, never
/// resurrected.
#[must_use]
pub fn effective_status(
    status: SubscriptionStatus,
    expires_at: DateTime<Utc>,
    now: DateTime<Utc>,
) -> SubscriptionStatus {
    match status {
        SubscriptionStatus::Active if expires_at < now => SubscriptionStatus::Expired,
        other => other,
    }
}

/// Validates a billing duration: strictly positive.
///
/// # Errors
///
/// Returns `InvalidDuration` otherwise.
pub fn validate_duration(duration: Duration) -> Result<(), WalletError> {
    if duration <= Duration::zero() {
        return Err(WalletError::InvalidDuration {
            days: duration.num_days(),
        });
    }
    Ok(())
}

/// Checks that a subscription may be extended: only `active` ones may.
///
/// # Errors
///
/// Returns `SubscriptionNotActive` otherwise.
pub fn can_extend(id: SubscriptionId, status: SubscriptionStatus) -> Result<(), WalletError> {
    if status != SubscriptionStatus::Active {
        return Err(WalletError::SubscriptionNotActive(id));
    }
    Ok(())
}

/// Pushes an expiry forward by `duration`.
#[must_use]
pub fn extended_expiry(expires_at: DateTime<Utc>, duration: Duration) -> DateTime<Utc> {
    expires_at + duration
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn t0() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2026-08-01T00:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    #[test]
    fn test_active_lapses_after_expiry() {
        let expires = t0();
        let later = expires + Duration::seconds(1);
        assert_eq!(
            effective_status(SubscriptionStatus::Active, expires, later),
            SubscriptionStatus::Expired
        );
    }

    #[test]
    fn test_active_stays_active_before_expiry() {
        let expires = t0();
        let earlier = expires - Duration::hours(1);
        assert_eq!(
            effective_status(SubscriptionStatus::Active, expires, earlier),
            SubscriptionStatus::Active
        );
    }

    #[test]
    fn test_terminal_states_stay_terminal() {
        let expires = t0();
        let much_earlier = expires - Duration::days(30);

        // Even with an expiry in the future, terminal states never revive.
        assert_eq!(
            effective_status(SubscriptionStatus::Expired, expires, much_earlier),
            SubscriptionStatus::Expired
        );
        assert_eq!(
            effective_status(SubscriptionStatus::Inactive, expires, much_earlier),
            SubscriptionStatus::Inactive
        );
    }

    #[test]
    fn test_can_extend_only_active() {
        let id = SubscriptionId::new();
        assert!(can_extend(id, SubscriptionStatus::Active).is_ok());
        assert!(matches!(
            can_extend(id, SubscriptionStatus::Expired),
            Err(WalletError::SubscriptionNotActive(_))
        ));
        assert!(can_extend(id, SubscriptionStatus::Inactive).is_err());
    }

    #[test]
    fn test_validate_duration() {
        assert!(validate_duration(Duration::days(30)).is_ok());
        assert!(validate_duration(Duration::zero()).is_err());
        assert!(validate_duration(Duration::days(-1)).is_err());
    }

    #[test]
    fn test_extended_expiry() {
        let expires = t0();
        assert_eq!(
            extended_expiry(expires, Duration::days(30)),
            expires + Duration::days(30)
        );
    }

    fn status_strategy() -> impl Strategy<Value = SubscriptionStatus> {
        prop_oneof![
            Just(SubscriptionStatus::Active),
            Just(SubscriptionStatus::Expired),
            Just(SubscriptionStatus::Inactive),
        ]
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        /// Status recomputation never produces `active` from a terminal
        /// state, for any clock skew.
        #[test]
        fn prop_no_resurrection(
            status in status_strategy(),
            offset_secs in -86_400i64..86_400i64,
        ) {
            let expires = t0();
            let now = expires + Duration::seconds(offset_secs);
            let next = effective_status(status, expires, now);

            if status.is_terminal() {
                prop_assert_eq!(next, status);
            }
            if next == SubscriptionStatus::Active {
                prop_assert_eq!(status, SubscriptionStatus::Active);
            }
        }

        /// Recomputation is idempotent: applying it twice with the same
        /// clock gives the same state.
        #[test]
        fn prop_recompute_idempotent(
            status in status_strategy(),
            offset_secs in -86_400i64..86_400i64,
        ) {
            let expires = t0();
            let now = expires + Duration::seconds(offset_secs);
            let once = effective_status(status, expires, now);
            let twice = effective_status(once, expires, now);
            prop_assert_eq!(once, twice);
        }
    }
}
