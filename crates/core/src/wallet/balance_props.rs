//! Property tests for balance arithmetic.

use proptest::prelude::*;
use rust_decimal::Decimal;

use super::balance::{apply_credit, apply_debit};

/// Strategy for positive operation amounts (0.01 .. 100,000.00).
fn amount_strategy() -> impl Strategy<Value = Decimal> {
    (1i64..10_000_000i64).prop_map(|n| Decimal::new(n, 2))
}

/// Strategy for a starting balance (0 .. 100,000.00).
fn balance_strategy() -> impl Strategy<Value = Decimal> {
    (0i64..10_000_000i64).prop_map(|n| Decimal::new(n, 2))
}

/// One step of a randomized operation sequence.
#[derive(Debug, Clone, Copy)]
enum Op {
    Credit(Decimal),
    Debit(Decimal),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        amount_strategy().prop_map(Op::Credit),
        amount_strategy().prop_map(Op::Debit),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// For any sequence of credits and debits, the balance never goes
    /// negative: debits that would overdraw fail and leave it unchanged.
    #[test]
    fn prop_balance_never_negative(
        start in balance_strategy(),
        ops in prop::collection::vec(op_strategy(), 1..50),
    ) {
        let mut balance = start;

        for op in ops {
            match op {
                Op::Credit(amount) => balance = apply_credit(balance, amount).unwrap(),
                Op::Debit(amount) => {
                    match apply_debit(balance, amount) {
                        Ok(next) => balance = next,
                        Err(_) => {
                            // Rejected debit must not have moved the balance.
                            prop_assert!(amount > balance);
                        }
                    }
                }
            }
            prop_assert!(balance >= Decimal::ZERO);
        }
    }

    /// A successful debit on one side and credit on the other conserves the
    /// total across the two balances.
    #[test]
    fn prop_transfer_conserves_total(
        sender in balance_strategy(),
        recipient in balance_strategy(),
        amount in amount_strategy(),
    ) {
        prop_assume!(amount <= sender);

        let sender_after = apply_debit(sender, amount).unwrap();
        let recipient_after = apply_credit(recipient, amount).unwrap();

        prop_assert_eq!(sender + recipient, sender_after + recipient_after);
    }

    /// Credit then equal debit is the identity.
    #[test]
    fn prop_credit_debit_roundtrip(
        start in balance_strategy(),
        amount in amount_strategy(),
    ) {
        let credited = apply_credit(start, amount).unwrap();
        let back = apply_debit(credited, amount).unwrap();
        prop_assert_eq!(back, start);
    }

    /// A failed debit is observationally free: the returned error carries
    /// the untouched balance.
    #[test]
    fn prop_failed_debit_reports_available(
        start in balance_strategy(),
        amount in amount_strategy(),
    ) {
        prop_assume!(amount > start);

        match apply_debit(start, amount) {
            Err(super::error::WalletError::InsufficientFunds { available, requested }) => {
                prop_assert_eq!(available, start);
                prop_assert_eq!(requested, amount);
            }
            other => prop_assert!(false, "expected InsufficientFunds, got {other:?}"),
        }
    }
}
