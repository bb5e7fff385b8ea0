//! Planning helpers for the atomic units executed by the storage layer.
//!
//! These functions are pure: they decide *what* an operation should do to
//! the ledger, while `saldo-db` decides *how* to apply it transactionally.

use rust_decimal::Decimal;

use saldo_shared::config::TopUpFeeMode;
use saldo_shared::types::{Currency, UserId};

use super::error::WalletError;
use crate::gateway::GatewayReceipt;

/// The ledger effect of a confirmed top-up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TopUpPlan {
    /// Amount to credit to the balance.
    pub credited: Decimal,
    /// Provider fee, recorded on the journal row.
    pub fee: Decimal,
}

/// The amount a top-up puts on the balance: gross in `record_only` mode,
/// gross minus fee in `deduct` mode.
#[must_use]
pub fn credited_amount(gross: Decimal, fee: Decimal, mode: TopUpFeeMode) -> Decimal {
    match mode {
        TopUpFeeMode::RecordOnly => gross,
        TopUpFeeMode::Deduct => gross - fee,
    }
}

/// Decides how much of a provider receipt lands on the balance, per the
/// configured fee policy.
///
/// # Errors
///
/// Returns `InvalidAmount` when `deduct` mode would credit nothing (the fee
/// consumed the entire amount).
pub fn plan_top_up(receipt: &GatewayReceipt, mode: TopUpFeeMode) -> Result<TopUpPlan, WalletError> {
    let credited = credited_amount(receipt.gross, receipt.fee, mode);

    if credited <= Decimal::ZERO {
        return Err(WalletError::InvalidAmount(credited));
    }

    Ok(TopUpPlan {
        credited,
        fee: receipt.fee,
    })
}

/// Orders two balance rows by their stable composite key (user id, then
/// currency). Every multi-row operation locks in this order, so two
/// transfers moving funds in opposite directions between the same pair of
/// accounts cannot deadlock.
#[must_use]
pub fn lock_order(
    a: (UserId, Currency),
    b: (UserId, Currency),
) -> ((UserId, Currency), (UserId, Currency)) {
    if a <= b { (a, b) } else { (b, a) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn receipt(gross: Decimal, fee: Decimal) -> GatewayReceipt {
        GatewayReceipt {
            reference: "ref".into(),
            gross,
            fee,
            net: gross - fee,
            currency: Currency::Usd,
        }
    }

    #[test]
    fn test_record_only_credits_gross() {
        let plan = plan_top_up(&receipt(dec!(100.00), dec!(3.20)), TopUpFeeMode::RecordOnly)
            .unwrap();
        assert_eq!(plan.credited, dec!(100.00));
        assert_eq!(plan.fee, dec!(3.20));
    }

    #[test]
    fn test_deduct_credits_net() {
        let plan =
            plan_top_up(&receipt(dec!(100.00), dec!(3.20)), TopUpFeeMode::Deduct).unwrap();
        assert_eq!(plan.credited, dec!(96.80));
        assert_eq!(plan.fee, dec!(3.20));
    }

    #[test]
    fn test_deduct_rejects_fee_eating_everything() {
        let result = plan_top_up(&receipt(dec!(0.30), dec!(0.30)), TopUpFeeMode::Deduct);
        assert!(matches!(result, Err(WalletError::InvalidAmount(_))));
    }

    #[tokio::test]
    async fn test_plan_composes_with_any_gateway() {
        use crate::gateway::{FeeSchedule, MockPaymentGateway, PaymentGateway};

        let mut gateway = MockPaymentGateway::new();
        gateway
            .expect_authorize_top_up()
            .returning(|amount, currency| {
                Ok(GatewayReceipt::from_schedule(
                    "ch_1".into(),
                    amount,
                    currency,
                    &FeeSchedule::new(dec!(2), dec!(0)),
                ))
            });

        let receipt = gateway
            .authorize_top_up(dec!(50.00), Currency::Usd)
            .await
            .unwrap();

        let plan = plan_top_up(&receipt, TopUpFeeMode::Deduct).unwrap();
        assert_eq!(plan.credited, dec!(49.00));
        assert_eq!(plan.fee, dec!(1.00));
    }

    #[test]
    fn test_lock_order_is_stable() {
        let a = (UserId::new(), Currency::Usd);
        let b = (UserId::new(), Currency::Usd);

        assert_eq!(lock_order(a, b), lock_order(b, a));
    }

    #[test]
    fn test_lock_order_orders_currencies_for_same_user() {
        let user = UserId::new();
        let usd = (user, Currency::Usd);
        let idr = (user, Currency::Idr);

        let (first, second) = lock_order(usd, idr);
        assert_eq!(lock_order(idr, usd), (first, second));
        assert!(first.1 <= second.1);
    }
}
