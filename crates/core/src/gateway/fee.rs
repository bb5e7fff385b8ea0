//! Provider fee schedules.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use saldo_shared::types::Currency;

/// A provider's fee schedule: a percentage of the gross amount plus a flat
/// component, rounded to the currency's minor unit with banker's rounding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeSchedule {
    /// Percentage component (e.g. 2.9 for 2.9%).
    pub percent: Decimal,
    /// Flat component in major units of the charged currency.
    pub flat: Decimal,
}

/// Fee assessment for one amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeeBreakdown {
    /// The gross amount charged.
    pub gross: Decimal,
    /// The provider fee.
    pub fee: Decimal,
    /// The net amount after the fee.
    pub net: Decimal,
}

impl FeeSchedule {
    /// Creates a new fee schedule.
    #[must_use]
    pub const fn new(percent: Decimal, flat: Decimal) -> Self {
        Self { percent, flat }
    }

    /// A schedule with no fee.
    #[must_use]
    pub const fn free() -> Self {
        Self {
            percent: Decimal::ZERO,
            flat: Decimal::ZERO,
        }
    }

    /// Computes the fee for a gross amount. The result is clamped into
    /// `[0, gross]` so a misconfigured schedule can never produce a negative
    /// fee or a negative net amount.
    #[must_use]
    pub fn fee_for(&self, gross: Decimal, currency: Currency) -> Decimal {
        let raw = gross * self.percent / Decimal::ONE_HUNDRED + self.flat;
        currency.round(raw).clamp(Decimal::ZERO, gross)
    }

    /// Assesses a gross amount into gross/fee/net.
    #[must_use]
    pub fn assess(&self, gross: Decimal, currency: Currency) -> FeeBreakdown {
        let fee = self.fee_for(gross, currency);
        FeeBreakdown {
            gross,
            fee,
            net: gross - fee,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_fee_percent_plus_flat() {
        let schedule = FeeSchedule::new(dec!(2.9), dec!(0.30));
        assert_eq!(schedule.fee_for(dec!(100.00), Currency::Usd), dec!(3.20));
    }

    #[test]
    fn test_fee_rounds_to_minor_units() {
        let schedule = FeeSchedule::new(dec!(2.5), dec!(0));
        // 2.5% of 10.01 = 0.25025 -> 0.25
        assert_eq!(schedule.fee_for(dec!(10.01), Currency::Usd), dec!(0.25));
        // JPY has no subunits: 2.5% of 101 = 2.525 -> 2
        assert_eq!(schedule.fee_for(dec!(101), Currency::Jpy), dec!(3));
    }

    #[test]
    fn test_free_schedule() {
        let breakdown = FeeSchedule::free().assess(dec!(50.00), Currency::Eur);
        assert_eq!(breakdown.fee, Decimal::ZERO);
        assert_eq!(breakdown.net, dec!(50.00));
    }

    #[test]
    fn test_fee_clamped_to_gross() {
        // Flat fee larger than the amount: fee caps at gross, net at zero.
        let schedule = FeeSchedule::new(dec!(0), dec!(5.00));
        let breakdown = schedule.assess(dec!(2.00), Currency::Usd);
        assert_eq!(breakdown.fee, dec!(2.00));
        assert_eq!(breakdown.net, Decimal::ZERO);
    }

    fn amount_strategy() -> impl Strategy<Value = Decimal> {
        (1i64..10_000_000i64).prop_map(|n| Decimal::new(n, 2))
    }

    fn schedule_strategy() -> impl Strategy<Value = FeeSchedule> {
        ((0i64..1_000i64), (0i64..10_000i64))
            .prop_map(|(p, f)| FeeSchedule::new(Decimal::new(p, 2), Decimal::new(f, 2)))
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        /// For any schedule and gross amount, the fee stays within
        /// `[0, gross]` and gross == fee + net.
        #[test]
        fn prop_fee_bounded_and_conserved(
            gross in amount_strategy(),
            schedule in schedule_strategy(),
        ) {
            let breakdown = schedule.assess(gross, Currency::Usd);

            prop_assert!(breakdown.fee >= Decimal::ZERO);
            prop_assert!(breakdown.fee <= gross);
            prop_assert!(breakdown.net >= Decimal::ZERO);
            prop_assert_eq!(breakdown.gross, breakdown.fee + breakdown.net);
        }

        /// The fee never carries more precision than the currency allows.
        #[test]
        fn prop_fee_fits_minor_units(
            gross in amount_strategy(),
            schedule in schedule_strategy(),
        ) {
            let fee = schedule.fee_for(gross, Currency::Usd);
            prop_assert!(Currency::Usd.fits_minor_units(fee));
        }
    }
}
