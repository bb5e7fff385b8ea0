//! Input validation for monetary operations.
//!
//! Validation runs before any ledger or journal work starts, so a rejected
//! request has no side effects at all.

use std::str::FromStr;

use rust_decimal::Decimal;

use saldo_shared::types::{Currency, UserId};

use super::error::WalletError;

/// Parses an external currency code, failing closed on anything that is not
/// a supported 3-letter ISO 4217 code.
///
/// # Errors
///
/// Returns `InvalidCurrency` for unknown or malformed codes.
pub fn parse_currency(code: &str) -> Result<Currency, WalletError> {
    Currency::from_str(code).map_err(|_| WalletError::InvalidCurrency(code.to_string()))
}

/// Validates an operation amount: strictly positive and no finer than the
/// currency's minor unit.
///
/// # Errors
///
/// Returns `InvalidAmount` otherwise.
pub fn validate_amount(amount: Decimal, currency: Currency) -> Result<(), WalletError> {
    if amount <= Decimal::ZERO || !currency.fits_minor_units(amount) {
        return Err(WalletError::InvalidAmount(amount));
    }
    Ok(())
}

/// Validates the two parties of a transfer.
///
/// # Errors
///
/// Returns `SameAccount` when sender and recipient are the same user.
pub fn validate_transfer_parties(sender: UserId, recipient: UserId) -> Result<(), WalletError> {
    if sender == recipient {
        return Err(WalletError::SameAccount);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use rust_decimal_macros::dec;

    #[test]
    fn test_parse_known_currency() {
        assert_eq!(parse_currency("USD").unwrap(), Currency::Usd);
        assert_eq!(parse_currency("idr").unwrap(), Currency::Idr);
    }

    #[rstest]
    #[case("XXX")]
    #[case("US")]
    #[case("USDT")]
    #[case("")]
    #[case("???")]
    fn test_parse_unknown_currency_fails(#[case] code: &str) {
        assert!(matches!(
            parse_currency(code),
            Err(WalletError::InvalidCurrency(_))
        ));
    }

    #[rstest]
    #[case(dec!(0.01), Currency::Usd, true)]
    #[case(dec!(100), Currency::Usd, true)]
    #[case(dec!(0), Currency::Usd, false)]
    #[case(dec!(-5), Currency::Usd, false)]
    #[case(dec!(1.999), Currency::Usd, false)]
    #[case(dec!(100), Currency::Jpy, true)]
    #[case(dec!(100.5), Currency::Jpy, false)]
    fn test_validate_amount(
        #[case] amount: Decimal,
        #[case] currency: Currency,
        #[case] ok: bool,
    ) {
        assert_eq!(validate_amount(amount, currency).is_ok(), ok);
    }

    #[test]
    fn test_transfer_parties() {
        let a = UserId::new();
        let b = UserId::new();
        assert!(validate_transfer_parties(a, b).is_ok());
        assert!(matches!(
            validate_transfer_parties(a, a),
            Err(WalletError::SameAccount)
        ));
    }
}
