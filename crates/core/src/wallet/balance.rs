//! Balance arithmetic with the no-negative invariant.
//!
//! Stored amounts change only through these functions, which the storage
//! layer calls while holding the balance row lock. A committed balance is
//! never negative.

use rust_decimal::Decimal;

use super::error::WalletError;

/// Applies a credit to a balance and returns the new amount.
///
/// The amount is assumed to be validated (`> 0`) before the storage layer
/// gets here.
///
/// # Errors
///
/// Returns `Internal` if the addition overflows `Decimal`'s range.
pub fn apply_credit(balance: Decimal, amount: Decimal) -> Result<Decimal, WalletError> {
    balance
        .checked_add(amount)
        .ok_or_else(|| WalletError::Internal(format!("balance overflow: {balance} + {amount}")))
}

/// Applies a debit to a balance and returns the new amount.
///
/// # Errors
///
/// Returns `InsufficientFunds` if the debit would drive the balance
/// negative; the input balance is untouched.
pub fn apply_debit(balance: Decimal, amount: Decimal) -> Result<Decimal, WalletError> {
    if amount > balance {
        return Err(WalletError::InsufficientFunds {
            available: balance,
            requested: amount,
        });
    }
    Ok(balance - amount)
}
