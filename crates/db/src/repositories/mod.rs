//! Repository abstractions for data access.
//!
//! Repositories provide a clean interface for database operations,
//! hiding the `SeaORM` implementation details from the rest of the
//! application. The wallet and subscription repositories own transaction
//! boundaries; balance and journal repositories are their building blocks.

pub mod balance;
pub mod journal;
pub mod subscription;
pub mod wallet;

pub use balance::BalanceRepository;
pub use journal::JournalRepository;
pub use subscription::{effective_status_of, SubscriptionRepository};
pub use wallet::{ReconciliationReport, TransferRecord, WalletRepository};

use saldo_core::wallet::WalletError;
use sea_orm::{DbErr, SqlErr};

/// Maps database errors onto the domain taxonomy. Unique violations become
/// `ConcurrentModification` so idempotent-insert races are retryable and
/// resolvable instead of opaque 500s.
pub(crate) fn map_db_err(err: DbErr) -> WalletError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => WalletError::ConcurrentModification,
        _ => WalletError::Database(err.to_string()),
    }
}
