//! Database layer with `SeaORM` entities and repositories.
//!
//! This crate provides:
//! - `SeaORM` entity definitions for balances, transactions, subscriptions
//! - Database migrations
//! - Repositories implementing the wallet's atomic units of work
//!
//! Every monetary operation runs inside one database transaction and takes
//! row-level locks (`SELECT ... FOR UPDATE`) on the balance rows it touches,
//! so concurrent debits against the same balance serialize instead of both
//! observing sufficient funds.

pub mod entities;
pub mod migration;
pub mod repositories;

pub use repositories::{
    BalanceRepository, JournalRepository, ReconciliationReport, SubscriptionRepository,
    TransferRecord, WalletRepository,
};

use sea_orm::{Database, DatabaseConnection, DbErr};

/// Establishes a connection to the database.
///
/// # Errors
///
/// Returns an error if the connection cannot be established.
pub async fn connect(database_url: &str) -> Result<DatabaseConnection, DbErr> {
    Database::connect(database_url).await
}
