//! Ledger store primitives: row-level reads, locks, and deltas.
//!
//! Mutations run only inside a database transaction that holds the balance
//! row lock; the orchestrating repository (`wallet.rs`) owns transaction
//! boundaries and lock ordering.

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseTransaction, EntityTrait, QueryFilter,
    QuerySelect, Set,
};

use saldo_core::wallet::{self, WalletError};
use saldo_shared::types::{Currency, UserId};

use crate::entities::balances;
use crate::repositories::map_db_err;

/// Repository for balance rows.
pub struct BalanceRepository;

impl BalanceRepository {
    /// Finds a balance row without locking it.
    pub async fn find<C: ConnectionTrait>(
        conn: &C,
        user_id: UserId,
        currency: Currency,
    ) -> Result<Option<balances::Model>, WalletError> {
        balances::Entity::find()
            .filter(balances::Column::UserId.eq(user_id.into_inner()))
            .filter(balances::Column::Currency.eq(currency.to_string()))
            .one(conn)
            .await
            .map_err(map_db_err)
    }

    /// Current spendable amount; 0 when no row exists.
    pub async fn balance_of<C: ConnectionTrait>(
        conn: &C,
        user_id: UserId,
        currency: Currency,
    ) -> Result<Decimal, WalletError> {
        Ok(Self::find(conn, user_id, currency)
            .await?
            .map_or(Decimal::ZERO, |row| row.amount))
    }

    /// Whether the user holds any balance row in any currency. Balances are
    /// created lazily on first credit, so this is the wallet's only notion
    /// of a user existing.
    pub async fn exists_for_user<C: ConnectionTrait>(
        conn: &C,
        user_id: UserId,
    ) -> Result<bool, WalletError> {
        let row = balances::Entity::find()
            .filter(balances::Column::UserId.eq(user_id.into_inner()))
            .limit(1)
            .one(conn)
            .await
            .map_err(map_db_err)?;
        Ok(row.is_some())
    }

    /// Takes the exclusive row lock (`SELECT ... FOR UPDATE`) on one balance
    /// row. Returns `None` when the row does not exist yet; inserting it is
    /// then race-guarded by the primary key.
    pub async fn lock(
        txn: &DatabaseTransaction,
        user_id: UserId,
        currency: Currency,
    ) -> Result<Option<balances::Model>, WalletError> {
        balances::Entity::find()
            .filter(balances::Column::UserId.eq(user_id.into_inner()))
            .filter(balances::Column::Currency.eq(currency.to_string()))
            .lock_exclusive()
            .one(txn)
            .await
            .map_err(map_db_err)
    }

    /// Credits a balance row under its lock, creating the row on first
    /// credit. Returns the new amount.
    pub async fn credit_locked(
        txn: &DatabaseTransaction,
        user_id: UserId,
        currency: Currency,
        amount: Decimal,
    ) -> Result<Decimal, WalletError> {
        let now = Utc::now().into();

        match Self::lock(txn, user_id, currency).await? {
            Some(row) => {
                let next = wallet::apply_credit(row.amount, amount)?;
                let mut active: balances::ActiveModel = row.into();
                active.amount = Set(next);
                active.updated_at = Set(now);
                active.update(txn).await.map_err(map_db_err)?;
                Ok(next)
            }
            None => {
                balances::ActiveModel {
                    user_id: Set(user_id.into_inner()),
                    currency: Set(currency.to_string()),
                    amount: Set(amount),
                    updated_at: Set(now),
                }
                .insert(txn)
                .await
                .map_err(map_db_err)?;
                Ok(amount)
            }
        }
    }

    /// Debits a balance row under its lock. Fails with `InsufficientFunds`
    /// (and leaves the row untouched) when the result would be negative.
    /// Returns the new amount.
    pub async fn debit_locked(
        txn: &DatabaseTransaction,
        user_id: UserId,
        currency: Currency,
        amount: Decimal,
    ) -> Result<Decimal, WalletError> {
        let Some(row) = Self::lock(txn, user_id, currency).await? else {
            return Err(WalletError::InsufficientFunds {
                available: Decimal::ZERO,
                requested: amount,
            });
        };

        let next = wallet::apply_debit(row.amount, amount)?;
        let mut active: balances::ActiveModel = row.into();
        active.amount = Set(next);
        active.updated_at = Set(Utc::now().into());
        active.update(txn).await.map_err(map_db_err)?;
        Ok(next)
    }
}
