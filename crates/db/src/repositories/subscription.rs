//! Subscription repository: billing state machine over the ledger.
//!
//! Creating a subscription debits the ledger and journals a
//! `subscription_charge` in the same database transaction; if the debit
//! fails, nothing is created. Status is recomputed lazily on read, so no
//! background scheduler is required (one may still drive the same
//! functions).

use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, EntityTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use tracing::info;

use saldo_core::subscription::{self, SubscriptionStatus};
use saldo_core::wallet::{self, TransactionDraft, TransactionStatus, WalletError};
use saldo_shared::types::{Currency, SubscriptionId, TransactionId, UserId};

use crate::entities::{sea_orm_active_enums, subscriptions};
use crate::repositories::balance::BalanceRepository;
use crate::repositories::journal::JournalRepository;
use crate::repositories::map_db_err;

/// Repository for subscriptions.
#[derive(Clone)]
pub struct SubscriptionRepository {
    db: DatabaseConnection,
}

impl SubscriptionRepository {
    /// Creates a new subscription repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Purchases a subscription: debits the ledger, journals the charge,
    /// and creates the `active` row, all in one transaction.
    ///
    /// An unexpired active subscription rejects the purchase; an expired
    /// one is lapsed first.
    pub async fn create(
        &self,
        user_id: UserId,
        plan: &str,
        amount: Decimal,
        currency: Currency,
        duration: Duration,
    ) -> Result<subscriptions::Model, WalletError> {
        wallet::validate_amount(amount, currency)?;
        subscription::validate_duration(duration)?;

        let now = Utc::now();
        let txn = self.db.begin().await.map_err(map_db_err)?;

        if let Some(active) = Self::find_active_locked(&txn, user_id).await? {
            let effective = subscription::effective_status(
                SubscriptionStatus::Active,
                active.expires_at.to_utc(),
                now,
            );
            if effective == SubscriptionStatus::Active {
                return Err(WalletError::SubscriptionActive(SubscriptionId::from_uuid(
                    active.id,
                )));
            }
            Self::lapse(&txn, active).await?;
        }

        // The charge and the subscription stand or fall together.
        let draft = TransactionDraft::subscription_charge(user_id, amount, currency);
        let charge =
            JournalRepository::record(&txn, &draft, TransactionStatus::Pending, None).await?;
        BalanceRepository::debit_locked(&txn, user_id, currency, amount).await?;
        let charge =
            JournalRepository::complete(&txn, TransactionId::from_uuid(charge.id), None).await?;

        let model = subscriptions::ActiveModel {
            id: Set(SubscriptionId::new().into_inner()),
            user_id: Set(user_id.into_inner()),
            plan: Set(plan.to_string()),
            status: Set(sea_orm_active_enums::SubscriptionStatus::Active),
            amount: Set(amount),
            currency: Set(currency.to_string()),
            started_at: Set(now.into()),
            expires_at: Set((now + duration).into()),
            charge_transaction_id: Set(charge.id),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        }
        .insert(&txn)
        .await
        .map_err(map_db_err)?;

        txn.commit().await.map_err(map_db_err)?;

        info!(
            user = %user_id,
            plan,
            %amount,
            %currency,
            subscription_id = %model.id,
            expires_at = %model.expires_at,
            "subscription created"
        );
        Ok(model)
    }

    /// Pushes an active subscription's expiry forward. Never re-debits:
    /// charging is a separate step composed by the caller.
    pub async fn extend(
        &self,
        subscription_id: SubscriptionId,
        duration: Duration,
    ) -> Result<subscriptions::Model, WalletError> {
        subscription::validate_duration(duration)?;

        let now = Utc::now();
        let txn = self.db.begin().await.map_err(map_db_err)?;

        let row = subscriptions::Entity::find_by_id(subscription_id.into_inner())
            .lock_exclusive()
            .one(&txn)
            .await
            .map_err(map_db_err)?
            .ok_or(WalletError::SubscriptionNotFound(subscription_id))?;

        let stored: SubscriptionStatus = row.status.clone().into();
        let effective = subscription::effective_status(stored, row.expires_at.to_utc(), now);

        if stored == SubscriptionStatus::Active && effective == SubscriptionStatus::Expired {
            // The lapse is persisted even though the caller asked to extend.
            Self::lapse(&txn, row).await?;
            txn.commit().await.map_err(map_db_err)?;
            return Err(WalletError::SubscriptionNotActive(subscription_id));
        }
        subscription::can_extend(subscription_id, effective)?;

        let next_expiry = subscription::extended_expiry(row.expires_at.to_utc(), duration);
        let mut active: subscriptions::ActiveModel = row.into();
        active.expires_at = Set(next_expiry.into());
        active.updated_at = Set(now.into());
        let updated = active.update(&txn).await.map_err(map_db_err)?;

        txn.commit().await.map_err(map_db_err)?;

        info!(
            subscription_id = %subscription_id,
            expires_at = %updated.expires_at,
            "subscription extended"
        );
        Ok(updated)
    }

    /// Idempotent lazy lapse: transitions the user's active subscription to
    /// `expired` once its expiry has passed. Returns the user's current
    /// subscription, if any.
    pub async fn check_and_update_status(
        &self,
        user_id: UserId,
    ) -> Result<Option<subscriptions::Model>, WalletError> {
        let now = Utc::now();
        let txn = self.db.begin().await.map_err(map_db_err)?;

        let Some(row) = Self::find_active_locked(&txn, user_id).await? else {
            // Nothing active; report the most recent subscription instead.
            return Self::find_latest(&self.db, user_id).await;
        };

        let effective = subscription::effective_status(
            SubscriptionStatus::Active,
            row.expires_at.to_utc(),
            now,
        );
        if effective == SubscriptionStatus::Active {
            return Ok(Some(row));
        }

        let lapsed = Self::lapse(&txn, row).await?;
        txn.commit().await.map_err(map_db_err)?;
        Ok(Some(lapsed))
    }

    /// Finds a subscription by id.
    pub async fn find_by_id(
        &self,
        subscription_id: SubscriptionId,
    ) -> Result<Option<subscriptions::Model>, WalletError> {
        subscriptions::Entity::find_by_id(subscription_id.into_inner())
            .one(&self.db)
            .await
            .map_err(map_db_err)
    }

    /// Finds and locks the user's active subscription.
    async fn find_active_locked(
        txn: &DatabaseTransaction,
        user_id: UserId,
    ) -> Result<Option<subscriptions::Model>, WalletError> {
        subscriptions::Entity::find()
            .filter(subscriptions::Column::UserId.eq(user_id.into_inner()))
            .filter(
                subscriptions::Column::Status
                    .eq(sea_orm_active_enums::SubscriptionStatus::Active),
            )
            .lock_exclusive()
            .one(txn)
            .await
            .map_err(map_db_err)
    }

    /// Most recent subscription for a user, regardless of status.
    async fn find_latest(
        db: &DatabaseConnection,
        user_id: UserId,
    ) -> Result<Option<subscriptions::Model>, WalletError> {
        subscriptions::Entity::find()
            .filter(subscriptions::Column::UserId.eq(user_id.into_inner()))
            .order_by_desc(subscriptions::Column::CreatedAt)
            .one(db)
            .await
            .map_err(map_db_err)
    }

    async fn lapse(
        txn: &DatabaseTransaction,
        row: subscriptions::Model,
    ) -> Result<subscriptions::Model, WalletError> {
        let id = row.id;
        let mut active: subscriptions::ActiveModel = row.into();
        active.status = Set(sea_orm_active_enums::SubscriptionStatus::Expired);
        active.updated_at = Set(Utc::now().into());
        let lapsed = active.update(txn).await.map_err(map_db_err)?;
        info!(subscription_id = %id, "subscription lapsed");
        Ok(lapsed)
    }
}

/// Maps a stored subscription row to its lazily recomputed status without
/// persisting the change; used by read paths that must not write.
#[must_use]
pub fn effective_status_of(row: &subscriptions::Model) -> SubscriptionStatus {
    let stored: SubscriptionStatus = row.status.clone().into();
    subscription::effective_status(stored, row.expires_at.to_utc(), Utc::now())
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_effective_status_of_lapses_overdue_rows() {
        let now = Utc::now();
        let row = subscriptions::Model {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            plan: "premium".to_string(),
            status: sea_orm_active_enums::SubscriptionStatus::Active,
            amount: Decimal::new(999, 2),
            currency: "USD".to_string(),
            started_at: (now - Duration::days(31)).into(),
            expires_at: (now - Duration::days(1)).into(),
            charge_transaction_id: Uuid::new_v4(),
            created_at: (now - Duration::days(31)).into(),
            updated_at: (now - Duration::days(31)).into(),
        };

        assert_eq!(effective_status_of(&row), SubscriptionStatus::Expired);
    }

    #[test]
    fn test_effective_status_of_keeps_terminal_rows() {
        let now = Utc::now();
        let row = subscriptions::Model {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            plan: "premium".to_string(),
            status: sea_orm_active_enums::SubscriptionStatus::Inactive,
            amount: Decimal::new(999, 2),
            currency: "USD".to_string(),
            started_at: (now - Duration::days(1)).into(),
            expires_at: (now + Duration::days(30)).into(),
            charge_transaction_id: Uuid::new_v4(),
            created_at: (now - Duration::days(1)).into(),
            updated_at: (now - Duration::days(1)).into(),
        };

        assert_eq!(effective_status_of(&row), SubscriptionStatus::Inactive);
    }
}
