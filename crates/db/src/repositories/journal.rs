//! Transaction journal repository.
//!
//! The journal is append-only: rows are inserted, move `pending` to one
//! terminal state, and are never deleted. Terminal transitions are
//! idempotent no-ops, so at-least-once delivery of gateway confirmations is
//! safe.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};
use tracing::warn;

use saldo_core::wallet::{IdempotencyKey, TransactionDraft, TransactionStatus, WalletError};
use saldo_shared::types::{CorrelationId, PageRequest, TransactionId, UserId};

use crate::entities::{sea_orm_active_enums, transactions};
use crate::repositories::map_db_err;

/// Repository for journal rows.
pub struct JournalRepository;

impl JournalRepository {
    /// Persists a draft with the given initial status.
    ///
    /// Normal flows record `pending`; gateway attempts that already failed
    /// are recorded `failed` directly so the audit trail keeps them.
    pub async fn record<C: ConnectionTrait>(
        conn: &C,
        draft: &TransactionDraft,
        status: TransactionStatus,
        failure_reason: Option<&str>,
    ) -> Result<transactions::Model, WalletError> {
        let now = Utc::now().into();

        transactions::ActiveModel {
            id: Set(draft.id.into_inner()),
            user_id: Set(draft.user_id.into_inner()),
            tx_type: Set(draft.tx_type.into()),
            amount: Set(draft.amount),
            currency: Set(draft.currency.to_string()),
            status: Set(status.into()),
            gateway: Set(draft.gateway.clone()),
            gateway_reference: Set(draft.gateway_reference.clone()),
            idempotency_key: Set(draft
                .idempotency_key
                .as_ref()
                .map(|key| key.as_str().to_string())),
            fee: Set(draft.fee),
            counterparty_id: Set(draft.counterparty_id.map(UserId::into_inner)),
            correlation_id: Set(draft.correlation_id.map(CorrelationId::into_inner)),
            failure_reason: Set(failure_reason.map(str::to_string)),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(conn)
        .await
        .map_err(map_db_err)
    }

    /// Finds a journal row by id.
    pub async fn find_by_id<C: ConnectionTrait>(
        conn: &C,
        id: TransactionId,
    ) -> Result<Option<transactions::Model>, WalletError> {
        transactions::Entity::find_by_id(id.into_inner())
            .one(conn)
            .await
            .map_err(map_db_err)
    }

    /// Looks up a prior transaction by (type, idempotency key), taking the
    /// row lock when a row exists. Runs inside the same database
    /// transaction as the write it guards; the partial unique index closes
    /// the remaining race between concurrent retries that both find
    /// nothing.
    pub async fn find_by_idempotency_key<C: ConnectionTrait>(
        conn: &C,
        tx_type: sea_orm_active_enums::TransactionType,
        key: &IdempotencyKey,
    ) -> Result<Option<transactions::Model>, WalletError> {
        transactions::Entity::find()
            .filter(transactions::Column::TxType.eq(tx_type))
            .filter(transactions::Column::IdempotencyKey.eq(key.as_str()))
            .lock_exclusive()
            .one(conn)
            .await
            .map_err(map_db_err)
    }

    /// Locks a journal row and returns it only while still `pending`.
    ///
    /// Settlement paths that move money (compensations, reconciliation
    /// credits) go through this so two settlers cannot both apply the same
    /// effect: the second one blocks on the lock, then sees a terminal row.
    pub async fn lock_pending(
        txn: &sea_orm::DatabaseTransaction,
        id: TransactionId,
    ) -> Result<Option<transactions::Model>, WalletError> {
        let row = transactions::Entity::find_by_id(id.into_inner())
            .lock_exclusive()
            .one(txn)
            .await
            .map_err(map_db_err)?;

        Ok(row.filter(|row| {
            let status: TransactionStatus = row.status.clone().into();
            !status.is_terminal()
        }))
    }

    /// Marks a transaction `completed`, optionally recording the provider
    /// fee learned at settlement time. Already-terminal rows are left
    /// untouched (logged no-op).
    pub async fn complete<C: ConnectionTrait>(
        conn: &C,
        id: TransactionId,
        fee: Option<Decimal>,
    ) -> Result<transactions::Model, WalletError> {
        Self::transition(conn, id, TransactionStatus::Completed, fee, None).await
    }

    /// Marks a transaction `failed` with a reason. Already-terminal rows
    /// are left untouched (logged no-op).
    pub async fn fail<C: ConnectionTrait>(
        conn: &C,
        id: TransactionId,
        reason: &str,
    ) -> Result<transactions::Model, WalletError> {
        Self::transition(conn, id, TransactionStatus::Failed, None, Some(reason)).await
    }

    async fn transition<C: ConnectionTrait>(
        conn: &C,
        id: TransactionId,
        to: TransactionStatus,
        fee: Option<Decimal>,
        failure_reason: Option<&str>,
    ) -> Result<transactions::Model, WalletError> {
        let row = Self::find_by_id(conn, id)
            .await?
            .ok_or(WalletError::TransactionNotFound(id))?;

        let current: TransactionStatus = row.status.clone().into();
        if current.is_terminal() {
            warn!(
                transaction_id = %id,
                current = ?current,
                requested = ?to,
                "ignoring transition on terminal transaction"
            );
            return Ok(row);
        }

        let mut active: transactions::ActiveModel = row.into();
        active.status = Set(to.into());
        if let Some(fee) = fee {
            active.fee = Set(Some(fee));
        }
        if let Some(reason) = failure_reason {
            active.failure_reason = Set(Some(reason.to_string()));
        }
        active.updated_at = Set(Utc::now().into());
        active.update(conn).await.map_err(map_db_err)
    }

    /// Gateway-backed transactions still `pending` past the cutoff; input
    /// for reconciliation.
    pub async fn find_stale_pending<C: ConnectionTrait>(
        conn: &C,
        cutoff: DateTime<Utc>,
    ) -> Result<Vec<transactions::Model>, WalletError> {
        transactions::Entity::find()
            .filter(transactions::Column::Status.eq(sea_orm_active_enums::TransactionStatus::Pending))
            .filter(transactions::Column::Gateway.is_not_null())
            .filter(transactions::Column::CreatedAt.lt(cutoff))
            .order_by_asc(transactions::Column::CreatedAt)
            .all(conn)
            .await
            .map_err(map_db_err)
    }

    /// Lists a user's journal, newest first, with the total row count.
    pub async fn list_for_user<C: ConnectionTrait>(
        conn: &C,
        user_id: UserId,
        page: &PageRequest,
    ) -> Result<(Vec<transactions::Model>, u64), WalletError> {
        let query = transactions::Entity::find()
            .filter(transactions::Column::UserId.eq(user_id.into_inner()));

        let total = query.clone().count(conn).await.map_err(map_db_err)?;

        let rows = query
            .order_by_desc(transactions::Column::CreatedAt)
            .order_by_desc(transactions::Column::Id)
            .offset(page.offset())
            .limit(page.limit())
            .all(conn)
            .await
            .map_err(map_db_err)?;

        Ok((rows, total))
    }
}
