//! Wallet repository: the atomic units of work.
//!
//! Each public operation spans ledger and journal writes inside one
//! database transaction; either all writes commit or none do. Gateway calls
//! happen strictly outside row locks: before the transaction for top-ups,
//! after the funds are reserved for withdrawals.

use rust_decimal::Decimal;
use sea_orm::{DatabaseConnection, TransactionTrait};
use tracing::{info, warn};

use saldo_core::gateway::{GatewayFailure, GatewayResolver, PaymentGateway, SettlementStatus};
use saldo_core::wallet::{
    self, IdempotencyKey, TransactionDraft, TransactionStatus, TransactionType, WalletError,
};
use saldo_shared::config::BillingConfig;
use saldo_shared::types::{Currency, Money, PageRequest, PageResponse, TransactionId, UserId};

use crate::entities::{sea_orm_active_enums, transactions};
use crate::repositories::balance::BalanceRepository;
use crate::repositories::journal::JournalRepository;
use crate::repositories::map_db_err;

/// The two linked journal rows of one committed transfer.
#[derive(Debug, Clone)]
pub struct TransferRecord {
    /// Sender leg (`transfer_out`).
    pub outgoing: transactions::Model,
    /// Recipient leg (`transfer_in`).
    pub incoming: transactions::Model,
}

/// Outcome counts of one reconciliation sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconciliationReport {
    /// Stale pending transactions examined.
    pub examined: usize,
    /// Transactions the provider confirmed settled.
    pub completed: usize,
    /// Transactions the provider reported failed.
    pub failed: usize,
    /// Transactions left pending (provider still processing, unknown
    /// gateway, or status query failed).
    pub skipped: usize,
}

/// Repository orchestrating balance, journal, and gateway interactions.
#[derive(Clone)]
pub struct WalletRepository {
    db: DatabaseConnection,
    billing: BillingConfig,
}

impl WalletRepository {
    /// Creates a new wallet repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection, billing: BillingConfig) -> Self {
        Self { db, billing }
    }

    /// Current balance for one currency; `None` when the account has never
    /// held it. The HTTP layer maps `None` onto 404, other callers may
    /// treat it as zero.
    pub async fn balance(
        &self,
        user_id: UserId,
        currency: Currency,
    ) -> Result<Option<Money>, WalletError> {
        Ok(BalanceRepository::find(&self.db, user_id, currency)
            .await?
            .map(|row| Money::new(row.amount, currency)))
    }

    /// A user's journal, newest first.
    pub async fn transactions(
        &self,
        user_id: UserId,
        page: &PageRequest,
    ) -> Result<PageResponse<transactions::Model>, WalletError> {
        let (rows, total) = JournalRepository::list_for_user(&self.db, user_id, page).await?;
        Ok(PageResponse::new(rows, page.page, page.per_page, total))
    }

    /// Funds a balance from an external provider.
    ///
    /// The provider is called before any lock is taken. Replayed
    /// confirmations (same provider reference) return the original
    /// transaction without a second credit.
    pub async fn top_up(
        &self,
        user_id: UserId,
        amount: Decimal,
        currency: Currency,
        gateway: &dyn PaymentGateway,
    ) -> Result<transactions::Model, WalletError> {
        wallet::validate_amount(amount, currency)?;

        let receipt = match gateway.authorize_top_up(amount, currency).await {
            Ok(receipt) => receipt,
            Err(failure) => {
                self.record_topup_attempt(user_id, amount, currency, gateway.name(), &failure)
                    .await?;
                return Err(failure.into());
            }
        };

        let plan = wallet::plan_top_up(&receipt, self.billing.topup_fee_mode)?;
        let draft = TransactionDraft::topup(user_id, gateway.name(), &receipt);
        let Some(key) = draft.idempotency_key.clone() else {
            return Err(WalletError::Internal(
                "top-up draft missing idempotency key".to_string(),
            ));
        };

        let txn = self.db.begin().await.map_err(map_db_err)?;

        // The lookup shares the transaction with the write it guards; the
        // unique index on (type, key) settles concurrent retries.
        if let Some(existing) = JournalRepository::find_by_idempotency_key(
            &txn,
            sea_orm_active_enums::TransactionType::Topup,
            &key,
        )
        .await?
        {
            let status: TransactionStatus = existing.status.clone().into();
            if status.is_terminal() {
                txn.commit().await.map_err(map_db_err)?;
                info!(
                    transaction_id = %existing.id,
                    reference = %receipt.reference,
                    "replayed top-up confirmation; returning original transaction"
                );
                return Ok(existing);
            }

            // A pending row means an earlier attempt stopped before
            // settling; finish its work instead of duplicating it.
            BalanceRepository::credit_locked(&txn, user_id, currency, plan.credited).await?;
            let row = JournalRepository::complete(
                &txn,
                TransactionId::from_uuid(existing.id),
                Some(receipt.fee),
            )
            .await?;
            txn.commit().await.map_err(map_db_err)?;
            return Ok(row);
        }

        let row =
            match JournalRepository::record(&txn, &draft, TransactionStatus::Pending, None).await {
                Ok(row) => row,
                Err(WalletError::ConcurrentModification) => {
                    // Lost the insert race to a concurrent retry of the same
                    // confirmation; surface the winner's committed row.
                    drop(txn);
                    return self
                        .find_replayed(sea_orm_active_enums::TransactionType::Topup, &key)
                        .await;
                }
                Err(other) => return Err(other),
            };

        BalanceRepository::credit_locked(&txn, user_id, currency, plan.credited).await?;
        let row = JournalRepository::complete(&txn, TransactionId::from_uuid(row.id), None).await?;
        txn.commit().await.map_err(map_db_err)?;

        info!(
            user = %user_id,
            %amount,
            credited = %plan.credited,
            fee = %plan.fee,
            %currency,
            gateway = gateway.name(),
            transaction_id = %row.id,
            "top-up completed"
        );
        Ok(row)
    }

    /// Pays a balance out through an external provider.
    ///
    /// Funds are debited (reserved) in one transaction, then the provider
    /// is called with no lock held. A declined payout credits the amount
    /// back; a timed-out payout stays `pending` for reconciliation.
    pub async fn withdraw(
        &self,
        user_id: UserId,
        amount: Decimal,
        currency: Currency,
        gateway: &dyn PaymentGateway,
    ) -> Result<transactions::Model, WalletError> {
        wallet::validate_amount(amount, currency)?;

        let draft = TransactionDraft::withdrawal(user_id, amount, currency, gateway.name());
        let reference = draft.id.to_string();

        // Phase 1: reserve the funds.
        let txn = self.db.begin().await.map_err(map_db_err)?;
        let row = JournalRepository::record(&txn, &draft, TransactionStatus::Pending, None).await?;

        match BalanceRepository::debit_locked(&txn, user_id, currency, amount).await {
            Ok(_) => {
                txn.commit().await.map_err(map_db_err)?;
            }
            Err(err @ WalletError::InsufficientFunds { .. }) => {
                // Keep the journal row for audit: the debit never happened,
                // so only the failed row commits.
                JournalRepository::fail(&txn, TransactionId::from_uuid(row.id), "insufficient funds")
                    .await?;
                txn.commit().await.map_err(map_db_err)?;
                return Err(err);
            }
            Err(other) => return Err(other),
        }

        // Phase 2: provider payout, outside any row lock.
        match gateway.initiate_payout(amount, currency, &reference).await {
            Ok(receipt) => {
                let row = JournalRepository::complete(
                    &self.db,
                    TransactionId::from_uuid(row.id),
                    Some(receipt.fee),
                )
                .await?;
                info!(
                    user = %user_id,
                    %amount,
                    %currency,
                    gateway = gateway.name(),
                    transaction_id = %row.id,
                    "withdrawal completed"
                );
                Ok(row)
            }
            Err(GatewayFailure::Timeout) => {
                // Never settle on a timed-out call; reconciliation asks the
                // provider later. The reserved funds stay reserved.
                warn!(
                    transaction_id = %row.id,
                    gateway = gateway.name(),
                    "payout timed out; leaving transaction pending for reconciliation"
                );
                Err(WalletError::Gateway(GatewayFailure::Timeout))
            }
            Err(failure) => {
                // Compensating credit: reverse the reserved debit and fail
                // the journal row in one unit. The row lock keeps a racing
                // reconciler from compensating the same payout twice.
                let txn = self.db.begin().await.map_err(map_db_err)?;
                if JournalRepository::lock_pending(&txn, TransactionId::from_uuid(row.id))
                    .await?
                    .is_some()
                {
                    BalanceRepository::credit_locked(&txn, user_id, currency, amount).await?;
                    JournalRepository::fail(
                        &txn,
                        TransactionId::from_uuid(row.id),
                        &failure.to_string(),
                    )
                    .await?;
                    txn.commit().await.map_err(map_db_err)?;
                }

                warn!(
                    transaction_id = %row.id,
                    gateway = gateway.name(),
                    %failure,
                    "payout failed; debit compensated"
                );
                Err(failure.into())
            }
        }
    }

    /// Moves funds between two users as one atomic unit: debit, credit, and
    /// two linked journal rows commit together or not at all.
    pub async fn transfer(
        &self,
        sender: UserId,
        recipient: UserId,
        amount: Decimal,
        currency: Currency,
    ) -> Result<TransferRecord, WalletError> {
        wallet::validate_amount(amount, currency)?;
        wallet::validate_transfer_parties(sender, recipient)?;

        let txn = self.db.begin().await.map_err(map_db_err)?;

        if !BalanceRepository::exists_for_user(&txn, recipient).await? {
            return Err(WalletError::RecipientNotFound(recipient));
        }

        // Both rows lock in ascending (user, currency) order so two
        // opposite transfers between the same accounts cannot deadlock.
        let (first, second) = wallet::lock_order((sender, currency), (recipient, currency));
        let _ = BalanceRepository::lock(&txn, first.0, first.1).await?;
        let _ = BalanceRepository::lock(&txn, second.0, second.1).await?;

        BalanceRepository::debit_locked(&txn, sender, currency, amount).await?;
        BalanceRepository::credit_locked(&txn, recipient, currency, amount).await?;

        let (out_draft, in_draft) =
            TransactionDraft::transfer_pair(sender, recipient, amount, currency);
        let out_row =
            JournalRepository::record(&txn, &out_draft, TransactionStatus::Pending, None).await?;
        let in_row =
            JournalRepository::record(&txn, &in_draft, TransactionStatus::Pending, None).await?;
        let outgoing =
            JournalRepository::complete(&txn, TransactionId::from_uuid(out_row.id), None).await?;
        let incoming =
            JournalRepository::complete(&txn, TransactionId::from_uuid(in_row.id), None).await?;

        txn.commit().await.map_err(map_db_err)?;

        info!(
            sender = %sender,
            recipient = %recipient,
            %amount,
            %currency,
            correlation_id = ?outgoing.correlation_id,
            "transfer completed"
        );
        Ok(TransferRecord { outgoing, incoming })
    }

    /// Debits a balance for a one-off purchase and journals it. Invoked by
    /// the surrounding platform's checkout flow.
    pub async fn purchase(
        &self,
        user_id: UserId,
        amount: Decimal,
        currency: Currency,
    ) -> Result<transactions::Model, WalletError> {
        wallet::validate_amount(amount, currency)?;

        let draft = TransactionDraft::purchase(user_id, amount, currency);

        let txn = self.db.begin().await.map_err(map_db_err)?;
        let row = JournalRepository::record(&txn, &draft, TransactionStatus::Pending, None).await?;
        BalanceRepository::debit_locked(&txn, user_id, currency, amount).await?;
        let row = JournalRepository::complete(&txn, TransactionId::from_uuid(row.id), None).await?;
        txn.commit().await.map_err(map_db_err)?;

        info!(user = %user_id, %amount, %currency, transaction_id = %row.id, "purchase completed");
        Ok(row)
    }

    /// Re-checks gateway transactions stuck in `pending` against the
    /// provider's own status query and settles them accordingly.
    ///
    /// Safe to run repeatedly and concurrently: each settlement re-locks
    /// the journal row inside its own transaction and terminal rows are
    /// no-ops.
    pub async fn reconcile_pending(
        &self,
        gateways: &dyn GatewayResolver,
    ) -> Result<ReconciliationReport, WalletError> {
        let cutoff =
            chrono::Utc::now() - chrono::Duration::minutes(self.billing.reconcile_after_minutes);
        let stale = JournalRepository::find_stale_pending(&self.db, cutoff).await?;

        let mut report = ReconciliationReport {
            examined: stale.len(),
            ..ReconciliationReport::default()
        };

        for row in stale {
            match self.reconcile_one(gateways, &row).await {
                Ok(Some(SettlementStatus::Settled)) => report.completed += 1,
                Ok(Some(SettlementStatus::Failed)) => report.failed += 1,
                Ok(Some(SettlementStatus::Pending) | None) => report.skipped += 1,
                Err(err) => {
                    warn!(transaction_id = %row.id, %err, "reconciliation step failed");
                    report.skipped += 1;
                }
            }
        }

        info!(
            examined = report.examined,
            completed = report.completed,
            failed = report.failed,
            skipped = report.skipped,
            "reconciliation sweep finished"
        );
        Ok(report)
    }

    /// Reconciles one stale transaction. Returns the provider's verdict, or
    /// `None` when the row cannot be checked (no reference or unknown
    /// gateway).
    async fn reconcile_one(
        &self,
        gateways: &dyn GatewayResolver,
        row: &transactions::Model,
    ) -> Result<Option<SettlementStatus>, WalletError> {
        let (Some(gateway_name), Some(reference)) = (&row.gateway, &row.gateway_reference) else {
            warn!(transaction_id = %row.id, "pending gateway transaction without reference");
            return Ok(None);
        };

        let gateway = match gateways.resolve(gateway_name) {
            Ok(gateway) => gateway,
            Err(err) => {
                warn!(transaction_id = %row.id, gateway = %gateway_name, %err, "cannot reconcile");
                return Ok(None);
            }
        };

        let verdict = gateway.query_status(reference).await?;
        let id = TransactionId::from_uuid(row.id);
        let user_id = UserId::from_uuid(row.user_id);
        let currency = wallet::parse_currency(&row.currency)?;
        let tx_type: TransactionType = row.tx_type.clone().into();

        match (tx_type, verdict) {
            // Top-up settled but never credited: apply the missing credit.
            (TransactionType::Topup, SettlementStatus::Settled) => {
                let credited = wallet::credited_amount(
                    row.amount,
                    row.fee.unwrap_or_default(),
                    self.billing.topup_fee_mode,
                );
                let txn = self.db.begin().await.map_err(map_db_err)?;
                if JournalRepository::lock_pending(&txn, id).await?.is_some() {
                    BalanceRepository::credit_locked(&txn, user_id, currency, credited).await?;
                    JournalRepository::complete(&txn, id, None).await?;
                    txn.commit().await.map_err(map_db_err)?;
                }
            }
            // Withdrawal settled: the debit already happened, just close.
            (TransactionType::Withdrawal, SettlementStatus::Settled) => {
                JournalRepository::complete(&self.db, id, None).await?;
            }
            // Top-up failed before any credit: just close.
            (TransactionType::Topup, SettlementStatus::Failed) => {
                JournalRepository::fail(&self.db, id, "provider reported failure").await?;
            }
            // Withdrawal failed after the debit: compensate and close.
            (TransactionType::Withdrawal, SettlementStatus::Failed) => {
                let txn = self.db.begin().await.map_err(map_db_err)?;
                if JournalRepository::lock_pending(&txn, id).await?.is_some() {
                    BalanceRepository::credit_locked(&txn, user_id, currency, row.amount).await?;
                    JournalRepository::fail(&txn, id, "provider reported failure").await?;
                    txn.commit().await.map_err(map_db_err)?;
                }
            }
            (_, SettlementStatus::Pending) => {}
            (other, verdict) => {
                warn!(transaction_id = %row.id, tx_type = ?other, verdict = ?verdict, "unexpected reconciliation combination");
                return Ok(None);
            }
        }

        Ok(Some(verdict))
    }

    /// Records the audit row for a top-up the provider rejected or lost.
    async fn record_topup_attempt(
        &self,
        user_id: UserId,
        amount: Decimal,
        currency: Currency,
        gateway_name: &str,
        failure: &GatewayFailure,
    ) -> Result<(), WalletError> {
        let draft = TransactionDraft::topup_attempt(user_id, amount, currency, gateway_name);

        // A timed-out authorization may still have happened on the provider
        // side, so it stays pending rather than failed.
        let (status, reason) = match failure {
            GatewayFailure::Timeout => (TransactionStatus::Pending, None),
            other => (TransactionStatus::Failed, Some(other.to_string())),
        };

        JournalRepository::record(&self.db, &draft, status, reason.as_deref()).await?;
        warn!(
            user = %user_id,
            %amount,
            %currency,
            gateway = gateway_name,
            %failure,
            "top-up attempt did not settle"
        );
        Ok(())
    }

    /// After losing an idempotent-insert race, surfaces the winner's row.
    async fn find_replayed(
        &self,
        tx_type: sea_orm_active_enums::TransactionType,
        key: &IdempotencyKey,
    ) -> Result<transactions::Model, WalletError> {
        match JournalRepository::find_by_idempotency_key(&self.db, tx_type, key).await? {
            Some(row) => Ok(row),
            None => Err(WalletError::ConcurrentModification),
        }
    }
}
