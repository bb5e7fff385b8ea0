//! Database enum types and their mappings onto the domain enums.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Kind of a journal transaction, as stored in Postgres.
#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "transaction_type")]
pub enum TransactionType {
    /// External funding credited to the ledger.
    #[sea_orm(string_value = "topup")]
    Topup,
    /// External payout debited from the ledger.
    #[sea_orm(string_value = "withdrawal")]
    Withdrawal,
    /// Sender leg of a transfer.
    #[sea_orm(string_value = "transfer_out")]
    TransferOut,
    /// Recipient leg of a transfer.
    #[sea_orm(string_value = "transfer_in")]
    TransferIn,
    /// One-off purchase debit.
    #[sea_orm(string_value = "purchase")]
    Purchase,
    /// Subscription billing debit.
    #[sea_orm(string_value = "subscription_charge")]
    SubscriptionCharge,
}

/// Lifecycle state of a journal transaction, as stored in Postgres.
#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "transaction_status")]
pub enum TransactionStatus {
    /// Recorded, not yet settled.
    #[sea_orm(string_value = "pending")]
    Pending,
    /// Settled successfully. Terminal.
    #[sea_orm(string_value = "completed")]
    Completed,
    /// Settled unsuccessfully. Terminal.
    #[sea_orm(string_value = "failed")]
    Failed,
}

/// Lifecycle state of a subscription, as stored in Postgres.
#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "subscription_status")]
pub enum SubscriptionStatus {
    /// Paid up and unexpired.
    #[sea_orm(string_value = "active")]
    Active,
    /// Lapsed. Terminal.
    #[sea_orm(string_value = "expired")]
    Expired,
    /// Canceled. Terminal.
    #[sea_orm(string_value = "inactive")]
    Inactive,
}

impl From<saldo_core::wallet::TransactionType> for TransactionType {
    fn from(value: saldo_core::wallet::TransactionType) -> Self {
        use saldo_core::wallet::TransactionType as Domain;
        match value {
            Domain::Topup => Self::Topup,
            Domain::Withdrawal => Self::Withdrawal,
            Domain::TransferOut => Self::TransferOut,
            Domain::TransferIn => Self::TransferIn,
            Domain::Purchase => Self::Purchase,
            Domain::SubscriptionCharge => Self::SubscriptionCharge,
        }
    }
}

impl From<TransactionType> for saldo_core::wallet::TransactionType {
    fn from(value: TransactionType) -> Self {
        use saldo_core::wallet::TransactionType as Domain;
        match value {
            TransactionType::Topup => Domain::Topup,
            TransactionType::Withdrawal => Domain::Withdrawal,
            TransactionType::TransferOut => Domain::TransferOut,
            TransactionType::TransferIn => Domain::TransferIn,
            TransactionType::Purchase => Domain::Purchase,
            TransactionType::SubscriptionCharge => Domain::SubscriptionCharge,
        }
    }
}

impl From<saldo_core::wallet::TransactionStatus> for TransactionStatus {
    fn from(value: saldo_core::wallet::TransactionStatus) -> Self {
        use saldo_core::wallet::TransactionStatus as Domain;
        match value {
            Domain::Pending => Self::Pending,
            Domain::Completed => Self::Completed,
            Domain::Failed => Self::Failed,
        }
    }
}

impl From<TransactionStatus> for saldo_core::wallet::TransactionStatus {
    fn from(value: TransactionStatus) -> Self {
        use saldo_core::wallet::TransactionStatus as Domain;
        match value {
            TransactionStatus::Pending => Domain::Pending,
            TransactionStatus::Completed => Domain::Completed,
            TransactionStatus::Failed => Domain::Failed,
        }
    }
}

impl From<saldo_core::subscription::SubscriptionStatus> for SubscriptionStatus {
    fn from(value: saldo_core::subscription::SubscriptionStatus) -> Self {
        use saldo_core::subscription::SubscriptionStatus as Domain;
        match value {
            Domain::Active => Self::Active,
            Domain::Expired => Self::Expired,
            Domain::Inactive => Self::Inactive,
        }
    }
}

impl From<SubscriptionStatus> for saldo_core::subscription::SubscriptionStatus {
    fn from(value: SubscriptionStatus) -> Self {
        use saldo_core::subscription::SubscriptionStatus as Domain;
        match value {
            SubscriptionStatus::Active => Domain::Active,
            SubscriptionStatus::Expired => Domain::Expired,
            SubscriptionStatus::Inactive => Domain::Inactive,
        }
    }
}
