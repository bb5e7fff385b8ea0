//! `SeaORM` Entity for the transactions table (the journal).
//!
//! Append-only: rows are inserted `pending`, move to exactly one terminal
//! state, and are never deleted. The partial unique index on
//! (tx_type, idempotency_key) makes the database the final arbiter of
//! replayed gateway confirmations.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::{TransactionStatus, TransactionType};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "transactions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub user_id: Uuid,
    pub tx_type: TransactionType,
    pub amount: Decimal,
    pub currency: String,
    pub status: TransactionStatus,
    pub gateway: Option<String>,
    pub gateway_reference: Option<String>,
    pub idempotency_key: Option<String>,
    pub fee: Option<Decimal>,
    pub counterparty_id: Option<Uuid>,
    pub correlation_id: Option<Uuid>,
    pub failure_reason: Option<String>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::subscriptions::Entity")]
    Subscriptions,
}

impl Related<super::subscriptions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Subscriptions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
