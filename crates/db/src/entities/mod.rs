//! `SeaORM` entity definitions.

pub mod balances;
pub mod sea_orm_active_enums;
pub mod subscriptions;
pub mod transactions;
