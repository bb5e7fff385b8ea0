//! Core business logic for Saldo.
//!
//! This crate contains the pure domain layer of the wallet:
//! - Balance arithmetic and its invariants
//! - Transaction journal domain types and state machine
//! - Idempotency key derivation for gateway-driven operations
//! - The payment gateway abstraction and fee schedules
//! - The subscription billing state machine
//!
//! It has no web or database dependencies; persistence and HTTP live in
//! `saldo-db` and `saldo-api`.

pub mod gateway;
pub mod subscription;
pub mod wallet;
