//! Payment provider adapters for Saldo.
//!
//! Each provider gets one [`saldo_core::gateway::PaymentGateway`]
//! implementation; the [`GatewayRegistry`] resolves them by the name the
//! caller supplies, failing closed on unknown names. Adapters normalize
//! provider responses and compute fees; they never touch the ledger.

pub mod midtrans;
pub mod registry;
pub mod sandbox;
pub mod xendit;

pub use midtrans::MidtransGateway;
pub use registry::GatewayRegistry;
pub use sandbox::SandboxGateway;
pub use xendit::XenditGateway;
