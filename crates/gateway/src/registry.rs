//! Name-keyed gateway registry.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{info, warn};

use saldo_core::gateway::{FeeSchedule, GatewayResolver, PaymentGateway};
use saldo_core::wallet::WalletError;
use saldo_shared::config::GatewayConfig;

use crate::{MidtransGateway, SandboxGateway, XenditGateway};

/// Registry of payment gateways, keyed by provider name.
///
/// Resolution fails closed: an unknown name is `GatewayNotSupported`, never
/// a fallback provider.
#[derive(Clone, Default)]
pub struct GatewayRegistry {
    gateways: HashMap<String, Arc<dyn PaymentGateway>>,
}

impl GatewayRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a gateway under its own name. A second registration with
    /// the same name replaces the first.
    pub fn register(&mut self, gateway: Arc<dyn PaymentGateway>) {
        self.gateways.insert(gateway.name().to_string(), gateway);
    }

    /// Builds a registry from the `[gateways]` configuration section.
    /// Unrecognized section names are skipped with a warning rather than
    /// aborting startup.
    #[must_use]
    pub fn from_config(config: &HashMap<String, GatewayConfig>) -> Self {
        let mut registry = Self::new();

        for (name, section) in config {
            match name.as_str() {
                MidtransGateway::NAME => {
                    registry.register(Arc::new(MidtransGateway::from_config(section)));
                }
                XenditGateway::NAME => {
                    registry.register(Arc::new(XenditGateway::from_config(section)));
                }
                SandboxGateway::NAME => {
                    registry.register(Arc::new(SandboxGateway::approving(FeeSchedule::new(
                        section.fee_percent,
                        section.fee_flat,
                    ))));
                }
                other => {
                    warn!(gateway = other, "ignoring unknown gateway in configuration");
                }
            }
        }

        info!(gateways = ?registry.names(), "gateway registry initialized");
        registry
    }

    /// Resolves a gateway by the name the caller supplied.
    ///
    /// # Errors
    ///
    /// Returns `GatewayNotSupported` for unknown names.
    pub fn resolve(&self, name: &str) -> Result<Arc<dyn PaymentGateway>, WalletError> {
        self.gateways
            .get(name)
            .cloned()
            .ok_or_else(|| WalletError::GatewayNotSupported(name.to_string()))
    }

    /// Names of all registered gateways, sorted for stable output.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.gateways.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl GatewayResolver for GatewayRegistry {
    fn resolve(&self, name: &str) -> Result<Arc<dyn PaymentGateway>, WalletError> {
        self.gateways
            .get(name)
            .cloned()
            .ok_or_else(|| WalletError::GatewayNotSupported(name.to_string()))
    }
}
