//! Application configuration management.

use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::Deserialize;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server configuration.
    pub server: ServerConfig,
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Billing policy configuration.
    #[serde(default)]
    pub billing: BillingConfig,
    /// Payment gateway configuration, keyed by gateway name.
    #[serde(default)]
    pub gateways: HashMap<String, GatewayConfig>,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Database connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

/// How a top-up's provider fee affects the credited amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TopUpFeeMode {
    /// The gross amount is credited; the fee is stored on the journal row
    /// as metadata only.
    #[default]
    RecordOnly,
    /// The fee is deducted and the net amount is credited.
    Deduct,
}

/// Billing policy configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct BillingConfig {
    /// Top-up fee policy.
    #[serde(default)]
    pub topup_fee_mode: TopUpFeeMode,
    /// Age in minutes after which a pending gateway transaction becomes a
    /// reconciliation candidate.
    #[serde(default = "default_reconcile_after_minutes")]
    pub reconcile_after_minutes: i64,
}

fn default_reconcile_after_minutes() -> i64 {
    30
}

impl Default for BillingConfig {
    fn default() -> Self {
        Self {
            topup_fee_mode: TopUpFeeMode::default(),
            reconcile_after_minutes: default_reconcile_after_minutes(),
        }
    }
}

/// Settings for one payment gateway.
#[derive(Debug, Clone, Deserialize)]
pub struct GatewayConfig {
    /// Provider API base URL. Absent for in-process providers.
    #[serde(default)]
    pub base_url: Option<String>,
    /// Provider API key.
    #[serde(default)]
    pub api_key: Option<String>,
    /// Percentage component of the fee schedule (e.g. 2.9 for 2.9%).
    #[serde(default)]
    pub fee_percent: Decimal,
    /// Flat component of the fee schedule, in major units of the charged
    /// currency.
    #[serde(default)]
    pub fee_flat: Decimal,
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("SALDO").separator("__"))
            .build()?;

        config.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fee_mode_default_is_record_only() {
        assert_eq!(TopUpFeeMode::default(), TopUpFeeMode::RecordOnly);
    }

    #[test]
    fn test_billing_config_defaults() {
        let billing = BillingConfig::default();
        assert_eq!(billing.topup_fee_mode, TopUpFeeMode::RecordOnly);
        assert_eq!(billing.reconcile_after_minutes, 30);
    }

    #[test]
    fn test_config_deserializes_from_toml() {
        let raw = r#"
            [server]
            port = 9000

            [database]
            url = "postgres://localhost/saldo_test"

            [billing]
            topup_fee_mode = "deduct"

            [gateways.midtrans]
            base_url = "https://api.sandbox.midtrans.com"
            api_key = "SB-key"
            fee_percent = "2.9"
            fee_flat = "0.30"
        "#;

        let cfg: AppConfig = config::Config::builder()
            .add_source(config::File::from_str(raw, config::FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(cfg.server.port, 9000);
        assert_eq!(cfg.server.host, "0.0.0.0");
        assert_eq!(cfg.database.max_connections, 10);
        assert_eq!(cfg.billing.topup_fee_mode, TopUpFeeMode::Deduct);
        let midtrans = &cfg.gateways["midtrans"];
        assert_eq!(midtrans.fee_percent, Decimal::new(29, 1));
    }
}
