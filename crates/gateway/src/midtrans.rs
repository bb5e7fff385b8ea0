//! Midtrans adapter.

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use saldo_core::gateway::{
    FeeSchedule, GatewayFailure, GatewayReceipt, PaymentGateway, SettlementStatus,
};
use saldo_shared::config::GatewayConfig;
use saldo_shared::types::Currency;

/// Adapter for the Midtrans payment API.
pub struct MidtransGateway {
    client: reqwest::Client,
    base_url: String,
    server_key: String,
    schedule: FeeSchedule,
}

#[derive(Debug, Serialize)]
struct ChargeRequest<'a> {
    gross_amount: Decimal,
    currency: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChargeResponse {
    transaction_id: String,
    transaction_status: String,
}

#[derive(Debug, Serialize)]
struct PayoutRequest<'a> {
    reference_no: &'a str,
    amount: Decimal,
    currency: &'a str,
}

#[derive(Debug, Deserialize)]
struct StatusResponse {
    transaction_status: String,
}

impl MidtransGateway {
    /// Registry name of this provider.
    pub const NAME: &'static str = "midtrans";

    /// Builds the adapter from its configuration section.
    #[must_use]
    pub fn from_config(config: &GatewayConfig) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(std::time::Duration::from_secs(10))
                .build()
                .unwrap_or_default(),
            base_url: config
                .base_url
                .clone()
                .unwrap_or_else(|| "https://api.midtrans.com".to_string()),
            server_key: config.api_key.clone().unwrap_or_default(),
            schedule: FeeSchedule::new(config.fee_percent, config.fee_flat),
        }
    }

    /// Maps Midtrans transaction statuses onto the normalized settlement
    /// vocabulary.
    fn map_status(status: &str) -> SettlementStatus {
        match status {
            "capture" | "settlement" => SettlementStatus::Settled,
            "pending" => SettlementStatus::Pending,
            // deny, cancel, expire, failure
            _ => SettlementStatus::Failed,
        }
    }

    async fn post_json<B: Serialize + Sync, R: for<'de> Deserialize<'de>>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<R, GatewayFailure> {
        let response = self
            .client
            .post(format!("{}{path}", self.base_url))
            .basic_auth(&self.server_key, Option::<&str>::None)
            .json(body)
            .send()
            .await
            .map_err(normalize_transport)?;

        if !response.status().is_success() {
            let status = response.status();
            let reason = response.text().await.unwrap_or_default();
            return Err(GatewayFailure::Declined {
                reason: format!("{status}: {reason}"),
            });
        }

        response.json::<R>().await.map_err(normalize_transport)
    }
}

/// Folds reqwest errors into the two transport-level failure kinds.
fn normalize_transport(err: reqwest::Error) -> GatewayFailure {
    if err.is_timeout() {
        GatewayFailure::Timeout
    } else {
        GatewayFailure::Transport(err.to_string())
    }
}

#[async_trait]
impl PaymentGateway for MidtransGateway {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn fee_schedule(&self) -> FeeSchedule {
        self.schedule
    }

    async fn authorize_top_up(
        &self,
        amount: Decimal,
        currency: Currency,
    ) -> Result<GatewayReceipt, GatewayFailure> {
        let currency_code = currency.to_string();
        let request = ChargeRequest {
            gross_amount: amount,
            currency: &currency_code,
        };
        let charge: ChargeResponse = self.post_json("/v2/charge", &request).await?;

        if Self::map_status(&charge.transaction_status) == SettlementStatus::Failed {
            return Err(GatewayFailure::Declined {
                reason: charge.transaction_status,
            });
        }

        debug!(reference = %charge.transaction_id, %amount, %currency, "midtrans charge accepted");
        Ok(GatewayReceipt::from_schedule(
            charge.transaction_id,
            amount,
            currency,
            &self.schedule,
        ))
    }

    async fn initiate_payout(
        &self,
        amount: Decimal,
        currency: Currency,
        reference: &str,
    ) -> Result<GatewayReceipt, GatewayFailure> {
        let currency_code = currency.to_string();
        let request = PayoutRequest {
            reference_no: reference,
            amount,
            currency: &currency_code,
        };
        let _: serde_json::Value = self.post_json("/v1/payouts", &request).await?;

        debug!(%reference, %amount, %currency, "midtrans payout accepted");
        Ok(GatewayReceipt::from_schedule(
            reference.to_string(),
            amount,
            currency,
            &self.schedule,
        ))
    }

    async fn query_status(&self, reference: &str) -> Result<SettlementStatus, GatewayFailure> {
        let response = self
            .client
            .get(format!("{}/v2/{reference}/status", self.base_url))
            .basic_auth(&self.server_key, Option::<&str>::None)
            .send()
            .await
            .map_err(normalize_transport)?;

        if !response.status().is_success() {
            return Err(GatewayFailure::Transport(format!(
                "status query returned {}",
                response.status()
            )));
        }

        let status: StatusResponse = response.json().await.map_err(normalize_transport)?;
        Ok(Self::map_status(&status.transaction_status))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("capture", SettlementStatus::Settled)]
    #[case("settlement", SettlementStatus::Settled)]
    #[case("pending", SettlementStatus::Pending)]
    #[case("deny", SettlementStatus::Failed)]
    #[case("cancel", SettlementStatus::Failed)]
    #[case("expire", SettlementStatus::Failed)]
    #[case("anything-else", SettlementStatus::Failed)]
    fn test_status_mapping(#[case] raw: &str, #[case] expected: SettlementStatus) {
        assert_eq!(MidtransGateway::map_status(raw), expected);
    }
}
