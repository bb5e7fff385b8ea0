//! Xendit adapter.

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use saldo_core::gateway::{
    FeeSchedule, GatewayFailure, GatewayReceipt, PaymentGateway, SettlementStatus,
};
use saldo_shared::config::GatewayConfig;
use saldo_shared::types::Currency;

/// Adapter for the Xendit payment API.
pub struct XenditGateway {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    schedule: FeeSchedule,
}

#[derive(Debug, Serialize)]
struct InvoiceRequest<'a> {
    amount: Decimal,
    currency: &'a str,
}

#[derive(Debug, Deserialize)]
struct InvoiceResponse {
    id: String,
    status: String,
}

#[derive(Debug, Serialize)]
struct DisbursementRequest<'a> {
    external_id: &'a str,
    amount: Decimal,
    currency: &'a str,
}

impl XenditGateway {
    /// Registry name of this provider.
    pub const NAME: &'static str = "xendit";

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
                .unwrap_or_else(|| "https://api.xendit.co".to_string()),
            api_key: config.api_key.clone().unwrap_or_default(),
            schedule: FeeSchedule::new(config.fee_percent, config.fee_flat),
        }
    }

    /// Maps Xendit invoice/disbursement statuses onto the normalized
    /// settlement vocabulary.
    fn map_status(status: &str) -> SettlementStatus {
        match status {
            "PAID" | "SETTLED" | "COMPLETED" => SettlementStatus::Settled,
            "PENDING" => SettlementStatus::Pending,
            // EXPIRED, FAILED
            _ => SettlementStatus::Failed,
        }
    }

    async fn send<B: Serialize + Sync, R: for<'de> Deserialize<'de>>(
        &self,
        request: reqwest::RequestBuilder,
        body: Option<&B>,
    ) -> Result<R, GatewayFailure> {
        let request = request.basic_auth(&self.api_key, Option::<&str>::None);
        let request = match body {
            Some(body) => request.json(body),
            None => request,
        };

        let response = request.send().await.map_err(normalize_transport)?;

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

fn normalize_transport(err: reqwest::Error) -> GatewayFailure {
    if err.is_timeout() {
        GatewayFailure::Timeout
    } else {
        GatewayFailure::Transport(err.to_string())
    }
}

#[async_trait]
impl PaymentGateway for XenditGateway {
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
        let request = InvoiceRequest {
            amount,
            currency: &currency_code,
        };
        let invoice: InvoiceResponse = self
            .send(
                self.client.post(format!("{}/v2/invoices", self.base_url)),
                Some(&request),
            )
            .await?;

        if Self::map_status(&invoice.status) == SettlementStatus::Failed {
            return Err(GatewayFailure::Declined {
                reason: invoice.status,
            });
        }

        debug!(reference = %invoice.id, %amount, %currency, "xendit invoice accepted");
        Ok(GatewayReceipt::from_schedule(
            invoice.id,
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
        let request = DisbursementRequest {
            external_id: reference,
            amount,
            currency: &currency_code,
        };
        let _: serde_json::Value = self
            .send(
                self.client
                    .post(format!("{}/disbursements", self.base_url)),
                Some(&request),
            )
            .await?;

        debug!(%reference, %amount, %currency, "xendit disbursement accepted");
        Ok(GatewayReceipt::from_schedule(
            reference.to_string(),
            amount,
            currency,
            &self.schedule,
        ))
    }

    async fn query_status(&self, reference: &str) -> Result<SettlementStatus, GatewayFailure> {
        let invoice: InvoiceResponse = self
            .send::<(), _>(
                self.client
                    .get(format!("{}/v2/invoices/{reference}", self.base_url)),
                None,
            )
            .await?;

        Ok(Self::map_status(&invoice.status))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("PAID", SettlementStatus::Settled)]
    #[case("SETTLED", SettlementStatus::Settled)]
    #[case("COMPLETED", SettlementStatus::Settled)]
    #[case("PENDING", SettlementStatus::Pending)]
    #[case("EXPIRED", SettlementStatus::Failed)]
    #[case("FAILED", SettlementStatus::Failed)]
    fn test_status_mapping(#[case] raw: &str, #[case] expected: SettlementStatus) {
        assert_eq!(XenditGateway::map_status(raw), expected);
    }
}
