//! Payment gateway client via REST API (no SDK dependency).
//!
//! The charge happens while the booking transaction is open, so the call
//! carries a hard timeout: an unreachable or slow gateway is a failed
//! payment, never a hung transaction.

use std::time::Duration;

use rust_decimal::Decimal;

/// Outcome of a successful charge.
#[derive(Debug, Clone)]
pub struct ChargeOutcome {
    pub transaction_id: String,
}

/// A charge that did not go through. Both arms map to a failed booking.
#[derive(Debug, thiserror::Error)]
pub enum ChargeError {
    #[error("payment declined: {0}")]
    Declined(String),
    #[error("payment gateway unreachable: {0}")]
    Unreachable(String),
}

#[derive(Clone)]
pub struct PaymentGateway {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl PaymentGateway {
    pub fn new(base_url: String, api_key: String, timeout_secs: u64) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .unwrap_or_default();
        Self {
            client,
            base_url,
            api_key,
        }
    }

    /// Charge the access fee against a tokenized payment instrument.
    pub async fn charge(
        &self,
        booking_id: i64,
        amount: Decimal,
        currency: &str,
        method: &str,
        reference: &str,
    ) -> Result<ChargeOutcome, ChargeError> {
        if self.base_url.is_empty() {
            // Unconfigured gateway: development mode, every charge succeeds
            tracing::info!(booking_id, %amount, "Payment gateway unconfigured, simulating charge");
            return Ok(ChargeOutcome {
                transaction_id: format!("dev-{booking_id}"),
            });
        }

        let resp = self
            .client
            .post(format!("{}/v1/charges", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&serde_json::json!({
                "amount": amount.to_string(),
                "currency": currency,
                "method": method,
                "reference": reference,
                "metadata": { "booking_id": booking_id.to_string() },
            }))
            .send()
            .await
            .map_err(|e| ChargeError::Unreachable(e.to_string()))?;

        let status = resp.status();
        let body: serde_json::Value = resp
            .json()
            .await
            .map_err(|e| ChargeError::Unreachable(e.to_string()))?;

        if !status.is_success() {
            let reason = body["error"]
                .as_str()
                .unwrap_or("gateway rejected the charge")
                .to_string();
            return Err(ChargeError::Declined(reason));
        }

        body["transaction_id"]
            .as_str()
            .map(|id| ChargeOutcome {
                transaction_id: id.to_string(),
            })
            .ok_or_else(|| ChargeError::Declined(format!("malformed gateway response: {body}")))
    }
}
