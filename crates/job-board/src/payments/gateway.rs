use std::fmt::Debug;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

const STRIPE_API: &str = "https://api.stripe.com";

#[derive(Clone, PartialEq, Eq)]
pub struct StripeCredentials {
    pub publishable_key: String,
    pub secret_key: String,
}

impl Debug for StripeCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StripeCredentials")
            .field("publishable_key", &self.publishable_key)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChargeRequest {
    pub amount_cents: i64,
    pub currency: String,
    /// Card token collected client-side.
    pub source: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ChargeReceipt {
    pub id: String,
    #[serde(rename = "amount")]
    pub amount_cents: i64,
}

#[derive(Debug, thiserror::Error)]
pub enum PaymentError {
    /// The card was declined; the message is safe to show the payer.
    #[error("{0}")]
    Card(String),
    #[error("payment provider error: {0}")]
    Provider(String),
    #[error("payment provider unreachable: {0}")]
    Transport(String),
}

#[async_trait]
pub trait PaymentGateway: Send + Sync + Debug {
    async fn charge(
        &self,
        credentials: &StripeCredentials,
        request: &ChargeRequest,
    ) -> Result<ChargeReceipt, PaymentError>;
}

#[derive(Debug, Clone)]
pub struct StripeGateway {
    client: reqwest::Client,
    base_url: String,
}

#[derive(Deserialize)]
struct StripeErrorBody {
    error: StripeErrorDetail,
}

#[derive(Deserialize)]
struct StripeErrorDetail {
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(default)]
    message: Option<String>,
}

impl StripeGateway {
    pub fn new(client: reqwest::Client) -> Self {
        Self::with_base_url(client, STRIPE_API)
    }

    pub fn with_base_url(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl PaymentGateway for StripeGateway {
    async fn charge(
        &self,
        credentials: &StripeCredentials,
        request: &ChargeRequest,
    ) -> Result<ChargeReceipt, PaymentError> {
        debug!(amount = request.amount_cents, description = %request.description, "creating charge");
        let amount = request.amount_cents.to_string();
        let form = [
            ("amount", amount.as_str()),
            ("currency", request.currency.as_str()),
            ("source", request.source.as_str()),
            ("description", request.description.as_str()),
        ];

        let response = self
            .client
            .post(format!("{}/v1/charges", self.base_url))
            .bearer_auth(&credentials.secret_key)
            .form(&form)
            .send()
            .await
            .map_err(|err| PaymentError::Transport(err.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return response
                .json::<ChargeReceipt>()
                .await
                .map_err(|err| PaymentError::Provider(err.to_string()));
        }

        let body = response.text().await.unwrap_or_default();
        Err(classify_failure(status.as_u16(), &body))
    }
}

fn classify_failure(status: u16, body: &str) -> PaymentError {
    match serde_json::from_str::<StripeErrorBody>(body) {
        Ok(StripeErrorBody { error }) if error.kind == "card_error" => PaymentError::Card(
            error
                .message
                .unwrap_or_else(|| "Your card was declined.".to_string()),
        ),
        Ok(StripeErrorBody { error }) => PaymentError::Provider(
            error
                .message
                .unwrap_or_else(|| format!("{} (status {status})", error.kind)),
        ),
        Err(_) => PaymentError::Provider(format!("unexpected response (status {status})")),
    }
}
