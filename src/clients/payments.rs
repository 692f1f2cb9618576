use anyhow::{anyhow, bail};
use async_trait::async_trait;

/// A confirmed charge as reported by the processor.
#[derive(Debug, Clone)]
pub struct PaymentIntent {
    pub id: String,
    pub status: String,
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Creates and confirms a charge of `amount_cents` in `currency`.
    async fn charge(
        &self,
        amount_cents: i64,
        currency: &str,
        payment_method: &str,
    ) -> anyhow::Result<PaymentIntent>;
}

/// Stripe PaymentIntents over the REST API.
pub struct StripeGateway {
    http: reqwest::Client,
    secret_key: String,
}

impl StripeGateway {
    pub fn new(secret_key: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            secret_key,
        }
    }
}

#[async_trait]
impl PaymentGateway for StripeGateway {
    async fn charge(
        &self,
        amount_cents: i64,
        currency: &str,
        payment_method: &str,
    ) -> anyhow::Result<PaymentIntent> {
        let amount = amount_cents.to_string();
        let resp: serde_json::Value = self
            .http
            .post("https://api.stripe.com/v1/payment_intents")
            .basic_auth(&self.secret_key, None::<&str>)
            .form(&[
                ("amount", amount.as_str()),
                ("currency", currency),
                ("payment_method", payment_method),
                ("confirm", "true"),
                ("automatic_payment_methods[enabled]", "true"),
                ("automatic_payment_methods[allow_redirects]", "never"),
            ])
            .send()
            .await?
            .json()
            .await?;

        if let Some(message) = resp["error"]["message"].as_str() {
            bail!("{message}");
        }

        let id = resp["id"]
            .as_str()
            .ok_or_else(|| anyhow!("Stripe create_payment_intent failed: {resp}"))?;
        let status = resp["status"].as_str().unwrap_or_default();
        if status != "succeeded" {
            bail!("Payment was not completed (status: {status})");
        }

        Ok(PaymentIntent {
            id: id.to_string(),
            status: status.to_string(),
        })
    }
}

/// Used when no processor key is configured; every charge fails.
pub struct DisabledPayments;

#[async_trait]
impl PaymentGateway for DisabledPayments {
    async fn charge(
        &self,
        _amount_cents: i64,
        _currency: &str,
        _payment_method: &str,
    ) -> anyhow::Result<PaymentIntent> {
        Err(anyhow!("payment processor is not configured"))
    }
}
