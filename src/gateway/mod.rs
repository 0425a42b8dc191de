use async_trait::async_trait;
use std::fmt;

#[derive(Debug)]
pub struct GatewayError(pub String);

impl fmt::Display for GatewayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for GatewayError {}

pub struct PaymentIntent {
    pub client_secret: String,
}

/// Third-party payment gateway seam. The gateway's own ledger stays
/// authoritative for fraud and chargebacks; this service only asks it
/// to open an intent and hands the client secret back to the caller.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn create_intent(&self, amount: i64, currency: &str) -> Result<PaymentIntent, GatewayError>;
}

pub struct StripeGateway {
    client: reqwest::Client,
    secret_key: String,
    base_url: String,
}

impl StripeGateway {
    pub fn new(secret_key: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            secret_key,
            base_url: "https://api.stripe.com".to_string(),
        }
    }
}

#[async_trait]
impl PaymentGateway for StripeGateway {
    async fn create_intent(&self, amount: i64, currency: &str) -> Result<PaymentIntent, GatewayError> {
        let params = [
            ("amount", amount.to_string()),
            ("currency", currency.to_string()),
            ("payment_method_types[]", "card".to_string()),
        ];

        let response = self
            .client
            .post(format!("{}/v1/payment_intents", self.base_url))
            .bearer_auth(&self.secret_key)
            .form(&params)
            .send()
            .await
            .map_err(|e| GatewayError(e.to_string()))?;

        let status = response.status();
        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| GatewayError(e.to_string()))?;

        if !status.is_success() {
            let message = body
                .get("error")
                .and_then(|e| e.get("message"))
                .and_then(|m| m.as_str())
                .unwrap_or("payment intent was rejected");
            return Err(GatewayError(message.to_string()));
        }

        let client_secret = body
            .get("client_secret")
            .and_then(|s| s.as_str())
            .ok_or_else(|| GatewayError("gateway response missing client_secret".to_string()))?;

        Ok(PaymentIntent {
            client_secret: client_secret.to_string(),
        })
    }
}
