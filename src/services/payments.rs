//! Payment-gateway client: order creation plus local signature verification.

use hmac::{Hmac, Mac};
use rust_decimal::{prelude::ToPrimitive, Decimal};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use crate::{config::PaymentConfig, error::ApiError};

type HmacSha256 = Hmac<Sha256>;

#[derive(Clone)]
pub struct PaymentGateway {
    http: reqwest::Client,
    api_url: String,
    key_id: String,
    key_secret: String,
}

/// Order as created on the gateway side; `id` is what the client signs against.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayOrder {
    pub id: String,
    pub amount: i64,
    pub currency: String,
    pub status: String,
}

#[derive(Debug, Serialize)]
struct CreateOrderBody<'a> {
    amount: i64,
    currency: &'a str,
    receipt: &'a str,
}

impl PaymentGateway {
    pub fn new(config: &PaymentConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_url: config.api_url.clone(),
            key_id: config.key_id.clone(),
            key_secret: config.key_secret.clone(),
        }
    }

    /// Register the order with the gateway. Amount is in the smallest currency
    /// unit, so the decimal total is scaled by 100.
    pub async fn create_order(
        &self,
        amount: Decimal,
        currency: &str,
        receipt: &str,
    ) -> Result<GatewayOrder, ApiError> {
        let minor_units = (amount * Decimal::from(100))
            .round()
            .to_i64()
            .ok_or_else(|| ApiError::Validation("Invalid order amount".into()))?;
        let response = self
            .http
            .post(format!("{}/orders", self.api_url))
            .basic_auth(&self.key_id, Some(&self.key_secret))
            .json(&CreateOrderBody { amount: minor_units, currency, receipt })
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(ApiError::Upstream(format!(
                "payment gateway returned status {}",
                response.status()
            )));
        }
        Ok(response.json().await?)
    }

    /// Check the client-supplied signature: HMAC-SHA256 over
    /// `"<order_id>|<payment_id>"` keyed with the shared secret, hex encoded.
    /// Comparison is constant-time via `Mac::verify_slice`.
    pub fn verify_signature(&self, order_id: &str, payment_id: &str, signature: &str) -> bool {
        let Ok(signature) = hex::decode(signature) else {
            return false;
        };
        let mut mac = HmacSha256::new_from_slice(self.key_secret.as_bytes())
            .expect("HMAC accepts keys of any length");
        mac.update(order_id.as_bytes());
        mac.update(b"|");
        mac.update(payment_id.as_bytes());
        mac.verify_slice(&signature).is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PaymentConfig;

    fn gateway() -> PaymentGateway {
        PaymentGateway::new(&PaymentConfig {
            api_url: "https://gateway.test/v1".into(),
            key_id: "key_test".into(),
            key_secret: "topsecret".into(),
        })
    }

    fn sign(secret: &str, payload: &str) -> String {
        let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).unwrap();
        mac.update(payload.as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }

    #[test]
    fn valid_signature_verifies() {
        let gw = gateway();
        let sig = sign("topsecret", "order_abc|pay_123");
        assert!(gw.verify_signature("order_abc", "pay_123", &sig));
    }

    #[test]
    fn tampered_payment_id_fails() {
        let gw = gateway();
        let sig = sign("topsecret", "order_abc|pay_123");
        assert!(!gw.verify_signature("order_abc", "pay_999", &sig));
    }

    #[test]
    fn wrong_secret_fails() {
        let gw = gateway();
        let sig = sign("othersecret", "order_abc|pay_123");
        assert!(!gw.verify_signature("order_abc", "pay_123", &sig));
    }

    #[test]
    fn non_hex_signature_fails_cleanly() {
        let gw = gateway();
        assert!(!gw.verify_signature("order_abc", "pay_123", "not-hex!"));
    }
}
