//! Environment-driven configuration, loaded once at startup.

use std::net::SocketAddr;

use anyhow::Context;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub database_url: String,
    pub bind_addr: SocketAddr,
    pub max_connections: u32,
    pub upload: Option<UploaderConfig>,
    pub payment: Option<PaymentConfig>,
}

/// Object-storage upload endpoint; images are posted here and the returned
/// public URL is stored on the product.
#[derive(Clone, Debug)]
pub struct UploaderConfig {
    pub endpoint: String,
    pub folder: String,
}

#[derive(Clone, Debug)]
pub struct PaymentConfig {
    pub api_url: String,
    pub key_id: String,
    pub key_secret: String,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Parse configuration out of any key-value lookup, so it can be tested
    /// without mutating process-wide environment state.
    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let database_url = get("DATABASE_URL").context("DATABASE_URL is not set")?;
        let port: u16 = get("PORT")
            .unwrap_or_else(|| "5000".to_string())
            .parse()
            .context("PORT must be a number")?;
        let max_connections: u32 = get("DB_MAX_CONNECTIONS")
            .unwrap_or_else(|| "10".to_string())
            .parse()
            .context("DB_MAX_CONNECTIONS must be a number")?;

        let upload = get("UPLOAD_ENDPOINT").map(|endpoint| UploaderConfig {
            endpoint,
            folder: get("UPLOAD_FOLDER").unwrap_or_else(|| "elanproducts".to_string()),
        });

        let payment = match (get("PAYMENT_KEY_ID"), get("PAYMENT_KEY_SECRET")) {
            (Some(key_id), Some(key_secret)) => Some(PaymentConfig {
                api_url: get("PAYMENT_API_URL")
                    .unwrap_or_else(|| "https://api.razorpay.com/v1".to_string()),
                key_id,
                key_secret,
            }),
            _ => None,
        };

        Ok(Self {
            database_url,
            bind_addr: SocketAddr::from(([0, 0, 0, 0], port)),
            max_connections,
            upload,
            payment,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup<'a>(vars: &'a [(&'a str, &'a str)]) -> impl Fn(&str) -> Option<String> + 'a {
        let map: HashMap<&str, &str> = vars.iter().copied().collect();
        move |key| map.get(key).map(|v| (*v).to_string())
    }

    #[test]
    fn minimal_config_uses_defaults() {
        let config =
            AppConfig::from_lookup(lookup(&[("DATABASE_URL", "postgres://localhost/elan")]))
                .unwrap();
        assert_eq!(config.database_url, "postgres://localhost/elan");
        assert_eq!(config.bind_addr.port(), 5000);
        assert_eq!(config.max_connections, 10);
        assert!(config.upload.is_none());
        assert!(config.payment.is_none());
    }

    #[test]
    fn missing_database_url_is_an_error() {
        let err = AppConfig::from_lookup(lookup(&[])).unwrap_err();
        assert!(err.to_string().contains("DATABASE_URL"));
    }

    #[test]
    fn bad_port_is_an_error() {
        let err = AppConfig::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://localhost/elan"),
            ("PORT", "not-a-port"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("PORT"));
    }

    #[test]
    fn uploader_folder_defaults_when_only_endpoint_is_set() {
        let config = AppConfig::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://localhost/elan"),
            ("UPLOAD_ENDPOINT", "https://storage.test/upload"),
        ]))
        .unwrap();
        let upload = config.upload.unwrap();
        assert_eq!(upload.endpoint, "https://storage.test/upload");
        assert_eq!(upload.folder, "elanproducts");
    }

    #[test]
    fn payment_requires_both_key_and_secret() {
        let partial = AppConfig::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://localhost/elan"),
            ("PAYMENT_KEY_ID", "key_test"),
        ]))
        .unwrap();
        assert!(partial.payment.is_none());

        let full = AppConfig::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://localhost/elan"),
            ("PAYMENT_KEY_ID", "key_test"),
            ("PAYMENT_KEY_SECRET", "topsecret"),
        ]))
        .unwrap();
        let payment = full.payment.unwrap();
        assert_eq!(payment.key_id, "key_test");
        assert_eq!(payment.api_url, "https://api.razorpay.com/v1");
    }

    #[test]
    fn explicit_port_and_pool_size_are_honored() {
        let config = AppConfig::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://localhost/elan"),
            ("PORT", "8080"),
            ("DB_MAX_CONNECTIONS", "25"),
        ]))
        .unwrap();
        assert_eq!(config.bind_addr.port(), 8080);
        assert_eq!(config.max_connections, 25);
    }
}
