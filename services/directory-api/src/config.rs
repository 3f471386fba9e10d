//! Configuration for the Directory API service.

use std::time::Duration;

use blogdex_billing_core::BillingConfig;
use blogdex_verify_core::VerifyConfig;

/// Directory API configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port
    pub http_port: u16,
    /// Database URL
    pub database_url: String,
    /// Billing core configuration
    pub billing: BillingConfig,
    /// Domain verification configuration
    pub verify: VerifyConfig,
    /// Transactional email endpoint
    pub email_endpoint: String,
    /// Transactional email API key
    pub email_api_key: String,
    /// From address for outbound notifications
    pub email_from: String,
    /// Request timeout
    pub request_timeout: Duration,
    /// Metrics enabled
    pub metrics_enabled: bool,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let database_url =
            std::env::var("DATABASE_URL").map_err(|_| ConfigError::Missing("DATABASE_URL"))?;

        let http_port = std::env::var("HTTP_PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse()
            .map_err(|_| ConfigError::Invalid("HTTP_PORT"))?;

        // Payment processor
        let stripe_secret_key = std::env::var("STRIPE_SECRET_KEY")
            .map_err(|_| ConfigError::Missing("STRIPE_SECRET_KEY"))?;
        let stripe_webhook_secret = std::env::var("STRIPE_WEBHOOK_SECRET")
            .map_err(|_| ConfigError::Missing("STRIPE_WEBHOOK_SECRET"))?;
        let pro_price_id = std::env::var("STRIPE_PRO_PRICE_ID")
            .map_err(|_| ConfigError::Missing("STRIPE_PRO_PRICE_ID"))?;

        let grace_days: i64 = std::env::var("BILLING_GRACE_DAYS")
            .unwrap_or_else(|_| "14".to_string())
            .parse()
            .map_err(|_| ConfigError::Invalid("BILLING_GRACE_DAYS"))?;

        let default_success_url = std::env::var("BILLING_SUCCESS_URL")
            .unwrap_or_else(|_| "https://blogdex.example.com/billing/success".to_string());
        let default_cancel_url = std::env::var("BILLING_CANCEL_URL")
            .unwrap_or_else(|_| "https://blogdex.example.com/billing/cancel".to_string());

        let billing = BillingConfig::new(&stripe_secret_key, &stripe_webhook_secret)
            .with_pro_price(&pro_price_id)
            .with_grace_period(chrono::Duration::days(grace_days))
            .with_urls(&default_success_url, &default_cancel_url);

        // Domain verification
        let verify_timeout_secs: u64 = std::env::var("VERIFY_TIMEOUT_SECS")
            .unwrap_or_else(|_| "10".to_string())
            .parse()
            .map_err(|_| ConfigError::Invalid("VERIFY_TIMEOUT_SECS"))?;

        let mut verify =
            VerifyConfig::default().with_probe_timeout(Duration::from_secs(verify_timeout_secs));
        if let Ok(endpoint) = std::env::var("DOH_ENDPOINT") {
            verify = verify.with_doh_endpoint(endpoint);
        }

        // Notification transport
        let email_endpoint = std::env::var("EMAIL_API_URL")
            .map_err(|_| ConfigError::Missing("EMAIL_API_URL"))?;
        let email_api_key =
            std::env::var("EMAIL_API_KEY").map_err(|_| ConfigError::Missing("EMAIL_API_KEY"))?;
        let email_from = std::env::var("EMAIL_FROM")
            .unwrap_or_else(|_| "Blogdex <notify@blogdex.example.com>".to_string());

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".to_string())
            .parse()
            .map_err(|_| ConfigError::Invalid("REQUEST_TIMEOUT_SECS"))?;

        let metrics_enabled = std::env::var("METRICS_ENABLED")
            .unwrap_or_else(|_| "true".to_string())
            .parse()
            .unwrap_or(true);

        Ok(Self {
            http_port,
            database_url,
            billing,
            verify,
            email_endpoint,
            email_api_key,
            email_from,
            request_timeout: Duration::from_secs(request_timeout_secs),
            metrics_enabled,
        })
    }
}

/// Configuration error
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for environment variable: {0}")]
    Invalid(&'static str),
}
