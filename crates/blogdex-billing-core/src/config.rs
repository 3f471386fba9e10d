//! Billing configuration

use chrono::Duration;

/// Billing service configuration
#[derive(Debug, Clone)]
pub struct BillingConfig {
    /// Payment processor secret key
    pub secret_key: String,
    /// Webhook signing secret
    pub webhook_secret: String,
    /// Processor price ID for the pro subscription
    pub pro_price_id: String,
    /// Grace period between `past_due` and the forced downgrade; also the
    /// window during which a past-due record still derives the pro tier
    pub grace_period: Duration,
    /// Default success URL for checkout
    pub default_success_url: String,
    /// Default cancel URL for checkout
    pub default_cancel_url: String,
    /// Default return URL for the billing-management portal
    pub default_portal_return_url: String,
}

impl BillingConfig {
    /// Create a new billing config
    pub fn new(secret_key: impl Into<String>, webhook_secret: impl Into<String>) -> Self {
        Self {
            secret_key: secret_key.into(),
            webhook_secret: webhook_secret.into(),
            pro_price_id: String::new(),
            grace_period: Duration::days(14),
            default_success_url: "https://blogdex.example.com/billing/success".to_string(),
            default_cancel_url: "https://blogdex.example.com/billing/cancel".to_string(),
            default_portal_return_url: "https://blogdex.example.com/account".to_string(),
        }
    }

    /// Set the pro price ID
    pub fn with_pro_price(mut self, price_id: impl Into<String>) -> Self {
        self.pro_price_id = price_id.into();
        self
    }

    /// Set the grace period
    pub fn with_grace_period(mut self, grace: Duration) -> Self {
        self.grace_period = grace;
        self
    }

    /// Set default checkout URLs
    pub fn with_urls(
        mut self,
        success_url: impl Into<String>,
        cancel_url: impl Into<String>,
    ) -> Self {
        self.default_success_url = success_url.into();
        self.default_cancel_url = cancel_url.into();
        self
    }
}
