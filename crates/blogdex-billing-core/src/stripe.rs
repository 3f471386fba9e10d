//! Stripe payment provider implementation

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, error, instrument};

use blogdex_types::{CheckoutSession, PortalSession};

use crate::config::BillingConfig;
use crate::error::BillingError;
use crate::provider::PaymentProvider;

const STRIPE_API_BASE: &str = "https://api.stripe.com/v1";

/// Stripe payment provider
#[derive(Clone)]
pub struct StripeProvider {
    client: Client,
    config: BillingConfig,
}

impl StripeProvider {
    /// Create a new Stripe provider
    pub fn new(config: BillingConfig) -> Self {
        let client = Client::new();
        Self { client, config }
    }

    /// Make an authenticated request to Stripe
    async fn stripe_request<T: for<'de> Deserialize<'de>>(
        &self,
        endpoint: &str,
        form: &[(&str, &str)],
    ) -> Result<T, BillingError> {
        let url = format!("{STRIPE_API_BASE}{endpoint}");

        let response = self
            .client
            .post(&url)
            .basic_auth(&self.config.secret_key, Option::<&str>::None)
            .form(form)
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, "Stripe API request failed");
                BillingError::ProviderError(e.to_string())
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_body = response.text().await.unwrap_or_default();
            error!(status = %status, body = %error_body, "Stripe API error");
            return Err(BillingError::ProviderError(format!(
                "Stripe API error: {status}"
            )));
        }

        response.json::<T>().await.map_err(|e| {
            error!(error = %e, "Failed to parse Stripe response");
            BillingError::Internal(e.to_string())
        })
    }
}

#[async_trait]
impl PaymentProvider for StripeProvider {
    #[instrument(skip(self))]
    async fn create_customer(&self, email: &str) -> Result<String, BillingError> {
        debug!(email = %email, "Creating Stripe customer");

        let customer: StripeCustomer = self
            .stripe_request("/customers", &[("email", email)])
            .await?;
        Ok(customer.id)
    }

    #[instrument(skip(self))]
    async fn create_checkout_session(
        &self,
        customer_ref: &str,
        success_url: &str,
        cancel_url: &str,
    ) -> Result<CheckoutSession, BillingError> {
        debug!(customer_ref = %customer_ref, "Creating checkout session");

        let form = [
            ("customer", customer_ref),
            ("mode", "subscription"),
            ("line_items[0][price]", self.config.pro_price_id.as_str()),
            ("line_items[0][quantity]", "1"),
            ("success_url", success_url),
            ("cancel_url", cancel_url),
        ];
        let session: StripeCheckoutSession = self
            .stripe_request("/checkout/sessions", &form)
            .await?;

        Ok(CheckoutSession {
            session_id: session.id,
            url: session.url.unwrap_or_default(),
        })
    }

    #[instrument(skip(self))]
    async fn create_portal_session(
        &self,
        customer_ref: &str,
        return_url: &str,
    ) -> Result<PortalSession, BillingError> {
        debug!(customer_ref = %customer_ref, "Creating billing portal session");

        let form = [("customer", customer_ref), ("return_url", return_url)];
        let session: StripePortalSession = self
            .stripe_request("/billing_portal/sessions", &form)
            .await?;

        Ok(PortalSession { url: session.url })
    }
}

// Raw Stripe API objects (only the fields the engine reads)

#[derive(Debug, Deserialize)]
struct StripeCustomer {
    id: String,
}

#[derive(Debug, Deserialize)]
struct StripeCheckoutSession {
    id: String,
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StripePortalSession {
    url: String,
}

/// Subscription object carried by webhook events
#[derive(Debug, Clone, Deserialize)]
pub struct StripeSubscription {
    pub id: String,
    pub customer: String,
    pub status: String,
    pub current_period_start: i64,
    pub current_period_end: i64,
    #[serde(default)]
    pub cancel_at_period_end: bool,
}

/// Invoice object carried by webhook events
#[derive(Debug, Clone, Deserialize)]
pub struct StripeInvoice {
    pub id: String,
    pub customer: String,
    pub subscription: Option<String>,
    pub status: Option<String>,
    #[serde(default)]
    pub amount_paid: i64,
    pub currency: String,
    pub period_start: i64,
    pub period_end: i64,
    #[serde(default)]
    pub attempt_count: i64,
    pub next_payment_attempt: Option<i64>,
}
