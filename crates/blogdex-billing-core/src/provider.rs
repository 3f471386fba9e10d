//! Payment provider abstraction

use async_trait::async_trait;

use blogdex_types::{CheckoutSession, PortalSession};

use crate::BillingError;

/// Payment provider trait
///
/// The engine never mutates billing state at the processor; opening a
/// checkout or a billing-management session is its only outbound surface.
#[async_trait]
pub trait PaymentProvider: Send + Sync {
    /// Create a customer record at the processor, returning its reference
    async fn create_customer(&self, email: &str) -> Result<String, BillingError>;

    /// Create a checkout session for the pro subscription
    async fn create_checkout_session(
        &self,
        customer_ref: &str,
        success_url: &str,
        cancel_url: &str,
    ) -> Result<CheckoutSession, BillingError>;

    /// Create a billing-management portal session
    async fn create_portal_session(
        &self,
        customer_ref: &str,
        return_url: &str,
    ) -> Result<PortalSession, BillingError>;
}
