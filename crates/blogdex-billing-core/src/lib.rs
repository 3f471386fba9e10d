//! Blogdex Billing Core - Subscription lifecycle
//!
//! Reacts to payment-processor events (checkout completed, invoice paid,
//! invoice payment failed, subscription canceled/updated) and keeps the
//! billing record, the derived tier, and the active-post quota consistent.
//! Every event is applied at most once via the externally-numbered event
//! ledger, so replayed webhooks are no-ops.

pub mod config;
pub mod error;
pub mod provider;
pub mod service;
pub mod stripe;
pub mod webhook;

pub use config::BillingConfig;
pub use error::BillingError;
pub use provider::PaymentProvider;
pub use service::SubscriptionLifecycle;
pub use stripe::StripeProvider;
pub use webhook::{PaymentEvent, PaymentEventData, PaymentEventType, WebhookHandler};
