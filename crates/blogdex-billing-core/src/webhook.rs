//! Payment webhook handling

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;
use tracing::{debug, error, info, instrument, warn};

use crate::error::BillingError;
use crate::stripe::{StripeInvoice, StripeSubscription};

/// Webhook event types the lifecycle reacts to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentEventType {
    /// Checkout session completed
    CheckoutCompleted,
    /// Subscription created or updated at the processor
    SubscriptionUpdated,
    /// Subscription deleted at the processor
    SubscriptionCanceled,
    /// Invoice paid
    InvoicePaid,
    /// Invoice payment failed
    InvoicePaymentFailed,
    /// Unknown event type, acknowledged and ignored
    Unknown(String),
}

impl From<&str> for PaymentEventType {
    fn from(s: &str) -> Self {
        match s {
            "checkout.session.completed" => Self::CheckoutCompleted,
            "customer.subscription.created" | "customer.subscription.updated" => {
                Self::SubscriptionUpdated
            }
            "customer.subscription.deleted" => Self::SubscriptionCanceled,
            "invoice.paid" => Self::InvoicePaid,
            "invoice.payment_failed" => Self::InvoicePaymentFailed,
            other => Self::Unknown(other.to_string()),
        }
    }
}

impl PaymentEventType {
    /// Stable name recorded in the applied-event ledger
    pub fn as_str(&self) -> &str {
        match self {
            Self::CheckoutCompleted => "checkout_completed",
            Self::SubscriptionUpdated => "subscription_updated",
            Self::SubscriptionCanceled => "subscription_canceled",
            Self::InvoicePaid => "invoice_paid",
            Self::InvoicePaymentFailed => "invoice_payment_failed",
            Self::Unknown(s) => s,
        }
    }
}

/// Parsed webhook event
#[derive(Debug, Clone)]
pub struct PaymentEvent {
    /// External event ID; the idempotency key
    pub id: String,
    /// Event type
    pub event_type: PaymentEventType,
    /// Event data
    pub data: PaymentEventData,
    /// When the event was created (Unix timestamp)
    pub created: i64,
}

impl PaymentEvent {
    /// The processor customer reference the event concerns, if any
    pub fn customer_ref(&self) -> Option<&str> {
        match &self.data {
            PaymentEventData::CheckoutSession(d) => Some(&d.customer_ref),
            PaymentEventData::Subscription(d) => Some(&d.customer_ref),
            PaymentEventData::Invoice(d) => Some(&d.customer_ref),
            PaymentEventData::Raw(_) => None,
        }
    }
}

/// Webhook event data
#[derive(Debug, Clone)]
pub enum PaymentEventData {
    /// Checkout session data
    CheckoutSession(CheckoutSessionData),
    /// Subscription data
    Subscription(SubscriptionData),
    /// Invoice data
    Invoice(InvoiceData),
    /// Raw JSON for unknown events
    Raw(serde_json::Value),
}

/// Checkout session completed data
#[derive(Debug, Clone)]
pub struct CheckoutSessionData {
    /// Session ID
    pub session_id: String,
    /// Customer reference
    pub customer_ref: String,
    /// Subscription reference, once the processor created it
    pub subscription_ref: Option<String>,
}

/// Subscription event data
#[derive(Debug, Clone)]
pub struct SubscriptionData {
    /// Subscription reference
    pub subscription_ref: String,
    /// Customer reference
    pub customer_ref: String,
    /// Remote status string as the processor reports it
    pub remote_status: String,
    /// Current period end
    pub period_end: DateTime<Utc>,
    /// Whether it cancels at period end
    pub cancel_at_period_end: bool,
}

impl SubscriptionData {
    /// Whether the remote status still grants service
    pub fn remote_is_active(&self) -> bool {
        matches!(self.remote_status.as_str(), "active" | "trialing")
    }
}

/// Invoice event data
#[derive(Debug, Clone)]
pub struct InvoiceData {
    /// Invoice reference
    pub invoice_ref: String,
    /// Customer reference
    pub customer_ref: String,
    /// Subscription reference
    pub subscription_ref: Option<String>,
    /// Amount in cents
    pub amount_cents: i64,
    /// Billing period covered by the invoice
    pub period_end: DateTime<Utc>,
    /// How many collection attempts the processor has made
    pub attempt_count: i64,
    /// When the processor will retry, if it will
    pub next_payment_attempt: Option<DateTime<Utc>>,
}

/// Webhook handler for verifying and parsing processor events
#[derive(Clone)]
pub struct WebhookHandler {
    webhook_secret: String,
}

impl WebhookHandler {
    /// Create a new webhook handler
    pub fn new(webhook_secret: impl Into<String>) -> Self {
        Self {
            webhook_secret: webhook_secret.into(),
        }
    }

    /// Verify and parse a webhook payload
    #[instrument(skip(self, payload, signature))]
    pub fn verify_and_parse(
        &self,
        payload: &[u8],
        signature: &str,
    ) -> Result<PaymentEvent, BillingError> {
        self.verify_signature(payload, signature)?;

        let raw_event: RawPaymentEvent = serde_json::from_slice(payload)
            .map_err(|e| BillingError::WebhookError(e.to_string()))?;

        debug!(event_id = %raw_event.id, event_type = %raw_event.event_type, "Parsed webhook event");

        let event_type = PaymentEventType::from(raw_event.event_type.as_str());
        let data = Self::parse_event_data(&event_type, raw_event.data.object)?;

        Ok(PaymentEvent {
            id: raw_event.id,
            event_type,
            data,
            created: raw_event.created,
        })
    }

    /// Verify the webhook signature header: `t=timestamp,v1=signature`
    fn verify_signature(&self, payload: &[u8], signature: &str) -> Result<(), BillingError> {
        let mut timestamp: Option<&str> = None;
        let mut sig_v1: Option<&str> = None;

        for part in signature.split(',') {
            if let Some((key, value)) = part.split_once('=') {
                match key {
                    "t" => timestamp = Some(value),
                    "v1" => sig_v1 = Some(value),
                    _ => {}
                }
            }
        }

        let timestamp = timestamp.ok_or_else(|| {
            warn!("Missing timestamp in webhook signature");
            BillingError::WebhookError("Missing timestamp".to_string())
        })?;

        let sig_v1 = sig_v1.ok_or_else(|| {
            warn!("Missing v1 signature in webhook signature");
            BillingError::WebhookError("Missing signature".to_string())
        })?;

        let signed_payload = format!(
            "{}.{}",
            timestamp,
            std::str::from_utf8(payload)
                .map_err(|_| BillingError::WebhookError("Invalid payload encoding".to_string()))?
        );

        let mut mac = Hmac::<Sha256>::new_from_slice(self.webhook_secret.as_bytes())
            .map_err(|_| BillingError::Internal("HMAC error".to_string()))?;
        mac.update(signed_payload.as_bytes());
        let expected = hex::encode(mac.finalize().into_bytes());

        if !constant_time_eq(sig_v1.as_bytes(), expected.as_bytes()) {
            error!("Webhook signature verification failed");
            return Err(BillingError::WebhookError(
                "Signature verification failed".to_string(),
            ));
        }

        // Timestamp freshness: within 5 minutes either way.
        let ts: i64 = timestamp
            .parse()
            .map_err(|_| BillingError::WebhookError("Invalid timestamp format".to_string()))?;
        let now = Utc::now().timestamp();
        if (now - ts).abs() > 300 {
            warn!(timestamp = ts, now = now, "Webhook timestamp too old");
            return Err(BillingError::WebhookError("Timestamp too old".to_string()));
        }

        Ok(())
    }

    /// Parse event data based on type
    fn parse_event_data(
        event_type: &PaymentEventType,
        object: serde_json::Value,
    ) -> Result<PaymentEventData, BillingError> {
        match event_type {
            PaymentEventType::CheckoutCompleted => {
                let session: RawCheckoutSession = serde_json::from_value(object)
                    .map_err(|e| BillingError::WebhookError(e.to_string()))?;
                Ok(PaymentEventData::CheckoutSession(CheckoutSessionData {
                    session_id: session.id,
                    customer_ref: session.customer.unwrap_or_default(),
                    subscription_ref: session.subscription,
                }))
            }
            PaymentEventType::SubscriptionUpdated | PaymentEventType::SubscriptionCanceled => {
                let sub: StripeSubscription = serde_json::from_value(object)
                    .map_err(|e| BillingError::WebhookError(e.to_string()))?;
                Ok(PaymentEventData::Subscription(SubscriptionData {
                    subscription_ref: sub.id,
                    customer_ref: sub.customer,
                    remote_status: sub.status,
                    period_end: from_unix(sub.current_period_end)?,
                    cancel_at_period_end: sub.cancel_at_period_end,
                }))
            }
            PaymentEventType::InvoicePaid | PaymentEventType::InvoicePaymentFailed => {
                let inv: StripeInvoice = serde_json::from_value(object)
                    .map_err(|e| BillingError::WebhookError(e.to_string()))?;
                Ok(PaymentEventData::Invoice(InvoiceData {
                    invoice_ref: inv.id,
                    customer_ref: inv.customer,
                    subscription_ref: inv.subscription,
                    amount_cents: inv.amount_paid,
                    period_end: from_unix(inv.period_end)?,
                    attempt_count: inv.attempt_count,
                    next_payment_attempt: inv.next_payment_attempt.map(from_unix).transpose()?,
                }))
            }
            PaymentEventType::Unknown(_) => {
                info!("Received unknown webhook event type");
                Ok(PaymentEventData::Raw(object))
            }
        }
    }
}

fn from_unix(secs: i64) -> Result<DateTime<Utc>, BillingError> {
    DateTime::<Utc>::from_timestamp(secs, 0)
        .ok_or_else(|| BillingError::WebhookError(format!("invalid timestamp: {secs}")))
}

/// Constant-time comparison
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b.iter()).fold(0, |acc, (x, y)| acc | (x ^ y)) == 0
}

// Raw event envelope for parsing
#[derive(Debug, Deserialize)]
struct RawPaymentEvent {
    id: String,
    #[serde(rename = "type")]
    event_type: String,
    data: RawEventData,
    created: i64,
}

#[derive(Debug, Deserialize)]
struct RawEventData {
    object: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct RawCheckoutSession {
    id: String,
    customer: Option<String>,
    subscription: Option<String>,
}
