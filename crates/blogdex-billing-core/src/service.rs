//! Subscription lifecycle - applies payment events
//!
//! Transitions are idempotent under replay: every event carries an external
//! id that is recorded in the applied-event ledger under the blogger's lock
//! before anything else happens. Downgrade enforcement and notification
//! dispatch run after the billing mutation commits and the lock is
//! released; the per-transition notification keys keep them at-most-once.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use blogdex_db::{
    BillingRepository, BloggerRepository, SubmissionRepository, UpsertBillingRecord,
    VerificationRepository,
};
use blogdex_listing_core::{BloggerLocks, ListingService};
use blogdex_notify_core::Notifier;
use blogdex_types::{
    BillingStatus, BloggerId, CheckoutSession, FailureNoticeStage, NotificationTemplate,
    PortalSession, Tier,
};

use crate::config::BillingConfig;
use crate::error::BillingError;
use crate::provider::PaymentProvider;
use crate::webhook::{PaymentEvent, PaymentEventData, PaymentEventType, WebhookHandler};

/// Subscription lifecycle service
pub struct SubscriptionLifecycle<S, V, B, R>
where
    S: SubmissionRepository,
    V: VerificationRepository,
    B: BillingRepository,
    R: BloggerRepository,
{
    billing: Arc<B>,
    bloggers: Arc<R>,
    listing: ListingService<S, V, B, R>,
    provider: Arc<dyn PaymentProvider>,
    notifier: Arc<dyn Notifier>,
    webhook: WebhookHandler,
    locks: BloggerLocks,
    config: BillingConfig,
}

impl<S, V, B, R> SubscriptionLifecycle<S, V, B, R>
where
    S: SubmissionRepository,
    V: VerificationRepository,
    B: BillingRepository,
    R: BloggerRepository,
{
    /// Create a new subscription lifecycle.
    ///
    /// `locks` must be the registry shared with the listing service.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        billing: Arc<B>,
        bloggers: Arc<R>,
        listing: ListingService<S, V, B, R>,
        provider: Arc<dyn PaymentProvider>,
        notifier: Arc<dyn Notifier>,
        locks: BloggerLocks,
        config: BillingConfig,
    ) -> Self {
        Self {
            billing,
            bloggers,
            listing,
            provider,
            notifier,
            webhook: WebhookHandler::new(config.webhook_secret.clone()),
            locks,
            config,
        }
    }

    // =========================================================================
    // Webhook processing
    // =========================================================================

    /// Verify, parse, and apply one webhook payload.
    #[instrument(skip(self, payload, signature))]
    pub async fn process_webhook(
        &self,
        payload: &[u8],
        signature: &str,
    ) -> Result<(), BillingError> {
        let event = self.webhook.verify_and_parse(payload, signature)?;
        self.apply_event(event).await
    }

    /// Apply one parsed payment event.
    #[instrument(skip(self, event), fields(event_id = %event.id))]
    pub async fn apply_event(&self, event: PaymentEvent) -> Result<(), BillingError> {
        let Some(customer_ref) = event.customer_ref() else {
            info!(event_type = ?event.event_type, "Event carries no customer, acknowledging");
            return Ok(());
        };

        let Some(blogger) = self.bloggers.find_by_customer_ref(customer_ref).await? else {
            // Not a customer of this directory (or deleted); acknowledging
            // stops the processor from retrying forever.
            warn!(customer_ref = %customer_ref, "Event for unknown customer, acknowledging");
            return Ok(());
        };
        let blogger_id = blogger.id;
        let recipient = blogger.email;

        let mut notifications: Vec<NotificationTemplate> = Vec::new();
        let mut enforce_downgrade = false;

        {
            let _guard = self.locks.acquire(blogger_id).await;

            // The ledger insert is the idempotency gate: a replayed event id
            // stops here, before any state or notification effect.
            if !self
                .billing
                .record_event(&event.id, blogger_id, event.event_type.as_str())
                .await?
            {
                info!(event_id = %event.id, "Event already applied, replay is a no-op");
                return Ok(());
            }

            match (&event.event_type, &event.data) {
                (PaymentEventType::CheckoutCompleted, PaymentEventData::CheckoutSession(data)) => {
                    // The first subscription event will carry the real period
                    // end; until then the checkout timestamp plus one cycle
                    // stands in.
                    let period_end = from_unix_or_now(event.created) + Duration::days(30);
                    self.billing
                        .upsert(UpsertBillingRecord {
                            blogger_id,
                            status: BillingStatus::Active.to_string(),
                            period_end,
                            failure_notice_stage: FailureNoticeStage::None.to_string(),
                            customer_ref: data.customer_ref.clone(),
                            subscription_ref: data.subscription_ref.clone(),
                        })
                        .await?;

                    info!(blogger_id = %blogger_id, "Checkout completed, subscription active");
                    notifications.push(NotificationTemplate::Welcome);
                }

                (PaymentEventType::InvoicePaid, PaymentEventData::Invoice(data)) => {
                    match self.current_status(blogger_id).await? {
                        Some(BillingStatus::Active) | Some(BillingStatus::PastDue) => {
                            self.billing
                                .update_status(
                                    blogger_id,
                                    &BillingStatus::Active.to_string(),
                                    Some(data.period_end),
                                    &FailureNoticeStage::None.to_string(),
                                )
                                .await?;
                            info!(blogger_id = %blogger_id, "Invoice paid, subscription active");
                            notifications.push(NotificationTemplate::PaymentSucceeded {
                                period_end: data.period_end,
                            });
                        }
                        Some(BillingStatus::Canceled) | None => {
                            warn!(blogger_id = %blogger_id, "Invoice paid without a live record, ignoring");
                        }
                    }
                }

                (PaymentEventType::InvoicePaymentFailed, PaymentEventData::Invoice(data)) => {
                    let Some(record) = self.billing.find_by_blogger_id(blogger_id).await? else {
                        warn!(blogger_id = %blogger_id, "Payment failure without a record, ignoring");
                        return Ok(());
                    };
                    let record = record.to_domain()?;

                    let stage = if data.attempt_count <= 1 {
                        notifications.push(NotificationTemplate::PaymentRetry {
                            retry_at: data.next_payment_attempt,
                        });
                        FailureNoticeStage::First
                    } else {
                        notifications.push(NotificationTemplate::FinalNotice {
                            downgrade_at: record.period_end + self.config.grace_period,
                        });
                        FailureNoticeStage::Final
                    };

                    self.billing
                        .update_status(
                            blogger_id,
                            &BillingStatus::PastDue.to_string(),
                            None,
                            &stage.to_string(),
                        )
                        .await?;
                    info!(
                        blogger_id = %blogger_id,
                        attempt = data.attempt_count,
                        stage = %stage,
                        "Invoice payment failed"
                    );
                }

                (PaymentEventType::SubscriptionUpdated, PaymentEventData::Subscription(data))
                    if data.remote_is_active() =>
                {
                    if self.current_status(blogger_id).await?.is_some() {
                        self.billing
                            .update_status(
                                blogger_id,
                                &BillingStatus::Active.to_string(),
                                Some(data.period_end),
                                &FailureNoticeStage::None.to_string(),
                            )
                            .await?;
                        info!(blogger_id = %blogger_id, "Subscription period refreshed");
                    }
                }

                (
                    PaymentEventType::SubscriptionUpdated | PaymentEventType::SubscriptionCanceled,
                    PaymentEventData::Subscription(_),
                ) => {
                    if self.current_status(blogger_id).await?.is_some() {
                        self.billing
                            .update_status(
                                blogger_id,
                                &BillingStatus::Canceled.to_string(),
                                None,
                                &FailureNoticeStage::None.to_string(),
                            )
                            .await?;
                        info!(blogger_id = %blogger_id, "Subscription canceled, tier drops to free");
                        enforce_downgrade = true;
                    }
                }

                (PaymentEventType::Unknown(name), _) => {
                    info!(event_type = %name, "Ignoring unhandled event type");
                }

                (event_type, _) => {
                    warn!(event_type = ?event_type, "Event data did not match its type, ignoring");
                }
            }
        }

        // The blogger lock is released: quota enforcement re-acquires it
        // itself, and notification dispatch must never run under it.
        if enforce_downgrade {
            let count = self
                .listing
                .enforce_quota(BloggerId(blogger_id), Tier::Free.active_post_quota())
                .await?;
            if count > 0 {
                notifications.push(NotificationTemplate::PostsDelisted { count });
            }
        }

        for template in notifications {
            let key = format!("billing:{}:{}", event.id, template.template_id());
            self.notifier.notify(&key, &recipient, &template).await;
        }

        Ok(())
    }

    // =========================================================================
    // Checkout and portal
    // =========================================================================

    /// Open a checkout session for the pro subscription, creating the
    /// processor customer on first use.
    #[instrument(skip(self))]
    pub async fn create_checkout(
        &self,
        blogger_id: BloggerId,
        success_url: Option<&str>,
        cancel_url: Option<&str>,
    ) -> Result<CheckoutSession, BillingError> {
        let customer_ref = self.ensure_customer(blogger_id.0).await?;

        self.provider
            .create_checkout_session(
                &customer_ref,
                success_url.unwrap_or(&self.config.default_success_url),
                cancel_url.unwrap_or(&self.config.default_cancel_url),
            )
            .await
    }

    /// Open a billing-management portal session.
    #[instrument(skip(self))]
    pub async fn create_portal(
        &self,
        blogger_id: BloggerId,
        return_url: Option<&str>,
    ) -> Result<PortalSession, BillingError> {
        let customer_ref = self.ensure_customer(blogger_id.0).await?;

        self.provider
            .create_portal_session(
                &customer_ref,
                return_url.unwrap_or(&self.config.default_portal_return_url),
            )
            .await
    }

    // =========================================================================
    // Internals
    // =========================================================================

    async fn current_status(&self, blogger_id: Uuid) -> Result<Option<BillingStatus>, BillingError> {
        Ok(match self.billing.find_by_blogger_id(blogger_id).await? {
            Some(row) => Some(row.to_domain()?.status),
            None => None,
        })
    }

    async fn ensure_customer(&self, blogger_id: Uuid) -> Result<String, BillingError> {
        let blogger = self
            .bloggers
            .find_by_id(blogger_id)
            .await?
            .ok_or(BillingError::BloggerNotFound)?;

        if let Some(customer_ref) = blogger.customer_ref {
            return Ok(customer_ref);
        }

        let customer_ref = self.provider.create_customer(&blogger.email).await?;
        self.bloggers
            .set_customer_ref(blogger_id, &customer_ref)
            .await?;
        info!(blogger_id = %blogger_id, "Created processor customer");

        Ok(customer_ref)
    }
}

fn from_unix_or_now(secs: i64) -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp(secs, 0).unwrap_or_else(Utc::now)
}

impl<S, V, B, R> Clone for SubscriptionLifecycle<S, V, B, R>
where
    S: SubmissionRepository,
    V: VerificationRepository,
    B: BillingRepository,
    R: BloggerRepository,
{
    fn clone(&self) -> Self {
        Self {
            billing: Arc::clone(&self.billing),
            bloggers: Arc::clone(&self.bloggers),
            listing: self.listing.clone(),
            provider: Arc::clone(&self.provider),
            notifier: Arc::clone(&self.notifier),
            webhook: self.webhook.clone(),
            locks: self.locks.clone(),
            config: self.config.clone(),
        }
    }
}

impl<S, V, B, R> std::fmt::Debug for SubscriptionLifecycle<S, V, B, R>
where
    S: SubmissionRepository,
    V: VerificationRepository,
    B: BillingRepository,
    R: BloggerRepository,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubscriptionLifecycle").finish()
    }
}
