//! Transition-keyed dispatch

use std::sync::Arc;

use tracing::{error, info, warn};

use blogdex_db::{CreateNotification, NotificationRepository};
use blogdex_types::NotificationTemplate;

use crate::transport::EmailTransport;

/// Result of a dispatch attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Message handed to the transport
    Sent,
    /// This transition key was already dispatched; nothing sent
    AlreadyDispatched,
    /// Delivery failed; recorded for manual resend
    Failed,
}

/// Object-safe dispatch interface consumed by the lifecycle services
#[async_trait::async_trait]
pub trait Notifier: Send + Sync {
    /// Dispatch one notification for a transition
    async fn notify(
        &self,
        transition_key: &str,
        recipient: &str,
        template: &NotificationTemplate,
    ) -> DispatchOutcome;
}

/// Notification dispatcher
///
/// Claims the transition key in the ledger before touching the transport,
/// so a replayed transition can never produce a second message.
pub struct Dispatcher<N: NotificationRepository, T: EmailTransport> {
    ledger: Arc<N>,
    transport: Arc<T>,
}

impl<N: NotificationRepository, T: EmailTransport> Dispatcher<N, T> {
    /// Create a new dispatcher
    pub fn new(ledger: Arc<N>, transport: Arc<T>) -> Self {
        Self { ledger, transport }
    }

    /// Dispatch one notification for the transition identified by
    /// `transition_key`.
    ///
    /// Never propagates delivery errors: the lifecycle state is the source
    /// of truth, and a failed send must not unwind the transition that
    /// triggered it.
    pub async fn dispatch(
        &self,
        transition_key: &str,
        recipient: &str,
        template: &NotificationTemplate,
    ) -> DispatchOutcome {
        let claim = self
            .ledger
            .begin_dispatch(CreateNotification {
                transition_key: transition_key.to_string(),
                recipient: recipient.to_string(),
                template_id: template.template_id().to_string(),
                payload: template.payload(),
            })
            .await;

        match claim {
            Ok(true) => {}
            Ok(false) => {
                info!(key = %transition_key, "Transition already notified, skipping");
                return DispatchOutcome::AlreadyDispatched;
            }
            Err(e) => {
                // Without a claimed ledger row the at-most-once guarantee is
                // gone, so do not send.
                error!(key = %transition_key, error = %e, "Failed to claim notification ledger row");
                return DispatchOutcome::Failed;
            }
        }

        match self
            .transport
            .send(recipient, template.template_id(), &template.payload())
            .await
        {
            Ok(()) => {
                if let Err(e) = self.ledger.mark_sent(transition_key).await {
                    error!(key = %transition_key, error = %e, "Failed to mark notification sent");
                }
                DispatchOutcome::Sent
            }
            Err(e) => {
                warn!(key = %transition_key, error = %e, "Notification delivery failed");
                if let Err(e) = self
                    .ledger
                    .mark_failed(transition_key, &e.to_string())
                    .await
                {
                    error!(key = %transition_key, error = %e, "Failed to mark notification failed");
                }
                DispatchOutcome::Failed
            }
        }
    }
}

#[async_trait::async_trait]
impl<N: NotificationRepository, T: EmailTransport> Notifier for Dispatcher<N, T> {
    async fn notify(
        &self,
        transition_key: &str,
        recipient: &str,
        template: &NotificationTemplate,
    ) -> DispatchOutcome {
        self.dispatch(transition_key, recipient, template).await
    }
}

impl<N: NotificationRepository, T: EmailTransport> Clone for Dispatcher<N, T> {
    fn clone(&self) -> Self {
        Self {
            ledger: Arc::clone(&self.ledger),
            transport: Arc::clone(&self.transport),
        }
    }
}

impl<N: NotificationRepository, T: EmailTransport> std::fmt::Debug for Dispatcher<N, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher").finish()
    }
}
