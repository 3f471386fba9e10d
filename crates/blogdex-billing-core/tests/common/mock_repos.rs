//! Mock repositories for testing
//!
//! Not every test binary touches every helper.
#![allow(dead_code)]

use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use uuid::Uuid;

use blogdex_db::{
    BillingRepository, BillingRow, BloggerRepository, BloggerRow, CreateBlogger, CreateSubmission,
    DbError, DbResult, DomainVerificationRow, SubmissionChange, SubmissionRepository,
    SubmissionRow, UpsertBillingRecord, VerificationRepository,
};
use blogdex_notify_core::{DispatchOutcome, Notifier};
use blogdex_types::NotificationTemplate;

/// In-memory submission repository mirroring the guarded-update semantics
/// of the Postgres implementation
#[derive(Default)]
pub struct MockSubmissionRepository {
    rows: DashMap<Uuid, SubmissionRow>,
    by_url: DashMap<String, Uuid>,
}

impl MockSubmissionRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a row directly
    pub fn insert(&self, row: SubmissionRow) {
        self.by_url.insert(row.post_url.clone(), row.id);
        self.rows.insert(row.id, row);
    }

    /// Build an approved submission row
    pub fn approved_row(
        blogger_id: Uuid,
        post_url: &str,
        active: bool,
        last_activated_at: Option<DateTime<Utc>>,
    ) -> SubmissionRow {
        SubmissionRow {
            id: Uuid::new_v4(),
            blogger_id,
            post_url: post_url.to_string(),
            status: "approved".to_string(),
            is_active: active,
            url_change_reason: None,
            submitted_at: Some(Utc::now()),
            reviewed_at: Some(Utc::now()),
            last_activated_at,
            revision: 2,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }
}

#[async_trait]
impl SubmissionRepository for MockSubmissionRepository {
    async fn find_by_id(&self, id: Uuid) -> DbResult<Option<SubmissionRow>> {
        Ok(self.rows.get(&id).map(|r| r.value().clone()))
    }

    async fn find_by_post_url(&self, post_url: &str) -> DbResult<Option<SubmissionRow>> {
        Ok(self
            .by_url
            .get(post_url)
            .and_then(|id| self.rows.get(id.value()).map(|r| r.value().clone())))
    }

    async fn list_by_blogger(&self, blogger_id: Uuid) -> DbResult<Vec<SubmissionRow>> {
        Ok(self
            .rows
            .iter()
            .filter(|r| r.blogger_id == blogger_id)
            .map(|r| r.value().clone())
            .collect())
    }

    async fn list_listed_by_blogger(&self, blogger_id: Uuid) -> DbResult<Vec<SubmissionRow>> {
        Ok(self
            .rows
            .iter()
            .filter(|r| r.blogger_id == blogger_id && r.status == "approved" && r.is_active)
            .map(|r| r.value().clone())
            .collect())
    }

    async fn count_listed(&self, blogger_id: Uuid) -> DbResult<i64> {
        Ok(self
            .rows
            .iter()
            .filter(|r| r.blogger_id == blogger_id && r.status == "approved" && r.is_active)
            .count() as i64)
    }

    async fn create(&self, sub: CreateSubmission) -> DbResult<SubmissionRow> {
        if self.by_url.contains_key(&sub.post_url) {
            return Err(DbError::UniqueViolation(sub.post_url));
        }
        let row = SubmissionRow {
            id: sub.id,
            blogger_id: sub.blogger_id,
            post_url: sub.post_url,
            status: sub.status,
            is_active: false,
            url_change_reason: None,
            submitted_at: sub.submitted_at,
            reviewed_at: None,
            last_activated_at: None,
            revision: 0,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        self.insert(row.clone());
        Ok(row)
    }

    async fn apply_transition(
        &self,
        id: Uuid,
        expected_status: &str,
        expected_revision: i32,
        change: SubmissionChange,
    ) -> DbResult<Option<SubmissionRow>> {
        // Uniqueness check first, as the database constraint would fire
        // before the row update commits.
        if let Some(new_url) = &change.post_url {
            if let Some(existing) = self.by_url.get(new_url) {
                if *existing.value() != id {
                    return Err(DbError::UniqueViolation(new_url.clone()));
                }
            }
        }

        let Some(mut row) = self.rows.get_mut(&id) else {
            return Ok(None);
        };
        if row.status != expected_status || row.revision != expected_revision {
            return Ok(None);
        }

        if let Some(status) = change.status {
            row.status = status;
        }
        if let Some(active) = change.is_active {
            row.is_active = active;
        }
        if let Some(post_url) = change.post_url {
            self.by_url.remove(&row.post_url);
            self.by_url.insert(post_url.clone(), id);
            row.post_url = post_url;
        }
        if let Some(reason) = change.url_change_reason {
            row.url_change_reason = Some(reason);
        }
        if let Some(at) = change.submitted_at {
            row.submitted_at = Some(at);
        }
        if let Some(at) = change.reviewed_at {
            row.reviewed_at = Some(at);
        }
        if let Some(at) = change.last_activated_at {
            row.last_activated_at = Some(at);
        }
        row.revision += 1;
        row.updated_at = Utc::now();

        Ok(Some(row.clone()))
    }
}

/// In-memory verification repository
#[derive(Default)]
pub struct MockVerificationRepository {
    rows: DashMap<Uuid, DomainVerificationRow>,
}

impl MockVerificationRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a verified domain for a blogger
    pub fn insert_verified(&self, blogger_id: Uuid, domain: &str) {
        self.rows.insert(
            blogger_id,
            DomainVerificationRow {
                blogger_id,
                domain: domain.to_string(),
                method: Some("dns_txt".to_string()),
                token: Some("blogdex-testtoken".to_string()),
                status: "verified".to_string(),
                verified_at: Some(Utc::now()),
                created_at: Utc::now(),
                updated_at: Utc::now(),
            },
        );
    }

    /// Seed a pending (unproven) domain for a blogger
    pub fn insert_pending(&self, blogger_id: Uuid, domain: &str) {
        self.rows.insert(
            blogger_id,
            DomainVerificationRow {
                blogger_id,
                domain: domain.to_string(),
                method: Some("dns_txt".to_string()),
                token: Some("blogdex-testtoken".to_string()),
                status: "pending".to_string(),
                verified_at: None,
                created_at: Utc::now(),
                updated_at: Utc::now(),
            },
        );
    }
}

#[async_trait]
impl VerificationRepository for MockVerificationRepository {
    async fn find_by_blogger_id(
        &self,
        blogger_id: Uuid,
    ) -> DbResult<Option<DomainVerificationRow>> {
        Ok(self.rows.get(&blogger_id).map(|r| r.value().clone()))
    }

    async fn reset_domain(
        &self,
        blogger_id: Uuid,
        domain: &str,
    ) -> DbResult<DomainVerificationRow> {
        let row = DomainVerificationRow {
            blogger_id,
            domain: domain.to_string(),
            method: None,
            token: None,
            status: "unverified".to_string(),
            verified_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        self.rows.insert(blogger_id, row.clone());
        Ok(row)
    }

    async fn set_challenge(&self, blogger_id: Uuid, method: &str, token: &str) -> DbResult<()> {
        if let Some(mut row) = self.rows.get_mut(&blogger_id) {
            row.method = Some(method.to_string());
            row.token = Some(token.to_string());
            row.status = "pending".to_string();
        }
        Ok(())
    }

    async fn mark_verified(&self, blogger_id: Uuid) -> DbResult<()> {
        if let Some(mut row) = self.rows.get_mut(&blogger_id) {
            row.status = "verified".to_string();
            row.verified_at = Some(Utc::now());
        }
        Ok(())
    }
}

/// In-memory billing repository with the applied-event ledger
#[derive(Default)]
pub struct MockBillingRepository {
    rows: DashMap<Uuid, BillingRow>,
    applied_events: DashMap<String, Uuid>,
}

impl MockBillingRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an active pro billing record
    pub fn insert_active(&self, blogger_id: Uuid, period_end: DateTime<Utc>) {
        self.rows.insert(
            blogger_id,
            BillingRow {
                blogger_id,
                status: "active".to_string(),
                period_end,
                failure_notice_stage: "none".to_string(),
                customer_ref: format!("cus_{blogger_id}"),
                subscription_ref: Some(format!("sub_{blogger_id}")),
                created_at: Utc::now(),
                updated_at: Utc::now(),
            },
        );
    }

    /// Read a record back for assertions
    pub fn get(&self, blogger_id: Uuid) -> Option<BillingRow> {
        self.rows.get(&blogger_id).map(|r| r.value().clone())
    }
}

#[async_trait]
impl BillingRepository for MockBillingRepository {
    async fn find_by_blogger_id(&self, blogger_id: Uuid) -> DbResult<Option<BillingRow>> {
        Ok(self.rows.get(&blogger_id).map(|r| r.value().clone()))
    }

    async fn upsert(&self, rec: UpsertBillingRecord) -> DbResult<BillingRow> {
        let row = BillingRow {
            blogger_id: rec.blogger_id,
            status: rec.status,
            period_end: rec.period_end,
            failure_notice_stage: rec.failure_notice_stage,
            customer_ref: rec.customer_ref,
            subscription_ref: rec.subscription_ref,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        self.rows.insert(rec.blogger_id, row.clone());
        Ok(row)
    }

    async fn update_status(
        &self,
        blogger_id: Uuid,
        status: &str,
        period_end: Option<DateTime<Utc>>,
        failure_notice_stage: &str,
    ) -> DbResult<()> {
        if let Some(mut row) = self.rows.get_mut(&blogger_id) {
            row.status = status.to_string();
            if let Some(end) = period_end {
                row.period_end = end;
            }
            row.failure_notice_stage = failure_notice_stage.to_string();
            row.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn record_event(
        &self,
        event_id: &str,
        blogger_id: Uuid,
        _event_type: &str,
    ) -> DbResult<bool> {
        if self.applied_events.contains_key(event_id) {
            return Ok(false);
        }
        self.applied_events.insert(event_id.to_string(), blogger_id);
        Ok(true)
    }
}

/// In-memory blogger repository
#[derive(Default)]
pub struct MockBloggerRepository {
    rows: DashMap<Uuid, BloggerRow>,
    by_customer_ref: DashMap<String, Uuid>,
}

impl MockBloggerRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a test blogger, returning their id
    pub fn insert_blogger(&self, email: &str) -> Uuid {
        let id = Uuid::new_v4();
        self.rows.insert(
            id,
            BloggerRow {
                id,
                email: email.to_string(),
                display_name: "Test Blogger".to_string(),
                declared_blog_url: None,
                customer_ref: None,
                created_at: Utc::now(),
                updated_at: Utc::now(),
            },
        );
        id
    }
}

#[async_trait]
impl BloggerRepository for MockBloggerRepository {
    async fn find_by_id(&self, id: Uuid) -> DbResult<Option<BloggerRow>> {
        Ok(self.rows.get(&id).map(|r| r.value().clone()))
    }

    async fn find_by_customer_ref(&self, customer_ref: &str) -> DbResult<Option<BloggerRow>> {
        Ok(self
            .by_customer_ref
            .get(customer_ref)
            .and_then(|id| self.rows.get(id.value()).map(|r| r.value().clone())))
    }

    async fn create(&self, blogger: CreateBlogger) -> DbResult<BloggerRow> {
        let row = BloggerRow {
            id: blogger.id,
            email: blogger.email,
            display_name: blogger.display_name,
            declared_blog_url: None,
            customer_ref: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        self.rows.insert(row.id, row.clone());
        Ok(row)
    }

    async fn set_declared_blog_url(&self, id: Uuid, url: &str) -> DbResult<()> {
        if let Some(mut row) = self.rows.get_mut(&id) {
            row.declared_blog_url = Some(url.to_string());
        }
        Ok(())
    }

    async fn set_customer_ref(&self, id: Uuid, customer_ref: &str) -> DbResult<()> {
        if let Some(mut row) = self.rows.get_mut(&id) {
            row.customer_ref = Some(customer_ref.to_string());
        }
        self.by_customer_ref.insert(customer_ref.to_string(), id);
        Ok(())
    }
}

impl MockBloggerRepository {
    /// Attach a processor customer reference to an existing blogger
    pub fn link_customer(&self, id: Uuid, customer_ref: &str) {
        if let Some(mut row) = self.rows.get_mut(&id) {
            row.customer_ref = Some(customer_ref.to_string());
        }
        self.by_customer_ref.insert(customer_ref.to_string(), id);
    }
}

/// Notifier that records every dispatched message
#[derive(Default)]
pub struct RecordingNotifier {
    /// (transition_key, recipient, template_id)
    pub sent: Mutex<Vec<(String, String, String)>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// All recorded template ids, in dispatch order
    pub fn template_ids(&self) -> Vec<String> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .map(|(_, _, t)| t.clone())
            .collect()
    }

    /// How many messages were dispatched with this template id
    pub fn count_of(&self, template_id: &str) -> usize {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .filter(|(_, _, t)| t == template_id)
            .count()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(
        &self,
        transition_key: &str,
        recipient: &str,
        template: &NotificationTemplate,
    ) -> DispatchOutcome {
        let mut sent = self.sent.lock().unwrap();
        // Mirror the real dispatcher's ledger: one message per key.
        if sent.iter().any(|(k, _, _)| k == transition_key) {
            return DispatchOutcome::AlreadyDispatched;
        }
        sent.push((
            transition_key.to_string(),
            recipient.to_string(),
            template.template_id().to_string(),
        ));
        DispatchOutcome::Sent
    }
}

/// Payment provider returning canned sessions
#[derive(Default)]
pub struct MockProvider {
    pub customers_created: Mutex<Vec<String>>,
}

#[async_trait]
impl blogdex_billing_core::PaymentProvider for MockProvider {
    async fn create_customer(
        &self,
        email: &str,
    ) -> Result<String, blogdex_billing_core::BillingError> {
        let customer_ref = format!("cus_{}", self.customers_created.lock().unwrap().len() + 1);
        self.customers_created.lock().unwrap().push(email.to_string());
        Ok(customer_ref)
    }

    async fn create_checkout_session(
        &self,
        customer_ref: &str,
        _success_url: &str,
        _cancel_url: &str,
    ) -> Result<blogdex_types::CheckoutSession, blogdex_billing_core::BillingError> {
        Ok(blogdex_types::CheckoutSession {
            session_id: format!("cs_{customer_ref}"),
            url: "https://checkout.example.com/session".to_string(),
        })
    }

    async fn create_portal_session(
        &self,
        _customer_ref: &str,
        _return_url: &str,
    ) -> Result<blogdex_types::PortalSession, blogdex_billing_core::BillingError> {
        Ok(blogdex_types::PortalSession {
            url: "https://billing.example.com/portal".to_string(),
        })
    }
}
