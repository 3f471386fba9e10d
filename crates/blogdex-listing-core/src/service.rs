//! Listing service - the submission state machine
//!
//! Every operation here runs under the owning blogger's lock and applies
//! its transition through a guarded update (expected status + revision).
//! A guard miss means a concurrent writer got there first; the operation
//! re-reads fresh state and retries once before surfacing
//! [`ListingError::TransitionConflict`]. Notifications are dispatched after
//! the lock is released; the committed transition is the source of truth.

use std::sync::Arc;

use chrono::{Duration, Utc};
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use blogdex_db::{
    BillingRepository, BloggerRepository, CreateSubmission, SubmissionChange, SubmissionRepository,
    SubmissionRow, VerificationRepository,
};
use blogdex_notify_core::Notifier;
use blogdex_types::{
    BloggerId, NotificationTemplate, Quota, ReviewDecision, Submission, SubmissionId,
    SubmissionStatus, Tier, VerificationStatus,
};
use blogdex_verify_core::url_matches_verified_domain;

use crate::entitlement::select_deactivations;
use crate::error::ListingError;
use crate::locks::BloggerLocks;

/// Submission lifecycle service
pub struct ListingService<S, V, B, R>
where
    S: SubmissionRepository,
    V: VerificationRepository,
    B: BillingRepository,
    R: BloggerRepository,
{
    submissions: Arc<S>,
    verifications: Arc<V>,
    billing: Arc<B>,
    bloggers: Arc<R>,
    notifier: Arc<dyn Notifier>,
    locks: BloggerLocks,
    grace: Duration,
}

impl<S, V, B, R> ListingService<S, V, B, R>
where
    S: SubmissionRepository,
    V: VerificationRepository,
    B: BillingRepository,
    R: BloggerRepository,
{
    /// Create a new listing service.
    ///
    /// `locks` must be the same registry the subscription lifecycle uses,
    /// and `grace` the same grace period its config carries, so both sides
    /// serialize and derive tiers identically.
    pub fn new(
        submissions: Arc<S>,
        verifications: Arc<V>,
        billing: Arc<B>,
        bloggers: Arc<R>,
        notifier: Arc<dyn Notifier>,
        locks: BloggerLocks,
        grace: Duration,
    ) -> Self {
        Self {
            submissions,
            verifications,
            billing,
            bloggers,
            notifier,
            locks,
            grace,
        }
    }

    // =========================================================================
    // Creation and submission
    // =========================================================================

    /// Create a draft submission. Drafts carry no guards beyond the global
    /// URL uniqueness constraint.
    #[instrument(skip(self))]
    pub async fn create_draft(
        &self,
        blogger_id: BloggerId,
        post_url: &str,
    ) -> Result<Submission, ListingError> {
        let row = self
            .create_row(blogger_id, post_url, SubmissionStatus::Draft)
            .await?;
        Ok(row.to_domain()?)
    }

    /// Submit a new post URL directly for review.
    #[instrument(skip(self))]
    pub async fn submit(
        &self,
        blogger_id: BloggerId,
        post_url: &str,
    ) -> Result<Submission, ListingError> {
        let submission = {
            let _guard = self.locks.acquire(blogger_id.0).await;

            self.ensure_url_allowed(blogger_id.0, post_url, None)
                .await?;
            self.create_row(blogger_id, post_url, SubmissionStatus::Pending)
                .await?
                .to_domain()?
        };

        info!(submission_id = %submission.id, blogger_id = %blogger_id, "Submission received");
        self.notify_submission(
            &submission,
            "submitted",
            NotificationTemplate::SubmissionReceived {
                post_url: submission.post_url.clone(),
            },
        )
        .await;

        Ok(submission)
    }

    /// Submit an existing draft for review. Submitting an already-pending
    /// submission is a no-op.
    #[instrument(skip(self))]
    pub async fn submit_draft(
        &self,
        submission_id: SubmissionId,
    ) -> Result<Submission, ListingError> {
        let initial = self.fetch(submission_id).await?;

        let (submission, transitioned) = {
            let _guard = self.locks.acquire(initial.blogger_id).await;
            let mut outcome = None;

            for _attempt in 0..2 {
                let row = self.fetch(submission_id).await?;
                match parse_status(&row)? {
                    SubmissionStatus::Pending => {
                        outcome = Some((row.to_domain()?, false));
                        break;
                    }
                    SubmissionStatus::Draft => {}
                    other => {
                        return Err(ListingError::InvalidState(format!(
                            "cannot submit a {other} submission"
                        )))
                    }
                }

                self.ensure_url_allowed(row.blogger_id, &row.post_url, Some(row.id))
                    .await?;

                let change = SubmissionChange {
                    status: Some(SubmissionStatus::Pending.to_string()),
                    submitted_at: Some(Utc::now()),
                    ..Default::default()
                };
                if let Some(updated) = self
                    .submissions
                    .apply_transition(row.id, &row.status, row.revision, change)
                    .await?
                {
                    outcome = Some((updated.to_domain()?, true));
                    break;
                }

                warn!(submission_id = %submission_id, "Submit lost a race, retrying with fresh state");
            }

            outcome.ok_or(ListingError::TransitionConflict)?
        };

        if transitioned {
            self.notify_submission(
                &submission,
                "submitted",
                NotificationTemplate::SubmissionReceived {
                    post_url: submission.post_url.clone(),
                },
            )
            .await;
        }

        Ok(submission)
    }

    // =========================================================================
    // Review
    // =========================================================================

    /// Apply a reviewer's decision to a pending submission.
    #[instrument(skip(self))]
    pub async fn review(
        &self,
        submission_id: SubmissionId,
        decision: ReviewDecision,
    ) -> Result<Submission, ListingError> {
        let initial = self.fetch(submission_id).await?;

        let submission = {
            let _guard = self.locks.acquire(initial.blogger_id).await;
            let mut outcome = None;

            for _attempt in 0..2 {
                let row = self.fetch(submission_id).await?;
                let status = parse_status(&row)?;
                if status != SubmissionStatus::Pending {
                    return Err(ListingError::InvalidState(format!(
                        "cannot review a {status} submission"
                    )));
                }

                let new_status = match &decision {
                    ReviewDecision::Approve => SubmissionStatus::Approved,
                    ReviewDecision::Reject { .. } => SubmissionStatus::Rejected,
                };

                let change = SubmissionChange {
                    status: Some(new_status.to_string()),
                    is_active: Some(false),
                    reviewed_at: Some(Utc::now()),
                    ..Default::default()
                };
                if let Some(updated) = self
                    .submissions
                    .apply_transition(row.id, &row.status, row.revision, change)
                    .await?
                {
                    outcome = Some(updated.to_domain()?);
                    break;
                }

                warn!(submission_id = %submission_id, "Review lost a race, retrying with fresh state");
            }

            outcome.ok_or(ListingError::TransitionConflict)?
        };

        let (event, template) = match &decision {
            ReviewDecision::Approve => (
                "approved",
                NotificationTemplate::SubmissionApproved {
                    post_url: submission.post_url.clone(),
                },
            ),
            ReviewDecision::Reject { reason } => (
                "rejected",
                NotificationTemplate::SubmissionRejected {
                    post_url: submission.post_url.clone(),
                    reason: reason.clone(),
                },
            ),
        };
        info!(submission_id = %submission_id, outcome = event, "Submission reviewed");
        self.notify_submission(&submission, event, template).await;

        Ok(submission)
    }

    // =========================================================================
    // URL changes
    // =========================================================================

    /// Change a submission's URL.
    ///
    /// Editing to the identical URL is a no-op with no transition. On an
    /// approved submission the change re-enters review: status drops to
    /// pending, the activity flag clears, and `reason` is recorded.
    #[instrument(skip(self))]
    pub async fn change_url(
        &self,
        submission_id: SubmissionId,
        new_url: &str,
        reason: Option<&str>,
    ) -> Result<Submission, ListingError> {
        let initial = self.fetch(submission_id).await?;

        let (submission, notification) = {
            let _guard = self.locks.acquire(initial.blogger_id).await;
            let mut outcome = None;

            for _attempt in 0..2 {
                let row = self.fetch(submission_id).await?;
                if row.post_url == new_url {
                    outcome = Some((row.to_domain()?, None));
                    break;
                }

                let status = parse_status(&row)?;
                let change = match status {
                    SubmissionStatus::Rejected => {
                        return Err(ListingError::InvalidState(
                            "cannot change the URL of a rejected submission".to_string(),
                        ))
                    }
                    SubmissionStatus::Approved => {
                        let reason = reason.ok_or(ListingError::ReasonRequired)?;
                        self.ensure_url_allowed(row.blogger_id, new_url, Some(row.id))
                            .await?;
                        SubmissionChange {
                            status: Some(SubmissionStatus::Pending.to_string()),
                            is_active: Some(false),
                            post_url: Some(new_url.to_string()),
                            url_change_reason: Some(reason.to_string()),
                            ..Default::default()
                        }
                    }
                    SubmissionStatus::Draft | SubmissionStatus::Pending => {
                        self.ensure_url_allowed(row.blogger_id, new_url, Some(row.id))
                            .await?;
                        SubmissionChange {
                            post_url: Some(new_url.to_string()),
                            ..Default::default()
                        }
                    }
                };

                let was_approved = status == SubmissionStatus::Approved;
                let old_url = row.post_url.clone();

                let applied = self
                    .submissions
                    .apply_transition(row.id, &row.status, row.revision, change)
                    .await;
                match applied {
                    Ok(Some(updated)) => {
                        let updated = updated.to_domain()?;
                        let notification = was_approved.then(|| NotificationTemplate::UrlChanged {
                            old_url,
                            new_url: updated.post_url.clone(),
                        });
                        outcome = Some((updated, notification));
                        break;
                    }
                    Ok(None) => {
                        warn!(submission_id = %submission_id, "URL change lost a race, retrying with fresh state");
                    }
                    // The unique index is the backstop for a URL race that
                    // slips past the pre-check.
                    Err(e) if e.is_unique_violation() => return Err(ListingError::DuplicateUrl),
                    Err(e) => return Err(e.into()),
                }
            }

            outcome.ok_or(ListingError::TransitionConflict)?
        };

        if let Some(template) = notification {
            info!(
                submission_id = %submission_id,
                "URL changed on approved submission, re-entering review"
            );
            self.notify_submission(&submission, "url_changed", template)
                .await;
        }

        Ok(submission)
    }

    // =========================================================================
    // Activation
    // =========================================================================

    /// Activate an approved submission, subject to the blogger's quota.
    /// Activating an already-active submission is a no-op.
    #[instrument(skip(self))]
    pub async fn activate(&self, submission_id: SubmissionId) -> Result<Submission, ListingError> {
        let initial = self.fetch(submission_id).await?;
        let _guard = self.locks.acquire(initial.blogger_id).await;

        for _attempt in 0..2 {
            let row = self.fetch(submission_id).await?;
            let status = parse_status(&row)?;
            if status != SubmissionStatus::Approved {
                return Err(ListingError::InvalidState(format!(
                    "cannot activate a {status} submission"
                )));
            }
            if row.is_active {
                return Ok(row.to_domain()?);
            }

            // Recounted under the blogger lock, so the check cannot race
            // another activation for the same blogger.
            let quota = self.current_quota(row.blogger_id).await?;
            let active = self.submissions.count_listed(row.blogger_id).await? as u32;
            if quota.exceeded_by(active + 1) {
                return Err(ListingError::QuotaExceeded);
            }

            let change = SubmissionChange {
                is_active: Some(true),
                last_activated_at: Some(Utc::now()),
                ..Default::default()
            };
            if let Some(updated) = self
                .submissions
                .apply_transition(row.id, &row.status, row.revision, change)
                .await?
            {
                info!(submission_id = %submission_id, "Submission activated");
                return Ok(updated.to_domain()?);
            }

            warn!(submission_id = %submission_id, "Activate lost a race, retrying with fresh state");
        }

        Err(ListingError::TransitionConflict)
    }

    /// Deactivate an approved submission. Deactivating an inactive
    /// submission is a no-op.
    #[instrument(skip(self))]
    pub async fn deactivate(
        &self,
        submission_id: SubmissionId,
    ) -> Result<Submission, ListingError> {
        let initial = self.fetch(submission_id).await?;
        let _guard = self.locks.acquire(initial.blogger_id).await;

        for _attempt in 0..2 {
            let row = self.fetch(submission_id).await?;
            let status = parse_status(&row)?;
            if status != SubmissionStatus::Approved {
                return Err(ListingError::InvalidState(format!(
                    "cannot deactivate a {status} submission"
                )));
            }
            if !row.is_active {
                return Ok(row.to_domain()?);
            }

            let change = SubmissionChange {
                is_active: Some(false),
                ..Default::default()
            };
            if let Some(updated) = self
                .submissions
                .apply_transition(row.id, &row.status, row.revision, change)
                .await?
            {
                info!(submission_id = %submission_id, "Submission deactivated");
                return Ok(updated.to_domain()?);
            }

            warn!(submission_id = %submission_id, "Deactivate lost a race, retrying with fresh state");
        }

        Err(ListingError::TransitionConflict)
    }

    // =========================================================================
    // Quota enforcement
    // =========================================================================

    /// Deactivate just enough submissions for the blogger's active count to
    /// fit `new_quota`, using the deterministic selection policy. Returns
    /// how many submissions were deactivated.
    #[instrument(skip(self))]
    pub async fn enforce_quota(
        &self,
        blogger_id: BloggerId,
        new_quota: Quota,
    ) -> Result<u32, ListingError> {
        let _guard = self.locks.acquire(blogger_id.0).await;

        let rows = self.submissions.list_listed_by_blogger(blogger_id.0).await?;
        let listed: Vec<Submission> = rows
            .iter()
            .map(|r| r.to_domain())
            .collect::<Result<_, _>>()?;

        let selected = select_deactivations(&listed, new_quota);
        if selected.is_empty() {
            return Ok(0);
        }

        info!(
            blogger_id = %blogger_id,
            count = selected.len(),
            "Deactivating submissions to fit shrunken quota"
        );

        for id in &selected {
            self.force_deactivate(id.0).await?;
        }

        Ok(selected.len() as u32)
    }

    /// The blogger's current quota, derived from their billing record.
    pub async fn current_quota(&self, blogger_id: Uuid) -> Result<Quota, ListingError> {
        let tier = match self.billing.find_by_blogger_id(blogger_id).await? {
            Some(row) => row.to_domain()?.tier_at(Utc::now(), self.grace),
            None => Tier::Free,
        };
        Ok(tier.active_post_quota())
    }

    // =========================================================================
    // Internals
    // =========================================================================

    async fn fetch(&self, submission_id: SubmissionId) -> Result<SubmissionRow, ListingError> {
        self.submissions
            .find_by_id(submission_id.0)
            .await?
            .ok_or(ListingError::SubmissionNotFound)
    }

    async fn create_row(
        &self,
        blogger_id: BloggerId,
        post_url: &str,
        status: SubmissionStatus,
    ) -> Result<SubmissionRow, ListingError> {
        if self.bloggers.find_by_id(blogger_id.0).await?.is_none() {
            return Err(ListingError::BloggerNotFound);
        }

        let submitted_at = (status == SubmissionStatus::Pending).then(Utc::now);
        let result = self
            .submissions
            .create(CreateSubmission {
                id: Uuid::new_v4(),
                blogger_id: blogger_id.0,
                post_url: post_url.to_string(),
                status: status.to_string(),
                submitted_at,
            })
            .await;

        match result {
            Ok(row) => Ok(row),
            Err(e) if e.is_unique_violation() => Err(ListingError::DuplicateUrl),
            Err(e) => Err(e.into()),
        }
    }

    /// All three submission guards, checked in gating order: verification
    /// state first, then domain match, then uniqueness.
    async fn ensure_url_allowed(
        &self,
        blogger_id: Uuid,
        post_url: &str,
        exclude: Option<Uuid>,
    ) -> Result<(), ListingError> {
        let verification = self
            .verifications
            .find_by_blogger_id(blogger_id)
            .await?
            .map(|row| row.to_domain())
            .transpose()?
            .ok_or(ListingError::DomainNotVerified)?;

        if verification.status != VerificationStatus::Verified {
            return Err(ListingError::DomainNotVerified);
        }
        if !url_matches_verified_domain(post_url, &verification.domain) {
            return Err(ListingError::DomainMismatch);
        }
        if let Some(existing) = self.submissions.find_by_post_url(post_url).await? {
            if exclude != Some(existing.id) {
                return Err(ListingError::DuplicateUrl);
            }
        }

        Ok(())
    }

    /// Deactivate one selected submission during quota enforcement
    async fn force_deactivate(&self, id: Uuid) -> Result<(), ListingError> {
        for _attempt in 0..2 {
            let Some(row) = self.submissions.find_by_id(id).await? else {
                return Ok(());
            };
            if !row.is_active {
                return Ok(());
            }

            let change = SubmissionChange {
                is_active: Some(false),
                ..Default::default()
            };
            if self
                .submissions
                .apply_transition(row.id, &row.status, row.revision, change)
                .await?
                .is_some()
            {
                return Ok(());
            }
        }

        Err(ListingError::TransitionConflict)
    }

    /// Send the single notification tied to a submission transition.
    ///
    /// Failures here are logged and swallowed: the transition has already
    /// committed and is the source of truth.
    async fn notify_submission(
        &self,
        submission: &Submission,
        event: &str,
        template: NotificationTemplate,
    ) {
        let recipient = match self.bloggers.find_by_id(submission.blogger_id.0).await {
            Ok(Some(blogger)) => blogger.email,
            Ok(None) => {
                warn!(blogger_id = %submission.blogger_id, "Blogger missing, skipping notification");
                return;
            }
            Err(e) => {
                error!(blogger_id = %submission.blogger_id, error = %e, "Blogger lookup failed, skipping notification");
                return;
            }
        };

        let key = format!(
            "submission:{}:{}:{}",
            submission.id, event, submission.revision
        );
        self.notifier.notify(&key, &recipient, &template).await;
    }
}

impl<S, V, B, R> Clone for ListingService<S, V, B, R>
where
    S: SubmissionRepository,
    V: VerificationRepository,
    B: BillingRepository,
    R: BloggerRepository,
{
    fn clone(&self) -> Self {
        Self {
            submissions: Arc::clone(&self.submissions),
            verifications: Arc::clone(&self.verifications),
            billing: Arc::clone(&self.billing),
            bloggers: Arc::clone(&self.bloggers),
            notifier: Arc::clone(&self.notifier),
            locks: self.locks.clone(),
            grace: self.grace,
        }
    }
}

impl<S, V, B, R> std::fmt::Debug for ListingService<S, V, B, R>
where
    S: SubmissionRepository,
    V: VerificationRepository,
    B: BillingRepository,
    R: BloggerRepository,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListingService").finish()
    }
}

fn parse_status(row: &SubmissionRow) -> Result<SubmissionStatus, ListingError> {
    row.status
        .parse()
        .map_err(|_| ListingError::Database(blogdex_db::DbError::Decode(row.status.clone())))
}
