//! Shared test harness

pub mod mock_repos;

use std::sync::Arc;

use chrono::Duration;

use blogdex_listing_core::{BloggerLocks, ListingService};

use mock_repos::{
    MockBillingRepository, MockBloggerRepository, MockSubmissionRepository,
    MockVerificationRepository, RecordingNotifier,
};

/// Everything a lifecycle test needs, wired the way the service binary
/// wires it
pub struct Harness {
    pub listing: ListingService<
        MockSubmissionRepository,
        MockVerificationRepository,
        MockBillingRepository,
        MockBloggerRepository,
    >,
    pub submissions: Arc<MockSubmissionRepository>,
    pub verifications: Arc<MockVerificationRepository>,
    pub billing: Arc<MockBillingRepository>,
    pub bloggers: Arc<MockBloggerRepository>,
    pub notifier: Arc<RecordingNotifier>,
}

pub fn harness() -> Harness {
    let submissions = Arc::new(MockSubmissionRepository::new());
    let verifications = Arc::new(MockVerificationRepository::new());
    let billing = Arc::new(MockBillingRepository::new());
    let bloggers = Arc::new(MockBloggerRepository::new());
    let notifier = Arc::new(RecordingNotifier::new());
    let notifier_dyn: Arc<dyn blogdex_notify_core::Notifier> = notifier.clone();

    let listing = ListingService::new(
        Arc::clone(&submissions),
        Arc::clone(&verifications),
        Arc::clone(&billing),
        Arc::clone(&bloggers),
        notifier_dyn,
        BloggerLocks::new(),
        Duration::days(14),
    );

    Harness {
        listing,
        submissions,
        verifications,
        billing,
        bloggers,
        notifier,
    }
}
