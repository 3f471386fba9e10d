//! Shared test harness

pub mod mock_repos;

use std::sync::Arc;

use chrono::Duration;

use blogdex_billing_core::{BillingConfig, SubscriptionLifecycle};
use blogdex_listing_core::{BloggerLocks, ListingService};

use mock_repos::{
    MockBillingRepository, MockBloggerRepository, MockProvider, MockSubmissionRepository,
    MockVerificationRepository, RecordingNotifier,
};

pub type TestLifecycle = SubscriptionLifecycle<
    MockSubmissionRepository,
    MockVerificationRepository,
    MockBillingRepository,
    MockBloggerRepository,
>;

/// Everything a lifecycle test needs, wired the way the service binary
/// wires it: one lock registry and one grace period shared by both sides
pub struct Harness {
    pub lifecycle: TestLifecycle,
    pub submissions: Arc<MockSubmissionRepository>,
    pub billing: Arc<MockBillingRepository>,
    pub bloggers: Arc<MockBloggerRepository>,
    pub provider: Arc<MockProvider>,
    pub notifier: Arc<RecordingNotifier>,
}

pub fn harness() -> Harness {
    let submissions = Arc::new(MockSubmissionRepository::new());
    let verifications = Arc::new(MockVerificationRepository::new());
    let billing = Arc::new(MockBillingRepository::new());
    let bloggers = Arc::new(MockBloggerRepository::new());
    let provider = Arc::new(MockProvider::default());
    let notifier = Arc::new(RecordingNotifier::new());
    let locks = BloggerLocks::new();

    let config = BillingConfig::new("sk_test", "whsec_test")
        .with_pro_price("price_test_pro")
        .with_grace_period(Duration::days(14));

    let notifier_dyn: Arc<dyn blogdex_notify_core::Notifier> = notifier.clone();
    let listing = ListingService::new(
        Arc::clone(&submissions),
        Arc::clone(&verifications),
        Arc::clone(&billing),
        Arc::clone(&bloggers),
        Arc::clone(&notifier_dyn),
        locks.clone(),
        config.grace_period,
    );

    let provider_dyn: Arc<dyn blogdex_billing_core::PaymentProvider> = provider.clone();
    let lifecycle = SubscriptionLifecycle::new(
        Arc::clone(&billing),
        Arc::clone(&bloggers),
        listing,
        provider_dyn,
        notifier_dyn,
        locks,
        config,
    );

    Harness {
        lifecycle,
        submissions,
        billing,
        bloggers,
        provider,
        notifier,
    }
}
