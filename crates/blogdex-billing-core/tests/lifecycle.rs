//! Subscription lifecycle tests

mod common;

use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;

use blogdex_billing_core::{
    PaymentEvent, PaymentEventData, PaymentEventType,
};
use blogdex_billing_core::webhook::{CheckoutSessionData, InvoiceData, SubscriptionData};
use blogdex_types::BloggerId;
use blogdex_db::SubmissionRepository;

use common::{harness, mock_repos::MockSubmissionRepository, Harness};

fn checkout_event(event_id: &str, customer_ref: &str) -> PaymentEvent {
    PaymentEvent {
        id: event_id.to_string(),
        event_type: PaymentEventType::CheckoutCompleted,
        data: PaymentEventData::CheckoutSession(CheckoutSessionData {
            session_id: "cs_1".to_string(),
            customer_ref: customer_ref.to_string(),
            subscription_ref: Some("sub_1".to_string()),
        }),
        created: Utc::now().timestamp(),
    }
}

fn invoice_paid_event(
    event_id: &str,
    customer_ref: &str,
    period_end: DateTime<Utc>,
) -> PaymentEvent {
    PaymentEvent {
        id: event_id.to_string(),
        event_type: PaymentEventType::InvoicePaid,
        data: PaymentEventData::Invoice(InvoiceData {
            invoice_ref: "in_1".to_string(),
            customer_ref: customer_ref.to_string(),
            subscription_ref: Some("sub_1".to_string()),
            amount_cents: 900,
            period_end,
            attempt_count: 1,
            next_payment_attempt: None,
        }),
        created: Utc::now().timestamp(),
    }
}

fn invoice_failed_event(
    event_id: &str,
    customer_ref: &str,
    attempt_count: i64,
    next_payment_attempt: Option<DateTime<Utc>>,
) -> PaymentEvent {
    PaymentEvent {
        id: event_id.to_string(),
        event_type: PaymentEventType::InvoicePaymentFailed,
        data: PaymentEventData::Invoice(InvoiceData {
            invoice_ref: "in_2".to_string(),
            customer_ref: customer_ref.to_string(),
            subscription_ref: Some("sub_1".to_string()),
            amount_cents: 0,
            period_end: Utc::now() + Duration::days(3),
            attempt_count,
            next_payment_attempt,
        }),
        created: Utc::now().timestamp(),
    }
}

fn cancel_event(event_id: &str, customer_ref: &str) -> PaymentEvent {
    PaymentEvent {
        id: event_id.to_string(),
        event_type: PaymentEventType::SubscriptionCanceled,
        data: PaymentEventData::Subscription(SubscriptionData {
            subscription_ref: "sub_1".to_string(),
            customer_ref: customer_ref.to_string(),
            remote_status: "canceled".to_string(),
            period_end: Utc::now() + Duration::days(3),
            cancel_at_period_end: false,
        }),
        created: Utc::now().timestamp(),
    }
}

/// Seed a blogger with a linked processor customer
fn pro_blogger(h: &Harness, customer_ref: &str) -> BloggerId {
    let id = h.bloggers.insert_blogger("pro@example.com");
    h.bloggers.link_customer(id, customer_ref);
    BloggerId(id)
}

#[tokio::test]
async fn test_checkout_completed_activates_subscription() {
    let h = harness();
    let blogger = pro_blogger(&h, "cus_1");

    h.lifecycle
        .apply_event(checkout_event("evt_1", "cus_1"))
        .await
        .unwrap();

    let record = h.billing.get(blogger.0).unwrap();
    assert_eq!(record.status, "active");
    assert_eq!(record.subscription_ref.as_deref(), Some("sub_1"));
    assert_eq!(h.notifier.count_of("welcome"), 1);
}

#[tokio::test]
async fn test_replayed_event_is_a_noop() {
    let h = harness();
    let blogger = pro_blogger(&h, "cus_1");

    h.lifecycle
        .apply_event(checkout_event("evt_1", "cus_1"))
        .await
        .unwrap();
    let after_first = h.billing.get(blogger.0).unwrap();

    // Same external event id delivered again.
    h.lifecycle
        .apply_event(checkout_event("evt_1", "cus_1"))
        .await
        .unwrap();

    let after_second = h.billing.get(blogger.0).unwrap();
    assert_eq!(after_second.status, after_first.status);
    assert_eq!(after_second.updated_at, after_first.updated_at);
    assert_eq!(h.notifier.count_of("welcome"), 1);
}

#[tokio::test]
async fn test_payment_failure_progresses_notice_stages() {
    let h = harness();
    let blogger = pro_blogger(&h, "cus_1");
    h.billing
        .insert_active(blogger.0, Utc::now() + Duration::days(3));

    // Attempt 1: past_due, first notice with a retry date.
    let retry_at = Utc::now() + Duration::days(2);
    h.lifecycle
        .apply_event(invoice_failed_event("evt_f1", "cus_1", 1, Some(retry_at)))
        .await
        .unwrap();
    let record = h.billing.get(blogger.0).unwrap();
    assert_eq!(record.status, "past_due");
    assert_eq!(record.failure_notice_stage, "first");
    assert_eq!(h.notifier.count_of("payment_retry"), 1);
    assert_eq!(h.notifier.count_of("final_notice"), 0);

    // Attempt 2: still past_due, final notice.
    h.lifecycle
        .apply_event(invoice_failed_event("evt_f2", "cus_1", 2, None))
        .await
        .unwrap();
    let record = h.billing.get(blogger.0).unwrap();
    assert_eq!(record.status, "past_due");
    assert_eq!(record.failure_notice_stage, "final");
    assert_eq!(h.notifier.count_of("final_notice"), 1);
}

#[tokio::test]
async fn test_invoice_paid_recovers_past_due() {
    let h = harness();
    let blogger = pro_blogger(&h, "cus_1");
    h.billing
        .insert_active(blogger.0, Utc::now() + Duration::days(3));

    h.lifecycle
        .apply_event(invoice_failed_event("evt_f1", "cus_1", 1, None))
        .await
        .unwrap();
    assert_eq!(h.billing.get(blogger.0).unwrap().status, "past_due");

    let new_period_end = Utc::now() + Duration::days(33);
    h.lifecycle
        .apply_event(invoice_paid_event("evt_p1", "cus_1", new_period_end))
        .await
        .unwrap();

    let record = h.billing.get(blogger.0).unwrap();
    assert_eq!(record.status, "active");
    assert_eq!(record.failure_notice_stage, "none");
    assert_eq!(record.period_end, new_period_end);
    assert_eq!(h.notifier.count_of("payment_succeeded"), 1);
}

#[tokio::test]
async fn test_cancellation_downgrades_and_delists() {
    let h = harness();
    let blogger = pro_blogger(&h, "cus_1");
    h.billing
        .insert_active(blogger.0, Utc::now() + Duration::days(3));

    // Five active posts, activated an hour apart.
    let base = Utc::now() - Duration::days(1);
    let mut ids = Vec::new();
    for i in 0..5 {
        let row = MockSubmissionRepository::approved_row(
            blogger.0,
            &format!("https://example.com/post-{i}"),
            true,
            Some(base + Duration::hours(i as i64)),
        );
        ids.push(row.id);
        h.submissions.insert(row);
    }

    h.lifecycle
        .apply_event(cancel_event("evt_c1", "cus_1"))
        .await
        .unwrap();

    // Tier drops to free: the record is canceled and exactly the two
    // oldest activations are delisted.
    assert_eq!(h.billing.get(blogger.0).unwrap().status, "canceled");
    assert_eq!(h.submissions.count_listed(blogger.0).await.unwrap(), 3);
    for (i, id) in ids.iter().enumerate() {
        let row = h.submissions.find_by_id(*id).await.unwrap().unwrap();
        assert_eq!(row.is_active, i >= 2, "submission {i}");
    }

    // One delisting notification carrying the count.
    assert_eq!(h.notifier.count_of("posts_delisted"), 1);
    let sent = h.notifier.sent.lock().unwrap();
    let (key, _, _) = sent
        .iter()
        .find(|(_, _, t)| t == "posts_delisted")
        .unwrap()
        .clone();
    assert_eq!(key, "billing:evt_c1:posts_delisted");
    drop(sent);

    // Replaying the cancellation changes nothing and sends nothing.
    h.lifecycle
        .apply_event(cancel_event("evt_c1", "cus_1"))
        .await
        .unwrap();
    assert_eq!(h.submissions.count_listed(blogger.0).await.unwrap(), 3);
    assert_eq!(h.notifier.count_of("posts_delisted"), 1);
}

#[tokio::test]
async fn test_cancellation_within_quota_sends_no_delisting_notice() {
    let h = harness();
    let blogger = pro_blogger(&h, "cus_1");
    h.billing
        .insert_active(blogger.0, Utc::now() + Duration::days(3));

    for i in 0..2 {
        h.submissions.insert(MockSubmissionRepository::approved_row(
            blogger.0,
            &format!("https://example.com/post-{i}"),
            true,
            Some(Utc::now()),
        ));
    }

    h.lifecycle
        .apply_event(cancel_event("evt_c1", "cus_1"))
        .await
        .unwrap();

    assert_eq!(h.billing.get(blogger.0).unwrap().status, "canceled");
    assert_eq!(h.submissions.count_listed(blogger.0).await.unwrap(), 2);
    assert_eq!(h.notifier.count_of("posts_delisted"), 0);
}

#[tokio::test]
async fn test_event_for_unknown_customer_is_acknowledged() {
    let h = harness();

    // No blogger holds this customer reference.
    h.lifecycle
        .apply_event(checkout_event("evt_1", "cus_stranger"))
        .await
        .unwrap();

    assert!(h.notifier.sent.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_checkout_creates_customer_once() {
    let h = harness();
    let blogger = BloggerId(h.bloggers.insert_blogger("new@example.com"));

    let session = h.lifecycle.create_checkout(blogger, None, None).await.unwrap();
    assert!(!session.session_id.is_empty());
    assert_eq!(h.provider.customers_created.lock().unwrap().len(), 1);

    // The stored reference is reused on the next checkout.
    h.lifecycle.create_checkout(blogger, None, None).await.unwrap();
    assert_eq!(h.provider.customers_created.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_process_webhook_end_to_end() {
    let h = harness();
    let blogger = pro_blogger(&h, "cus_wh");

    let payload = serde_json::to_vec(&serde_json::json!({
        "id": "evt_wh_1",
        "type": "checkout.session.completed",
        "created": Utc::now().timestamp(),
        "data": { "object": {
            "id": "cs_wh_1",
            "customer": "cus_wh",
            "subscription": "sub_wh_1"
        }}
    }))
    .unwrap();

    let timestamp = Utc::now().timestamp();
    let signed = format!("{}.{}", timestamp, std::str::from_utf8(&payload).unwrap());
    let mut mac = Hmac::<Sha256>::new_from_slice(b"whsec_test").unwrap();
    mac.update(signed.as_bytes());
    let signature = format!(
        "t={},v1={}",
        timestamp,
        hex::encode(mac.finalize().into_bytes())
    );

    h.lifecycle
        .process_webhook(&payload, &signature)
        .await
        .unwrap();

    assert_eq!(h.billing.get(blogger.0).unwrap().status, "active");
    assert_eq!(h.notifier.count_of("welcome"), 1);
}
