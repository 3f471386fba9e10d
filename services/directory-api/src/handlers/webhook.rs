//! Payment webhook handler

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use std::time::Instant;

use crate::state::AppState;

/// POST /webhooks/stripe
///
/// Handle payment-processor events with signature verification. The
/// response code steers the processor's retry behavior: 2xx acknowledges,
/// 400 marks an unverifiable payload, 5xx requests a retry.
pub async fn stripe_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> StatusCode {
    let start = Instant::now();

    let Some(sig_header) = headers.get("stripe-signature") else {
        tracing::warn!("Missing Stripe-Signature header");
        return StatusCode::BAD_REQUEST;
    };

    let Ok(signature) = sig_header.to_str() else {
        tracing::warn!("Invalid Stripe-Signature header encoding");
        return StatusCode::BAD_REQUEST;
    };

    match state.billing.process_webhook(&body, signature).await {
        Ok(()) => {
            metrics::counter!("directory_webhooks_processed_total", "status" => "success")
                .increment(1);
            metrics::histogram!(
                "directory_operation_duration_seconds",
                "operation" => "process_webhook"
            )
            .record(start.elapsed().as_secs_f64());

            StatusCode::OK
        }
        Err(e) => {
            tracing::error!(error = ?e, "Webhook processing failed");
            metrics::counter!("directory_webhooks_processed_total", "status" => "error")
                .increment(1);

            if e.is_webhook_rejection() {
                StatusCode::BAD_REQUEST
            } else {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}
