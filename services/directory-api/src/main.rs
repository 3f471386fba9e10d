//! Blogdex Directory API
//!
//! HTTP service exposing the content-lifecycle and entitlement engine.
//!
//! ## REST Endpoints
//!
//! - `POST /api/v1/submissions` - Submit a blog post (or save a draft)
//! - `POST /api/v1/submissions/{id}/submit` - Submit a saved draft
//! - `POST /api/v1/submissions/{id}/url` - Change a submission's URL
//! - `POST /api/v1/submissions/{id}/review` - Approve or reject (reviewers)
//! - `POST /api/v1/submissions/{id}/activate` - List the post publicly
//! - `POST /api/v1/submissions/{id}/deactivate` - Unlist the post
//! - `POST /api/v1/verification/declare` - Declare the blog URL
//! - `POST /api/v1/verification/challenge` - Issue an ownership challenge
//! - `POST /api/v1/verification/verify` - Run the ownership check
//! - `POST /api/v1/billing/checkout` - Open a pro checkout session
//! - `POST /api/v1/billing/portal` - Open the billing portal
//! - `GET  /api/v1/notifications/failed` - Failed deliveries (manual resend)
//! - `POST /webhooks/stripe` - Payment webhook handler
//!
//! ## Health Endpoints
//!
//! - `GET /health` - Liveness probe
//! - `GET /ready` - Readiness probe
//! - `GET /metrics` - Prometheus metrics

mod config;
mod error;
mod handlers;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use tokio::signal;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use blogdex_billing_core::{PaymentProvider, StripeProvider, SubscriptionLifecycle};
use blogdex_db::Repositories;
use blogdex_listing_core::{BloggerLocks, ListingService};
use blogdex_notify_core::{Dispatcher, HttpEmailTransport, Notifier};
use blogdex_verify_core::{HttpProber, VerificationService};

use crate::config::Config;
use crate::handlers::{health, ready};
use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive("directory_api=debug".parse()?))
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Blogdex Directory API");

    let config = Config::from_env()?;
    tracing::info!(http_port = config.http_port, "Configuration loaded");

    let metrics_handle = if config.metrics_enabled {
        Some(setup_metrics()?)
    } else {
        None
    };

    let pool = blogdex_db::create_pool(&config.database_url).await?;
    tracing::info!("Database pool created");

    let repos = Repositories::new(pool.clone());
    let state = build_state(config, repos, pool)?;

    let app = build_router(state.clone(), metrics_handle);

    let addr = SocketAddr::from(([0, 0, 0, 0], state.config.http_port));
    run_http_server(app, addr).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

fn build_state(
    config: Config,
    repos: Repositories,
    pool: blogdex_db::DbPool,
) -> anyhow::Result<AppState> {
    // One lock registry serializes every per-blogger mutation, whether it
    // arrives from a user action or a billing webhook.
    let locks = BloggerLocks::new();

    let transport = HttpEmailTransport::new(
        &config.email_endpoint,
        &config.email_api_key,
        &config.email_from,
    );
    let notifier: Arc<dyn Notifier> = Arc::new(Dispatcher::new(
        Arc::new(repos.notifications.clone()),
        Arc::new(transport),
    ));

    let prober = HttpProber::new(
        &config.verify.doh_endpoint,
        &config.verify.user_agent,
        config.verify.probe_timeout,
    )
    .map_err(|e| anyhow::anyhow!("failed to build domain prober: {e}"))?;
    let verification = VerificationService::new(
        Arc::new(repos.verifications.clone()),
        Arc::new(prober),
    );

    let listing = ListingService::new(
        Arc::new(repos.submissions.clone()),
        Arc::new(repos.verifications.clone()),
        Arc::new(repos.billing.clone()),
        Arc::new(repos.bloggers.clone()),
        Arc::clone(&notifier),
        locks.clone(),
        config.billing.grace_period,
    );

    let provider: Arc<dyn PaymentProvider> =
        Arc::new(StripeProvider::new(config.billing.clone()));
    let billing = SubscriptionLifecycle::new(
        Arc::new(repos.billing.clone()),
        Arc::new(repos.bloggers.clone()),
        listing.clone(),
        provider,
        notifier,
        locks,
        config.billing.clone(),
    );

    Ok(AppState {
        listing: Arc::new(listing),
        billing: Arc::new(billing),
        verification: Arc::new(verification),
        notifications: repos.notifications.clone(),
        repos,
        pool,
        config: Arc::new(config),
    })
}

fn build_router(state: AppState, metrics_handle: Option<PrometheusHandle>) -> Router {
    let request_timeout = state.request_timeout();

    let api_v1 = Router::new()
        // Blogger routes
        .route("/bloggers", post(handlers::create_blogger))
        .route(
            "/bloggers/{id}/submissions",
            get(handlers::list_submissions),
        )
        // Submission routes
        .route("/submissions", post(handlers::create_submission))
        .route("/submissions/{id}/submit", post(handlers::submit_draft))
        .route("/submissions/{id}/url", post(handlers::change_submission_url))
        .route("/submissions/{id}/review", post(handlers::review_submission))
        .route(
            "/submissions/{id}/activate",
            post(handlers::activate_submission),
        )
        .route(
            "/submissions/{id}/deactivate",
            post(handlers::deactivate_submission),
        )
        // Verification routes
        .route("/verification/declare", post(handlers::declare_blog_url))
        .route("/verification/challenge", post(handlers::issue_challenge))
        .route("/verification/verify", post(handlers::verify_domain))
        // Billing routes
        .route("/billing/checkout", post(handlers::create_checkout))
        .route("/billing/portal", post(handlers::create_portal))
        // Notification ledger
        .route(
            "/notifications/failed",
            get(handlers::list_failed_notifications),
        );

    // Webhook route (separate - uses raw body, no JSON parsing)
    let webhook_routes = Router::new().route("/webhooks/stripe", post(handlers::stripe_webhook));

    // Health routes (no timeout - must always respond quickly)
    let health_routes = Router::new()
        .route("/health", get(health))
        .route("/ready", get(ready));

    let metrics_route = if let Some(handle) = metrics_handle {
        Router::new().route("/metrics", get(move || async move { handle.render() }))
    } else {
        Router::new()
    };

    // Build middleware stack (order matters - outermost first)
    let middleware = ServiceBuilder::new()
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TimeoutLayer::new(request_timeout));

    Router::new()
        .nest("/api/v1", api_v1)
        .merge(webhook_routes)
        .layer(middleware)
        .merge(health_routes)
        .merge(metrics_route)
        .with_state(state)
}

async fn run_http_server(app: Router, addr: SocketAddr) -> anyhow::Result<()> {
    tracing::info!("HTTP server listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

fn setup_metrics() -> anyhow::Result<PrometheusHandle> {
    // Latency buckets sized for the engine's synchronous operations; the
    // verification probes are the only slow path.
    let latency_buckets = &[0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.2, 0.5, 1.0, 2.5, 10.0];

    let builder = PrometheusBuilder::new().set_buckets_for_metric(
        Matcher::Full("directory_operation_duration_seconds".to_string()),
        latency_buckets,
    )?;

    let handle = builder.install_recorder()?;

    metrics::describe_counter!(
        "directory_submissions_created_total",
        "Total submissions created"
    );
    metrics::describe_counter!("directory_reviews_total", "Total reviews by outcome");
    metrics::describe_counter!("directory_activations_total", "Total submission activations");
    metrics::describe_counter!(
        "directory_challenges_issued_total",
        "Total domain challenges issued by method"
    );
    metrics::describe_counter!(
        "directory_verifications_total",
        "Total verification attempts by outcome"
    );
    metrics::describe_counter!(
        "directory_checkouts_created_total",
        "Total checkout sessions created"
    );
    metrics::describe_counter!(
        "directory_webhooks_processed_total",
        "Total webhooks processed by status"
    );
    metrics::describe_histogram!(
        "directory_operation_duration_seconds",
        "Operation latency in seconds by operation type"
    );

    Ok(handle)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}
