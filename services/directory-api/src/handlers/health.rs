//! Health and readiness probes

use axum::extract::State;
use axum::http::StatusCode;

use crate::state::AppState;

/// GET /health
///
/// Liveness probe; always succeeds while the process is up.
pub async fn health() -> StatusCode {
    StatusCode::OK
}

/// GET /ready
///
/// Readiness probe; verifies the database is reachable.
pub async fn ready(State(state): State<AppState>) -> StatusCode {
    match sqlx::query("SELECT 1").execute(&state.pool).await {
        Ok(_) => StatusCode::OK,
        Err(e) => {
            tracing::warn!(error = %e, "Readiness check failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}
