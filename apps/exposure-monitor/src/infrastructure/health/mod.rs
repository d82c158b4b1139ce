//! Health, Metrics and Exposure Endpoints
//!
//! HTTP surface for probes, Prometheus scraping and the latest published
//! exposure view.
//!
//! # Endpoints
//!
//! - `GET /health` - JSON status of the refresh loop
//! - `GET /healthz` - Liveness probe (simple OK)
//! - `GET /readyz` - Readiness probe (ready once a view has been published)
//! - `GET /metrics` - Prometheus metrics in text format
//! - `GET /exposure` - Latest published view as JSON

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use axum::{Json, Router, extract::State, http::StatusCode, response::IntoResponse, routing::get};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use crate::application::services::{CycleStatus, SharedMonitorStatus, StatusSnapshot};
use crate::infrastructure::metrics::get_metrics_handle;

// =============================================================================
// Health Response Types
// =============================================================================

/// Health check response.
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Overall status.
    pub status: HealthStatus,
    /// Monitor version.
    pub version: String,
    /// Server uptime in seconds.
    pub uptime_secs: u64,
    /// Current time.
    pub current_time: DateTime<Utc>,
    /// Refresh loop bookkeeping.
    pub refresh: StatusSnapshot,
}

/// Overall health status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    /// Last cycle published a view.
    Healthy,
    /// A view is available but the last cycle did not refresh it, or no
    /// cycle has finished yet.
    Degraded,
    /// The last cycle failed and nothing has ever been published.
    Unhealthy,
}

fn determine_health_status(snapshot: &StatusSnapshot) -> HealthStatus {
    match (&snapshot.last_status, snapshot.has_view) {
        (Some(CycleStatus::Published), _) => HealthStatus::Healthy,
        (Some(CycleStatus::Failed { .. }), false) => HealthStatus::Unhealthy,
        _ => HealthStatus::Degraded,
    }
}

// =============================================================================
// Health Server State
// =============================================================================

/// Shared state for the HTTP server.
pub struct HealthServerState {
    version: String,
    started_at: Instant,
    status: SharedMonitorStatus,
}

impl HealthServerState {
    /// Create new server state over the monitor status.
    #[must_use]
    pub fn new(version: String, status: SharedMonitorStatus) -> Self {
        Self {
            version,
            started_at: Instant::now(),
            status,
        }
    }
}

/// Build the router. Exposed for in-process tests.
pub fn router(state: Arc<HealthServerState>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/healthz", get(liveness_handler))
        .route("/readyz", get(readiness_handler))
        .route("/metrics", get(metrics_handler))
        .route("/exposure", get(exposure_handler))
        .with_state(state)
}

// =============================================================================
// Health Server
// =============================================================================

/// HTTP server for probes, metrics and the exposure view.
pub struct HealthServer {
    port: u16,
    state: Arc<HealthServerState>,
    cancel: CancellationToken,
}

impl HealthServer {
    /// Create a new server.
    #[must_use]
    pub const fn new(port: u16, state: Arc<HealthServerState>, cancel: CancellationToken) -> Self {
        Self {
            port,
            state,
            cancel,
        }
    }

    /// Run the server until cancelled.
    ///
    /// # Errors
    ///
    /// Returns `HealthServerError` if binding fails or the HTTP server
    /// encounters a fatal error while running.
    pub async fn run(self) -> Result<(), HealthServerError> {
        let app = router(self.state);

        let addr = SocketAddr::from(([0, 0, 0, 0], self.port));
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| HealthServerError::BindFailed(self.port, e.to_string()))?;

        tracing::info!(port = self.port, "HTTP server listening");

        axum::serve(listener, app)
            .with_graceful_shutdown(self.cancel.cancelled_owned())
            .await
            .map_err(|e| HealthServerError::ServerFailed(e.to_string()))?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

// =============================================================================
// HTTP Handlers
// =============================================================================

async fn health_handler(State(state): State<Arc<HealthServerState>>) -> impl IntoResponse {
    let response = build_health_response(&state);
    let status_code = match response.status {
        HealthStatus::Healthy | HealthStatus::Degraded => StatusCode::OK,
        HealthStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    };
    (status_code, Json(response))
}

async fn liveness_handler() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

async fn readiness_handler(State(state): State<Arc<HealthServerState>>) -> impl IntoResponse {
    if state.status.snapshot().has_view {
        (StatusCode::OK, "READY")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "NOT READY")
    }
}

async fn metrics_handler() -> impl IntoResponse {
    get_metrics_handle().map_or_else(
        || {
            (
                StatusCode::SERVICE_UNAVAILABLE,
                [("content-type", "text/plain")],
                "Metrics not initialized".to_string(),
            )
        },
        |handle| {
            (
                StatusCode::OK,
                [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
                handle.render(),
            )
        },
    )
}

async fn exposure_handler(
    State(state): State<Arc<HealthServerState>>,
) -> axum::response::Response {
    state.status.latest().map_or_else(
        || (StatusCode::SERVICE_UNAVAILABLE, "No exposure published yet").into_response(),
        |model| (StatusCode::OK, Json(model.as_ref().clone())).into_response(),
    )
}

fn build_health_response(state: &HealthServerState) -> HealthResponse {
    let refresh = state.status.snapshot();
    HealthResponse {
        status: determine_health_status(&refresh),
        version: state.version.clone(),
        uptime_secs: state.started_at.elapsed().as_secs(),
        current_time: Utc::now(),
        refresh,
    }
}

// =============================================================================
// Errors
// =============================================================================

/// HTTP server errors.
#[derive(Debug, thiserror::Error)]
pub enum HealthServerError {
    /// Failed to bind to port.
    #[error("failed to bind to port {0}: {1}")]
    BindFailed(u16, String),

    /// Server error.
    #[error("server error: {0}")]
    ServerFailed(String),
}

// =============================================================================
// Tests
// =============================================================================
