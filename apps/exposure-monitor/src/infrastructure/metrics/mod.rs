//! Prometheus Metrics Module
//!
//! Exposes refresh metrics in Prometheus format.
//!
//! # Metrics
//!
//! - **Cycles**: completed refresh cycles by outcome, and their duration
//! - **Fetch attempts**: positions queries by candidate shape and outcome
//! - **Positions**: normalized position count of the last published view
//!
//! # Integration
//!
//! Metrics are exposed at `/metrics` on the health server port. Recording
//! before [`init_metrics`] is a no-op.

use std::sync::OnceLock;
use std::time::Duration;

use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

/// Refresh cycles, labelled by outcome.
pub const CYCLES_TOTAL: &str = "exposure_monitor_cycles_total";
/// Positions queries, labelled by candidate shape and outcome.
pub const FETCH_ATTEMPTS_TOTAL: &str = "exposure_monitor_fetch_attempts_total";
/// Position count of the last published view.
pub const POSITIONS: &str = "exposure_monitor_positions";
/// Refresh cycle wall time.
pub const CYCLE_DURATION_SECONDS: &str = "exposure_monitor_cycle_duration_seconds";

// =============================================================================
// Global Metrics Handle
// =============================================================================

static PROMETHEUS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Initialize the Prometheus metrics recorder.
///
/// Repeated calls return the handle installed by the first.
///
/// # Panics
///
/// Panics if another global recorder was already installed.
#[allow(clippy::expect_used)]
pub fn init_metrics() -> PrometheusHandle {
    PROMETHEUS_HANDLE
        .get_or_init(|| {
            let handle = PrometheusBuilder::new()
                .install_recorder()
                .expect("failed to install Prometheus recorder");

            register_metrics();
            handle
        })
        .clone()
}

/// Get the Prometheus handle for rendering metrics.
///
/// Returns `None` if metrics have not been initialized.
#[must_use]
pub fn get_metrics_handle() -> Option<PrometheusHandle> {
    PROMETHEUS_HANDLE.get().cloned()
}

fn register_metrics() {
    describe_counter!(CYCLES_TOTAL, "Refresh cycles by outcome");
    describe_counter!(
        FETCH_ATTEMPTS_TOTAL,
        "Positions queries by candidate shape and outcome"
    );
    describe_gauge!(POSITIONS, "Normalized positions in the last published view");
    describe_histogram!(
        CYCLE_DURATION_SECONDS,
        "Wall time of one refresh cycle, login through aggregation"
    );
}

// =============================================================================
// Metric Recording Functions
// =============================================================================

/// Record a finished (or abandoned) refresh cycle.
pub fn record_cycle(outcome: &'static str, duration: Duration) {
    counter!(CYCLES_TOTAL, "outcome" => outcome).increment(1);
    histogram!(CYCLE_DURATION_SECONDS).record(duration.as_secs_f64());
}

/// Record one positions query.
pub fn record_fetch_attempt(query: &'static str, outcome: &'static str) {
    counter!(FETCH_ATTEMPTS_TOTAL, "query" => query, "outcome" => outcome).increment(1);
}

/// Update the published position count.
#[allow(clippy::cast_precision_loss)]
pub fn set_positions(count: usize) {
    gauge!(POSITIONS).set(count as f64);
}
