//! Refresh Scheduler
//!
//! Drives the pipeline on a fixed period. A single task awaits each cycle to
//! completion before looking at the timer again, so cycles never overlap;
//! ticks that fire while a cycle is still running are skipped rather than
//! queued.
//!
//! State is committed only after a cycle finishes. Cancelling mid-cycle
//! drops the in-flight requests and leaves the last committed state and the
//! published view untouched.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::Serialize;
use thiserror::Error;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use super::pipeline::{
    CycleContext, CycleError, CycleOutcome, NoDataReason, Pipeline, PipelineState, RenderModel,
};
use crate::infrastructure::metrics;

/// Default refresh period.
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(5);

/// Result of the most recent cycle, for status reporting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CycleStatus {
    /// A new view was published.
    Published,
    /// The cycle found nothing to publish.
    NoData {
        /// Why.
        reason: NoDataReason,
    },
    /// Login failed; the cycle was abandoned.
    Failed {
        /// Error description.
        error: String,
    },
}

impl CycleStatus {
    /// Label for logs and metrics.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Published => "published",
            Self::NoData { .. } => "no_data",
            Self::Failed { .. } => "failed",
        }
    }
}

#[derive(Debug, Default)]
struct MonitorStatusInner {
    latest: Option<Arc<RenderModel>>,
    last_status: Option<CycleStatus>,
    last_cycle_at: Option<DateTime<Utc>>,
    cycles_run: u64,
}

/// Published view and cycle bookkeeping, shared with readers such as the
/// HTTP surface.
#[derive(Debug, Default)]
pub struct MonitorStatus {
    inner: RwLock<MonitorStatusInner>,
}

/// Shared handle to the monitor status.
pub type SharedMonitorStatus = Arc<MonitorStatus>;

/// Point-in-time copy of the cycle bookkeeping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusSnapshot {
    /// Cycles completed or abandoned so far.
    pub cycles_run: u64,
    /// Result of the most recent cycle.
    pub last_status: Option<CycleStatus>,
    /// When the most recent cycle ended.
    pub last_cycle_at: Option<DateTime<Utc>>,
    /// Whether a view has ever been published.
    pub has_view: bool,
}

impl MonitorStatus {
    /// Empty status.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The latest published view, if any.
    #[must_use]
    pub fn latest(&self) -> Option<Arc<RenderModel>> {
        self.inner.read().latest.clone()
    }

    /// Copy of the bookkeeping fields.
    #[must_use]
    pub fn snapshot(&self) -> StatusSnapshot {
        let inner = self.inner.read();
        StatusSnapshot {
            cycles_run: inner.cycles_run,
            last_status: inner.last_status.clone(),
            last_cycle_at: inner.last_cycle_at,
            has_view: inner.latest.is_some(),
        }
    }

    fn record(&self, status: CycleStatus, view: Option<RenderModel>) {
        let mut inner = self.inner.write();
        inner.cycles_run += 1;
        inner.last_status = Some(status);
        inner.last_cycle_at = Some(Utc::now());
        if let Some(view) = view {
            inner.latest = Some(Arc::new(view));
        }
    }
}

/// Scheduler errors.
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// A cycle hit an unrecoverable configuration error.
    #[error("refresh stopped: {0}")]
    Fatal(#[from] CycleError),
}

/// Runs the pipeline once or on a fixed period.
pub struct RefreshScheduler {
    pipeline: Pipeline,
    context: CycleContext,
    interval: Duration,
    state: PipelineState,
    status: SharedMonitorStatus,
}

impl RefreshScheduler {
    /// Create a scheduler with empty pipeline state.
    #[must_use]
    pub fn new(
        pipeline: Pipeline,
        context: CycleContext,
        interval: Duration,
        status: SharedMonitorStatus,
    ) -> Self {
        Self {
            pipeline,
            context,
            interval,
            state: PipelineState::default(),
            status,
        }
    }

    /// Last committed pipeline state.
    #[must_use]
    pub const fn state(&self) -> &PipelineState {
        &self.state
    }

    /// Run exactly one cycle and commit its result.
    ///
    /// # Errors
    ///
    /// Returns the cycle error when login fails. Committed state is left
    /// unchanged in that case.
    pub async fn run_once(&mut self) -> Result<CycleOutcome, CycleError> {
        let started = Instant::now();
        let result = self.pipeline.run_cycle(&self.context, &self.state).await;
        let elapsed = started.elapsed();

        match result {
            Ok((next, outcome)) => {
                self.state = next;
                let (status, view) = match &outcome {
                    CycleOutcome::Published(model) => {
                        metrics::set_positions(model.position_count);
                        tracing::info!(
                            positions = model.position_count,
                            pl = %model.kpis_formatted.pl,
                            notional = %model.kpis_formatted.notional,
                            query = model.query_kind.as_str(),
                            elapsed_ms = elapsed.as_millis(),
                            "Exposure refreshed"
                        );
                        (CycleStatus::Published, Some(model.as_ref().clone()))
                    }
                    CycleOutcome::NoData { reason, .. } => {
                        tracing::warn!(reason = reason.as_str(), "No positions returned");
                        (CycleStatus::NoData { reason: *reason }, None)
                    }
                };
                metrics::record_cycle(status.label(), elapsed);
                self.status.record(status, view);
                Ok(outcome)
            }
            Err(err) => {
                tracing::error!(error = %err, fatal = err.is_fatal(), "Refresh cycle failed");
                let status = CycleStatus::Failed {
                    error: err.to_string(),
                };
                metrics::record_cycle(status.label(), elapsed);
                self.status.record(status, None);
                Err(err)
            }
        }
    }

    /// Run cycles on the configured period until cancelled.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::Fatal`] on a configuration error.
    pub async fn run(mut self, cancel: CancellationToken) -> Result<(), SchedulerError> {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        tracing::info!(
            interval_ms = self.interval.as_millis(),
            accounts = self.context.accounts.len(),
            "Refresh scheduler started"
        );

        loop {
            tokio::select! {
                () = cancel.cancelled() => break,
                _ = ticker.tick() => {}
            }

            let result = tokio::select! {
                () = cancel.cancelled() => {
                    tracing::info!("Cycle abandoned on shutdown");
                    break;
                }
                result = self.run_once() => result,
            };

            match result {
                Err(err) if err.is_fatal() => return Err(SchedulerError::Fatal(err)),
                _ => {}
            }
        }

        tracing::info!("Refresh scheduler stopped");
        Ok(())
    }
}
