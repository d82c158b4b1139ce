//! Application Services
//!
//! Use cases that orchestrate domain logic over the bridge ports.

pub mod fetcher;
pub mod pipeline;
pub mod scheduler;

pub use fetcher::{FetchCandidate, FetchedPositions, PositionFetcher, QueryKind, build_candidates};
pub use pipeline::{
    CycleContext, CycleError, CycleOutcome, FormattedKpis, NoDataReason, Pipeline, PipelineState,
    RenderModel, commit_cycle,
};
pub use scheduler::{
    CycleStatus, DEFAULT_REFRESH_INTERVAL, MonitorStatus, RefreshScheduler, SchedulerError,
    SharedMonitorStatus, StatusSnapshot,
};
