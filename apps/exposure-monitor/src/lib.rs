#![cfg_attr(
    test,
    allow(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::significant_drop_tightening,
        clippy::too_many_lines,
        clippy::needless_pass_by_value,
        clippy::option_if_let_else,
        clippy::items_after_statements
    )
)]

//! Exposure Monitor - Live Risk Exposure for Centroid Bridge Accounts
//!
//! Periodically logs in to the Centroid bridge, pulls open positions for a
//! set of accounts, and publishes headline KPIs (floating P/L, notional,
//! margin) with period-over-period deltas and a per-currency net exposure
//! table.
//!
//! # Layers (inside → outside)
//!
//! - **Domain**: Pure computation, no I/O
//!   - `accounts`: Account identifier normalization
//!   - `positions`: Position records and the filtered view
//!   - `exposure`: Headline KPIs and currency buckets
//!   - `kpi`: Period-over-period deltas
//!   - `instruments`: Symbol to base/quote reference data
//!
//! - **Application**: Use cases and port definitions
//!   - `ports`: Login and positions interfaces
//!   - `services`: Fetch fallback, cycle pipeline, refresh scheduler
//!
//! - **Infrastructure**: Adapters and external integrations
//!   - `broker`: HTTP clients for the bridge
//!   - `config`: Environment configuration
//!   - `health`: Health, metrics and exposure endpoints
//!
//! # Data Flow
//!
//! ```text
//! login ──► positions (canonical → raw → wildcard) ──► normalize
//!                                                        │
//!        published view ◄── KPI deltas ◄── aggregate ◄───┘
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]

/// Domain layer - Normalization and aggregation with no external I/O.
pub mod domain;

/// Application layer - Use cases and port definitions.
pub mod application;

/// Infrastructure layer - Adapters and external integrations.
pub mod infrastructure;

// Domain types
pub use domain::accounts::{AccountTokens, normalize_accounts};
pub use domain::exposure::{BucketTable, CurrencyBucket, ExposureAggregator, HeadlineKpis};
pub use domain::instruments::InstrumentCatalog;
pub use domain::kpi::{KpiDeltas, KpiSnapshot, KpiTracker};
pub use domain::money::format_money;
pub use domain::positions::{PositionRecord, ViewFilter, normalize_positions};

// Application services
pub use application::services::{
    CycleContext, CycleError, CycleOutcome, MonitorStatus, Pipeline, PipelineState,
    PositionFetcher, RefreshScheduler, RenderModel, SharedMonitorStatus,
};

// Infrastructure config
pub use infrastructure::config::{ConfigError, Credentials, MonitorConfig};

// Health server
pub use infrastructure::health::{HealthServer, HealthServerError, HealthServerState};

// Metrics
pub use infrastructure::metrics::init_metrics;

// Telemetry
pub use infrastructure::telemetry::{TelemetryConfig, TelemetryGuard, init as init_telemetry};
