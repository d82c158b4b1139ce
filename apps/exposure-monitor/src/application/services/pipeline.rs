//! Refresh Cycle Pipeline
//!
//! One cycle: authenticate, fetch, normalize, aggregate, update KPI state.
//! The cycle is a function of an explicit [`CycleContext`] and the prior
//! [`PipelineState`]; it returns the next state together with what should
//! be published. No state lives anywhere else.
//!
//! A cycle that ends up with no positions returns the prior state
//! unchanged, so KPI deltas keep measuring against the last cycle that had
//! data.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use super::fetcher::{FetchedPositions, PositionFetcher, QueryKind};
use crate::application::ports::{FetchQueryBody, LoginError};
use crate::domain::exposure::{
    Aggregation, BucketTable, CurrencyBucket, ExposureAggregator, HeadlineKpis, headline_kpis,
};
use crate::domain::instruments::InstrumentCatalog;
use crate::domain::kpi::{KpiDeltas, KpiTracker};
use crate::domain::money::format_money;
use crate::domain::positions::{
    FilterOptions, PositionRecord, ViewFilter, build_view, filter_options, normalize_positions,
};

/// Inputs that stay fixed for every cycle.
#[derive(Debug, Clone, Default)]
pub struct CycleContext {
    /// Account identifiers to monitor, as configured.
    pub accounts: Vec<String>,
    /// Symbol/platform selection for the published view.
    pub filter: ViewFilter,
}

/// State carried from one committed cycle to the next.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PipelineState {
    /// KPI history for deltas.
    pub kpi: KpiTracker,
    /// Bucket table of the last committed cycle.
    pub buckets: Option<BucketTable>,
}

/// Why a cycle published nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoDataReason {
    /// Every candidate query came back empty.
    NoPositions,
    /// Positions were fetched but all were excluded.
    EmptyAfterNormalization,
}

impl NoDataReason {
    /// Label for logs and metrics.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::NoPositions => "no_positions",
            Self::EmptyAfterNormalization => "empty_after_normalization",
        }
    }
}

/// Headline KPIs rendered for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FormattedKpis {
    /// Floating P/L.
    pub pl: String,
    /// Notional volume.
    pub notional: String,
    /// Utilised margin, when reported.
    pub margin: Option<String>,
}

impl From<&HeadlineKpis> for FormattedKpis {
    fn from(kpis: &HeadlineKpis) -> Self {
        Self {
            pl: format_money(kpis.pl),
            notional: format_money(kpis.notional),
            margin: kpis.margin.map(format_money),
        }
    }
}

/// Everything the display layer needs from one published cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderModel {
    /// When the cycle finished.
    pub generated_at: DateTime<Utc>,
    /// Configured account identifiers.
    pub accounts: Vec<String>,
    /// Client code the session resolved.
    pub client_code: String,
    /// Broker user the session resolved.
    pub broker_user: String,
    /// Body of the query that returned data.
    pub query_used: FetchQueryBody,
    /// Shape of `query_used`.
    pub query_kind: QueryKind,
    /// Headline KPIs over all positions.
    pub kpis: HeadlineKpis,
    /// Headline KPIs formatted for display.
    pub kpis_formatted: FormattedKpis,
    /// Change since the previous committed cycle, `None` on the first.
    pub deltas: Option<KpiDeltas>,
    /// Number of normalized positions before filtering.
    pub position_count: usize,
    /// Filtered, rounded, sorted positions.
    pub positions: Vec<PositionRecord>,
    /// Currency buckets over the filtered view, largest exposure first.
    pub buckets: Vec<CurrencyBucket>,
    /// Values available for the symbol and platform filters.
    pub filter_options: FilterOptions,
}

/// What a finished cycle produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// Nothing to show; state was not committed.
    NoData {
        /// Why nothing was published.
        reason: NoDataReason,
        /// Last query tried.
        query_used: FetchQueryBody,
    },
    /// A new view was produced and state committed.
    Published(Box<RenderModel>),
}

/// Cycle failures. The prior state remains valid after either.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CycleError {
    /// Credentials or client code are not configured.
    #[error("configuration error: {0}")]
    Configuration(LoginError),

    /// The login endpoint rejected or failed the login.
    #[error("authentication error: {0}")]
    Authentication(LoginError),
}

impl CycleError {
    /// Configuration errors stop the scheduler; authentication errors only
    /// abandon the current cycle.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::Configuration(_))
    }
}

impl From<LoginError> for CycleError {
    fn from(err: LoginError) -> Self {
        if err.is_configuration() {
            Self::Configuration(err)
        } else {
            Self::Authentication(err)
        }
    }
}

/// Sequences one refresh cycle.
#[derive(Clone)]
pub struct Pipeline {
    fetcher: PositionFetcher,
    catalog: Arc<InstrumentCatalog>,
}

impl Pipeline {
    /// Create a pipeline over a fetcher and the instrument catalog.
    #[must_use]
    pub const fn new(fetcher: PositionFetcher, catalog: Arc<InstrumentCatalog>) -> Self {
        Self { fetcher, catalog }
    }

    /// Run one cycle against the prior state.
    ///
    /// # Errors
    ///
    /// Returns [`CycleError`] when login fails; the caller keeps `prior`.
    pub async fn run_cycle(
        &self,
        context: &CycleContext,
        prior: &PipelineState,
    ) -> Result<(PipelineState, CycleOutcome), CycleError> {
        let fetched = self.fetcher.fetch_positions(&context.accounts).await?;
        Ok(commit_cycle(&self.catalog, context, prior, fetched, Utc::now()))
    }
}

/// Turn fetched rows into the next state and the published outcome.
#[must_use]
pub fn commit_cycle(
    catalog: &InstrumentCatalog,
    context: &CycleContext,
    prior: &PipelineState,
    fetched: FetchedPositions,
    now: DateTime<Utc>,
) -> (PipelineState, CycleOutcome) {
    if fetched.items.is_empty() {
        return no_data(prior, NoDataReason::NoPositions, fetched.query_used);
    }

    let records = normalize_positions(&fetched.items);
    if records.is_empty() {
        return no_data(
            prior,
            NoDataReason::EmptyAfterNormalization,
            fetched.query_used,
        );
    }

    let aggregator = ExposureAggregator::new(catalog);
    let view = build_view(&records, &context.filter);
    // Buckets sum exact values; rounding applies to the displayed rows only.
    let Aggregation { kpis, buckets } = if context.filter.is_all() {
        aggregator.aggregate(&records)
    } else {
        let selected: Vec<PositionRecord> = records
            .iter()
            .filter(|r| context.filter.matches(r))
            .cloned()
            .collect();
        Aggregation {
            kpis: headline_kpis(&records),
            buckets: aggregator.bucket_table(&selected),
        }
    };

    let mut kpi = prior.kpi.clone();
    let deltas = kpi.update(kpis);

    let model = RenderModel {
        generated_at: now,
        accounts: context.accounts.clone(),
        client_code: fetched.session.client_code,
        broker_user: fetched.session.broker_user,
        query_used: fetched.query_used,
        query_kind: fetched.query_kind,
        kpis_formatted: FormattedKpis::from(&kpis),
        kpis,
        deltas,
        position_count: records.len(),
        positions: view,
        buckets: buckets.sorted_by_magnitude(),
        filter_options: filter_options(&records),
    };

    let next = PipelineState {
        kpi,
        buckets: Some(buckets),
    };
    (next, CycleOutcome::Published(Box::new(model)))
}

fn no_data(
    prior: &PipelineState,
    reason: NoDataReason,
    query_used: FetchQueryBody,
) -> (PipelineState, CycleOutcome) {
    (
        prior.clone(),
        CycleOutcome::NoData { reason, query_used },
    )
}
