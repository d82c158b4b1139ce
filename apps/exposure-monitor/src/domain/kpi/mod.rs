//! Period-over-period KPI tracking.
//!
//! Keeps the headline KPIs of the last committed cycle and reports the
//! change against them. Callers must only feed cycles that actually
//! produced positions; a cycle that fetched nothing never reaches
//! [`KpiTracker::update`], so deltas always compare against the last
//! cycle that had data.

use rust_decimal::Decimal;
use serde::Serialize;

use crate::domain::exposure::HeadlineKpis;

/// Scalar KPIs retained between cycles.
pub type KpiSnapshot = HeadlineKpis;

/// Change in each headline KPI since the previous committed cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct KpiDeltas {
    /// Change in floating P/L.
    pub pl: Decimal,
    /// Change in notional volume.
    pub notional: Decimal,
    /// Change in utilised margin, `None` unless both cycles reported margin.
    pub margin: Option<Decimal>,
}

impl KpiDeltas {
    /// Difference `current - previous` for every tracked scalar, saturating
    /// at the `Decimal` bounds.
    #[must_use]
    pub fn between(previous: &KpiSnapshot, current: &KpiSnapshot) -> Self {
        Self {
            pl: current.pl.saturating_sub(previous.pl),
            notional: current.notional.saturating_sub(previous.notional),
            margin: current
                .margin
                .zip(previous.margin)
                .map(|(c, p)| c.saturating_sub(p)),
        }
    }
}

/// Holds the previous snapshot and computes deltas.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KpiTracker {
    previous: Option<KpiSnapshot>,
}

impl KpiTracker {
    /// A tracker with no history.
    #[must_use]
    pub const fn new() -> Self {
        Self { previous: None }
    }

    /// Compute deltas against the stored snapshot, then store `current`.
    ///
    /// Returns `None` on the first call: there is nothing to compare
    /// against, and a zero delta would be misleading.
    pub fn update(&mut self, current: KpiSnapshot) -> Option<KpiDeltas> {
        let deltas = self
            .previous
            .as_ref()
            .map(|previous| KpiDeltas::between(previous, &current));
        self.previous = Some(current);
        deltas
    }

    /// The last committed snapshot.
    #[must_use]
    pub const fn previous(&self) -> Option<&KpiSnapshot> {
        self.previous.as_ref()
    }
}
