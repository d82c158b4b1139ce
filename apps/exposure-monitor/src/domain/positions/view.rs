//! Filtered and sorted position view.

use std::cmp::Ordering;
use std::collections::BTreeSet;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;

use super::PositionRecord;

/// Decimal places kept for numeric columns in the view.
const VIEW_DECIMALS: u32 = 2;

/// Optional symbol/platform selection. `None` selects everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewFilter {
    /// Exact symbol to keep.
    pub symbol: Option<String>,
    /// Exact taker (platform) to keep.
    pub taker: Option<String>,
}

impl ViewFilter {
    /// Whether a record passes this filter.
    #[must_use]
    pub fn matches(&self, record: &PositionRecord) -> bool {
        let symbol_ok = self
            .symbol
            .as_deref()
            .is_none_or(|wanted| record.symbol.as_deref() == Some(wanted));
        let taker_ok = self
            .taker
            .as_deref()
            .is_none_or(|wanted| record.taker.as_deref() == Some(wanted));
        symbol_ok && taker_ok
    }

    /// True when no selection is applied.
    #[must_use]
    pub const fn is_all(&self) -> bool {
        self.symbol.is_none() && self.taker.is_none()
    }
}

/// Distinct values available for filtering, sorted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FilterOptions {
    /// Distinct symbols.
    pub symbols: Vec<String>,
    /// Distinct takers.
    pub takers: Vec<String>,
}

/// Collect the distinct non-null symbols and takers.
#[must_use]
pub fn filter_options(records: &[PositionRecord]) -> FilterOptions {
    let symbols: BTreeSet<&str> = records.iter().filter_map(|r| r.symbol.as_deref()).collect();
    let takers: BTreeSet<&str> = records.iter().filter_map(|r| r.taker.as_deref()).collect();

    FilterOptions {
        symbols: symbols.into_iter().map(str::to_string).collect(),
        takers: takers.into_iter().map(str::to_string).collect(),
    }
}

/// Apply the filter, round numeric columns, and sort by absolute P/L
/// descending. Records without a P/L sort last.
#[must_use]
pub fn build_view(records: &[PositionRecord], filter: &ViewFilter) -> Vec<PositionRecord> {
    let mut view: Vec<PositionRecord> = records
        .iter()
        .filter(|r| filter.matches(r))
        .map(rounded)
        .collect();

    view.sort_by(|a, b| match (a.pl, b.pl) {
        (Some(x), Some(y)) => y.abs().cmp(&x.abs()),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });
    view
}

fn rounded(record: &PositionRecord) -> PositionRecord {
    let round = |v: Option<Decimal>| {
        v.map(|d| d.round_dp_with_strategy(VIEW_DECIMALS, RoundingStrategy::MidpointNearestEven))
    };
    PositionRecord {
        net: round(record.net),
        avg_px: round(record.avg_px),
        pl: round(record.pl),
        notional: round(record.notional),
        base_exposure: round(record.base_exposure),
        quote_exposure: round(record.quote_exposure),
        margin: round(record.margin),
        ..record.clone()
    }
}
