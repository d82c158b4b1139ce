//! Position Records
//!
//! Raw position rows arrive from the bridge as loosely-typed JSON objects
//! whose numeric fields may be numbers, numeric strings, or garbage. This
//! module projects them onto the fixed [`PositionRecord`] schema in a single
//! step so the untyped shape never travels further than normalization.
//!
//! # Field mapping
//!
//! | Bridge field      | Record field     |
//! |-------------------|------------------|
//! | `account`         | `account`        |
//! | `symbol_val`      | `symbol`         |
//! | `net_volume`      | `net`            |
//! | `avg_price`       | `avg_px`         |
//! | `pl`              | `pl`             |
//! | `taker`           | `taker`          |
//! | `last_time_value` | `last_time`      |
//! | `notional`        | `notional`       |
//! | `base_exposure`   | `base_exposure`  |
//! | `quote_exposure`  | `quote_exposure` |
//! | `margin`          | `margin`         |
//!
//! Every other field is dropped.

mod view;

pub use view::{FilterOptions, ViewFilter, build_view, filter_options};

use std::str::FromStr;

use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::{Map, Value};

/// One raw position object as returned by the positions endpoint.
pub type RawPositionRow = Map<String, Value>;

/// Symbol that is never shown, compared case-insensitively.
pub const EXCLUDED_SYMBOL: &str = "coffee";

/// A normalized open position.
///
/// Numeric fields are `None` when the bridge omitted them or sent a value
/// that could not be read as a number.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PositionRecord {
    /// Trading account the position belongs to.
    pub account: Option<String>,
    /// Instrument symbol.
    pub symbol: Option<String>,
    /// Signed net volume.
    pub net: Option<Decimal>,
    /// Average entry price.
    pub avg_px: Option<Decimal>,
    /// Floating profit/loss.
    pub pl: Option<Decimal>,
    /// Counterparty or platform the position was taken on.
    pub taker: Option<String>,
    /// Last update time, as reported.
    pub last_time: Option<String>,
    /// Notional value.
    pub notional: Option<Decimal>,
    /// Exposure in the base currency.
    pub base_exposure: Option<Decimal>,
    /// Exposure in the quote currency.
    pub quote_exposure: Option<Decimal>,
    /// Margin utilised.
    pub margin: Option<Decimal>,
}

impl PositionRecord {
    /// Project one raw row onto the record schema.
    #[must_use]
    pub fn from_raw(row: &RawPositionRow) -> Self {
        Self {
            account: text_field(row, "account"),
            symbol: text_field(row, "symbol_val"),
            net: numeric_field(row, "net_volume"),
            avg_px: numeric_field(row, "avg_price"),
            pl: numeric_field(row, "pl"),
            taker: text_field(row, "taker"),
            last_time: text_field(row, "last_time_value"),
            notional: numeric_field(row, "notional"),
            base_exposure: numeric_field(row, "base_exposure"),
            quote_exposure: numeric_field(row, "quote_exposure"),
            margin: numeric_field(row, "margin"),
        }
    }

    /// Whether the standing instrument exclusion applies to this record.
    #[must_use]
    pub fn is_excluded(&self) -> bool {
        self.symbol
            .as_deref()
            .is_some_and(|s| s.to_lowercase() == EXCLUDED_SYMBOL)
    }

    /// Notional estimated from volume and price: `|net| * avg_px`.
    ///
    /// `None` when either input is missing or the product does not fit in a
    /// `Decimal`.
    #[must_use]
    pub fn estimated_notional(&self) -> Option<Decimal> {
        self.net?.abs().checked_mul(self.avg_px?)
    }
}

/// Normalize raw rows into position records, dropping excluded instruments.
#[must_use]
pub fn normalize_positions(rows: &[RawPositionRow]) -> Vec<PositionRecord> {
    rows.iter()
        .map(PositionRecord::from_raw)
        .filter(|record| !record.is_excluded())
        .collect()
}

/// Best-effort numeric coercion.
///
/// Accepts JSON numbers and strings holding a plain or scientific decimal.
/// Everything else yields `None`.
#[must_use]
pub fn coerce_decimal(value: &Value) -> Option<Decimal> {
    match value {
        Value::Number(n) => parse_decimal(&n.to_string()),
        Value::String(s) => parse_decimal(s.trim()),
        _ => None,
    }
}

fn parse_decimal(s: &str) -> Option<Decimal> {
    if s.is_empty() {
        return None;
    }
    Decimal::from_str(s)
        .or_else(|_| Decimal::from_scientific(s))
        .ok()
}

fn numeric_field(row: &RawPositionRow, key: &str) -> Option<Decimal> {
    row.get(key).and_then(coerce_decimal)
}

fn text_field(row: &RawPositionRow, key: &str) -> Option<String> {
    match row.get(key)? {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}
