//! Compact monetary formatting for headline figures.
//!
//! `1_500_000` renders as `$1.50m`, `-2_500` as `-$2.50k`. Values that are
//! missing or not numeric render as `$0.00`.

use rust_decimal::{Decimal, RoundingStrategy};
use serde_json::Value;

use crate::domain::positions::coerce_decimal;

const BILLION: Decimal = Decimal::from_parts(1_000_000_000, 0, 0, false, 0);
const MILLION: Decimal = Decimal::from_parts(1_000_000, 0, 0, false, 0);
const THOUSAND: Decimal = Decimal::from_parts(1_000, 0, 0, false, 0);

/// Format a monetary value with a magnitude suffix and two decimals.
#[must_use]
pub fn format_money(value: Decimal) -> String {
    let sign = if value.is_sign_negative() && !value.is_zero() {
        "-"
    } else {
        ""
    };
    let magnitude = value.abs();

    let (scaled, suffix) = if magnitude >= BILLION {
        (magnitude / BILLION, "b")
    } else if magnitude >= MILLION {
        (magnitude / MILLION, "m")
    } else if magnitude >= THOUSAND {
        (magnitude / THOUSAND, "k")
    } else {
        (magnitude, "")
    };

    let rounded = scaled.round_dp_with_strategy(2, RoundingStrategy::MidpointNearestEven);
    format!("{sign}${rounded:.2}{suffix}")
}

/// Format an optional value; `None` renders as `$0.00`.
#[must_use]
pub fn format_money_opt(value: Option<Decimal>) -> String {
    format_money(value.unwrap_or_default())
}

/// Format a loosely-typed JSON value.
#[must_use]
pub fn format_money_value(value: &Value) -> String {
    format_money_opt(coerce_decimal(value))
}

/// Format a textual amount; unparsable text renders as `$0.00`.
#[must_use]
pub fn format_money_str(value: &str) -> String {
    format_money_value(&Value::String(value.to_string()))
}
