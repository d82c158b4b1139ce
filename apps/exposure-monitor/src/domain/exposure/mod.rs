//! Exposure Aggregation
//!
//! Computes the headline KPIs (floating P/L, notional volume, utilised
//! margin) and the per-currency net exposure table from normalized
//! positions.
//!
//! # Bucket algorithm
//!
//! Each record is joined to its [`InstrumentMeta`](crate::domain::instruments::InstrumentMeta)
//! by symbol. Base exposure is summed per base currency, quote exposure per
//! quote currency, and every currency in the fixed bucket dictionary gets
//! `base_sum + quote_sum`. Buckets without contributions are reported as zero.
//! Records whose symbol is not in the catalog count toward the KPIs only.
//!
//! The table is rebuilt from scratch on every call; no bucket value survives
//! between cycles.
//!
//! # Overflow
//!
//! Totals saturate at `Decimal::MAX`/`Decimal::MIN` instead of panicking, so
//! one absurd value from the bridge cannot take the monitor down.

use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::Serialize;

use crate::domain::instruments::InstrumentCatalog;
use crate::domain::positions::PositionRecord;

/// Headline scalar KPIs for one cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct HeadlineKpis {
    /// Sum of floating P/L, nulls counted as zero.
    pub pl: Decimal,
    /// Sum of notional, or of `|net| * avg_px` when no record reports one.
    pub notional: Decimal,
    /// Sum of margin, `None` when no record reports one.
    pub margin: Option<Decimal>,
}

/// Net exposure for one currency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CurrencyBucket {
    /// Currency or asset code.
    pub asset: String,
    /// Signed net exposure.
    pub net_total: Decimal,
}

/// The full bucket set, in dictionary order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct BucketTable {
    buckets: Vec<CurrencyBucket>,
}

impl BucketTable {
    /// All buckets in dictionary order.
    #[must_use]
    pub fn buckets(&self) -> &[CurrencyBucket] {
        &self.buckets
    }

    /// Net total for one currency, if it is a known bucket.
    #[must_use]
    pub fn net_total(&self, asset: &str) -> Option<Decimal> {
        self.buckets
            .iter()
            .find(|b| b.asset == asset)
            .map(|b| b.net_total)
    }

    /// Buckets ordered by absolute net exposure, largest first.
    ///
    /// Ties keep dictionary order.
    #[must_use]
    pub fn sorted_by_magnitude(&self) -> Vec<CurrencyBucket> {
        let mut sorted = self.buckets.clone();
        sorted.sort_by(|a, b| b.net_total.abs().cmp(&a.net_total.abs()));
        sorted
    }
}

/// KPIs and buckets produced together from one record set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Aggregation {
    /// Headline KPIs.
    pub kpis: HeadlineKpis,
    /// Currency bucket table.
    pub buckets: BucketTable,
}

/// Stateless aggregator over a fixed instrument catalog.
#[derive(Debug, Clone, Copy)]
pub struct ExposureAggregator<'a> {
    catalog: &'a InstrumentCatalog,
}

impl<'a> ExposureAggregator<'a> {
    /// Create an aggregator over the given catalog.
    #[must_use]
    pub const fn new(catalog: &'a InstrumentCatalog) -> Self {
        Self { catalog }
    }

    /// Compute KPIs and the bucket table from the same records.
    #[must_use]
    pub fn aggregate(&self, records: &[PositionRecord]) -> Aggregation {
        Aggregation {
            kpis: headline_kpis(records),
            buckets: self.bucket_table(records),
        }
    }

    /// Recompute every bucket from scratch.
    #[must_use]
    pub fn bucket_table(&self, records: &[PositionRecord]) -> BucketTable {
        let mut base_sum: HashMap<&str, Decimal> = HashMap::new();
        let mut quote_sum: HashMap<&str, Decimal> = HashMap::new();

        for record in records {
            let Some(meta) = record.symbol.as_deref().and_then(|s| self.catalog.get(s)) else {
                continue;
            };
            let base = base_sum.entry(meta.base).or_default();
            *base = saturating_add(*base, record.base_exposure.unwrap_or_default());
            let quote = quote_sum.entry(meta.quote).or_default();
            *quote = saturating_add(*quote, record.quote_exposure.unwrap_or_default());
        }

        let buckets = self
            .catalog
            .buckets()
            .iter()
            .map(|&asset| CurrencyBucket {
                asset: asset.to_string(),
                net_total: saturating_add(
                    base_sum.get(asset).copied().unwrap_or_default(),
                    quote_sum.get(asset).copied().unwrap_or_default(),
                ),
            })
            .collect();

        BucketTable { buckets }
    }
}

/// Sum the headline KPIs across all records.
#[must_use]
pub fn headline_kpis(records: &[PositionRecord]) -> HeadlineKpis {
    let pl = saturating_sum(records.iter().filter_map(|r| r.pl));

    let reported_notional: Vec<Decimal> = records.iter().filter_map(|r| r.notional).collect();
    let notional = if reported_notional.is_empty() {
        saturating_sum(records.iter().filter_map(PositionRecord::estimated_notional))
    } else {
        saturating_sum(reported_notional)
    };

    let margins: Vec<Decimal> = records.iter().filter_map(|r| r.margin).collect();
    let margin = (!margins.is_empty()).then(|| saturating_sum(margins));

    HeadlineKpis {
        pl,
        notional,
        margin,
    }
}

fn saturating_sum(values: impl IntoIterator<Item = Decimal>) -> Decimal {
    values.into_iter().fold(Decimal::ZERO, saturating_add)
}

fn saturating_add(total: Decimal, value: Decimal) -> Decimal {
    total.checked_add(value).unwrap_or_else(|| {
        tracing::warn!(%total, %value, "Exposure total overflowed, saturating");
        if value.is_sign_negative() {
            Decimal::MIN
        } else {
            Decimal::MAX
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::instruments::BUCKET_CURRENCIES;
    use crate::domain::positions::{RawPositionRow, normalize_positions};
    use rust_decimal_macros::dec;
    use serde_json::{Value, json};

    fn position(symbol: &str, base: Decimal, quote: Decimal) -> PositionRecord {
        PositionRecord {
            symbol: Some(symbol.to_string()),
            base_exposure: Some(base),
            quote_exposure: Some(quote),
            ..PositionRecord::default()
        }
    }

    fn row(value: Value) -> RawPositionRow {
        match value {
            Value::Object(map) => map,
            _ => panic!("test rows must be objects"),
        }
    }

    fn aggregator() -> ExposureAggregator<'static> {
        ExposureAggregator::new(InstrumentCatalog::standard())
    }

    #[test]
    fn buckets_sum_base_and_quote_exposure() {
        let records = vec![
            position("EURUSD", dec!(100000), dec!(-108500)),
            position("USDJPY", dec!(50000), dec!(-7500000)),
            position("EURGBP", dec!(-20000), dec!(17000)),
        ];

        let table = aggregator().bucket_table(&records);

        assert_eq!(table.net_total("EUR"), Some(dec!(80000)));
        assert_eq!(table.net_total("USD"), Some(dec!(-58500)));
        assert_eq!(table.net_total("JPY"), Some(dec!(-7500000)));
        assert_eq!(table.net_total("GBP"), Some(dec!(17000)));
    }

    #[test]
    fn untouched_buckets_are_zero_not_omitted() {
        let records = vec![position("EURUSD", dec!(1), dec!(-1))];

        let table = aggregator().bucket_table(&records);

        assert_eq!(table.buckets().len(), BUCKET_CURRENCIES.len());
        assert_eq!(table.net_total("ZAR"), Some(Decimal::ZERO));
        assert_eq!(table.net_total("XAU"), Some(Decimal::ZERO));
    }

    #[test]
    fn unknown_symbols_skip_buckets_but_count_in_kpis() {
        let mut unknown = position("UNLISTED", dec!(999), dec!(999));
        unknown.pl = Some(dec!(40));
        let mut known = position("AUDUSD", dec!(10), dec!(-6));
        known.pl = Some(dec!(2));

        let result = aggregator().aggregate(&[unknown, known]);

        assert_eq!(result.kpis.pl, dec!(42));
        let total: Decimal = result.buckets.buckets().iter().map(|b| b.net_total).sum();
        assert_eq!(total, dec!(4));
    }

    #[test]
    fn empty_records_give_zero_table() {
        let table = aggregator().bucket_table(&[]);
        assert!(table.buckets().iter().all(|b| b.net_total.is_zero()));
        assert_eq!(table.buckets().len(), 30);
    }

    #[test]
    fn null_exposures_contribute_nothing() {
        let record = PositionRecord {
            symbol: Some("GBPUSD".to_string()),
            base_exposure: None,
            quote_exposure: Some(dec!(-5)),
            ..PositionRecord::default()
        };

        let table = aggregator().bucket_table(&[record]);

        assert_eq!(table.net_total("GBP"), Some(Decimal::ZERO));
        assert_eq!(table.net_total("USD"), Some(dec!(-5)));
    }

    #[test]
    fn pl_sum_treats_null_as_zero() {
        let records = vec![
            PositionRecord {
                pl: Some(dec!(100)),
                ..PositionRecord::default()
            },
            PositionRecord::default(),
            PositionRecord {
                pl: Some(dec!(-30.5)),
                ..PositionRecord::default()
            },
        ];

        assert_eq!(headline_kpis(&records).pl, dec!(69.5));
    }

    #[test]
    fn notional_prefers_reported_values() {
        let records = vec![
            PositionRecord {
                notional: Some(dec!(1000)),
                net: Some(dec!(5)),
                avg_px: Some(dec!(5)),
                ..PositionRecord::default()
            },
            PositionRecord {
                net: Some(dec!(10)),
                avg_px: Some(dec!(10)),
                ..PositionRecord::default()
            },
        ];

        assert_eq!(headline_kpis(&records).notional, dec!(1000));
    }

    #[test]
    fn notional_is_estimated_when_never_reported() {
        let records = vec![
            PositionRecord {
                net: Some(dec!(-2)),
                avg_px: Some(dec!(1.5)),
                ..PositionRecord::default()
            },
            PositionRecord {
                net: Some(dec!(4)),
                avg_px: Some(dec!(10)),
                ..PositionRecord::default()
            },
        ];

        assert_eq!(headline_kpis(&records).notional, dec!(43));
    }

    #[test]
    fn margin_absent_everywhere_is_none() {
        let records = vec![PositionRecord::default()];
        assert_eq!(headline_kpis(&records).margin, None);

        let with_margin = vec![
            PositionRecord {
                margin: Some(dec!(12)),
                ..PositionRecord::default()
            },
            PositionRecord::default(),
        ];
        assert_eq!(headline_kpis(&with_margin).margin, Some(dec!(12)));
    }

    #[test]
    fn sorted_by_magnitude_keeps_dictionary_order_on_ties() {
        let records = vec![position("USDJPY", dec!(-300), dec!(200))];
        let sorted = aggregator().bucket_table(&records).sorted_by_magnitude();

        assert_eq!(sorted[0].asset, "USD");
        assert_eq!(sorted[1].asset, "JPY");
        assert_eq!(sorted[2].asset, "AUD");
    }

    #[test]
    fn overflowing_estimate_drops_out_of_notional() {
        let records = normalize_positions(&[
            row(json!({"net_volume": "1e20", "avg_price": "1e10"})),
            row(json!({"net_volume": 3, "avg_price": 2})),
        ]);

        assert_eq!(headline_kpis(&records).notional, dec!(6));
    }

    #[test]
    fn kpi_sums_saturate_instead_of_panicking() {
        let huge = "70000000000000000000000000000";
        let records = normalize_positions(&[
            row(json!({"pl": huge, "margin": huge})),
            row(json!({"pl": huge, "margin": huge})),
        ]);

        let kpis = headline_kpis(&records);

        assert_eq!(kpis.pl, Decimal::MAX);
        assert_eq!(kpis.margin, Some(Decimal::MAX));

        let negative = vec![
            PositionRecord {
                pl: Some(Decimal::MIN),
                ..PositionRecord::default()
            },
            PositionRecord {
                pl: Some(dec!(-1)),
                ..PositionRecord::default()
            },
        ];
        assert_eq!(headline_kpis(&negative).pl, Decimal::MIN);
    }

    #[test]
    fn bucket_sums_saturate_instead_of_panicking() {
        let records = vec![
            position("EURUSD", Decimal::MAX, Decimal::ZERO),
            position("EURGBP", Decimal::MAX, Decimal::ZERO),
            position("USDJPY", dec!(1), Decimal::MIN),
            position("AUDJPY", dec!(1), dec!(-1)),
        ];

        let table = aggregator().bucket_table(&records);

        assert_eq!(table.net_total("EUR"), Some(Decimal::MAX));
        assert_eq!(table.net_total("JPY"), Some(Decimal::MIN));
        assert_eq!(table.net_total("USD"), Some(dec!(1)));
    }
}
