//! Instrument Reference Data
//!
//! Static mapping from tradable symbol to its base and quote currency, and
//! the fixed set of currency buckets the exposure table always reports.
//! Both tables are compiled in and never change for the process lifetime.

use std::collections::HashMap;
use std::sync::OnceLock;

/// Base/quote currency pair for one tradable instrument.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InstrumentMeta {
    /// Instrument symbol as reported by the bridge.
    pub symbol: &'static str,
    /// Base currency (or asset for commodities and indices).
    pub base: &'static str,
    /// Quote currency.
    pub quote: &'static str,
}

const fn meta(symbol: &'static str, base: &'static str, quote: &'static str) -> InstrumentMeta {
    InstrumentMeta {
        symbol,
        base,
        quote,
    }
}

/// Every instrument the monitor can attribute to currency buckets.
pub const INSTRUMENTS: &[InstrumentMeta] = &[
    meta("AUDCAD", "AUD", "CAD"),
    meta("AUDCHF", "AUD", "CHF"),
    meta("AUDJPY", "AUD", "JPY"),
    meta("AUDNZD", "AUD", "NZD"),
    meta("AUDUSD", "AUD", "USD"),
    meta("BCHUSD", "BCH", "USD"),
    meta("BRENT", "BRENT", "GBP"),
    meta("BTCUSD", "BTC", "USD"),
    meta("CADCHF", "CAD", "CHF"),
    meta("CADJPY", "CAD", "JPY"),
    meta("CHFJPY", "CHF", "JPY"),
    meta("Cotton", "Cotton", "USD"),
    meta("DE40", "DE40", "EUR"),
    meta("ETHUSD", "ETH", "USD"),
    meta("EURAUD", "EUR", "AUD"),
    meta("EURCAD", "EUR", "CAD"),
    meta("EURCHF", "EUR", "CHF"),
    meta("EURGBP", "EUR", "GBP"),
    meta("EURJPY", "EUR", "JPY"),
    meta("EURNZD", "EUR", "NZD"),
    meta("EURUSD", "EUR", "USD"),
    meta("Gasoil", "Gasoil", "USD"),
    meta("GBPAUD", "GBP", "AUD"),
    meta("GBPCAD", "GBP", "CAD"),
    meta("GBPCHF", "GBP", "CHF"),
    meta("GBPJPY", "GBP", "JPY"),
    meta("GBPNZD", "GBP", "NZD"),
    meta("GBPUSD", "GBP", "USD"),
    meta("JP225", "JP225", "JPY"),
    meta("LTCUSD", "LTC", "USD"),
    meta("NZDCAD", "NZD", "CAD"),
    meta("NZDCHF", "NZD", "CHF"),
    meta("NZDJPY", "NZD", "JPY"),
    meta("NZDUSD", "NZD", "USD"),
    meta("UK100", "UK100", "GBP"),
    meta("US100", "US100", "USD"),
    meta("US30", "US30", "USD"),
    meta("US500", "US500", "USD"),
    meta("USDCAD", "USD", "CAD"),
    meta("USDCHF", "USD", "CHF"),
    meta("USDCNH", "USD", "CNH"),
    meta("USDJPY", "USD", "JPY"),
    meta("USDMXN", "USD", "MXN"),
    meta("USDNOK", "USD", "NOK"),
    meta("USDPLN", "USD", "PLN"),
    meta("USDSEK", "USD", "SEK"),
    meta("USDZAR", "USD", "ZAR"),
    meta("USOIL", "USOIL", "USD"),
    meta("XAGUSD", "XAG", "USD"),
    meta("XAUUSD", "XAU", "USD"),
];

/// Currency buckets reported in the exposure table, in display order.
pub const BUCKET_CURRENCIES: &[&str] = &[
    "AUD", "BCH", "BRENT", "BTC", "CAD", "CHF", "Cotton", "DE40", "ETH", "EUR", "Gasoil", "GBP",
    "JP225", "LTC", "NZD", "UK100", "US100", "US30", "US500", "USD", "USOIL", "XAG", "XAU", "JPY",
    "CNH", "MXN", "NOK", "PLN", "SEK", "ZAR",
];

/// Symbol-keyed lookup over an instrument table.
#[derive(Debug, Clone)]
pub struct InstrumentCatalog {
    by_symbol: HashMap<&'static str, InstrumentMeta>,
    buckets: &'static [&'static str],
}

impl InstrumentCatalog {
    /// Build a catalog from an instrument table and a bucket dictionary.
    #[must_use]
    pub fn new(instruments: &[InstrumentMeta], buckets: &'static [&'static str]) -> Self {
        let by_symbol = instruments
            .iter()
            .map(|meta| (meta.symbol, *meta))
            .collect();
        Self { by_symbol, buckets }
    }

    /// The compiled-in catalog shared by every cycle.
    #[must_use]
    pub fn standard() -> &'static Self {
        static CATALOG: OnceLock<InstrumentCatalog> = OnceLock::new();
        CATALOG.get_or_init(Self::default)
    }

    /// Look up an instrument by exact symbol.
    #[must_use]
    pub fn get(&self, symbol: &str) -> Option<&InstrumentMeta> {
        self.by_symbol.get(symbol)
    }

    /// Fixed bucket dictionary, in display order.
    #[must_use]
    pub const fn buckets(&self) -> &'static [&'static str] {
        self.buckets
    }
}

impl Default for InstrumentCatalog {
    fn default() -> Self {
        Self::new(INSTRUMENTS, BUCKET_CURRENCIES)
    }
}
