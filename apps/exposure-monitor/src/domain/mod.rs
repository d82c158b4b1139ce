//! Domain Layer - Position normalization and exposure aggregation.
//!
//! Pure Rust types and functions with no I/O. Everything the refresh cycle
//! computes lives here; the application layer only sequences it.

/// Account identifier normalization.
pub mod accounts;

/// Headline KPIs and per-currency net exposure.
pub mod exposure;

/// Static instrument and currency bucket reference data.
pub mod instruments;

/// Period-over-period KPI tracking.
pub mod kpi;

/// Monetary display formatting.
pub mod money;

/// Position records, normalization, and the filtered view.
pub mod positions;
