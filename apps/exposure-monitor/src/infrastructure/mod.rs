//! Infrastructure Layer - Adapters and external integrations.
//!
//! Concrete implementations of the application ports, plus the ambient
//! service plumbing.

/// Centroid bridge HTTP adapters.
pub mod broker;

/// Configuration loading.
pub mod config;

/// Health, metrics and exposure HTTP endpoints.
pub mod health;

/// Prometheus metrics instrumentation.
pub mod metrics;

/// Tracing subscriber and OpenTelemetry export.
pub mod telemetry;
