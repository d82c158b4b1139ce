//! Application Layer - Ports and the refresh cycle.
//!
//! Defines the outbound interfaces to the Centroid bridge and the services
//! that sequence one refresh cycle and drive it on a timer.

/// Port interfaces for the login and positions endpoints.
pub mod ports;

/// Position fetching, the cycle pipeline, and the refresh scheduler.
pub mod services;
