//! Configuration Module
//!
//! Configuration loading for the exposure monitor.

mod settings;

pub use settings::{
    BridgeSettings, ConfigError, Credentials, MonitorConfig, RefreshSettings, ServerSettings,
};
