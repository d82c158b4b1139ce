//! Monitor Configuration Settings
//!
//! Configuration types for the exposure monitor, loaded from environment
//! variables.

use std::time::Duration;

use crate::domain::positions::ViewFilter;

/// Bridge login credentials.
#[derive(Clone)]
pub struct Credentials {
    username: String,
    password: String,
}

impl Credentials {
    /// Create new credentials.
    #[must_use]
    pub const fn new(username: String, password: String) -> Self {
        Self { username, password }
    }

    /// Get the username.
    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Get the password.
    #[must_use]
    pub fn password(&self) -> &str {
        &self.password
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Bridge endpoint settings.
#[derive(Debug, Clone)]
pub struct BridgeSettings {
    /// Login endpoint.
    pub login_url: String,
    /// Positions query endpoint.
    pub positions_url: String,
    /// Client code used when login does not return one.
    pub default_client_code: Option<String>,
    /// Login request timeout.
    pub login_timeout: Duration,
    /// Positions request timeout.
    pub fetch_timeout: Duration,
}

impl BridgeSettings {
    /// Default login timeout.
    pub const DEFAULT_LOGIN_TIMEOUT: Duration = Duration::from_secs(15);
    /// Default positions timeout.
    pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(25);
}

/// Refresh loop settings.
#[derive(Debug, Clone)]
pub struct RefreshSettings {
    /// Period between cycle starts.
    pub interval: Duration,
    /// Run a single cycle and exit.
    pub run_once: bool,
}

impl Default for RefreshSettings {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(5),
            run_once: false,
        }
    }
}

/// Server port settings.
#[derive(Debug, Clone)]
pub struct ServerSettings {
    /// HTTP port for health, metrics and the exposure view (0 = disabled).
    pub http_port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self { http_port: 8083 }
    }
}

/// Complete monitor configuration.
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// Bridge credentials.
    pub credentials: Credentials,
    /// Bridge endpoints and timeouts.
    pub bridge: BridgeSettings,
    /// Account identifiers to monitor, as configured.
    pub accounts: Vec<String>,
    /// Symbol/platform filter for the published view.
    pub filter: ViewFilter,
    /// Refresh loop settings.
    pub refresh: RefreshSettings,
    /// Server port settings.
    pub server: ServerSettings,
}

impl MonitorConfig {
    /// Create configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if required environment variables are missing or
    /// empty.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Create configuration from an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// Returns an error if required keys are missing or empty.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = EnvReader { lookup };

        let login_url = env.required("CENTROID_LOGIN_URL")?;
        let positions_url = env.required("CENTROID_POSITIONS_URL")?;
        let username = env.required("CENTROID_USERNAME")?;
        let password = env.required("CENTROID_PASSWORD")?;

        let bridge = BridgeSettings {
            login_url,
            positions_url,
            default_client_code: env.optional("CENTROID_CLIENT_CODE"),
            login_timeout: env.duration_secs(
                "CENTROID_LOGIN_TIMEOUT_SECS",
                BridgeSettings::DEFAULT_LOGIN_TIMEOUT,
            ),
            fetch_timeout: env.duration_secs(
                "CENTROID_FETCH_TIMEOUT_SECS",
                BridgeSettings::DEFAULT_FETCH_TIMEOUT,
            ),
        };

        let accounts = env
            .optional("CENTROID_ACCOUNTS")
            .map(|raw| split_list(&raw))
            .unwrap_or_default();

        let filter = ViewFilter {
            symbol: env.optional("EXPOSURE_FILTER_SYMBOL"),
            taker: env.optional("EXPOSURE_FILTER_TAKER"),
        };

        let refresh = RefreshSettings {
            interval: env.duration_secs(
                "EXPOSURE_REFRESH_INTERVAL_SECS",
                RefreshSettings::default().interval,
            ),
            run_once: env.bool("EXPOSURE_RUN_ONCE", false),
        };

        let server = ServerSettings {
            http_port: env.u16("EXPOSURE_HTTP_PORT", ServerSettings::default().http_port),
        };

        Ok(Self {
            credentials: Credentials::new(username, password),
            bridge,
            accounts,
            filter,
            refresh,
            server,
        })
    }
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Required environment variable is missing.
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),
    /// Environment variable has empty value.
    #[error("environment variable {0} cannot be empty")]
    EmptyValue(String),
}

struct EnvReader<F> {
    lookup: F,
}

impl<F> EnvReader<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn required(&self, key: &str) -> Result<String, ConfigError> {
        let value = (self.lookup)(key).ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))?;
        let value = value.trim();
        if value.is_empty() {
            return Err(ConfigError::EmptyValue(key.to_string()));
        }
        Ok(value.to_string())
    }

    fn optional(&self, key: &str) -> Option<String> {
        (self.lookup)(key)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn u16(&self, key: &str, default: u16) -> u16 {
        self.optional(key)
            .and_then(|v| v.parse().ok())
            .unwrap_or(default)
    }

    fn duration_secs(&self, key: &str, default: Duration) -> Duration {
        self.optional(key)
            .and_then(|v| v.parse::<u64>().ok())
            .filter(|secs| *secs > 0)
            .map_or(default, Duration::from_secs)
    }

    fn bool(&self, key: &str, default: bool) -> bool {
        self.optional(key).map_or(default, |v| {
            matches!(v.to_lowercase().as_str(), "1" | "true" | "yes" | "on")
        })
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    const REQUIRED: &[(&str, &str)] = &[
        ("CENTROID_LOGIN_URL", "https://bridge.test/login"),
        ("CENTROID_POSITIONS_URL", "https://bridge.test/positions"),
        ("CENTROID_USERNAME", "ops"),
        ("CENTROID_PASSWORD", "hunter2"),
    ];

    fn with(extra: &[(&'static str, &'static str)]) -> Vec<(&'static str, &'static str)> {
        let mut pairs = REQUIRED.to_vec();
        pairs.extend_from_slice(extra);
        pairs
    }

    #[test]
    fn defaults_apply_when_optional_keys_absent() {
        let config = MonitorConfig::from_lookup(lookup(REQUIRED)).unwrap();

        assert_eq!(config.credentials.username(), "ops");
        assert!(config.accounts.is_empty());
        assert!(config.bridge.default_client_code.is_none());
        assert_eq!(config.bridge.login_timeout, Duration::from_secs(15));
        assert_eq!(config.bridge.fetch_timeout, Duration::from_secs(25));
        assert_eq!(config.refresh.interval, Duration::from_secs(5));
        assert!(!config.refresh.run_once);
        assert_eq!(config.server.http_port, 8083);
        assert!(config.filter.is_all());
    }

    #[test]
    fn optional_keys_override_defaults() {
        let pairs = with(&[
            ("CENTROID_ACCOUNTS", " 1001, CLIENT||2002 ,,CLIENT 3003 "),
            ("CENTROID_CLIENT_CODE", "SEA"),
            ("EXPOSURE_REFRESH_INTERVAL_SECS", "10"),
            ("EXPOSURE_HTTP_PORT", "0"),
            ("EXPOSURE_RUN_ONCE", "TRUE"),
            ("EXPOSURE_FILTER_SYMBOL", "EURUSD"),
        ]);
        let config = MonitorConfig::from_lookup(lookup(&pairs)).unwrap();

        assert_eq!(
            config.accounts,
            vec!["1001", "CLIENT||2002", "CLIENT 3003"]
        );
        assert_eq!(config.bridge.default_client_code.as_deref(), Some("SEA"));
        assert_eq!(config.refresh.interval, Duration::from_secs(10));
        assert_eq!(config.server.http_port, 0);
        assert!(config.refresh.run_once);
        assert_eq!(config.filter.symbol.as_deref(), Some("EURUSD"));
        assert!(config.filter.taker.is_none());
    }

    #[test]
    fn unparsable_or_zero_values_fall_back() {
        let pairs = with(&[
            ("EXPOSURE_REFRESH_INTERVAL_SECS", "0"),
            ("CENTROID_FETCH_TIMEOUT_SECS", "soon"),
            ("EXPOSURE_HTTP_PORT", "99999"),
        ]);
        let config = MonitorConfig::from_lookup(lookup(&pairs)).unwrap();

        assert_eq!(config.refresh.interval, Duration::from_secs(5));
        assert_eq!(config.bridge.fetch_timeout, Duration::from_secs(25));
        assert_eq!(config.server.http_port, 8083);
    }

    #[test]
    fn missing_password_is_an_error() {
        let pairs: Vec<_> = REQUIRED
            .iter()
            .copied()
            .filter(|(k, _)| *k != "CENTROID_PASSWORD")
            .collect();

        let err = MonitorConfig::from_lookup(lookup(&pairs)).unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnvVar(key) if key == "CENTROID_PASSWORD"));
    }

    #[test]
    fn blank_username_is_an_error() {
        let mut pairs = REQUIRED.to_vec();
        pairs.push(("CENTROID_USERNAME", "   "));
        // Later entries win when collected into the map.
        let err = MonitorConfig::from_lookup(lookup(&pairs)).unwrap_err();
        assert!(matches!(err, ConfigError::EmptyValue(key) if key == "CENTROID_USERNAME"));
    }

    #[test]
    fn credentials_redacted_debug() {
        let creds = Credentials::new("ops".to_string(), "hunter2".to_string());
        let debug = format!("{creds:?}");
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("[REDACTED]"));
    }
}
