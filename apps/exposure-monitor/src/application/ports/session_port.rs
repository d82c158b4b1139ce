//! Session Port (Driven Port)
//!
//! Interface for authenticating against the bridge login endpoint.

use async_trait::async_trait;
use thiserror::Error;

/// An authenticated bridge session, valid for one cycle.
#[derive(Clone, PartialEq, Eq)]
pub struct Session {
    /// Bearer token.
    pub token: String,
    /// Client code scoping every positions query.
    pub client_code: String,
    /// Broker user forwarded with every positions query.
    pub broker_user: String,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("token", &"[REDACTED]")
            .field("client_code", &self.client_code)
            .field("broker_user", &self.broker_user)
            .finish()
    }
}

/// Login failures.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LoginError {
    /// Username or password not configured.
    #[error("missing credentials: username and password must be configured")]
    MissingCredentials,

    /// Neither the login response nor configuration supplied a client code.
    #[error("client code missing: login returned none and no default is configured")]
    MissingClientCode,

    /// Login endpoint answered with a non-success status.
    #[error("login rejected with status {status}")]
    Rejected {
        /// HTTP status code.
        status: u16,
    },

    /// Login request did not complete.
    #[error("login transport error: {0}")]
    Transport(String),

    /// Login succeeded but the body could not be read.
    #[error("invalid login response: {0}")]
    InvalidResponse(String),
}

impl LoginError {
    /// Whether the failure is a configuration problem rather than a
    /// rejected or failed login.
    #[must_use]
    pub const fn is_configuration(&self) -> bool {
        matches!(self, Self::MissingCredentials | Self::MissingClientCode)
    }
}

/// Authenticates against the bridge.
#[async_trait]
pub trait SessionPort: Send + Sync {
    /// Log in and resolve the client code and broker user.
    async fn login(&self) -> Result<Session, LoginError>;
}
