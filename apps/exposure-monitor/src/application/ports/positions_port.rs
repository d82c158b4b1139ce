//! Positions Port (Driven Port)
//!
//! Interface for running one query against the bridge positions endpoint.
//! Soft transport failures come back as a typed [`TransportFault`] so the
//! fetch fallback can decide on them explicitly.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::Session;
use crate::domain::positions::RawPositionRow;

/// Request body for the positions endpoint.
///
/// Empty lists mean "no filter" on that dimension.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchQueryBody {
    /// Account tokens to query.
    #[serde(rename = "position_account")]
    pub accounts: Vec<String>,
    /// Symbol filter (always empty).
    #[serde(rename = "symbol")]
    pub symbols: Vec<String>,
    /// Taker filter (always empty).
    #[serde(rename = "taker")]
    pub takers: Vec<String>,
}

impl FetchQueryBody {
    /// Query scoped to the given account tokens.
    #[must_use]
    pub const fn for_accounts(accounts: Vec<String>) -> Self {
        Self {
            accounts,
            symbols: Vec::new(),
            takers: Vec::new(),
        }
    }

    /// Query for every position visible to the session.
    #[must_use]
    pub const fn wildcard() -> Self {
        Self::for_accounts(Vec::new())
    }

    /// True when no filter is applied.
    #[must_use]
    pub fn is_wildcard(&self) -> bool {
        self.accounts.is_empty() && self.symbols.is_empty() && self.takers.is_empty()
    }
}

/// Why a positions query produced no usable data.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportFault {
    /// Request exceeded its timeout.
    #[error("request timed out")]
    Timeout,

    /// Connection could not be established or was dropped.
    #[error("connection failed: {0}")]
    Connection(String),

    /// Response status was not 200.
    #[error("unexpected status {0}")]
    UnexpectedStatus(u16),

    /// Response was not declared as JSON.
    #[error("unexpected content type: {0:?}")]
    NotJson(String),

    /// Body claimed to be JSON but did not parse.
    #[error("malformed body: {0}")]
    Malformed(String),

    /// Body parsed but was not a list of position objects.
    #[error("body is not a list of positions")]
    NotAList,
}

impl TransportFault {
    /// Faults caused by the network rather than by what the endpoint sent.
    ///
    /// These are logged as warnings; the rest are routine endpoint
    /// misbehaviour.
    #[must_use]
    pub const fn is_network(&self) -> bool {
        matches!(self, Self::Timeout | Self::Connection(_))
    }

    /// Short label for metrics.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Timeout => "timeout",
            Self::Connection(_) => "connection",
            Self::UnexpectedStatus(_) => "status",
            Self::NotJson(_) => "not_json",
            Self::Malformed(_) => "malformed",
            Self::NotAList => "not_a_list",
        }
    }
}

/// Runs positions queries against the bridge.
#[async_trait]
pub trait PositionsPort: Send + Sync {
    /// Run one query. An empty list is a valid, successful answer.
    async fn fetch_positions(
        &self,
        session: &Session,
        query: &FetchQueryBody,
    ) -> Result<Vec<RawPositionRow>, TransportFault>;
}
