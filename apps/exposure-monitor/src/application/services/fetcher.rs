//! Position Fetcher
//!
//! Runs the positions query fallback against the bridge. Account ids may be
//! stored remotely in canonical (`CLIENT||<id>`) or raw form, so both are
//! tried before falling back to everything the session can see.
//!
//! # Decision table
//!
//! | Attempt result              | Action                         |
//! |-----------------------------|--------------------------------|
//! | `Ok(rows)`, rows non-empty  | stop, return rows              |
//! | `Ok(rows)`, rows empty      | try next candidate             |
//! | `Err(fault)`, network fault | warn, try next candidate       |
//! | `Err(fault)`, other fault   | debug, try next candidate      |
//!
//! When every candidate comes back empty the wildcard body is reported as
//! the query used.

use std::sync::Arc;

use serde::Serialize;

use crate::application::ports::{
    FetchQueryBody, LoginError, PositionsPort, Session, SessionPort, TransportFault,
};
use crate::domain::accounts::{AccountTokens, normalize_accounts};
use crate::domain::positions::RawPositionRow;
use crate::infrastructure::metrics;

/// Which account shape a candidate query uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryKind {
    /// `CLIENT||<id>` tokens.
    Canonical,
    /// Tokens exactly as configured.
    Raw,
    /// No account filter.
    Wildcard,
}

impl QueryKind {
    /// Label for logs and metrics.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Canonical => "canonical",
            Self::Raw => "raw",
            Self::Wildcard => "wildcard",
        }
    }
}

/// One query the fetcher will try.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchCandidate {
    /// Account shape.
    pub kind: QueryKind,
    /// Request body.
    pub body: FetchQueryBody,
}

/// Build the ordered candidate list: canonical, raw, then wildcard.
///
/// Empty token lists are skipped; the wildcard is always last.
#[must_use]
pub fn build_candidates(tokens: &AccountTokens) -> Vec<FetchCandidate> {
    let mut candidates = Vec::with_capacity(3);
    if !tokens.canonical.is_empty() {
        candidates.push(FetchCandidate {
            kind: QueryKind::Canonical,
            body: FetchQueryBody::for_accounts(tokens.canonical.clone()),
        });
    }
    if !tokens.raw.is_empty() {
        candidates.push(FetchCandidate {
            kind: QueryKind::Raw,
            body: FetchQueryBody::for_accounts(tokens.raw.clone()),
        });
    }
    candidates.push(FetchCandidate {
        kind: QueryKind::Wildcard,
        body: FetchQueryBody::wildcard(),
    });
    candidates
}

/// Result of one fetch run.
#[derive(Debug, Clone)]
pub struct FetchedPositions {
    /// Raw rows from the first candidate that returned any.
    pub items: Vec<RawPositionRow>,
    /// Session used for every attempt.
    pub session: Session,
    /// Body of the successful query, or the last one tried.
    pub query_used: FetchQueryBody,
    /// Shape of `query_used`.
    pub query_kind: QueryKind,
}

/// Authenticates and runs the candidate queries in order.
#[derive(Clone)]
pub struct PositionFetcher {
    session: Arc<dyn SessionPort>,
    positions: Arc<dyn PositionsPort>,
}

impl PositionFetcher {
    /// Create a fetcher over the two bridge ports.
    #[must_use]
    pub fn new(session: Arc<dyn SessionPort>, positions: Arc<dyn PositionsPort>) -> Self {
        Self { session, positions }
    }

    /// Log in, then try each candidate until one returns positions.
    ///
    /// # Errors
    ///
    /// Returns the login error when authentication fails. Query failures
    /// never surface; they count as an empty answer for that attempt.
    pub async fn fetch_positions<S: AsRef<str>>(
        &self,
        accounts: &[S],
    ) -> Result<FetchedPositions, LoginError> {
        let session = self.session.login().await?;
        let tokens = normalize_accounts(accounts);
        let candidates = build_candidates(&tokens);

        tracing::debug!(
            canonical = tokens.canonical.len(),
            raw = tokens.raw.len(),
            candidates = candidates.len(),
            "Fetching positions"
        );

        let mut last = None;
        for candidate in candidates {
            let items = self.attempt(&session, &candidate).await;
            if !items.is_empty() {
                tracing::debug!(
                    query = candidate.kind.as_str(),
                    positions = items.len(),
                    "Positions query returned data"
                );
                return Ok(FetchedPositions {
                    items,
                    session,
                    query_used: candidate.body,
                    query_kind: candidate.kind,
                });
            }
            last = Some(candidate);
        }

        let last = last.unwrap_or(FetchCandidate {
            kind: QueryKind::Wildcard,
            body: FetchQueryBody::wildcard(),
        });
        Ok(FetchedPositions {
            items: Vec::new(),
            session,
            query_used: last.body,
            query_kind: last.kind,
        })
    }

    async fn attempt(&self, session: &Session, candidate: &FetchCandidate) -> Vec<RawPositionRow> {
        let query = candidate.kind.as_str();
        match self.positions.fetch_positions(session, &candidate.body).await {
            Ok(items) => {
                let outcome = if items.is_empty() { "empty" } else { "data" };
                metrics::record_fetch_attempt(query, outcome);
                items
            }
            Err(fault) => {
                metrics::record_fetch_attempt(query, fault.label());
                log_fault(query, &fault);
                Vec::new()
            }
        }
    }
}

fn log_fault(query: &str, fault: &TransportFault) {
    if fault.is_network() {
        tracing::warn!(query, error = %fault, "Positions endpoint unreachable or timed out");
    } else {
        tracing::debug!(query, error = %fault, "Positions endpoint returned no usable data");
    }
}
