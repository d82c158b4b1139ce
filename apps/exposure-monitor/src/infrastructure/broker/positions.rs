//! Bridge Positions Query
//!
//! `PositionsPort` over the bridge's positions endpoint. Only a `200`
//! response whose content type names `application/json` and whose body is
//! a JSON array counts as an answer; anything else is a [`TransportFault`]
//! that the fetcher treats as an empty result.

use async_trait::async_trait;
use reqwest::{Client, StatusCode, header};
use serde_json::Value;

use crate::application::ports::{FetchQueryBody, PositionsPort, Session, TransportFault};
use crate::domain::positions::RawPositionRow;
use crate::infrastructure::config::BridgeSettings;

const FORWARD_CLIENT: &str = "x-forward-client";
const FORWARD_USER: &str = "x-forward-user";

/// Queries open positions over HTTP.
#[derive(Debug, Clone)]
pub struct HttpPositionsClient {
    client: Client,
    positions_url: String,
}

impl HttpPositionsClient {
    /// Create a client from bridge settings.
    ///
    /// # Errors
    ///
    /// Returns [`TransportFault::Connection`] if the HTTP client cannot be
    /// built.
    pub fn new(settings: &BridgeSettings) -> Result<Self, TransportFault> {
        let client = Client::builder()
            .timeout(settings.fetch_timeout)
            .build()
            .map_err(|e| TransportFault::Connection(e.to_string()))?;

        Ok(Self {
            client,
            positions_url: settings.positions_url.clone(),
        })
    }
}

#[async_trait]
impl PositionsPort for HttpPositionsClient {
    async fn fetch_positions(
        &self,
        session: &Session,
        query: &FetchQueryBody,
    ) -> Result<Vec<RawPositionRow>, TransportFault> {
        let response = self
            .client
            .post(&self.positions_url)
            .header(header::ACCEPT, "application/json")
            .bearer_auth(&session.token)
            .header(FORWARD_CLIENT, &session.client_code)
            .header(FORWARD_USER, &session.broker_user)
            .json(query)
            .send()
            .await
            .map_err(classify)?;

        if response.status() != StatusCode::OK {
            return Err(TransportFault::UnexpectedStatus(response.status().as_u16()));
        }

        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_ascii_lowercase();
        if !content_type.contains("application/json") {
            return Err(TransportFault::NotJson(content_type));
        }

        let body = response.bytes().await.map_err(classify)?;
        let value: Value =
            serde_json::from_slice(&body).map_err(|e| TransportFault::Malformed(e.to_string()))?;

        rows_from_value(value)
    }
}

/// Keep the object elements of a JSON array.
fn rows_from_value(value: Value) -> Result<Vec<RawPositionRow>, TransportFault> {
    let Value::Array(items) = value else {
        return Err(TransportFault::NotAList);
    };

    let total = items.len();
    let rows: Vec<RawPositionRow> = items
        .into_iter()
        .filter_map(|item| match item {
            Value::Object(map) => Some(map),
            _ => None,
        })
        .collect();

    if rows.len() < total {
        tracing::debug!(
            skipped = total - rows.len(),
            "Ignoring non-object entries in positions response"
        );
    }
    Ok(rows)
}

fn classify(err: reqwest::Error) -> TransportFault {
    if err.is_timeout() {
        TransportFault::Timeout
    } else {
        TransportFault::Connection(err.to_string())
    }
}
