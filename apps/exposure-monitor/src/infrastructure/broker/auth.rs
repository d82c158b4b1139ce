//! Bridge Login
//!
//! `SessionPort` over the bridge's JSON login endpoint.
//!
//! # Resolution
//!
//! - client code: login response, else the configured default, else
//!   [`LoginError::MissingClientCode`]
//! - broker user: login response, else the configured username

use async_trait::async_trait;
use reqwest::Client;

use super::messages::{LoginRequest, LoginResponse};
use crate::application::ports::{LoginError, Session, SessionPort};
use crate::infrastructure::config::{BridgeSettings, Credentials};

/// Logs in against the bridge over HTTP.
#[derive(Debug, Clone)]
pub struct HttpSessionAuthenticator {
    client: Client,
    login_url: String,
    credentials: Credentials,
    default_client_code: Option<String>,
}

impl HttpSessionAuthenticator {
    /// Create an authenticator from bridge settings.
    ///
    /// # Errors
    ///
    /// Returns [`LoginError::Transport`] if the HTTP client cannot be built.
    pub fn new(settings: &BridgeSettings, credentials: Credentials) -> Result<Self, LoginError> {
        let client = Client::builder()
            .timeout(settings.login_timeout)
            .build()
            .map_err(|e| LoginError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            login_url: settings.login_url.clone(),
            credentials,
            default_client_code: settings
                .default_client_code
                .clone()
                .filter(|c| !c.trim().is_empty()),
        })
    }

    fn resolve(&self, response: &LoginResponse) -> Result<Session, LoginError> {
        let client_code = response
            .client_code()
            .map(str::to_string)
            .or_else(|| self.default_client_code.clone())
            .ok_or(LoginError::MissingClientCode)?;

        let broker_user = response
            .broker_user()
            .unwrap_or_else(|| self.credentials.username())
            .to_string();

        Ok(Session {
            token: response.token.clone(),
            client_code,
            broker_user,
        })
    }
}

#[async_trait]
impl SessionPort for HttpSessionAuthenticator {
    async fn login(&self) -> Result<Session, LoginError> {
        if self.credentials.username().is_empty() || self.credentials.password().is_empty() {
            return Err(LoginError::MissingCredentials);
        }

        let response = self
            .client
            .post(&self.login_url)
            .header(reqwest::header::ACCEPT, "application/json")
            .json(&LoginRequest {
                username: self.credentials.username(),
                password: self.credentials.password(),
            })
            .send()
            .await
            .map_err(|e| LoginError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(LoginError::Rejected {
                status: status.as_u16(),
            });
        }

        let body: LoginResponse = response
            .json()
            .await
            .map_err(|e| LoginError::InvalidResponse(e.to_string()))?;

        let session = self.resolve(&body)?;
        tracing::debug!(
            client_code = %session.client_code,
            broker_user = %session.broker_user,
            "Logged in to bridge"
        );
        Ok(session)
    }
}
