//! Bridge Wire Types
//!
//! JSON bodies exchanged with the login endpoint. Positions are kept as
//! loose JSON objects and parsed by the domain normalizer.

use serde::{Deserialize, Serialize};

/// Login request body.
#[derive(Serialize)]
pub struct LoginRequest<'a> {
    /// Bridge username.
    pub username: &'a str,
    /// Bridge password.
    pub password: &'a str,
}

/// Login response body. Fields beyond these are ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    /// Bearer token for subsequent requests.
    pub token: String,
    /// Account details, when returned.
    #[serde(default)]
    pub user: Option<LoginUser>,
}

impl LoginResponse {
    /// Client code from the response, ignoring blanks.
    #[must_use]
    pub fn client_code(&self) -> Option<&str> {
        self.user
            .as_ref()
            .and_then(|u| u.client_code.as_deref())
            .map(str::trim)
            .filter(|c| !c.is_empty())
    }

    /// Broker username from the response, ignoring blanks.
    #[must_use]
    pub fn broker_user(&self) -> Option<&str> {
        self.user
            .as_ref()
            .and_then(|u| u.username.as_deref())
            .map(str::trim)
            .filter(|u| !u.is_empty())
    }
}

/// User block of the login response.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginUser {
    /// Broker-side username.
    #[serde(default)]
    pub username: Option<String>,
    /// Client code scoping positions queries.
    #[serde(default)]
    pub client_code: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn login_response_without_user_block() {
        let response: LoginResponse = serde_json::from_str(r#"{"token":"abc"}"#).unwrap();
        assert_eq!(response.token, "abc");
        assert!(response.client_code().is_none());
        assert!(response.broker_user().is_none());
    }

    #[test]
    fn login_response_ignores_unknown_fields() {
        let response: LoginResponse = serde_json::from_str(
            r#"{"token":"abc","expires":3600,"user":{"username":"bridge-ops","client_code":"SEA","role":"x"}}"#,
        )
        .unwrap();
        assert_eq!(response.broker_user(), Some("bridge-ops"));
        assert_eq!(response.client_code(), Some("SEA"));
    }

    #[test]
    fn blank_or_null_client_code_is_absent() {
        let response: LoginResponse =
            serde_json::from_str(r#"{"token":"abc","user":{"client_code":"  "}}"#).unwrap();
        assert!(response.client_code().is_none());

        let response: LoginResponse =
            serde_json::from_str(r#"{"token":"abc","user":null}"#).unwrap();
        assert!(response.client_code().is_none());
    }

    #[test]
    fn login_response_requires_token() {
        assert!(serde_json::from_str::<LoginResponse>(r#"{"user":{}}"#).is_err());
    }

    #[test]
    fn login_request_shape() {
        let body = serde_json::to_value(LoginRequest {
            username: "ops",
            password: "pw",
        })
        .unwrap();
        assert_eq!(body, serde_json::json!({"username": "ops", "password": "pw"}));
    }
}
