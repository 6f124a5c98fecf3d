//! Wire types for token and userinfo responses.

use crate::error::Error;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Seconds of validity assumed when the provider omits `expires_in`.
const DEFAULT_EXPIRES_IN: i64 = 3600;

/// Token response from the `OAuth2` token endpoint.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TokenResponse {
    /// Access token.
    pub access_token: String,
    /// Token type (usually "Bearer").
    pub token_type: String,
    /// Lifetime in seconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_in: Option<u32>,
    /// Refresh token. Absent on refresh responses unless rotated.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    /// Scope granted by the authorization server.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
}

impl TokenResponse {
    /// Absolute expiry instant for this response, measured from `now`.
    ///
    /// Providers that omit `expires_in` get the conventional one-hour
    /// lifetime.
    #[must_use]
    pub fn expires_at(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        let secs = self.expires_in.map_or(DEFAULT_EXPIRES_IN, i64::from);
        now + Duration::seconds(secs)
    }
}

/// Profile attributes from the userinfo endpoint.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Userinfo {
    /// Account email address, if the `email` scope was granted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Display name, if the `profile` scope was granted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// Error response from the `OAuth2` server.
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorResponse {
    /// Error code.
    pub error: String,
    /// Error description.
    #[serde(default)]
    pub error_description: String,
}

impl ErrorResponse {
    /// Converts to an [`Error`].
    #[must_use]
    pub fn into_error(self) -> Error {
        Error::oauth_error(self.error, self.error_description)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn response(expires_in: Option<u32>) -> TokenResponse {
        TokenResponse {
            access_token: "at".to_string(),
            token_type: "Bearer".to_string(),
            expires_in,
            refresh_token: None,
            scope: None,
        }
    }

    #[test]
    fn test_expires_at_from_response() {
        let now = Utc::now();
        let at = response(Some(120)).expires_at(now);
        assert_eq!(at, now + Duration::seconds(120));
    }

    #[test]
    fn test_expires_at_defaults_to_one_hour() {
        let now = Utc::now();
        let at = response(None).expires_at(now);
        assert_eq!(at, now + Duration::seconds(3600));
    }

    #[test]
    fn test_deserialize_exchange_response() {
        let json = r#"{
            "access_token": "AT1",
            "token_type": "Bearer",
            "expires_in": 3599,
            "refresh_token": "RT1",
            "scope": "https://www.googleapis.com/auth/gmail.send"
        }"#;
        let parsed: TokenResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.access_token, "AT1");
        assert_eq!(parsed.refresh_token.as_deref(), Some("RT1"));
    }

    #[test]
    fn test_deserialize_refresh_response_without_rotation() {
        let json = r#"{"access_token": "AT2", "token_type": "Bearer", "expires_in": 3600}"#;
        let parsed: TokenResponse = serde_json::from_str(json).unwrap();
        assert!(parsed.refresh_token.is_none());
    }

    #[test]
    fn test_error_response_conversion() {
        let json = r#"{"error": "invalid_grant", "error_description": "Bad code"}"#;
        let parsed: ErrorResponse = serde_json::from_str(json).unwrap();
        let err = parsed.into_error();
        assert!(err.to_string().contains("invalid_grant"));
    }
}
