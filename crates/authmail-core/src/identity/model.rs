//! Identity model types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Display attributes of an authorized account.
///
/// Replaced only by re-running the full authorization flow, never by a
/// token refresh.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    /// Account email address.
    pub email: String,
    /// Display name, if the provider supplied one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// Token material for one authorized account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenSet {
    /// Short-lived bearer token presented to the mail API.
    pub access_token: String,
    /// Long-lived token used to mint new access tokens. Never empty for a
    /// stored identity.
    pub refresh_token: String,
    /// Instant the access token stops being accepted.
    pub expires_at: DateTime<Utc>,
}

impl TokenSet {
    /// Creates a new token set.
    #[must_use]
    pub fn new(
        access_token: impl Into<String>,
        refresh_token: impl Into<String>,
        expires_at: DateTime<Utc>,
    ) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: refresh_token.into(),
            expires_at,
        }
    }

    /// Merges the supplied fields of `update` into this set, leaving the
    /// rest untouched. A refresh that does not rotate the refresh token
    /// therefore keeps the stored one.
    pub fn merge(&mut self, update: TokenUpdate) {
        if let Some(access_token) = update.access_token {
            self.access_token = access_token;
        }
        if let Some(refresh_token) = update.refresh_token {
            self.refresh_token = refresh_token;
        }
        if let Some(expires_at) = update.expires_at {
            self.expires_at = expires_at;
        }
    }
}

/// Partial token update; absent fields keep their stored value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUpdate {
    /// New access token.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    /// New refresh token, only when the provider rotated it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    /// New expiry instant.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}

/// One authorized account: stable email key, display profile, and tokens.
///
/// Created at the end of a successful authorization round-trip; tokens are
/// mutated in place by refreshes; never deleted in normal operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Stable identifier; immutable once created.
    pub email: String,
    /// Display attributes.
    pub profile: Profile,
    /// Current token set.
    pub tokens: TokenSet,
}

impl Identity {
    /// Assembles an identity keyed by its profile's email.
    #[must_use]
    pub fn new(profile: Profile, tokens: TokenSet) -> Self {
        Self {
            email: profile.email.clone(),
            profile,
            tokens,
        }
    }
}
