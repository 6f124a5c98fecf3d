//! Seam to the external `OAuth2` provider.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::ProviderError;
use crate::identity::{Profile, TokenSet};

/// Tokens minted by a refresh grant.
///
/// The refresh token is only present when the provider chose to rotate it;
/// the stored one stays in force otherwise.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshedTokens {
    /// New access token.
    pub access_token: String,
    /// Expiry of the new access token.
    pub expires_at: DateTime<Utc>,
    /// Replacement refresh token, if rotated.
    pub refresh_token: Option<String>,
}

/// External authorization provider.
///
/// Every method may fail with a provider error; the orchestrator treats any
/// such failure as fatal to the current attempt and never retries
/// internally.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Consent URL for the operator to open. Built locally, no network.
    fn authorization_url(&self) -> String;

    /// Exchanges a one-shot authorization code for a full token set.
    ///
    /// # Errors
    ///
    /// Returns an error if the exchange fails or yields no usable tokens.
    async fn exchange_code(&self, code: &str) -> std::result::Result<TokenSet, ProviderError>;

    /// Mints a new access token from a refresh token.
    ///
    /// # Errors
    ///
    /// Returns an error if the refresh fails or the response omits the
    /// access token.
    async fn refresh_access_token(
        &self,
        refresh_token: &str,
    ) -> std::result::Result<RefreshedTokens, ProviderError>;

    /// Fetches the account profile for the given access token.
    ///
    /// # Errors
    ///
    /// Returns an error if the fetch fails or the response has no email.
    async fn fetch_profile(
        &self,
        access_token: &str,
    ) -> std::result::Result<Profile, ProviderError>;
}
