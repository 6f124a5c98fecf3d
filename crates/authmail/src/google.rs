//! Google as the authorization provider.

use async_trait::async_trait;
use chrono::Utc;

use authmail_core::{AuthProvider, Profile, ProviderError, RefreshedTokens, TokenSet};
use authmail_oauth::{Endpoints, OAuthClient};

use crate::config::GoogleConfig;

/// [`AuthProvider`] backed by Google's `OAuth2` endpoints.
pub struct GoogleAuthProvider {
    client: OAuthClient,
}

impl GoogleAuthProvider {
    /// Creates the provider from the client registration.
    ///
    /// # Errors
    ///
    /// Returns an error if the endpoint URLs fail to parse.
    pub fn new(config: &GoogleConfig) -> authmail_oauth::Result<Self> {
        let client = OAuthClient::new(&config.client_id, Endpoints::google()?)
            .with_client_secret(&config.client_secret)
            .with_redirect_uri(&config.redirect_uri);
        Ok(Self { client })
    }
}

#[async_trait]
impl AuthProvider for GoogleAuthProvider {
    fn authorization_url(&self) -> String {
        self.client.authorization_url(None).to_string()
    }

    async fn exchange_code(&self, code: &str) -> Result<TokenSet, ProviderError> {
        let response = self.client.exchange_code(code).await?;
        let expires_at = response.expires_at(Utc::now());
        let refresh_token = response
            .refresh_token
            .ok_or("exchange response carried no refresh token")?;
        Ok(TokenSet::new(
            response.access_token,
            refresh_token,
            expires_at,
        ))
    }

    async fn refresh_access_token(
        &self,
        refresh_token: &str,
    ) -> Result<RefreshedTokens, ProviderError> {
        let response = self.client.refresh_access_token(refresh_token).await?;
        Ok(RefreshedTokens {
            expires_at: response.expires_at(Utc::now()),
            access_token: response.access_token,
            refresh_token: response.refresh_token,
        })
    }

    async fn fetch_profile(&self, access_token: &str) -> Result<Profile, ProviderError> {
        let info = self.client.fetch_userinfo(access_token).await?;
        let email = info.email.ok_or("userinfo response carried no email")?;
        Ok(Profile {
            email,
            name: info.name,
        })
    }
}
