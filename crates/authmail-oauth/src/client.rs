//! `OAuth2` client for the authorization-code grant.

use crate::endpoints::Endpoints;
use crate::error::{Error, Result};
use crate::token::{ErrorResponse, TokenResponse, Userinfo};
use reqwest::Client;
use std::collections::HashMap;
use url::Url;

/// Client for one provider's `OAuth2` endpoints.
#[derive(Debug, Clone)]
pub struct OAuthClient {
    /// Client ID from provider registration.
    pub client_id: String,
    /// Client secret (confidential clients only).
    pub client_secret: Option<String>,
    /// Redirect URI the authorization code is delivered to.
    pub redirect_uri: Option<String>,
    /// Provider endpoint configuration.
    pub endpoints: Endpoints,
    /// HTTP client.
    http_client: Client,
}

impl OAuthClient {
    /// Creates a new OAuth client.
    #[must_use]
    pub fn new(client_id: impl Into<String>, endpoints: Endpoints) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: None,
            redirect_uri: None,
            endpoints,
            http_client: Client::new(),
        }
    }

    /// Sets the client secret.
    #[must_use]
    pub fn with_client_secret(mut self, secret: impl Into<String>) -> Self {
        self.client_secret = Some(secret.into());
        self
    }

    /// Sets the redirect URI.
    #[must_use]
    pub fn with_redirect_uri(mut self, uri: impl Into<String>) -> Self {
        self.redirect_uri = Some(uri.into());
        self
    }

    /// Builds the authorization URL for user consent.
    ///
    /// The user opens this URL in a browser; the provider redirects back to
    /// the configured redirect URI with the authorization code.
    ///
    /// Uses the endpoint set's default scopes when `scopes` is `None`.
    #[must_use]
    pub fn authorization_url(&self, scopes: Option<&[String]>) -> Url {
        let mut url = self.endpoints.auth_url.clone();

        {
            let mut pairs = url.query_pairs_mut();
            pairs
                .append_pair("client_id", &self.client_id)
                .append_pair("response_type", "code");

            if let Some(redirect_uri) = &self.redirect_uri {
                pairs.append_pair("redirect_uri", redirect_uri);
            }

            let scope_str = scopes.map_or_else(
                || self.endpoints.default_scopes.join(" "),
                |s| s.join(" "),
            );
            if !scope_str.is_empty() {
                pairs.append_pair("scope", &scope_str);
            }

            for (key, value) in &self.endpoints.auth_params {
                pairs.append_pair(key, value);
            }
        }

        url
    }

    /// Exchanges an authorization code for tokens.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server rejects the code.
    pub async fn exchange_code(&self, code: &str) -> Result<TokenResponse> {
        let mut params = HashMap::new();
        params.insert("grant_type", "authorization_code");
        params.insert("code", code);

        if let Some(uri) = self.redirect_uri.as_deref() {
            params.insert("redirect_uri", uri);
        }

        self.token_request(params).await
    }

    /// Refreshes an access token using a refresh token.
    ///
    /// The response carries a `refresh_token` only when the provider rotated
    /// it; callers keep the old one otherwise.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the grant was revoked.
    pub async fn refresh_access_token(&self, refresh_token: &str) -> Result<TokenResponse> {
        let mut params = HashMap::new();
        params.insert("grant_type", "refresh_token");
        params.insert("refresh_token", refresh_token);

        self.token_request(params).await
    }

    /// Fetches the account profile from the userinfo endpoint.
    ///
    /// # Errors
    ///
    /// Returns an error if no userinfo endpoint is configured or the request
    /// fails.
    pub async fn fetch_userinfo(&self, access_token: &str) -> Result<Userinfo> {
        let url = self
            .endpoints
            .userinfo_url
            .clone()
            .ok_or_else(|| Error::InvalidConfig("no userinfo endpoint configured".into()))?;

        let response = self
            .http_client
            .get(url)
            .bearer_auth(access_token)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(Error::InvalidResponse(format!(
                "userinfo request failed with status {status}"
            )));
        }

        Ok(response.json().await?)
    }

    /// Posts a form to the token endpoint and decodes the response.
    async fn token_request<'a>(
        &'a self,
        mut params: HashMap<&'a str, &'a str>,
    ) -> Result<TokenResponse> {
        params.insert("client_id", &self.client_id);
        if let Some(secret) = &self.client_secret {
            params.insert("client_secret", secret);
        }

        let response = self
            .http_client
            .post(self.endpoints.token_url.clone())
            .form(&params)
            .send()
            .await?;

        if !response.status().is_success() {
            let error: ErrorResponse = response.json().await?;
            return Err(error.into_error());
        }

        Ok(response.json().await?)
    }
}
