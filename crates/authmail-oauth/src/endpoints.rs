//! Provider endpoint configuration.

use crate::error::Result;
use url::Url;

/// `OAuth2` endpoint set for one provider.
#[derive(Debug, Clone)]
pub struct Endpoints {
    /// Provider name (e.g., "Google").
    pub name: String,
    /// Authorization endpoint URL.
    pub auth_url: Url,
    /// Token endpoint URL.
    pub token_url: Url,
    /// Userinfo endpoint (if the provider exposes one).
    pub userinfo_url: Option<Url>,
    /// Default scopes requested when the caller passes none.
    pub default_scopes: Vec<String>,
    /// Extra query parameters appended to every authorization URL.
    pub auth_params: Vec<(String, String)>,
}

impl Endpoints {
    /// Creates a new endpoint set.
    ///
    /// # Errors
    ///
    /// Returns an error if either URL is invalid.
    pub fn new(
        name: impl Into<String>,
        auth_url: impl AsRef<str>,
        token_url: impl AsRef<str>,
    ) -> Result<Self> {
        Ok(Self {
            name: name.into(),
            auth_url: Url::parse(auth_url.as_ref())?,
            token_url: Url::parse(token_url.as_ref())?,
            userinfo_url: None,
            default_scopes: Vec::new(),
            auth_params: Vec::new(),
        })
    }

    /// Sets the userinfo endpoint URL.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid.
    pub fn with_userinfo_url(mut self, url: impl AsRef<str>) -> Result<Self> {
        self.userinfo_url = Some(Url::parse(url.as_ref())?);
        Ok(self)
    }

    /// Sets the default scopes.
    #[must_use]
    pub fn with_default_scopes(mut self, scopes: Vec<String>) -> Self {
        self.default_scopes = scopes;
        self
    }

    /// Appends an extra authorization-URL query parameter.
    #[must_use]
    pub fn with_auth_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.auth_params.push((key.into(), value.into()));
        self
    }

    /// Google endpoint set for sending Gmail on the user's behalf.
    ///
    /// Scopes:
    /// - `https://www.googleapis.com/auth/gmail.send` - Send-only Gmail access
    /// - `https://www.googleapis.com/auth/userinfo.email` - Account email
    /// - `https://www.googleapis.com/auth/userinfo.profile` - Display name
    ///
    /// `access_type=offline` and `prompt=consent` are requested so Google
    /// issues a refresh token on every authorization.
    ///
    /// # Errors
    ///
    /// Returns an error if URL parsing fails.
    pub fn google() -> Result<Self> {
        Ok(Self::new(
            "Google",
            "https://accounts.google.com/o/oauth2/v2/auth",
            "https://oauth2.googleapis.com/token",
        )?
        .with_userinfo_url("https://www.googleapis.com/oauth2/v2/userinfo")?
        .with_default_scopes(vec![
            "https://www.googleapis.com/auth/gmail.send".to_string(),
            "https://www.googleapis.com/auth/userinfo.email".to_string(),
            "https://www.googleapis.com/auth/userinfo.profile".to_string(),
        ])
        .with_auth_param("access_type", "offline")
        .with_auth_param("prompt", "consent"))
    }
}
