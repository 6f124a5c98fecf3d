//! Authorization round-trip and token refresh-on-demand.

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::callback::CallbackListener;
use crate::error::{Error, Result};
use crate::identity::{Identity, IdentityStore, TokenUpdate};
use crate::policy::TokenPolicy;
use crate::provider::AuthProvider;

/// Result of probing the integration without touching the network.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntegrationStatus {
    /// An authorized identity is active and holds a refresh token.
    Active,
    /// Nobody is authorized yet; the operator should open this URL.
    Inactive {
        /// Consent URL for the operator to open.
        auth_url: String,
    },
}

/// Coordinates authorization attempts and keeps access tokens fresh.
///
/// Holds the one callback listener; locking it for the whole round-trip is
/// what makes "at most one in-flight authorization" structural rather than
/// a convention.
pub struct AuthService<P, S, L> {
    provider: Arc<P>,
    store: Arc<S>,
    listener: Mutex<L>,
    policy: TokenPolicy,
    callback_port: u16,
}

impl<P, S, L> AuthService<P, S, L>
where
    P: AuthProvider,
    S: IdentityStore,
    L: CallbackListener,
{
    /// Creates the service around its collaborators.
    pub fn new(provider: Arc<P>, store: Arc<S>, listener: L, callback_port: u16) -> Self {
        Self {
            provider,
            store,
            listener: Mutex::new(listener),
            policy: TokenPolicy::default(),
            callback_port,
        }
    }

    /// Probes whether an authorized identity is active.
    ///
    /// Reads the store and builds the consent URL locally; never calls the
    /// network or the callback listener.
    ///
    /// # Errors
    ///
    /// Propagates store failures, including the active pointer naming a
    /// missing identity.
    pub async fn check_integration(&self) -> Result<IntegrationStatus> {
        match self.store.get_active().await? {
            Some(identity) if !identity.tokens.refresh_token.is_empty() => {
                Ok(IntegrationStatus::Active)
            }
            _ => Ok(IntegrationStatus::Inactive {
                auth_url: self.provider.authorization_url(),
            }),
        }
    }

    /// Runs one full authorization round-trip and returns the new identity,
    /// saved and marked active.
    ///
    /// The listener is stopped on every exit path past a successful bind,
    /// so no attempt leaks a bound port. Any failure aborts the whole
    /// attempt; no partial identity is ever saved.
    ///
    /// # Errors
    ///
    /// [`Error::ListenerBindFailed`], [`Error::AuthorizationDenied`],
    /// [`Error::MissingCode`], [`Error::ProviderExchangeFailed`], or
    /// [`Error::ProviderProfileFailed`], depending on where the attempt
    /// died.
    pub async fn authenticate(&self) -> Result<Identity> {
        let mut listener = self.listener.lock().await;
        let result = match listener.start(self.callback_port).await {
            Ok(()) => self.complete_authorization(&mut *listener).await,
            Err(err) => Err(err),
        };
        listener.stop().await;
        result
    }

    async fn complete_authorization(&self, listener: &mut L) -> Result<Identity> {
        let code = listener.wait_for_code().await?;
        debug!("authorization code received, exchanging for tokens");

        let tokens = self
            .provider
            .exchange_code(&code)
            .await
            .map_err(Error::ProviderExchangeFailed)?;
        if tokens.refresh_token.is_empty() {
            return Err(Error::ProviderExchangeFailed(
                "exchange response carried no refresh token".into(),
            ));
        }

        let profile = self
            .provider
            .fetch_profile(&tokens.access_token)
            .await
            .map_err(Error::ProviderProfileFailed)?;

        let identity = Identity::new(profile, tokens);
        self.store.save(identity.clone()).await?;
        self.store.set_active(&identity.email).await?;
        info!(email = %identity.email, "identity authorized");
        Ok(identity)
    }

    /// Returns an access token that is safe to use right now.
    ///
    /// A cached token inside its validity window is returned without any
    /// network call; otherwise one refresh is performed and the merged
    /// tokens are stored. Nothing here triggers the authorization flow.
    ///
    /// # Errors
    ///
    /// [`Error::IdentityNotFound`] if `email` was never authorized;
    /// [`Error::ProviderRefreshFailed`] if the refresh grant fails.
    pub async fn ensure_valid_token(&self, email: &str) -> Result<String> {
        let identity = self
            .store
            .find_by_email(email)
            .await?
            .ok_or_else(|| Error::IdentityNotFound(email.to_string()))?;

        if self.policy.is_usable(&identity.tokens, Utc::now()) {
            return Ok(identity.tokens.access_token);
        }

        debug!(email, "access token expired, refreshing");
        let refreshed = self
            .provider
            .refresh_access_token(&identity.tokens.refresh_token)
            .await
            .map_err(Error::ProviderRefreshFailed)?;

        let access_token = refreshed.access_token.clone();
        self.store
            .update_tokens(
                email,
                TokenUpdate {
                    access_token: Some(refreshed.access_token),
                    refresh_token: refreshed.refresh_token,
                    expires_at: Some(refreshed.expires_at),
                },
            )
            .await?;

        Ok(access_token)
    }
}
