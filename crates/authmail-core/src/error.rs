//! Error types for the core library.

use thiserror::Error;

/// Opaque failure from an external collaborator (provider, mail sender).
///
/// The orchestrator classifies these per call site; see the
/// `Provider*Failed` and `SendFailed` variants of [`Error`].
pub type ProviderError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors that can occur in core operations.
#[derive(Debug, Error)]
pub enum Error {
    /// No identity is stored under the given email. The caller must run the
    /// authorization flow first; nothing triggers it implicitly.
    #[error("identity not found: {0} (authenticate first)")]
    IdentityNotFound(String),

    /// The authorization redirect carried an error indicator.
    #[error("authorization denied: {0}")]
    AuthorizationDenied(String),

    /// The wait for an authorization code ended without one.
    #[error("no authorization code received")]
    MissingCode,

    /// The code-for-tokens exchange with the provider failed.
    #[error("token exchange failed: {0}")]
    ProviderExchangeFailed(#[source] ProviderError),

    /// The access-token refresh with the provider failed.
    #[error("token refresh failed: {0}")]
    ProviderRefreshFailed(#[source] ProviderError),

    /// The profile fetch from the provider failed.
    #[error("profile fetch failed: {0}")]
    ProviderProfileFailed(#[source] ProviderError),

    /// The callback listener could not bind its port.
    #[error("failed to bind callback listener: {0}")]
    ListenerBindFailed(#[source] std::io::Error),

    /// The active-identity pointer names an identity that does not exist.
    /// Unreachable as long as the pointer only moves after a save; treated
    /// as a fatal invariant violation if observed.
    #[error("active identity points at unknown email: {0}")]
    ActiveIdentityNotFound(String),

    /// No active identity is set; sending requires a prior authorization.
    #[error("no active identity (authenticate first)")]
    NoActiveIdentity,

    /// The mail sender reported a failure.
    #[error("send failed: {0}")]
    SendFailed(#[source] ProviderError),
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;
