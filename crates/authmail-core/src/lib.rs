//! # authmail-core
//!
//! Identity and token-lifecycle core for the authmail client.
//!
//! This crate provides:
//! - The [`Identity`] model: one authorized account with its profile and
//!   token set
//! - [`IdentityStore`]: the identity records plus the single active-identity
//!   pointer
//! - [`TokenPolicy`]: the pure decision of whether a cached access token is
//!   still usable
//! - [`CallbackListener`]: a transient local HTTP endpoint that captures the
//!   one-shot authorization code from the provider's browser redirect
//! - [`AuthService`]: the authorization round-trip and refresh-on-demand
//!   orchestration
//! - [`MailService`]: sending mail as the active identity through a
//!   [`MailSender`]
//!
//! Concrete providers (Google, Gmail) live in the binary crate behind the
//! [`AuthProvider`] and [`MailSender`] traits, so tests and alternative
//! wirings can substitute their own.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod callback;
mod error;
pub mod identity;
pub mod policy;
pub mod provider;
pub mod service;

pub use callback::{CallbackListener, CallbackOutcome, HttpCallbackListener};
pub use error::{Error, ProviderError, Result};
pub use identity::{Identity, IdentityStore, InMemoryIdentityStore, Profile, TokenSet, TokenUpdate};
pub use policy::TokenPolicy;
pub use provider::{AuthProvider, RefreshedTokens};
pub use service::{
    AuthService, IntegrationStatus, MailSender, MailService, OutgoingMessage, SendReceipt,
};
