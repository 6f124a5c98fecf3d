//! # authmail-oauth
//!
//! `OAuth2` authorization-code client for mail providers.
//!
//! This crate speaks the provider's wire protocol and nothing else: it
//! builds the consent URL, exchanges a one-shot authorization code for
//! tokens, refreshes an access token from a long-lived refresh token, and
//! fetches the account profile from the userinfo endpoint.
//!
//! ## Quick Start
//!
//! ```ignore
//! use authmail_oauth::{Endpoints, OAuthClient};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = OAuthClient::new("your_client_id", Endpoints::google()?)
//!         .with_client_secret("your_secret")
//!         .with_redirect_uri("http://localhost:3000/auth/callback");
//!
//!     let auth_url = client.authorization_url(None);
//!     println!("Visit: {auth_url}");
//!
//!     // After the user authorizes and the redirect delivers a code:
//!     let token = client.exchange_code("code_from_redirect").await?;
//!     println!("Access token: {}", token.access_token);
//!     Ok(())
//! }
//! ```
//!
//! ## Token Refresh
//!
//! ```ignore
//! let refreshed = client.refresh_access_token(&refresh_token).await?;
//! // The response omits `refresh_token` unless the provider rotated it.
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod client;
mod endpoints;
mod error;
mod token;

pub use client::OAuthClient;
pub use endpoints::Endpoints;
pub use error::{Error, Result};
pub use token::{ErrorResponse, TokenResponse, Userinfo};
