//! authmail - console Gmail sender with `OAuth2` sign-in.
//!
//! Wires the core services to their Google-backed infrastructure. Every
//! collaborator sits behind a trait, so this is the one place that decides
//! which concrete pieces run.

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod cli;
mod config;
mod gmail;
mod google;

use std::sync::Arc;

use anyhow::Context;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use authmail_core::{AuthService, HttpCallbackListener, InMemoryIdentityStore, MailService};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "authmail=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = config::load()?;
    info!(callback_port = config.callback_port, "starting authmail");

    // Infrastructure (swappable implementations)
    let store = Arc::new(InMemoryIdentityStore::new());
    let provider = Arc::new(
        google::GoogleAuthProvider::new(&config.google)
            .context("configuring Google OAuth2 endpoints")?,
    );
    let sender = gmail::GmailSender::new().context("configuring the Gmail endpoint")?;
    let listener = HttpCallbackListener::new();

    // Services
    let auth = Arc::new(AuthService::new(
        provider,
        Arc::clone(&store),
        listener,
        config.callback_port,
    ));
    let mail = MailService::new(sender, store, Arc::clone(&auth));

    cli::Cli::new(auth, mail).run().await
}
