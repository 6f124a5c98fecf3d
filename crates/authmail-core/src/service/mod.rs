//! Orchestration services.
//!
//! [`AuthService`] drives the authorization round-trip and refresh-on-demand;
//! [`MailService`] is the sequential glue that sends as the active identity.

pub mod auth;
pub mod mail;

pub use auth::{AuthService, IntegrationStatus};
pub use mail::{MailSender, MailService, OutgoingMessage, SendReceipt};
