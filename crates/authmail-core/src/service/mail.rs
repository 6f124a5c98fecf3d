//! Sending mail as the active identity.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use super::auth::AuthService;
use crate::callback::CallbackListener;
use crate::error::{Error, ProviderError, Result};
use crate::identity::IdentityStore;
use crate::provider::AuthProvider;

/// An outbound plain-text message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMessage {
    /// Sender address (the active identity's email).
    pub from: String,
    /// Recipient address.
    pub to: String,
    /// Subject line.
    pub subject: String,
    /// Plain text body.
    pub body: String,
}

impl OutgoingMessage {
    /// Renders the RFC 5322 message the mail API transmits.
    #[must_use]
    pub fn to_rfc5322(&self) -> String {
        [
            &format!("From: {}", self.from),
            &format!("To: {}", self.to),
            &format!("Subject: {}", self.subject),
            "MIME-Version: 1.0",
            "Content-Type: text/plain; charset=\"UTF-8\"",
            "",
            &self.body,
        ]
        .join("\r\n")
    }
}

/// What a completed send reports back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendReceipt {
    /// Provider-assigned message ID, if it supplied one.
    pub message_id: Option<String>,
}

/// Transport that delivers a message using a bearer access token.
#[async_trait]
pub trait MailSender: Send + Sync {
    /// Delivers `message` on behalf of the token's account.
    ///
    /// # Errors
    ///
    /// Returns an error if delivery fails; no retry is attempted here.
    async fn send(
        &self,
        access_token: &str,
        message: &OutgoingMessage,
    ) -> std::result::Result<SendReceipt, ProviderError>;
}

/// Sends mail as the active identity, refreshing its token on demand.
pub struct MailService<M, P, S, L> {
    sender: M,
    store: Arc<S>,
    auth: Arc<AuthService<P, S, L>>,
}

impl<M, P, S, L> MailService<M, P, S, L>
where
    M: MailSender,
    P: AuthProvider,
    S: IdentityStore,
    L: CallbackListener,
{
    /// Creates the service around its collaborators.
    pub fn new(sender: M, store: Arc<S>, auth: Arc<AuthService<P, S, L>>) -> Self {
        Self {
            sender,
            store,
            auth,
        }
    }

    /// Sends a plain-text message from the active identity.
    ///
    /// # Errors
    ///
    /// [`Error::NoActiveIdentity`] if nobody has authorized yet; token
    /// errors from [`AuthService::ensure_valid_token`]; or
    /// [`Error::SendFailed`] if the transport rejects the message.
    pub async fn send(&self, to: &str, subject: &str, body: &str) -> Result<SendReceipt> {
        let active = self
            .store
            .get_active()
            .await?
            .ok_or(Error::NoActiveIdentity)?;
        let access_token = self.auth.ensure_valid_token(&active.email).await?;

        let message = OutgoingMessage {
            from: active.email,
            to: to.to_string(),
            subject: subject.to_string(),
            body: body.to_string(),
        };
        debug!(to = %message.to, "sending message");
        self.sender
            .send(&access_token, &message)
            .await
            .map_err(Error::SendFailed)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::callback::CallbackListener;
    use crate::identity::{Identity, InMemoryIdentityStore, Profile, TokenSet};
    use crate::provider::RefreshedTokens;
    use chrono::{Duration, Utc};
    use std::sync::Mutex;

    struct NullProvider;

    #[async_trait]
    impl AuthProvider for NullProvider {
        fn authorization_url(&self) -> String {
            "https://provider.test/authorize".to_string()
        }

        async fn exchange_code(
            &self,
            _code: &str,
        ) -> std::result::Result<TokenSet, ProviderError> {
            Err("no exchange in these tests".into())
        }

        async fn refresh_access_token(
            &self,
            _refresh_token: &str,
        ) -> std::result::Result<RefreshedTokens, ProviderError> {
            Err("no refresh in these tests".into())
        }

        async fn fetch_profile(
            &self,
            _access_token: &str,
        ) -> std::result::Result<Profile, ProviderError> {
            Err("no profile in these tests".into())
        }
    }

    struct IdleListener;

    #[async_trait]
    impl CallbackListener for IdleListener {
        async fn start(&mut self, _port: u16) -> Result<()> {
            Ok(())
        }

        async fn wait_for_code(&mut self) -> Result<String> {
            Err(Error::MissingCode)
        }

        async fn stop(&mut self) {}
    }

    #[derive(Default)]
    struct RecordingSender {
        sent: Mutex<Vec<(String, OutgoingMessage)>>,
    }

    #[async_trait]
    impl MailSender for RecordingSender {
        async fn send(
            &self,
            access_token: &str,
            message: &OutgoingMessage,
        ) -> std::result::Result<SendReceipt, ProviderError> {
            self.sent
                .lock()
                .map(|mut sent| sent.push((access_token.to_string(), message.clone())))
                .ok();
            Ok(SendReceipt {
                message_id: Some("msg-1".to_string()),
            })
        }
    }

    fn mail_service(
        store: Arc<InMemoryIdentityStore>,
    ) -> MailService<RecordingSender, NullProvider, InMemoryIdentityStore, IdleListener> {
        let auth = Arc::new(AuthService::new(
            Arc::new(NullProvider),
            Arc::clone(&store),
            IdleListener,
            0,
        ));
        MailService::new(RecordingSender::default(), store, auth)
    }

    async fn activate(store: &InMemoryIdentityStore, email: &str) {
        store
            .save(Identity::new(
                Profile {
                    email: email.to_string(),
                    name: None,
                },
                TokenSet::new("AT1", "RT1", Utc::now() + Duration::hours(1)),
            ))
            .await
            .unwrap();
        store.set_active(email).await.unwrap();
    }

    #[tokio::test]
    async fn send_uses_the_active_identity_and_its_token() {
        let store = Arc::new(InMemoryIdentityStore::new());
        activate(&store, "a@x.com").await;
        let service = mail_service(Arc::clone(&store));

        let receipt = service.send("b@y.com", "Hi", "Hello there").await.unwrap();
        assert_eq!(receipt.message_id.as_deref(), Some("msg-1"));

        let sent = service.sender.sent.lock().unwrap();
        let (token, message) = &sent[0];
        assert_eq!(token, "AT1");
        assert_eq!(message.from, "a@x.com");
        assert_eq!(message.to, "b@y.com");
    }

    #[tokio::test]
    async fn send_without_active_identity_fails_before_the_transport() {
        let store = Arc::new(InMemoryIdentityStore::new());
        let service = mail_service(Arc::clone(&store));

        let err = service.send("b@y.com", "Hi", "Hello").await.unwrap_err();
        assert!(matches!(err, Error::NoActiveIdentity));
        assert!(service.sender.sent.lock().unwrap().is_empty());
    }

    #[test]
    fn rfc5322_layout() {
        let message = OutgoingMessage {
            from: "a@x.com".to_string(),
            to: "b@y.com".to_string(),
            subject: "Greetings".to_string(),
            body: "line one\nline two".to_string(),
        };

        let raw = message.to_rfc5322();
        assert!(raw.starts_with("From: a@x.com\r\nTo: b@y.com\r\nSubject: Greetings\r\n"));
        assert!(raw.contains("MIME-Version: 1.0\r\n"));
        assert!(raw.contains("Content-Type: text/plain; charset=\"UTF-8\"\r\n"));
        // Blank line separates headers from the body
        assert!(raw.ends_with("\r\n\r\nline one\nline two"));
    }
}
