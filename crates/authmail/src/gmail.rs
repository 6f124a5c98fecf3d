//! Gmail REST API as the mail transport.

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;
use url::Url;

use authmail_core::{MailSender, OutgoingMessage, ProviderError, SendReceipt};

/// Gmail send endpoint; `me` resolves to the token's account.
const GMAIL_SEND_URL: &str = "https://gmail.googleapis.com/gmail/v1/users/me/messages/send";

/// [`MailSender`] that posts raw messages to the Gmail API.
pub struct GmailSender {
    http_client: Client,
    endpoint: Url,
}

impl GmailSender {
    /// Creates the sender against the production Gmail endpoint.
    ///
    /// # Errors
    ///
    /// Returns an error if the endpoint URL fails to parse.
    pub fn new() -> Result<Self, url::ParseError> {
        Ok(Self {
            http_client: Client::new(),
            endpoint: Url::parse(GMAIL_SEND_URL)?,
        })
    }
}

#[derive(Debug, Deserialize)]
struct SendResponse {
    id: Option<String>,
}

#[async_trait]
impl MailSender for GmailSender {
    async fn send(
        &self,
        access_token: &str,
        message: &OutgoingMessage,
    ) -> Result<SendReceipt, ProviderError> {
        let raw = encode_raw(message);
        let response = self
            .http_client
            .post(self.endpoint.clone())
            .bearer_auth(access_token)
            .json(&json!({ "raw": raw }))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(format!("gmail rejected the message ({status}): {body}").into());
        }

        let parsed: SendResponse = response.json().await?;
        debug!(message_id = ?parsed.id, "message accepted by gmail");
        Ok(SendReceipt {
            message_id: parsed.id,
        })
    }
}

/// Gmail wants the RFC 5322 message URL-safe base64 encoded, unpadded.
fn encode_raw(message: &OutgoingMessage) -> String {
    URL_SAFE_NO_PAD.encode(message.to_rfc5322())
}
