use reqwest::Client;
use reqwest::header::CONTENT_TYPE;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use tracing::info;

use super::{EmailTransport, ProviderError, ProviderKind, Receipt, endpoint, into_receipt};
use crate::message::OutgoingMessage;

/// Request body for `POST /emails`
#[derive(Debug, Serialize)]
struct ResendPayload<'a> {
    from: &'a str,
    to: &'a str,
    subject: &'a str,

    #[serde(skip_serializing_if = "Option::is_none")]
    html: Option<&'a str>,

    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<&'a str>,
}

impl<'a> From<&'a OutgoingMessage> for ResendPayload<'a> {
    fn from(message: &'a OutgoingMessage) -> Self {
        ResendPayload {
            from: message.from_address(),
            to: message.to_address(),
            subject: message.subject(),
            html: message.html(),
            text: message.text(),
        }
    }
}

/// Sends through the Resend API, authenticating with a bearer token
pub struct ResendTransport<'a> {
    client: &'a Client,
    base_url: &'a str,
    api_key: &'a SecretString,
}

impl<'a> ResendTransport<'a> {
    pub fn new(client: &'a Client, base_url: &'a str, api_key: &'a SecretString) -> Self {
        Self {
            client,
            base_url,
            api_key,
        }
    }
}

impl EmailTransport for ResendTransport<'_> {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Resend
    }

    fn payload(&self, message: &OutgoingMessage) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec(&ResendPayload::from(message))
    }

    async fn send(&self, message: &OutgoingMessage) -> Result<Receipt, ProviderError> {
        let provider = self.kind();
        let body = self
            .payload(message)
            .map_err(ProviderError::encode(provider))?;

        let url = endpoint(self.base_url, "/emails");
        info!(%url, "sending email via Resend");

        let response = self
            .client
            .post(&url)
            .bearer_auth(self.api_key.expose_secret())
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await
            .map_err(ProviderError::transport(provider))?;

        into_receipt(provider, response).await
    }
}
