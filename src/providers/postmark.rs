use reqwest::Client;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use tracing::info;

use super::{EmailTransport, ProviderError, ProviderKind, Receipt, endpoint, into_receipt};
use crate::message::OutgoingMessage;

const SERVER_TOKEN_HEADER: &str = "X-Postmark-Server-Token";

/// Request body for `POST /email`
#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct PostmarkPayload<'a> {
    from: &'a str,
    to: &'a str,
    subject: &'a str,

    #[serde(skip_serializing_if = "Option::is_none")]
    html_body: Option<&'a str>,

    #[serde(skip_serializing_if = "Option::is_none")]
    text_body: Option<&'a str>,
}

impl<'a> From<&'a OutgoingMessage> for PostmarkPayload<'a> {
    fn from(message: &'a OutgoingMessage) -> Self {
        PostmarkPayload {
            from: message.from_address(),
            to: message.to_address(),
            subject: message.subject(),
            html_body: message.html(),
            text_body: message.text(),
        }
    }
}

/// Sends through the Postmark API using a server token
pub struct PostmarkTransport<'a> {
    client: &'a Client,
    base_url: &'a str,
    server_token: &'a SecretString,
}

impl<'a> PostmarkTransport<'a> {
    pub fn new(client: &'a Client, base_url: &'a str, server_token: &'a SecretString) -> Self {
        Self {
            client,
            base_url,
            server_token,
        }
    }
}

impl EmailTransport for PostmarkTransport<'_> {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Postmark
    }

    fn payload(&self, message: &OutgoingMessage) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec(&PostmarkPayload::from(message))
    }

    async fn send(&self, message: &OutgoingMessage) -> Result<Receipt, ProviderError> {
        let provider = self.kind();
        let body = self
            .payload(message)
            .map_err(ProviderError::encode(provider))?;

        let url = endpoint(self.base_url, "/email");
        info!(%url, "sending email via Postmark");

        let response = self
            .client
            .post(&url)
            .header(SERVER_TOKEN_HEADER, self.server_token.expose_secret())
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, "application/json")
            .body(body)
            .send()
            .await
            .map_err(ProviderError::transport(provider))?;

        into_receipt(provider, response).await
    }
}
