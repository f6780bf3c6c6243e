//! Provider adapters.
//!
//! | Provider | Name | Endpoint |
//! |----------|------|----------|
//! | [`ResendTransport`] | `resend` | `POST https://api.resend.com/emails` |
//! | [`PostmarkTransport`] | `postmark` | `POST https://api.postmarkapp.com/email` |

mod postmark;
mod resend;

pub use postmark::PostmarkTransport;
pub use resend::ResendTransport;

use reqwest::Response;
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use tracing::debug;

use crate::message::OutgoingMessage;

/// The supported email delivery providers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    Resend,
    Postmark,
}

impl ProviderKind {
    /// The name accepted in `INPUT_PROVIDER`
    pub fn name(&self) -> &'static str {
        match self {
            ProviderKind::Resend => "resend",
            ProviderKind::Postmark => "postmark",
        }
    }

    /// Returns the production origin for this provider
    pub fn base_url(&self) -> &'static str {
        match self {
            ProviderKind::Resend => "https://api.resend.com",
            ProviderKind::Postmark => "https://api.postmarkapp.com",
        }
    }

    /// The environment variable holding this provider's credential
    pub fn credential_var(&self) -> &'static str {
        match self {
            ProviderKind::Resend => crate::config::RESEND_API_KEY,
            ProviderKind::Postmark => crate::config::POSTMARK_API_TOKEN,
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderKind::Resend => f.write_str("Resend"),
            ProviderKind::Postmark => f.write_str("Postmark"),
        }
    }
}

/// Returned when a provider name is neither `resend` nor `postmark`
#[derive(Error, Debug, PartialEq, Eq)]
#[error("Invalid provider '{0}'. Must be 'resend' or 'postmark'.")]
pub struct InvalidProvider(pub String);

impl FromStr for ProviderKind {
    type Err = InvalidProvider;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "resend" => Ok(ProviderKind::Resend),
            "postmark" => Ok(ProviderKind::Postmark),
            other => Err(InvalidProvider(other.to_string())),
        }
    }
}

/// Errors that can occur while talking to a provider.
///
/// Client (4xx) and server (5xx) statuses are not told apart; both end the
/// run.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("{provider} API error (HTTP {status}): {body}")]
    Status {
        provider: ProviderKind,
        status: u16,
        body: String,
    },

    #[error("{provider} request failed: {source}")]
    Transport {
        provider: ProviderKind,
        #[source]
        source: reqwest::Error,
    },

    #[error("failed to encode {provider} payload: {source}")]
    Encode {
        provider: ProviderKind,
        #[source]
        source: serde_json::Error,
    },

    #[error("{provider} returned a response that is not JSON: {source}")]
    Decode {
        provider: ProviderKind,
        #[source]
        source: serde_json::Error,
    },
}

impl ProviderError {
    fn transport(provider: ProviderKind) -> impl FnOnce(reqwest::Error) -> Self {
        move |source| ProviderError::Transport { provider, source }
    }

    fn encode(provider: ProviderKind) -> impl FnOnce(serde_json::Error) -> Self {
        move |source| ProviderError::Encode { provider, source }
    }
}

/// What a provider handed back after accepting a message
#[derive(Debug, Clone, PartialEq)]
pub struct Receipt {
    provider: ProviderKind,
    raw: String,
    response: Value,
}

impl Receipt {
    pub fn provider(&self) -> ProviderKind {
        self.provider
    }

    /// The provider's response body, byte for byte
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// The provider's response body, parsed
    pub fn response(&self) -> &Value {
        &self.response
    }
}

/// A provider that can deliver one message.
///
/// Implementations make exactly one HTTP request per call and never retry.
pub trait EmailTransport {
    fn kind(&self) -> ProviderKind;

    /// Serializes the provider-specific JSON body for `message`
    ///
    /// # Errors
    ///
    /// Returns an error if the payload cannot be serialized
    fn payload(&self, message: &OutgoingMessage) -> serde_json::Result<Vec<u8>>;

    /// Sends `message` and returns the provider's receipt
    ///
    /// # Errors
    ///
    /// Returns `ProviderError::Status` for any non-2xx response and
    /// `ProviderError::Transport` if the request could not complete
    fn send(
        &self,
        message: &OutgoingMessage,
    ) -> impl Future<Output = Result<Receipt, ProviderError>> + Send;
}

fn endpoint(base_url: &str, path: &str) -> String {
    format!("{}{path}", base_url.trim_end_matches('/'))
}

/// Turns a provider response into a receipt or a status error
async fn into_receipt(
    provider: ProviderKind,
    response: Response,
) -> Result<Receipt, ProviderError> {
    let status = response.status();
    debug!(%provider, status = status.as_u16(), "provider responded");

    if !status.is_success() {
        let body = response
            .text()
            .await
            .map_err(ProviderError::transport(provider))?;
        return Err(ProviderError::Status {
            provider,
            status: status.as_u16(),
            body,
        });
    }

    let raw = response
        .text()
        .await
        .map_err(ProviderError::transport(provider))?;
    let response = serde_json::from_str(&raw).map_err(|source| ProviderError::Decode {
        provider,
        source,
    })?;

    Ok(Receipt {
        provider,
        raw,
        response,
    })
}
