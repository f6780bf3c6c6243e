use std::io::{self, Write};

use reqwest::Client;
use secrecy::SecretString;
use thiserror::Error;
use tracing::{debug, info};

use crate::config::{Config, ConfigError, Credentials};
use crate::message::{MessageError, OutgoingMessage};
use crate::providers::{
    EmailTransport, InvalidProvider, PostmarkTransport, ProviderError, ProviderKind, Receipt,
    ResendTransport,
};

/// Prefix the CI runner recognises as an annotated failure
pub const ERROR_SENTINEL: &str = "::error::";

/// A client that validates one message and hands it to the selected provider
///
/// The client owns the HTTP connection settings and the provider origins. It
/// performs a single request per `dispatch` call and never retries.
pub struct EmailClient {
    client: Client,
    resend_url: String,
    postmark_url: String,
}

/// Every way a send can fail. All of them end the run with exit status 1.
#[derive(Error, Debug)]
pub enum SendError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    InvalidProvider(#[from] InvalidProvider),

    #[error(transparent)]
    MissingBody(#[from] MessageError),

    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error("failed to write report: {0}")]
    Report(#[from] io::Error),
}

impl SendError {
    /// Renders the error as a single `::error::<message>` line
    pub fn annotation(&self) -> String {
        format!("{ERROR_SENTINEL}{self}")
    }
}

/// Writes the success lines for an accepted message: which provider took it,
/// then the response body exactly as the provider sent it
///
/// # Errors
///
/// Returns an error if writing to `out` fails
pub fn report(receipt: &Receipt, mut out: impl Write) -> io::Result<()> {
    writeln!(out, "Email sent successfully via {}", receipt.provider())?;
    writeln!(out, "Response: {}", receipt.raw())?;
    out.flush()
}

impl Default for EmailClient {
    fn default() -> Self {
        Self::new()
    }
}

impl EmailClient {
    /// Creates a client pointed at the production Resend and Postmark APIs
    ///
    /// # Examples
    ///
    /// ```
    /// use send_email::EmailClient;
    ///
    /// let client = EmailClient::new();
    /// ```
    pub fn new() -> Self {
        Self {
            client: Client::new(),
            resend_url: ProviderKind::Resend.base_url().to_string(),
            postmark_url: ProviderKind::Postmark.base_url().to_string(),
        }
    }

    /// Points one provider at a different origin. The request path is kept.
    ///
    /// # Arguments
    ///
    /// * `provider` - The provider whose origin to replace
    /// * `base_url` - Scheme, host and port, e.g. `http://127.0.0.1:8080`
    ///
    /// # Returns
    ///
    /// The modified client instance for method chaining
    pub fn with_base_url(mut self, provider: ProviderKind, base_url: impl Into<String>) -> Self {
        match provider {
            ProviderKind::Resend => self.resend_url = base_url.into(),
            ProviderKind::Postmark => self.postmark_url = base_url.into(),
        }
        self
    }

    /// Sends the message described by `config`
    ///
    /// # Errors
    ///
    /// See [`EmailClient::dispatch`]
    pub async fn send(&self, config: &Config) -> Result<Receipt, SendError> {
        self.dispatch(&config.provider, &config.message(), &config.credentials)
            .await
    }

    /// Validates the provider name and message, then sends through the
    /// matching adapter
    ///
    /// # Arguments
    ///
    /// * `provider` - `resend` or `postmark`
    /// * `message` - The canonical message
    /// * `credentials` - Provider secrets; only the selected one must be set
    ///
    /// # Errors
    ///
    /// This function will return an error if:
    /// - The provider name is not recognised
    /// - The message has neither an HTML nor a text body
    /// - The selected provider's credential is missing
    /// - The provider rejects the message or the request fails
    pub async fn dispatch(
        &self,
        provider: &str,
        message: &OutgoingMessage,
        credentials: &Credentials,
    ) -> Result<Receipt, SendError> {
        let kind: ProviderKind = provider.parse()?;
        message.validate()?;
        debug!(
            provider = kind.name(),
            from = message.from_address(),
            to = message.to_address(),
            subject = message.subject(),
            "message validated"
        );

        let receipt = match kind {
            ProviderKind::Resend => {
                let api_key = credential(kind, credentials.resend_api_key.as_ref())?;
                ResendTransport::new(&self.client, &self.resend_url, api_key)
                    .send(message)
                    .await?
            }
            ProviderKind::Postmark => {
                let token = credential(kind, credentials.postmark_api_token.as_ref())?;
                PostmarkTransport::new(&self.client, &self.postmark_url, token)
                    .send(message)
                    .await?
            }
        };

        info!(provider = kind.name(), "email accepted");
        Ok(receipt)
    }
}

fn credential(
    kind: ProviderKind,
    secret: Option<&SecretString>,
) -> Result<&SecretString, ConfigError> {
    secret.ok_or(ConfigError::Missing(kind.credential_var()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn resend_credentials() -> Credentials {
        Credentials {
            resend_api_key: Some(SecretString::from("re_123".to_string())),
            postmark_api_token: None,
        }
    }

    fn html_message() -> OutgoingMessage {
        OutgoingMessage::new("ci@example.com", "team@example.com", "Build passed")
            .with_html("<p>All green.</p>")
    }

    #[tokio::test]
    async fn test_invalid_provider() {
        let err = EmailClient::new()
            .dispatch("sendgrid", &html_message(), &resend_credentials())
            .await
            .unwrap_err();

        assert!(matches!(err, SendError::InvalidProvider(_)));
        assert_eq!(
            err.annotation(),
            "::error::Invalid provider 'sendgrid'. Must be 'resend' or 'postmark'."
        );
    }

    #[tokio::test]
    async fn test_provider_is_checked_before_body() {
        let message = OutgoingMessage::new("ci@example.com", "team@example.com", "Build passed");

        let err = EmailClient::new()
            .dispatch("smtp", &message, &resend_credentials())
            .await
            .unwrap_err();

        assert!(matches!(err, SendError::InvalidProvider(_)));
    }

    #[tokio::test]
    async fn test_missing_body() {
        let message = OutgoingMessage::new("ci@example.com", "team@example.com", "Build passed");

        let err = EmailClient::new()
            .dispatch("resend", &message, &resend_credentials())
            .await
            .unwrap_err();

        assert!(matches!(err, SendError::MissingBody(MessageError::MissingBody)));
        assert!(err.annotation().contains("must be provided"));
    }

    #[tokio::test]
    async fn test_missing_credential_names_variable() {
        let err = EmailClient::new()
            .dispatch("postmark", &html_message(), &resend_credentials())
            .await
            .unwrap_err();

        assert_eq!(
            err.to_string(),
            "Missing required environment variable: POSTMARK_API_TOKEN"
        );
    }

    #[tokio::test]
    async fn test_dispatch_to_resend() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/emails"))
            .and(body_json(json!({
                "from": "ci@example.com",
                "to": "team@example.com",
                "subject": "Build passed",
                "html": "<p>All green.</p>"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"id":"abc"}"#))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = EmailClient::new().with_base_url(ProviderKind::Resend, mock_server.uri());
        let receipt = client
            .dispatch("resend", &html_message(), &resend_credentials())
            .await
            .unwrap();

        assert_eq!(receipt.provider(), ProviderKind::Resend);
        assert_eq!(receipt.response(), &json!({"id": "abc"}));
    }

    #[tokio::test]
    async fn test_send_from_config_to_postmark() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/email"))
            .respond_with(ResponseTemplate::new(422).set_body_string(r#"{"ErrorCode":300}"#))
            .expect(1)
            .mount(&mock_server)
            .await;

        let config = Config::from_lookup(|name| {
            let value = match name {
                "INPUT_PROVIDER" => Some("postmark"),
                "EMAIL_FROM" => Some("ci@example.com"),
                "EMAIL_TO" => Some("team@example.com"),
                "INPUT_SUBJECT" => Some("Deployed"),
                "INPUT_BODY_TEXT" => Some("done"),
                "POSTMARK_API_TOKEN" => Some("pm-token"),
                _ => None,
            };
            value.map(str::to_string)
        })
        .unwrap();

        let client = EmailClient::new().with_base_url(ProviderKind::Postmark, mock_server.uri());
        let err = client.send(&config).await.unwrap_err();

        assert_eq!(
            err.annotation(),
            r#"::error::Postmark API error (HTTP 422): {"ErrorCode":300}"#
        );
    }

    #[tokio::test]
    async fn test_unreachable_provider_is_provider_error() {
        // Nothing listens on the discard port.
        let client =
            EmailClient::new().with_base_url(ProviderKind::Resend, "http://127.0.0.1:9");

        let err = client
            .dispatch("resend", &html_message(), &resend_credentials())
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            SendError::Provider(ProviderError::Transport { .. })
        ));
        assert!(err.annotation().starts_with("::error::Resend request failed"));
    }
}
