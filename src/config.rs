use std::path::Path;

use secrecy::SecretString;
use thiserror::Error;
use tracing::debug;

use crate::message::OutgoingMessage;

pub const PROVIDER: &str = "INPUT_PROVIDER";
pub const EMAIL_FROM: &str = "EMAIL_FROM";
pub const EMAIL_TO: &str = "EMAIL_TO";
pub const SUBJECT: &str = "INPUT_SUBJECT";
pub const BODY_HTML: &str = "INPUT_BODY_HTML";
pub const BODY_TEXT: &str = "INPUT_BODY_TEXT";
pub const RESEND_API_KEY: &str = "RESEND_API_KEY";
pub const POSTMARK_API_TOKEN: &str = "POSTMARK_API_TOKEN";

/// Errors that can occur when reading configuration from the environment
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Failed to load {path}: {reason}")]
    DotEnv { path: String, reason: String },
}

/// Loads `KEY=value` pairs from exactly `path` into the process environment.
/// Parent directories are never searched and variables already set win.
///
/// Returns `false` when the file does not exist.
///
/// # Errors
///
/// Returns `ConfigError::DotEnv` if the file exists but cannot be read or
/// parsed
pub fn load_dotenv(path: impl AsRef<Path>) -> Result<bool, ConfigError> {
    let path = path.as_ref();
    match dotenvy::from_path(path) {
        Ok(()) => {
            debug!(path = %path.display(), "loaded environment file");
            Ok(true)
        }
        Err(err) if err.not_found() => Ok(false),
        Err(err) => Err(ConfigError::DotEnv {
            path: path.display().to_string(),
            reason: err.to_string(),
        }),
    }
}

/// Everything one invocation needs, read once at the process boundary.
#[derive(Debug)]
pub struct Config {
    pub provider: String,
    pub from: String,
    pub to: String,
    pub subject: String,
    pub html_body: String,
    pub text_body: String,
    pub credentials: Credentials,
}

/// Provider secrets. Only the one matching the selected provider is required,
/// which the dispatcher checks once the provider name is known to be valid.
#[derive(Debug, Default)]
pub struct Credentials {
    pub resend_api_key: Option<SecretString>,
    pub postmark_api_token: Option<SecretString>,
}

impl Config {
    /// Reads the configuration from the process environment
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Missing` naming the first required variable that
    /// is unset or empty
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Reads the configuration through an arbitrary lookup function.
    ///
    /// Required variables are checked in a fixed order: provider, sender,
    /// recipient, subject.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Missing` naming the first required variable that
    /// is absent or empty
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let provider = read(&lookup, PROVIDER, true)?;
        let from = read(&lookup, EMAIL_FROM, true)?;
        let to = read(&lookup, EMAIL_TO, true)?;
        let subject = read(&lookup, SUBJECT, true)?;
        let html_body = read(&lookup, BODY_HTML, false)?;
        let text_body = read(&lookup, BODY_TEXT, false)?;

        let credentials = Credentials {
            resend_api_key: secret(&lookup, RESEND_API_KEY),
            postmark_api_token: secret(&lookup, POSTMARK_API_TOKEN),
        };

        Ok(Self {
            provider,
            from,
            to,
            subject,
            html_body,
            text_body,
            credentials,
        })
    }

    /// Builds the canonical message from the configured fields
    pub fn message(&self) -> OutgoingMessage {
        OutgoingMessage::new(&self.from, &self.to, &self.subject)
            .with_html(&self.html_body)
            .with_text(&self.text_body)
    }
}

/// Reads one named value. Optional values default to the empty string.
///
/// # Errors
///
/// Returns `ConfigError::Missing` if `required` is set and the value is absent
/// or empty
pub fn read<F>(lookup: F, name: &'static str, required: bool) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let value = lookup(name).unwrap_or_default();
    if required && value.is_empty() {
        return Err(ConfigError::Missing(name));
    }
    Ok(value)
}

fn secret<F>(lookup: F, name: &str) -> Option<SecretString>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(name)
        .filter(|value| !value.is_empty())
        .map(SecretString::from)
}
