use thiserror::Error;

/// A provider-agnostic email: one sender, one recipient, a subject and at
/// least one body.
///
/// Providers translate this into their own JSON field names. An empty body is
/// stored as `None` so every adapter omits the key instead of sending `""`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMessage {
    from: String,
    to: String,
    subject: String,
    html: Option<String>,
    text: Option<String>,
}

/// Errors that can occur when validating an outgoing message
#[derive(Error, Debug, PartialEq, Eq)]
pub enum MessageError {
    #[error("At least one of html_body or text_body must be provided.")]
    MissingBody,
}

impl OutgoingMessage {
    /// Creates a message without a body
    ///
    /// # Examples
    ///
    /// ```
    /// use send_email::OutgoingMessage;
    ///
    /// let message = OutgoingMessage::new("ci@example.com", "team@example.com", "Build passed")
    ///     .with_text("All green.");
    /// assert!(message.validate().is_ok());
    /// ```
    pub fn new(from: impl Into<String>, to: impl Into<String>, subject: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            subject: subject.into(),
            html: None,
            text: None,
        }
    }

    /// Sets the HTML body. An empty string clears it.
    pub fn with_html(mut self, html: impl Into<String>) -> Self {
        self.html = non_empty(html.into());
        self
    }

    /// Sets the plain text body. An empty string clears it.
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = non_empty(text.into());
        self
    }

    pub fn from_address(&self) -> &str {
        &self.from
    }

    pub fn to_address(&self) -> &str {
        &self.to
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn html(&self) -> Option<&str> {
        self.html.as_deref()
    }

    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    /// Checks that the message carries an HTML or a text body
    ///
    /// # Errors
    ///
    /// Returns `MessageError::MissingBody` if neither body is set
    pub fn validate(&self) -> Result<(), MessageError> {
        if self.html.is_none() && self.text.is_none() {
            return Err(MessageError::MissingBody);
        }
        Ok(())
    }
}

fn non_empty(value: String) -> Option<String> {
    if value.is_empty() { None } else { Some(value) }
}
