//! Error types for the mailsend facade.

use thiserror::Error;

/// Errors that can occur while configuring or sending mail.
#[derive(Debug, Error)]
pub enum Error {
    /// SMTP connection, authentication or delivery failed.
    #[error("SMTP error: {0}")]
    Smtp(#[from] mailsend_smtp::Error),

    /// The message could not be built.
    #[error("Message error: {0}")]
    Message(#[from] mailsend_mime::Error),

    /// Settings document is not valid JSON for [`Settings`](crate::Settings).
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    /// Settings file could not be read.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Settings are well-formed but unusable.
    #[error("Settings error: {0}")]
    Settings(String),
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;
