//! Error types for MIME operations.

/// Result type alias for MIME operations.
pub type Result<T> = std::result::Result<T, Error>;

/// MIME error types.
///
/// Errors are `Clone` so the builder can keep the first failure and hand
/// it back unchanged from [`Email::error`](crate::Email::error) and
/// [`Email::build`](crate::Email::build).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// Malformed email address or display name.
    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    /// Invalid MIME header.
    #[error("Invalid MIME header: {0}")]
    InvalidHeader(String),

    /// Unparseable date.
    #[error("Invalid date: {0}")]
    InvalidDate(String),

    /// Invalid content type.
    #[error("Invalid content type: {0}")]
    InvalidContentType(String),

    /// Invalid encoding.
    #[error("Invalid encoding: {0}")]
    InvalidEncoding(String),

    /// An attachment source could not be read.
    #[error("Cannot read attachment {path}: {reason}")]
    AttachmentRead {
        /// Path that was read.
        path: String,
        /// Underlying I/O error.
        reason: String,
    },

    /// No From address was set.
    #[error("Message has no sender")]
    MissingSender,

    /// No To, Cc or Bcc address was set.
    #[error("Message has no recipient")]
    MissingRecipient,

    /// An earlier builder call failed; carries that first error.
    #[error("Message builder failed earlier: {0}")]
    Poisoned(Box<Error>),
}

impl Error {
    /// Returns true for input validation failures.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::InvalidAddress(_)
                | Self::InvalidHeader(_)
                | Self::InvalidDate(_)
                | Self::InvalidContentType(_)
                | Self::InvalidEncoding(_)
        )
    }
}

impl From<base64::DecodeError> for Error {
    fn from(err: base64::DecodeError) -> Self {
        Self::InvalidEncoding(format!("Base64 decode error: {err}"))
    }
}

impl From<std::string::FromUtf8Error> for Error {
    fn from(err: std::string::FromUtf8Error) -> Self {
        Self::InvalidEncoding(format!("UTF-8 decode error: {err}"))
    }
}
