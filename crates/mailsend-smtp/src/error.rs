//! Error types for SMTP operations.

use std::io;
use std::time::Duration;

use crate::types::AuthMechanism;

/// Result type alias for SMTP operations.
pub type Result<T> = std::result::Result<T, Error>;

/// SMTP error types.
///
/// The low-level variants describe what went wrong on the wire. The
/// [`SmtpClient`](crate::SmtpClient) wraps them in [`Error::Connection`] or
/// [`Error::Send`] depending on the operation that failed, so callers can
/// match on the phase first and inspect the cause with [`std::error::Error::source`].
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// TLS error.
    #[error("TLS error: {0}")]
    Tls(#[from] rustls::Error),

    /// Server returned error response.
    #[error("SMTP error {code}: {message}")]
    SmtpError {
        /// Reply code (e.g., 550).
        code: u16,
        /// Error message from server.
        message: String,
    },

    /// Protocol error (unexpected response).
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Invalid email address.
    #[error("Invalid email address: {0}")]
    InvalidAddress(String),

    /// Message too large.
    #[error("Message exceeds size limit: {0} bytes")]
    MessageTooLarge(usize),

    /// Feature not supported by server.
    #[error("Server does not support {0}")]
    NotSupported(String),

    /// Invalid state for operation.
    #[error("Invalid state for operation: {0}")]
    InvalidState(String),

    /// Operation did not finish in time.
    #[error("Operation timed out after {0:?}")]
    Timeout(Duration),

    /// Establishing the session failed (TCP, TLS, greeting, EHLO, STARTTLS).
    #[error("Connection failed: {0}")]
    Connection(#[source] Box<Error>),

    /// Server rejected the credentials.
    #[error("Authentication with {} failed ({code}): {message}", mechanism.as_str())]
    Auth {
        /// Mechanism that was attempted.
        mechanism: AuthMechanism,
        /// Reply code (usually 535).
        code: u16,
        /// Error message from server.
        message: String,
    },

    /// Transmitting a message failed.
    #[error("Send failed: {0}")]
    Send(#[source] Box<Error>),

    /// The connection was closed, either explicitly or after a failure.
    #[error("Connection is closed")]
    Closed,
}

impl Error {
    /// Creates an SMTP error from a reply code and message.
    #[must_use]
    pub fn smtp_error(code: u16, message: impl Into<String>) -> Self {
        Self::SmtpError {
            code,
            message: message.into(),
        }
    }

    /// Wraps an error raised while connecting.
    ///
    /// Authentication failures and already wrapped errors pass through unchanged.
    #[must_use]
    pub fn connection(err: Self) -> Self {
        match err {
            Self::Auth { .. } | Self::Connection(_) | Self::Closed => err,
            other => Self::Connection(Box::new(other)),
        }
    }

    /// Wraps an error raised while sending.
    #[must_use]
    pub fn send(err: Self) -> Self {
        match err {
            Self::Send(_) | Self::Closed => err,
            other => Self::Send(Box::new(other)),
        }
    }

    /// Returns the underlying error, looking through phase wrappers.
    #[must_use]
    pub fn root(&self) -> &Self {
        match self {
            Self::Connection(inner) | Self::Send(inner) => inner.root(),
            other => other,
        }
    }

    /// Returns the SMTP reply code carried by this error, if any.
    #[must_use]
    pub fn reply_code(&self) -> Option<u16> {
        match self {
            Self::SmtpError { code, .. } | Self::Auth { code, .. } => Some(*code),
            Self::Connection(inner) | Self::Send(inner) => inner.reply_code(),
            _ => None,
        }
    }

    /// Returns true if this is a permanent error (5xx).
    #[must_use]
    pub fn is_permanent(&self) -> bool {
        matches!(self.reply_code(), Some(code) if code >= 500 && code < 600)
    }

    /// Returns true if this is a transient error (4xx).
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self.reply_code(), Some(code) if code >= 400 && code < 500)
    }

    /// Returns true if the operation ran out of time.
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self.root(), Self::Timeout(_))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::redundant_clone, clippy::manual_string_new, clippy::needless_collect, clippy::unreadable_literal, clippy::used_underscore_items, clippy::similar_names)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_wraps_once() {
        let err = Error::connection(Error::connection(Error::Timeout(Duration::from_secs(1))));
        assert!(matches!(&err, Error::Connection(inner) if matches!(**inner, Error::Timeout(_))));
        assert!(err.is_timeout());
    }

    #[test]
    fn test_connection_keeps_auth() {
        let err = Error::connection(Error::Auth {
            mechanism: AuthMechanism::Plain,
            code: 535,
            message: "bad credentials".into(),
        });
        assert!(matches!(err, Error::Auth { code: 535, .. }));
        assert!(err.is_permanent());
    }

    #[test]
    fn test_send_classification() {
        let err = Error::send(Error::smtp_error(550, "no such user"));
        assert!(err.is_permanent());
        assert!(!err.is_transient());
        assert_eq!(err.reply_code(), Some(550));

        let err = Error::send(Error::smtp_error(451, "try later"));
        assert!(err.is_transient());
    }

    #[test]
    fn test_closed_is_not_wrapped() {
        assert!(matches!(Error::send(Error::Closed), Error::Closed));
        assert!(matches!(Error::connection(Error::Closed), Error::Closed));
    }

    #[test]
    fn test_display() {
        let err = Error::send(Error::smtp_error(554, "rejected"));
        assert_eq!(err.to_string(), "Send failed: SMTP error 554: rejected");
    }
}
