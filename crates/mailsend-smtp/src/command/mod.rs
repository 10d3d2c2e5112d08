//! Client commands (RFC 5321 section 4.1).

use std::fmt;

use crate::types::{Address, AuthMechanism};

/// A command line sent to the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `HELO <hostname>`
    Helo {
        /// Client hostname
        hostname: String,
    },
    /// `EHLO <hostname>`
    Ehlo {
        /// Client hostname
        hostname: String,
    },
    /// `STARTTLS` (RFC 3207)
    StartTls,
    /// `AUTH <mechanism> [initial-response]` (RFC 4954)
    Auth {
        /// Authentication mechanism
        mechanism: AuthMechanism,
        /// Initial response, already base64 encoded
        initial_response: Option<String>,
    },
    /// Line answering a 334 challenge, already base64 encoded
    AuthResponse(String),
    /// `MAIL FROM:<addr> [SIZE=n]`
    MailFrom {
        /// Reverse-path
        from: Address,
        /// SIZE parameter (RFC 1870)
        size: Option<usize>,
    },
    /// `RCPT TO:<addr>`
    RcptTo {
        /// Forward-path
        to: Address,
    },
    /// `DATA`
    Data,
    /// `RSET`
    Rset,
    /// `NOOP`
    Noop,
    /// `QUIT`
    Quit,
}

impl Command {
    /// Command verb, for logging.
    #[must_use]
    pub const fn verb(&self) -> &'static str {
        match self {
            Self::Helo { .. } => "HELO",
            Self::Ehlo { .. } => "EHLO",
            Self::StartTls => "STARTTLS",
            Self::Auth { .. } => "AUTH",
            Self::AuthResponse(_) => "AUTH-RESPONSE",
            Self::MailFrom { .. } => "MAIL",
            Self::RcptTo { .. } => "RCPT",
            Self::Data => "DATA",
            Self::Rset => "RSET",
            Self::Noop => "NOOP",
            Self::Quit => "QUIT",
        }
    }

    /// Returns the wire form, terminated by CRLF.
    #[must_use]
    pub fn serialize(&self) -> Vec<u8> {
        format!("{self}\r\n").into_bytes()
    }

    /// Display form with credentials masked.
    #[must_use]
    pub const fn redacted(&self) -> Redacted<'_> {
        Redacted(self)
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Helo { hostname } => write!(f, "HELO {hostname}"),
            Self::Ehlo { hostname } => write!(f, "EHLO {hostname}"),
            Self::Auth {
                mechanism,
                initial_response: Some(response),
            } => write!(f, "AUTH {mechanism} {response}"),
            Self::Auth { mechanism, .. } => write!(f, "AUTH {mechanism}"),
            Self::AuthResponse(response) => f.write_str(response),
            Self::MailFrom { from, size } => {
                write!(f, "MAIL FROM:<{}>", from.as_str())?;
                if let Some(size) = size {
                    write!(f, " SIZE={size}")?;
                }
                Ok(())
            }
            Self::RcptTo { to } => write!(f, "RCPT TO:<{}>", to.as_str()),
            Self::StartTls | Self::Data | Self::Rset | Self::Noop | Self::Quit => {
                f.write_str(self.verb())
            }
        }
    }
}

/// [`Command`] display that hides SASL payloads.
#[derive(Debug, Clone, Copy)]
pub struct Redacted<'a>(&'a Command);

impl fmt::Display for Redacted<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Command::Auth {
                mechanism,
                initial_response: Some(_),
            } => write!(f, "AUTH {mechanism} ***"),
            Command::AuthResponse(_) => f.write_str("***"),
            other => fmt::Display::fmt(other, f),
        }
    }
}
