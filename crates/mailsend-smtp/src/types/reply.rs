//! Server replies (RFC 5321 section 4.2).

use std::fmt;

use crate::error::{Error, Result};

/// Reply class, from the first digit of the code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyClass {
    /// 2xx: the command succeeded.
    Completed,
    /// 3xx: the server waits for more input (DATA, SASL challenges).
    Intermediate,
    /// 4xx: temporary failure, the command may succeed later.
    Transient,
    /// 5xx: permanent failure.
    Permanent,
    /// Anything outside 200-599.
    Unknown,
}

/// Three-digit reply code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ReplyCode(u16);

impl ReplyCode {
    /// 220 Service ready (greeting, STARTTLS go-ahead)
    pub const SERVICE_READY: Self = Self(220);
    /// 221 Closing transmission channel
    pub const CLOSING: Self = Self(221);
    /// 235 Authentication successful
    pub const AUTH_SUCCESS: Self = Self(235);
    /// 250 Requested action completed
    pub const OK: Self = Self(250);
    /// 334 Server challenge
    pub const AUTH_CONTINUE: Self = Self(334);
    /// 354 Start mail input
    pub const START_DATA: Self = Self(354);
    /// 421 Service not available
    pub const SERVICE_UNAVAILABLE: Self = Self(421);
    /// 450 Mailbox busy
    pub const MAILBOX_BUSY: Self = Self(450);
    /// 454 TLS temporarily unavailable
    pub const TLS_UNAVAILABLE: Self = Self(454);
    /// 500 Command unrecognized
    pub const SYNTAX_ERROR: Self = Self(500);
    /// 502 Command not implemented
    pub const NOT_IMPLEMENTED: Self = Self(502);
    /// 535 Authentication credentials invalid
    pub const AUTH_FAILED: Self = Self(535);
    /// 550 Mailbox unavailable
    pub const MAILBOX_UNAVAILABLE: Self = Self(550);
    /// 552 Message exceeds storage allocation
    pub const EXCEEDED_STORAGE: Self = Self(552);
    /// 554 Transaction failed
    pub const TRANSACTION_FAILED: Self = Self(554);

    /// Creates a reply code.
    #[must_use]
    pub const fn new(code: u16) -> Self {
        Self(code)
    }

    /// Returns the numeric code.
    #[must_use]
    pub const fn as_u16(self) -> u16 {
        self.0
    }

    /// Returns the reply class.
    #[must_use]
    pub const fn class(self) -> ReplyClass {
        match self.0 / 100 {
            2 => ReplyClass::Completed,
            3 => ReplyClass::Intermediate,
            4 => ReplyClass::Transient,
            5 => ReplyClass::Permanent,
            _ => ReplyClass::Unknown,
        }
    }

    /// 2xx.
    #[must_use]
    pub const fn is_success(self) -> bool {
        matches!(self.class(), ReplyClass::Completed)
    }

    /// 3xx.
    #[must_use]
    pub const fn is_intermediate(self) -> bool {
        matches!(self.class(), ReplyClass::Intermediate)
    }

    /// 4xx.
    #[must_use]
    pub const fn is_transient(self) -> bool {
        matches!(self.class(), ReplyClass::Transient)
    }

    /// 5xx.
    #[must_use]
    pub const fn is_permanent(self) -> bool {
        matches!(self.class(), ReplyClass::Permanent)
    }
}

impl fmt::Display for ReplyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A complete, possibly multi-line, server reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    /// Reply code.
    pub code: ReplyCode,
    /// Text of each line, without code and separator.
    pub lines: Vec<String>,
}

impl Reply {
    /// Creates a reply.
    #[must_use]
    #[allow(clippy::missing_const_for_fn)] // Vec is not const-compatible
    pub fn new(code: ReplyCode, lines: Vec<String>) -> Self {
        Self { code, lines }
    }

    /// Returns true for 2xx replies.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.code.is_success()
    }

    /// Returns true for 3xx replies.
    #[must_use]
    pub const fn is_intermediate(&self) -> bool {
        self.code.is_intermediate()
    }

    /// Returns true for 5xx replies.
    #[must_use]
    pub const fn is_permanent_error(&self) -> bool {
        self.code.is_permanent()
    }

    /// First line of text. Carries the challenge on 334 replies.
    #[must_use]
    pub fn first_line(&self) -> &str {
        self.lines.first().map_or("", String::as_str)
    }

    /// All lines joined with `\n`.
    #[must_use]
    pub fn text(&self) -> String {
        self.lines.join("\n")
    }

    /// Passes 2xx replies through and turns anything else into
    /// [`Error::SmtpError`].
    ///
    /// # Errors
    ///
    /// Returns the reply as an error unless it is 2xx.
    pub fn ensure_success(self) -> Result<Self> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(self.into_error())
        }
    }

    /// Passes the reply through if it carries exactly `expected`.
    ///
    /// # Errors
    ///
    /// Returns the reply as an error for any other code.
    pub fn ensure(self, expected: ReplyCode) -> Result<Self> {
        if self.code == expected {
            Ok(self)
        } else {
            Err(self.into_error())
        }
    }

    /// Converts the reply into [`Error::SmtpError`].
    #[must_use]
    pub fn into_error(self) -> Error {
        Error::smtp_error(self.code.as_u16(), self.text())
    }
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.code, self.lines.join(" / "))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::redundant_clone, clippy::manual_string_new, clippy::needless_collect, clippy::unreadable_literal, clippy::used_underscore_items, clippy::similar_names)]
mod tests {
    use super::*;

    fn reply(code: u16, lines: &[&str]) -> Reply {
        Reply::new(
            ReplyCode::new(code),
            lines.iter().map(ToString::to_string).collect(),
        )
    }

    #[test]
    fn test_classes() {
        assert_eq!(ReplyCode::SERVICE_READY.class(), ReplyClass::Completed);
        assert_eq!(ReplyCode::START_DATA.class(), ReplyClass::Intermediate);
        assert_eq!(ReplyCode::TLS_UNAVAILABLE.class(), ReplyClass::Transient);
        assert_eq!(ReplyCode::AUTH_FAILED.class(), ReplyClass::Permanent);
        assert_eq!(ReplyCode::new(199).class(), ReplyClass::Unknown);
        assert_eq!(ReplyCode::new(600).class(), ReplyClass::Unknown);
    }

    #[test]
    fn test_code_predicates() {
        assert!(ReplyCode::OK.is_success());
        assert!(!ReplyCode::OK.is_transient());
        assert!(ReplyCode::AUTH_CONTINUE.is_intermediate());
        assert!(ReplyCode::MAILBOX_BUSY.is_transient());
        assert!(ReplyCode::MAILBOX_UNAVAILABLE.is_permanent());
        assert!(ReplyCode::OK < ReplyCode::MAILBOX_BUSY);
        assert_eq!(ReplyCode::TRANSACTION_FAILED.to_string(), "554");
    }

    #[test]
    fn test_text_and_first_line() {
        let r = reply(220, &["smtp.example.com ESMTP", "Ready"]);
        assert_eq!(r.first_line(), "smtp.example.com ESMTP");
        assert_eq!(r.text(), "smtp.example.com ESMTP\nReady");
        assert_eq!(r.to_string(), "220 smtp.example.com ESMTP / Ready");
        assert_eq!(reply(250, &[]).first_line(), "");
    }

    #[test]
    fn test_ensure_success() {
        assert!(reply(250, &["OK"]).ensure_success().is_ok());

        let err = reply(550, &["No such user"]).ensure_success().unwrap_err();
        assert_eq!(err.reply_code(), Some(550));
        assert!(err.is_permanent());

        let err = reply(354, &["Go ahead"]).ensure_success().unwrap_err();
        assert_eq!(err.reply_code(), Some(354));
    }

    #[test]
    fn test_ensure_exact_code() {
        assert!(reply(354, &["Go ahead"]).ensure(ReplyCode::START_DATA).is_ok());
        // 250 is a success but not the go-ahead for message data.
        let err = reply(250, &["OK"]).ensure(ReplyCode::START_DATA).unwrap_err();
        assert_eq!(err.reply_code(), Some(250));
    }
}
