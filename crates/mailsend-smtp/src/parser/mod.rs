//! Reply parser.
//!
//! Replies arrive one line at a time. Every line starts with the same
//! three-digit code followed by `-` (more lines follow) or a space (last
//! line). A bare code is accepted as a last line.
//!
//! ```text
//! 250-smtp.example.com Hello
//! 250-SIZE 10240000
//! 250 AUTH PLAIN LOGIN
//! ```

use crate::error::{Error, Result};
use crate::types::{Reply, ReplyCode};

/// Accumulates reply lines until the reply is complete.
#[derive(Debug, Default)]
pub struct ReplyParser {
    code: Option<u16>,
    lines: Vec<String>,
}

impl ReplyParser {
    /// Creates an empty parser.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds one line (without CRLF).
    ///
    /// Returns the reply once its last line has been fed; the parser is then
    /// empty again.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Protocol`] for a malformed line or a code that
    /// changes mid-reply.
    pub fn feed(&mut self, line: &str) -> Result<Option<Reply>> {
        let (code, last, text) = split_line(line)?;

        match self.code {
            Some(expected) if expected != code => {
                return Err(Error::Protocol(format!(
                    "Reply code changed mid-reply: {line}"
                )));
            }
            Some(_) => {}
            None => self.code = Some(code),
        }
        self.lines.push(text.to_string());

        if !last {
            return Ok(None);
        }
        self.code = None;
        let lines = std::mem::take(&mut self.lines);
        Ok(Some(Reply::new(ReplyCode::new(code), lines)))
    }
}

/// Splits a line into code, last-line flag and text.
fn split_line(line: &str) -> Result<(u16, bool, &str)> {
    let digits = line
        .get(..3)
        .filter(|d| d.bytes().all(|b| b.is_ascii_digit()))
        .ok_or_else(|| Error::Protocol(format!("Invalid reply code: {line}")))?;
    // Only ASCII digits, so this always parses.
    let code = digits.parse::<u16>().map_err(|_| Error::Protocol(line.into()))?;

    match line.as_bytes().get(3) {
        None => Ok((code, true, "")),
        Some(b' ') => Ok((code, true, &line[4..])),
        Some(b'-') => Ok((code, false, &line[4..])),
        Some(_) => Err(Error::Protocol(format!("Malformed reply line: {line}"))),
    }
}

/// Parses a complete reply from its lines.
///
/// # Errors
///
/// Returns an error if the lines are malformed or do not end the reply.
pub fn parse_reply<S: AsRef<str>>(lines: &[S]) -> Result<Reply> {
    let mut parser = ReplyParser::new();
    let mut lines = lines.iter().peekable();
    while let Some(line) = lines.next() {
        if let Some(reply) = parser.feed(line.as_ref())? {
            if lines.peek().is_some() {
                return Err(Error::Protocol("Data after final reply line".into()));
            }
            return Ok(reply);
        }
    }
    Err(Error::Protocol("Incomplete reply".into()))
}
