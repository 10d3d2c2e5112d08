//! Header mailboxes (`Display Name <local@domain>`).

use crate::encoding::{encode_rfc2047, needs_encoding};
use crate::error::{Error, Result};
use std::fmt;

/// A mailbox: an address with an optional display name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Mailbox {
    name: Option<String>,
    address: String,
}

impl Mailbox {
    /// Creates a mailbox from a bare address.
    ///
    /// # Errors
    ///
    /// Returns an error if the address is malformed.
    pub fn new(address: impl Into<String>) -> Result<Self> {
        let address = address.into();
        validate_address(&address)?;
        Ok(Self {
            name: None,
            address,
        })
    }

    /// Creates a mailbox with a display name.
    ///
    /// # Errors
    ///
    /// Returns an error if the address or the name is malformed.
    pub fn with_name(name: impl Into<String>, address: impl Into<String>) -> Result<Self> {
        let mut mailbox = Self::new(address)?;
        let name = name.into();
        if name.chars().any(char::is_control) {
            return Err(Error::InvalidAddress(format!(
                "Display name contains control characters: {name:?}"
            )));
        }
        let name = name.trim();
        if !name.is_empty() {
            mailbox.name = Some(name.to_string());
        }
        Ok(mailbox)
    }

    /// Parses `local@domain`, `<local@domain>` or `Display Name <local@domain>`.
    ///
    /// The display name may be quoted (`"Doe, John" <john@example.com>`).
    ///
    /// # Errors
    ///
    /// Returns an error if the input is malformed.
    pub fn parse(input: &str) -> Result<Self> {
        let input = input.trim();

        let Some(open) = input.rfind('<') else {
            return Self::new(input);
        };
        let rest = &input[open + 1..];
        let address = rest
            .strip_suffix('>')
            .ok_or_else(|| Error::InvalidAddress(format!("Unterminated angle address: {input:?}")))?;

        let name = input[..open].trim();
        let name = match name.strip_prefix('"').and_then(|n| n.strip_suffix('"')) {
            Some(quoted) => quoted.replace("\\\"", "\"").replace("\\\\", "\\"),
            None if name.contains('"') => {
                return Err(Error::InvalidAddress(format!(
                    "Unbalanced quotes in display name: {input:?}"
                )));
            }
            None => name.to_string(),
        };

        Self::with_name(name, address)
    }

    /// Returns the address part.
    #[must_use]
    pub fn address(&self) -> &str {
        &self.address
    }

    /// Returns the display name, if any.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Returns the domain part of the address.
    #[must_use]
    pub fn domain(&self) -> &str {
        self.address.rsplit_once('@').map_or("", |(_, domain)| domain)
    }

    /// Returns true if both mailboxes share the same address (case-insensitive).
    #[must_use]
    pub fn same_address(&self, other: &Self) -> bool {
        self.address.eq_ignore_ascii_case(&other.address)
    }
}

fn validate_address(address: &str) -> Result<()> {
    if address.is_empty() {
        return Err(Error::InvalidAddress("Address cannot be empty".into()));
    }

    // No SMTPUTF8: addresses travel as-is in headers and on the envelope.
    if !address.is_ascii() {
        return Err(Error::InvalidAddress(format!(
            "Address must be ASCII: {address:?}"
        )));
    }

    if address
        .chars()
        .any(|c| c.is_whitespace() || c.is_control() || "<>,;\"()[]\\".contains(c))
    {
        return Err(Error::InvalidAddress(format!(
            "Address contains forbidden characters: {address:?}"
        )));
    }

    let Some((local, domain)) = address.rsplit_once('@') else {
        return Err(Error::InvalidAddress(format!("Missing @: {address:?}")));
    };

    if local.is_empty() || local.contains('@') {
        return Err(Error::InvalidAddress(format!(
            "Invalid local part: {address:?}"
        )));
    }

    if domain.is_empty() || domain.split('.').any(str::is_empty) {
        return Err(Error::InvalidAddress(format!("Invalid domain: {address:?}")));
    }

    Ok(())
}

/// RFC 5322 atext plus space: names made of these need no quoting.
fn is_plain_phrase(name: &str) -> bool {
    name.chars()
        .all(|c| c.is_ascii_alphanumeric() || c == ' ' || "!#$%&'*+-/=?^_`{|}~".contains(c))
}

impl fmt::Display for Mailbox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            None => f.write_str(&self.address),
            Some(name) if needs_encoding(name) => {
                write!(f, "{} <{}>", encode_rfc2047(name, "utf-8"), self.address)
            }
            Some(name) if is_plain_phrase(name) => write!(f, "{name} <{}>", self.address),
            Some(name) => {
                let escaped = name.replace('\\', "\\\\").replace('"', "\\\"");
                write!(f, "\"{escaped}\" <{}>", self.address)
            }
        }
    }
}

impl std::str::FromStr for Mailbox {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::redundant_clone, clippy::manual_string_new, clippy::needless_collect, clippy::unreadable_literal, clippy::used_underscore_items, clippy::similar_names)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bare_address() {
        let mailbox = Mailbox::parse("user@example.com").unwrap();
        assert_eq!(mailbox.address(), "user@example.com");
        assert_eq!(mailbox.name(), None);
        assert_eq!(mailbox.domain(), "example.com");
        assert_eq!(mailbox.to_string(), "user@example.com");
    }

    #[test]
    fn test_parse_named_address() {
        let mailbox = Mailbox::parse("From Example <nube@example.com>").unwrap();
        assert_eq!(mailbox.name(), Some("From Example"));
        assert_eq!(mailbox.address(), "nube@example.com");
        assert_eq!(mailbox.to_string(), "From Example <nube@example.com>");
    }

    #[test]
    fn test_parse_angle_only() {
        let mailbox = Mailbox::parse("<a@example.com>").unwrap();
        assert_eq!(mailbox.name(), None);
        assert_eq!(mailbox.address(), "a@example.com");
    }

    #[test]
    fn test_parse_quoted_name() {
        let mailbox = Mailbox::parse("\"Doe, John\" <john@example.com>").unwrap();
        assert_eq!(mailbox.name(), Some("Doe, John"));
        assert_eq!(mailbox.to_string(), "\"Doe, John\" <john@example.com>");
    }

    #[test]
    fn test_non_ascii_name_is_encoded() {
        let mailbox = Mailbox::with_name("José", "jose@example.com").unwrap();
        let rendered = mailbox.to_string();
        assert!(rendered.starts_with("=?utf-8?B?"));
        assert!(rendered.ends_with(" <jose@example.com>"));
    }

    #[test]
    fn test_invalid_addresses() {
        for input in [
            "",
            "plainaddress",
            "@example.com",
            "user@",
            "user@@example.com",
            "user@example..com",
            "us er@example.com",
            "Name <user@example.com",
            "Na\"me <user@example.com>",
            "user@example.com\r\nBcc: x@y.z",
        ] {
            assert!(
                matches!(Mailbox::parse(input), Err(Error::InvalidAddress(_))),
                "{input:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_non_ascii_address_rejected() {
        for input in ["jösé@example.com", "jose@exämple.com", "José <jösé@exämple.com>"] {
            assert!(
                matches!(Mailbox::parse(input), Err(Error::InvalidAddress(_))),
                "{input:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_same_address_ignores_case_and_name() {
        let a = Mailbox::parse("A <User@Example.com>").unwrap();
        let b = Mailbox::parse("user@example.com").unwrap();
        assert!(a.same_address(&b));
    }
}
