//! Envelope address types.

use crate::error::{Error, Result};

/// Email address for the SMTP envelope (`MAIL FROM` / `RCPT TO`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Address(String);

impl Address {
    /// Creates a new address from a string.
    ///
    /// # Errors
    ///
    /// Returns an error if the address is invalid.
    pub fn new(addr: impl Into<String>) -> Result<Self> {
        let addr = addr.into();
        Self::validate(&addr)?;
        Ok(Self(addr))
    }

    /// Returns the address as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the domain part.
    #[must_use]
    pub fn domain(&self) -> &str {
        self.0.rsplit_once('@').map_or("", |(_, domain)| domain)
    }

    fn validate(addr: &str) -> Result<()> {
        if addr.is_empty() {
            return Err(Error::InvalidAddress("Address cannot be empty".into()));
        }

        // SMTPUTF8 is never negotiated.
        if !addr.is_ascii() {
            return Err(Error::InvalidAddress(format!(
                "Address must be ASCII: {addr:?}"
            )));
        }

        // Anything that would break out of `<...>` on the command line.
        if addr
            .chars()
            .any(|c| c.is_whitespace() || c.is_control() || c == '<' || c == '>')
        {
            return Err(Error::InvalidAddress(format!(
                "Address contains forbidden characters: {addr:?}"
            )));
        }

        let Some((local, domain)) = addr.rsplit_once('@') else {
            return Err(Error::InvalidAddress("Address must contain @".into()));
        };

        if local.is_empty() || domain.is_empty() {
            return Err(Error::InvalidAddress(
                "Local and domain parts cannot be empty".into(),
            ));
        }

        if local.contains('@') {
            return Err(Error::InvalidAddress(
                "Address must have exactly one @".into(),
            ));
        }

        Ok(())
    }
}

impl std::fmt::Display for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<&str> for Address {
    type Error = Error;

    fn try_from(value: &str) -> Result<Self> {
        Self::new(value)
    }
}

/// The addresses of one mail transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    from: Address,
    recipients: Vec<Address>,
}

impl Envelope {
    /// Creates an envelope.
    ///
    /// # Errors
    ///
    /// Returns an error if there are no recipients.
    pub fn new(from: Address, recipients: Vec<Address>) -> Result<Self> {
        if recipients.is_empty() {
            return Err(Error::InvalidAddress("Envelope has no recipients".into()));
        }
        Ok(Self { from, recipients })
    }

    /// Reverse-path for `MAIL FROM`.
    #[must_use]
    pub const fn from(&self) -> &Address {
        &self.from
    }

    /// Forward-paths for `RCPT TO`, in order.
    #[must_use]
    pub fn recipients(&self) -> &[Address] {
        &self.recipients
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::redundant_clone, clippy::manual_string_new, clippy::needless_collect, clippy::unreadable_literal, clippy::used_underscore_items, clippy::similar_names)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_address() {
        let addr = Address::new("user@example.com").unwrap();
        assert_eq!(addr.as_str(), "user@example.com");
        assert_eq!(addr.domain(), "example.com");
    }

    #[test]
    fn test_invalid_address_no_at() {
        assert!(Address::new("userexample.com").is_err());
    }

    #[test]
    fn test_invalid_address_empty() {
        assert!(Address::new("").is_err());
    }

    #[test]
    fn test_invalid_address_empty_local() {
        assert!(Address::new("@example.com").is_err());
    }

    #[test]
    fn test_invalid_address_empty_domain() {
        assert!(Address::new("user@").is_err());
    }

    #[test]
    fn test_invalid_address_two_at() {
        assert!(Address::new("a@b@example.com").is_err());
    }

    #[test]
    fn test_invalid_address_injection() {
        assert!(Address::new("user@example.com>\r\nRCPT TO:<x@y.z").is_err());
        assert!(Address::new("user name@example.com").is_err());
    }

    #[test]
    fn test_invalid_address_non_ascii() {
        assert!(matches!(
            Address::new("jösé@example.com"),
            Err(Error::InvalidAddress(_))
        ));
        assert!(matches!(
            Address::new("user@exämple.com"),
            Err(Error::InvalidAddress(_))
        ));
    }

    #[test]
    fn test_envelope_requires_recipient() {
        let from = Address::new("from@example.com").unwrap();
        assert!(Envelope::new(from.clone(), vec![]).is_err());

        let to = Address::new("to@example.com").unwrap();
        let envelope = Envelope::new(from, vec![to]).unwrap();
        assert_eq!(envelope.from().as_str(), "from@example.com");
        assert_eq!(envelope.recipients().len(), 1);
    }
}
