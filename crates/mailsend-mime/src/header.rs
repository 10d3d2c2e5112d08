//! MIME header handling.

use crate::encoding::encode_rfc2047;
use crate::error::{Error, Result};
use std::fmt;

/// Preferred maximum header line length (RFC 5322 section 2.1.1).
const FOLD_WIDTH: usize = 78;

/// Ordered collection of email headers.
///
/// Headers are written in insertion order. Lookups are case-insensitive.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers {
    headers: Vec<(String, String)>,
}

impl Headers {
    /// Creates a new empty header collection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a header value after validating name and value.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is not a valid field name or the value
    /// contains line breaks.
    pub fn add(&mut self, name: impl Into<String>, value: impl Into<String>) -> Result<()> {
        let name = name.into();
        let value = value.into();
        validate_name(&name)?;
        validate_value(&name, &value)?;
        self.headers.push((name, value));
        Ok(())
    }

    /// Adds a header whose value is already encoded and folded.
    pub(crate) fn push_raw(&mut self, name: &str, value: String) {
        self.headers.push((name.to_string(), value));
    }

    /// Sets a header value, replacing any existing values.
    ///
    /// # Errors
    ///
    /// Returns an error if the header is invalid.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) -> Result<()> {
        let name = name.into();
        self.remove(&name);
        self.add(name, value)
    }

    /// Gets the first value for a header.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Gets all values for a header.
    #[must_use]
    pub fn get_all(&self, name: &str) -> Vec<&str> {
        self.headers
            .iter()
            .filter(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
            .collect()
    }

    /// Returns true if the header is present.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Removes all values for a header.
    pub fn remove(&mut self, name: &str) {
        self.headers.retain(|(n, _)| !n.eq_ignore_ascii_case(name));
    }

    /// Returns an iterator over all headers in order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.headers.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    /// Returns the number of header fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.headers.len()
    }

    /// Returns true if there are no headers.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.headers.is_empty()
    }

    /// Encodes a header value using RFC 2047 if needed.
    #[must_use]
    pub fn encode_value(value: &str) -> String {
        encode_rfc2047(value, "utf-8")
    }
}

/// Field names are printable ASCII without colon (RFC 5322 section 2.2).
fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() || !name.chars().all(|c| c.is_ascii_graphic() && c != ':') {
        return Err(Error::InvalidHeader(format!("Invalid header name: {name:?}")));
    }
    Ok(())
}

fn validate_value(name: &str, value: &str) -> Result<()> {
    if value.contains(['\r', '\n']) {
        return Err(Error::InvalidHeader(format!(
            "Header {name} contains a line break"
        )));
    }
    Ok(())
}

/// Folds `Name: value` at spaces so lines stay near 78 characters.
///
/// Existing folds (CRLF followed by whitespace) are kept.
fn write_folded(f: &mut fmt::Formatter<'_>, name: &str, value: &str) -> fmt::Result {
    f.write_str(name)?;
    f.write_str(":")?;

    let mut column = name.len() + 1;
    for (i, physical) in value.split("\r\n").enumerate() {
        if i > 0 {
            f.write_str("\r\n")?;
            column = 0;
        }
        for (j, word) in physical.split(' ').enumerate() {
            let leading_space = i == 0 || j > 0;
            if leading_space && column > 1 && column + 1 + word.len() > FOLD_WIDTH && !word.is_empty() {
                f.write_str("\r\n")?;
                column = 0;
            }
            if leading_space {
                f.write_str(" ")?;
                column += 1;
            }
            f.write_str(word)?;
            column += word.len();
        }
    }

    f.write_str("\r\n")
}

impl fmt::Display for Headers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (name, value) in &self.headers {
            write_folded(f, name, value)?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::redundant_clone,
    clippy::manual_string_new,
    clippy::needless_collect,
    clippy::unreadable_literal,
    clippy::used_underscore_items,
    clippy::similar_names
)]
mod tests {
    use super::*;

    #[test]
    fn test_headers_new() {
        let headers = Headers::new();
        assert!(headers.is_empty());
    }

    #[test]
    fn test_headers_add_get() {
        let mut headers = Headers::new();
        headers.add("Content-Type", "text/plain").unwrap();
        assert_eq!(headers.get("Content-Type"), Some("text/plain"));
        assert_eq!(headers.get("content-type"), Some("text/plain")); // Case insensitive
        assert!(headers.contains("CONTENT-TYPE"));
    }

    #[test]
    fn test_headers_set() {
        let mut headers = Headers::new();
        headers.add("To", "alice@example.com").unwrap();
        headers.add("To", "bob@example.com").unwrap();
        assert_eq!(headers.get_all("To").len(), 2);

        headers.set("To", "charlie@example.com").unwrap();
        assert_eq!(headers.get_all("To").len(), 1);
        assert_eq!(headers.get("To"), Some("charlie@example.com"));
    }

    #[test]
    fn test_headers_remove() {
        let mut headers = Headers::new();
        headers.add("Subject", "Test").unwrap();
        assert!(headers.get("Subject").is_some());

        headers.remove("Subject");
        assert!(headers.get("Subject").is_none());
    }

    #[test]
    fn test_headers_reject_injection() {
        let mut headers = Headers::new();
        assert!(matches!(
            headers.add("X-Test", "a\r\nBcc: victim@example.com"),
            Err(Error::InvalidHeader(_))
        ));
        assert!(matches!(headers.add("Bad Name", "x"), Err(Error::InvalidHeader(_))));
        assert!(matches!(headers.add("Bad:Name", "x"), Err(Error::InvalidHeader(_))));
        assert!(matches!(headers.add("", "x"), Err(Error::InvalidHeader(_))));
        assert!(headers.is_empty());
    }

    #[test]
    fn test_headers_display_keeps_order() {
        let mut headers = Headers::new();
        headers.add("From", "sender@example.com").unwrap();
        headers.add("To", "recipient@example.com").unwrap();
        headers.add("Subject", "Hi").unwrap();

        assert_eq!(
            headers.to_string(),
            "From: sender@example.com\r\nTo: recipient@example.com\r\nSubject: Hi\r\n"
        );
    }

    #[test]
    fn test_long_value_is_folded() {
        let mut headers = Headers::new();
        let value = (0..20)
            .map(|i| format!("user{i}@example.com"))
            .collect::<Vec<_>>()
            .join(", ");
        headers.add("To", value.clone()).unwrap();

        let rendered = headers.to_string();
        assert!(rendered.contains("\r\n "));
        assert!(rendered.split("\r\n").all(|line| line.len() <= 78));
        // Unfolding restores the original value.
        let unfolded = rendered.trim_end().replace("\r\n", "");
        assert_eq!(unfolded, format!("To: {value}"));
    }

    #[test]
    fn test_headers_iter() {
        let mut headers = Headers::new();
        headers.add("From", "sender@example.com").unwrap();
        headers.add("To", "recipient@example.com").unwrap();

        let names: Vec<&str> = headers.iter().map(|(name, _)| name).collect();
        assert_eq!(names, ["From", "To"]);
        assert_eq!(headers.len(), 2);
    }
}
