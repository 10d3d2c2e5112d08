//! EHLO keywords and SASL mechanisms.

use std::fmt;

/// Service extension announced in the EHLO reply.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Extension {
    /// STARTTLS (RFC 3207)
    StartTls,
    /// AUTH with the mechanisms this client can use (RFC 4954)
    Auth(Vec<AuthMechanism>),
    /// SIZE with the optional limit in bytes (RFC 1870)
    Size(Option<usize>),
    /// 8BITMIME (RFC 6152)
    EightBitMime,
    /// PIPELINING (RFC 2920)
    Pipelining,
    /// SMTPUTF8 (RFC 6531)
    SmtpUtf8,
    /// Any other keyword line, kept verbatim
    Other(String),
}

impl Extension {
    /// Parses one EHLO keyword line (without the reply code).
    ///
    /// The pre-standard `AUTH=PLAIN LOGIN` form is read like `AUTH`.
    #[must_use]
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        let (keyword, params) = line
            .split_once([' ', '='])
            .map_or((line, ""), |(k, p)| (k, p.trim()));

        match keyword.to_ascii_uppercase().as_str() {
            "STARTTLS" => Self::StartTls,
            "AUTH" => Self::Auth(
                params
                    .split_whitespace()
                    .filter_map(AuthMechanism::parse)
                    .collect(),
            ),
            "SIZE" => Self::Size(params.parse().ok()),
            "8BITMIME" => Self::EightBitMime,
            "PIPELINING" => Self::Pipelining,
            "SMTPUTF8" => Self::SmtpUtf8,
            _ => Self::Other(line.to_string()),
        }
    }
}

/// SASL authentication mechanism.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum AuthMechanism {
    /// PLAIN (RFC 4616): credentials in one base64 initial response
    #[default]
    Plain,
    /// LOGIN: username and password in separate challenge rounds
    Login,
    /// CRAM-MD5 (RFC 2195): HMAC-MD5 over a server challenge
    CramMd5,
}

impl AuthMechanism {
    /// Parses a mechanism name, ignoring case. Unknown names give `None`.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        [Self::Plain, Self::Login, Self::CramMd5]
            .into_iter()
            .find(|m| m.as_str().eq_ignore_ascii_case(s))
    }

    /// Mechanism name as used on the wire.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Plain => "PLAIN",
            Self::Login => "LOGIN",
            Self::CramMd5 => "CRAM-MD5",
        }
    }
}

impl fmt::Display for AuthMechanism {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::redundant_clone, clippy::manual_string_new, clippy::needless_collect, clippy::unreadable_literal, clippy::used_underscore_items, clippy::similar_names)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_keywords() {
        assert_eq!(Extension::parse("STARTTLS"), Extension::StartTls);
        assert_eq!(Extension::parse("starttls"), Extension::StartTls);
        assert_eq!(Extension::parse("8BITMIME"), Extension::EightBitMime);
        assert_eq!(Extension::parse("PIPELINING"), Extension::Pipelining);
        assert_eq!(Extension::parse("SMTPUTF8"), Extension::SmtpUtf8);
        assert_eq!(
            Extension::parse("ENHANCEDSTATUSCODES"),
            Extension::Other("ENHANCEDSTATUSCODES".into())
        );
    }

    #[test]
    fn test_parse_size() {
        assert_eq!(Extension::parse("SIZE 35882577"), Extension::Size(Some(35_882_577)));
        assert_eq!(Extension::parse("SIZE"), Extension::Size(None));
        assert_eq!(Extension::parse("SIZE lots"), Extension::Size(None));
    }

    #[test]
    fn test_parse_auth() {
        assert_eq!(
            Extension::parse("AUTH PLAIN LOGIN"),
            Extension::Auth(vec![AuthMechanism::Plain, AuthMechanism::Login])
        );
        // Mechanisms this client cannot use are dropped.
        assert_eq!(
            Extension::parse("AUTH XOAUTH2 cram-md5 OAUTHBEARER"),
            Extension::Auth(vec![AuthMechanism::CramMd5])
        );
        assert_eq!(
            Extension::parse("AUTH=LOGIN PLAIN"),
            Extension::Auth(vec![AuthMechanism::Login, AuthMechanism::Plain])
        );
        assert_eq!(Extension::parse("AUTH"), Extension::Auth(vec![]));
    }

    #[test]
    fn test_mechanism_names() {
        for mechanism in [AuthMechanism::Plain, AuthMechanism::Login, AuthMechanism::CramMd5] {
            assert_eq!(AuthMechanism::parse(mechanism.as_str()), Some(mechanism));
            assert_eq!(mechanism.to_string(), mechanism.as_str());
        }
        assert_eq!(AuthMechanism::parse("Cram-Md5"), Some(AuthMechanism::CramMd5));
        assert_eq!(AuthMechanism::parse("GSSAPI"), None);
        assert_eq!(AuthMechanism::default(), AuthMechanism::Plain);
    }
}
