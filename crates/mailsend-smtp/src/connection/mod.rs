//! SMTP connection management.
//!
//! - [`SmtpClient`]: connection lifecycle, timeouts and keep-alive
//! - [`Client`]: type-state protocol client underneath it
//! - [`ServerConfig`]: server settings

mod client;
mod config;
mod session;
mod stream;

pub use client::{
    Authenticated, Client, Connected, Data, MailTransaction, Ready, RecipientAdded,
    SmtpConnection,
};
pub use config::{Credentials, Encryption, ServerConfig, ServerConfigBuilder};
pub use session::{ConnectionState, SmtpClient};
pub use stream::{SmtpStream, TlsOptions, connect, create_tls_connector};

use crate::types::{AuthMechanism, Extension};
use std::collections::HashSet;

/// Server capabilities from EHLO response.
#[derive(Debug, Clone, Default)]
pub struct ServerInfo {
    /// Server hostname from greeting.
    pub hostname: String,
    /// Supported extensions.
    pub extensions: HashSet<Extension>,
}

impl ServerInfo {
    /// Checks if the server supports an extension.
    #[must_use]
    pub fn supports(&self, ext: &Extension) -> bool {
        self.extensions.contains(ext)
    }

    /// Checks if STARTTLS is supported.
    #[must_use]
    pub fn supports_starttls(&self) -> bool {
        self.supports(&Extension::StartTls)
    }

    /// Checks if the SIZE extension was announced, with or without a limit.
    #[must_use]
    pub fn supports_size(&self) -> bool {
        self.extensions
            .iter()
            .any(|ext| matches!(ext, Extension::Size(_)))
    }

    /// Returns the maximum message size, if advertised.
    #[must_use]
    pub fn max_message_size(&self) -> Option<usize> {
        self.extensions.iter().find_map(|ext| match ext {
            Extension::Size(size) => *size,
            _ => None,
        })
    }

    /// Returns the announced authentication mechanisms this client can use.
    #[must_use]
    pub fn auth_mechanisms(&self) -> Vec<AuthMechanism> {
        let mut found = Vec::new();
        for ext in &self.extensions {
            if let Extension::Auth(mechanisms) = ext {
                for mechanism in mechanisms {
                    if !found.contains(mechanism) {
                        found.push(*mechanism);
                    }
                }
            }
        }
        found
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::redundant_clone, clippy::manual_string_new, clippy::needless_collect, clippy::unreadable_literal, clippy::used_underscore_items, clippy::similar_names)]
mod tests {
    use super::*;

    fn info(lines: &[&str]) -> ServerInfo {
        ServerInfo {
            hostname: "mx.example.com".into(),
            extensions: lines.iter().map(|l| Extension::parse(l)).collect(),
        }
    }

    #[test]
    fn test_server_info_size() {
        assert!(!info(&["PIPELINING"]).supports_size());
        assert!(info(&["SIZE"]).supports_size());
        assert_eq!(info(&["SIZE"]).max_message_size(), None);
        assert_eq!(info(&["SIZE 35882577"]).max_message_size(), Some(35882577));
    }

    #[test]
    fn test_server_info_auth() {
        let info = info(&["STARTTLS", "AUTH PLAIN LOGIN CRAM-MD5 XOAUTH2"]);
        assert!(info.supports_starttls());
        assert_eq!(
            info.auth_mechanisms(),
            vec![AuthMechanism::Plain, AuthMechanism::Login, AuthMechanism::CramMd5]
        );
    }

    #[test]
    fn test_server_info_legacy_auth_merged() {
        let mechanisms = info(&["AUTH=LOGIN", "AUTH LOGIN PLAIN"]).auth_mechanisms();
        assert_eq!(mechanisms.len(), 2);
        assert!(mechanisms.contains(&AuthMechanism::Login));
        assert!(mechanisms.contains(&AuthMechanism::Plain));
    }
}
