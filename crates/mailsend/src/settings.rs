//! JSON settings for an SMTP server.
//!
//! ```json
//! {
//!   "host": "smtp.example.com",
//!   "port": 587,
//!   "username": "user@example.com",
//!   "password": "secret",
//!   "encryption": "starttls",
//!   "authentication": "login",
//!   "keep_alive": true
//! }
//! ```
//!
//! Omitted fields take the [`ServerConfigBuilder`] defaults; the port
//! follows the encryption mode.

use std::path::Path;
use std::time::Duration;

use mailsend_smtp::{AuthMechanism, Encryption, ServerConfig, ServerConfigBuilder};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Server settings as stored on disk.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Server hostname.
    pub host: String,
    /// Server port (default: 25, 465 for SSL/TLS, 587 for STARTTLS).
    pub port: Option<u16>,
    /// Username for authentication.
    pub username: Option<String>,
    /// Password for authentication.
    pub password: Option<String>,
    /// Encryption mode.
    pub encryption: Encryption,
    /// SASL mechanism.
    pub authentication: AuthMechanism,
    /// Connect timeout in seconds.
    pub connect_timeout_secs: Option<u64>,
    /// Send timeout in seconds.
    pub send_timeout_secs: Option<u64>,
    /// Keep the connection open between messages.
    pub keep_alive: bool,
    /// Name announced in EHLO.
    pub helo_name: Option<String>,
    /// Skip certificate verification.
    pub accept_invalid_certs: bool,
}

impl Settings {
    /// Parses settings from a JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if the document is not valid settings JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Reads settings from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Serializes the settings as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Checks the settings for values that cannot work.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Settings`] describing the first problem found.
    pub fn validate(&self) -> Result<()> {
        if self.host.trim().is_empty() {
            return Err(Error::Settings("SMTP host is required".into()));
        }
        if self.port == Some(0) {
            return Err(Error::Settings("SMTP port must be 1-65535".into()));
        }
        if self.username.is_some() && self.password.is_none() {
            return Err(Error::Settings("SMTP password is required".into()));
        }
        if self.password.is_some() && self.username.is_none() {
            return Err(Error::Settings("SMTP username is required".into()));
        }
        if self.connect_timeout_secs == Some(0) || self.send_timeout_secs == Some(0) {
            return Err(Error::Settings("Timeouts must be at least one second".into()));
        }
        Ok(())
    }

    /// Validates the settings and turns them into a [`ServerConfig`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::Settings`] if validation fails.
    pub fn server_config(&self) -> Result<ServerConfig> {
        self.validate()?;

        let mut builder = ServerConfigBuilder::new(self.host.trim())
            .encryption(self.encryption)
            .authentication(self.authentication)
            .keep_alive(self.keep_alive)
            .danger_accept_invalid_certs(self.accept_invalid_certs);

        if let Some(port) = self.port {
            builder = builder.port(port);
        }
        if let (Some(username), Some(password)) = (&self.username, &self.password) {
            builder = builder.credentials(username, password);
        }
        if let Some(secs) = self.connect_timeout_secs {
            builder = builder.connect_timeout(Duration::from_secs(secs));
        }
        if let Some(secs) = self.send_timeout_secs {
            builder = builder.send_timeout(Duration::from_secs(secs));
        }
        if let Some(name) = &self.helo_name {
            builder = builder.helo_name(name);
        }

        Ok(builder.build())
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
    fn test_minimal_settings_use_defaults() {
        let settings = Settings::from_json(r#"{"host": "smtp.example.com"}"#).unwrap();
        let config = settings.server_config().unwrap();

        assert_eq!(config.host(), "smtp.example.com");
        assert_eq!(config.port(), 25);
        assert_eq!(config.encryption(), Encryption::None);
        assert_eq!(config.authentication(), AuthMechanism::Plain);
        assert!(config.credentials().is_none());
        assert_eq!(config.connect_timeout(), Duration::from_secs(10));
        assert!(!config.keep_alive());
    }

    #[test]
    fn test_full_settings() {
        let json = r#"{
            "host": "smtp.example.com",
            "username": "user@example.com",
            "password": "secret",
            "encryption": "starttls",
            "authentication": "cram-md5",
            "connect_timeout_secs": 3,
            "send_timeout_secs": 30,
            "keep_alive": true,
            "helo_name": "client.example.com",
            "accept_invalid_certs": true
        }"#;
        let config = Settings::from_json(json).unwrap().server_config().unwrap();

        assert_eq!(config.port(), 587);
        assert_eq!(config.encryption(), Encryption::StartTls);
        assert_eq!(config.authentication(), AuthMechanism::CramMd5);
        assert_eq!(config.credentials().unwrap().username(), "user@example.com");
        assert_eq!(config.connect_timeout(), Duration::from_secs(3));
        assert_eq!(config.send_timeout(), Duration::from_secs(30));
        assert!(config.keep_alive());
        assert_eq!(config.helo_name(), "client.example.com");
        assert!(config.tls().accept_invalid_certs);
    }

    #[test]
    fn test_ssl_tls_port() {
        let settings =
            Settings::from_json(r#"{"host": "smtp.example.com", "encryption": "ssl-tls"}"#)
                .unwrap();
        assert_eq!(settings.server_config().unwrap().port(), 465);
    }

    #[test]
    fn test_invalid_settings() {
        for json in [
            r#"{"host": ""}"#,
            r#"{"host": "h", "port": 0}"#,
            r#"{"host": "h", "username": "u"}"#,
            r#"{"host": "h", "password": "p"}"#,
            r#"{"host": "h", "send_timeout_secs": 0}"#,
        ] {
            let settings = Settings::from_json(json).unwrap();
            assert!(
                matches!(settings.server_config(), Err(Error::Settings(_))),
                "{json}"
            );
        }

        assert!(matches!(
            Settings::from_json(r#"{"host": "h", "encryption": "tls13"}"#),
            Err(Error::Serde(_))
        ));
    }

    #[test]
    fn test_json_round_trip() {
        let settings = Settings {
            host: "smtp.example.com".into(),
            keep_alive: true,
            ..Settings::default()
        };
        let parsed = Settings::from_json(&settings.to_json().unwrap()).unwrap();
        assert_eq!(parsed, settings);
    }

    #[test]
    fn test_load_missing_file() {
        assert!(matches!(
            Settings::load("/nonexistent/mailsend/settings.json"),
            Err(Error::Io(_))
        ));
    }
}
