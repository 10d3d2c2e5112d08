//! Server configuration types.

use std::fmt;
use std::time::Duration;

use super::stream::TlsOptions;
use crate::types::AuthMechanism;

/// Connection encryption mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum Encryption {
    /// No encryption (port 25). **Not recommended outside local relays.**
    #[default]
    None,
    /// TLS from the start (port 465).
    SslTls,
    /// Start with plaintext, upgrade with STARTTLS (port 587).
    #[cfg_attr(feature = "serde", serde(rename = "starttls"))]
    StartTls,
}

impl Encryption {
    /// Returns the default port for this encryption mode.
    #[must_use]
    pub const fn default_port(self) -> u16 {
        match self {
            Self::None => 25,
            Self::SslTls => 465,
            Self::StartTls => 587,
        }
    }
}

/// Username and password for `AUTH`.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    username: String,
    password: String,
}

impl Credentials {
    /// Creates credentials.
    #[must_use]
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Returns the username.
    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Returns the password.
    #[must_use]
    pub fn password(&self) -> &str {
        &self.password
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// SMTP server configuration.
///
/// Immutable once built; use [`ServerConfig::builder`].
#[derive(Debug, Clone)]
pub struct ServerConfig {
    host: String,
    port: u16,
    credentials: Option<Credentials>,
    encryption: Encryption,
    authentication: AuthMechanism,
    connect_timeout: Duration,
    send_timeout: Duration,
    keep_alive: bool,
    helo_name: String,
    tls: TlsOptions,
}

impl ServerConfig {
    /// Creates a configuration with defaults: no encryption on port 25,
    /// no credentials, 10 second timeouts, keep-alive off.
    #[must_use]
    pub fn new(host: impl Into<String>) -> Self {
        ServerConfigBuilder::new(host).build()
    }

    /// Creates a configuration builder.
    #[must_use]
    pub fn builder(host: impl Into<String>) -> ServerConfigBuilder {
        ServerConfigBuilder::new(host)
    }

    /// Server hostname.
    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Server port.
    #[must_use]
    pub const fn port(&self) -> u16 {
        self.port
    }

    /// Credentials, if authentication is wanted.
    #[must_use]
    pub const fn credentials(&self) -> Option<&Credentials> {
        self.credentials.as_ref()
    }

    /// Encryption mode.
    #[must_use]
    pub const fn encryption(&self) -> Encryption {
        self.encryption
    }

    /// SASL mechanism used when credentials are present.
    #[must_use]
    pub const fn authentication(&self) -> AuthMechanism {
        self.authentication
    }

    /// Upper bound for establishing the session, authentication included.
    #[must_use]
    pub const fn connect_timeout(&self) -> Duration {
        self.connect_timeout
    }

    /// Upper bound for one send (or NOOP) round.
    #[must_use]
    pub const fn send_timeout(&self) -> Duration {
        self.send_timeout
    }

    /// Whether the connection stays open after a send.
    #[must_use]
    pub const fn keep_alive(&self) -> bool {
        self.keep_alive
    }

    /// Name announced in EHLO/HELO.
    #[must_use]
    pub fn helo_name(&self) -> &str {
        &self.helo_name
    }

    /// TLS settings.
    #[must_use]
    pub const fn tls(&self) -> TlsOptions {
        self.tls
    }
}

/// Builder for [`ServerConfig`].
#[derive(Debug, Clone)]
pub struct ServerConfigBuilder {
    host: String,
    port: Option<u16>,
    credentials: Option<Credentials>,
    encryption: Encryption,
    authentication: AuthMechanism,
    connect_timeout: Duration,
    send_timeout: Duration,
    keep_alive: bool,
    helo_name: String,
    tls: TlsOptions,
}

impl ServerConfigBuilder {
    /// Creates a new builder with the given hostname.
    #[must_use]
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: None,
            credentials: None,
            encryption: Encryption::None,
            authentication: AuthMechanism::Plain,
            connect_timeout: Duration::from_secs(10),
            send_timeout: Duration::from_secs(10),
            keep_alive: false,
            helo_name: "localhost".to_string(),
            tls: TlsOptions::default(),
        }
    }

    /// Sets the port.
    #[must_use]
    pub const fn port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// Sets username and password.
    #[must_use]
    pub fn credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.credentials = Some(Credentials::new(username, password));
        self
    }

    /// Sets the encryption mode.
    #[must_use]
    pub const fn encryption(mut self, encryption: Encryption) -> Self {
        self.encryption = encryption;
        self
    }

    /// Sets the SASL mechanism.
    #[must_use]
    pub const fn authentication(mut self, mechanism: AuthMechanism) -> Self {
        self.authentication = mechanism;
        self
    }

    /// Sets the connection timeout.
    #[must_use]
    pub const fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Sets the send timeout.
    #[must_use]
    pub const fn send_timeout(mut self, timeout: Duration) -> Self {
        self.send_timeout = timeout;
        self
    }

    /// Keeps the connection open between sends.
    #[must_use]
    pub const fn keep_alive(mut self, keep_alive: bool) -> Self {
        self.keep_alive = keep_alive;
        self
    }

    /// Sets the name announced in EHLO/HELO.
    #[must_use]
    pub fn helo_name(mut self, name: impl Into<String>) -> Self {
        self.helo_name = name.into();
        self
    }

    /// Disables certificate verification.
    #[must_use]
    pub const fn danger_accept_invalid_certs(mut self, accept: bool) -> Self {
        self.tls.accept_invalid_certs = accept;
        self
    }

    /// Builds the configuration.
    #[must_use]
    pub fn build(self) -> ServerConfig {
        ServerConfig {
            host: self.host,
            port: self.port.unwrap_or_else(|| self.encryption.default_port()),
            credentials: self.credentials,
            encryption: self.encryption,
            authentication: self.authentication,
            connect_timeout: self.connect_timeout,
            send_timeout: self.send_timeout,
            keep_alive: self.keep_alive,
            helo_name: self.helo_name,
            tls: self.tls,
        }
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
    fn test_default_ports() {
        assert_eq!(Encryption::None.default_port(), 25);
        assert_eq!(Encryption::StartTls.default_port(), 587);
        assert_eq!(Encryption::SslTls.default_port(), 465);
    }

    #[test]
    fn test_config_new() {
        let config = ServerConfig::new("smtp.example.com");
        assert_eq!(config.host(), "smtp.example.com");
        assert_eq!(config.port(), 25);
        assert_eq!(config.encryption(), Encryption::None);
        assert_eq!(config.authentication(), AuthMechanism::Plain);
        assert!(config.credentials().is_none());
        assert!(!config.keep_alive());
        assert_eq!(config.helo_name(), "localhost");
    }

    #[test]
    fn test_config_builder() {
        let config = ServerConfig::builder("smtp.example.com")
            .port(2525)
            .credentials("user@example.com", "secret")
            .encryption(Encryption::SslTls)
            .authentication(AuthMechanism::CramMd5)
            .connect_timeout(Duration::from_secs(3))
            .send_timeout(Duration::from_secs(4))
            .keep_alive(true)
            .helo_name("client.example.com")
            .build();

        assert_eq!(config.port(), 2525);
        assert_eq!(config.encryption(), Encryption::SslTls);
        assert_eq!(config.authentication(), AuthMechanism::CramMd5);
        assert_eq!(config.connect_timeout(), Duration::from_secs(3));
        assert_eq!(config.send_timeout(), Duration::from_secs(4));
        assert!(config.keep_alive());
        assert_eq!(config.helo_name(), "client.example.com");
        let creds = config.credentials().unwrap();
        assert_eq!(creds.username(), "user@example.com");
        assert_eq!(creds.password(), "secret");
    }

    #[test]
    fn test_config_builder_default_port() {
        let config = ServerConfig::builder("smtp.example.com")
            .encryption(Encryption::StartTls)
            .build();

        assert_eq!(config.port(), 587);
    }

    #[test]
    fn test_credentials_debug_redacts_password() {
        let creds = Credentials::new("user", "hunter2");
        let debug = format!("{creds:?}");
        assert!(debug.contains("user"));
        assert!(!debug.contains("hunter2"));
    }
}
