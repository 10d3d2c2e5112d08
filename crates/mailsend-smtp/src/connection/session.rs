//! High-level SMTP connection with timeouts and keep-alive.
//!
//! `SmtpClient` wraps the type-state [`Client`] and drives it through the
//! connection lifecycle:
//!
//! ```text
//! Disconnected -> Connecting -> (TlsHandshake) -> (Authenticating) -> Ready
//! Ready -> Sending -> Ready            (keep-alive)
//! Ready -> Sending -> Closed           (no keep-alive)
//! any failure -> Closed
//! ```
//!
//! Closed is terminal. Every operation on a closed client fails with
//! [`Error::Closed`]; reconnect by calling [`SmtpClient::connect`] again.
//!
//! ## Example
//!
//! ```ignore
//! use mailsend_smtp::{Address, Envelope, ServerConfig, SmtpClient};
//!
//! let config = ServerConfig::builder("smtp.example.com")
//!     .credentials("user@example.com", "password")
//!     .keep_alive(true)
//!     .build();
//!
//! let mut client = SmtpClient::connect(config).await?;
//! let envelope = Envelope::new(
//!     Address::new("user@example.com")?,
//!     vec![Address::new("friend@example.com")?],
//! )?;
//! client.send(&envelope, b"Subject: hi\r\n\r\nhello\r\n").await?;
//! client.noop().await?;
//! client.quit().await?;
//! ```

use std::future::Future;
use std::time::Duration;

use tracing::{debug, info, warn};

use super::client::{Authenticated, Client, Connected, Ready, stuffed_len};
use super::config::{Encryption, ServerConfig};
use super::{ServerInfo, SmtpConnection, stream};
use crate::types::Envelope;
use crate::{Error, Result};

/// Lifecycle state of an [`SmtpClient`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConnectionState {
    /// No transport yet.
    Disconnected,
    /// Opening the TCP connection and reading the greeting.
    Connecting,
    /// Negotiating TLS (implicit or STARTTLS).
    TlsHandshake,
    /// Running SASL authentication.
    Authenticating,
    /// Idle and able to send.
    Ready,
    /// A mail transaction is in flight.
    Sending,
    /// Terminated. No further operations are possible.
    Closed,
}

impl ConnectionState {
    /// Returns the state name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::TlsHandshake => "tls-handshake",
            Self::Authenticating => "authenticating",
            Self::Ready => "ready",
            Self::Sending => "sending",
            Self::Closed => "closed",
        }
    }
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Protocol client in one of the states that can start a transaction.
#[derive(Debug)]
enum Session {
    Connected(Client<Connected>),
    Authenticated(Client<Authenticated>),
}

impl Session {
    fn server_info(&self) -> &ServerInfo {
        match self {
            Self::Connected(client) => client.server_info(),
            Self::Authenticated(client) => client.server_info(),
        }
    }

    const fn is_tls(&self) -> bool {
        match self {
            Self::Connected(client) => client.is_tls(),
            Self::Authenticated(client) => client.is_tls(),
        }
    }

    async fn noop(&mut self) -> Result<()> {
        match self {
            Self::Connected(client) => client.noop().await,
            Self::Authenticated(client) => client.noop().await,
        }
    }

    async fn transact(self, envelope: &Envelope, message: &[u8], reset: bool) -> Result<Self> {
        match self {
            Self::Connected(client) => transact(client, envelope, message, reset)
                .await
                .map(Self::Connected),
            Self::Authenticated(client) => transact(client, envelope, message, reset)
                .await
                .map(Self::Authenticated),
        }
    }

    async fn quit(self) -> Result<()> {
        match self {
            Self::Connected(client) => client.quit().await,
            Self::Authenticated(client) => client.quit().await,
        }
    }
}

/// Runs one complete mail transaction.
async fn transact<S: Ready>(
    mut client: Client<S>,
    envelope: &Envelope,
    message: &[u8],
    reset: bool,
) -> Result<Client<S>> {
    if reset {
        client.reset().await?;
    }

    let mut recipients = envelope.recipients().iter();
    let first = recipients
        .next()
        .ok_or_else(|| Error::InvalidState("envelope has no recipients".into()))?;

    let mut client = client
        .mail_from(envelope.from().clone(), Some(stuffed_len(message)))
        .await?
        .rcpt_to(first.clone())
        .await?;
    for recipient in recipients {
        client = client.rcpt_to(recipient.clone()).await?;
    }

    client.data().await?.send_message(message).await
}

async fn bounded<T>(limit: Duration, operation: impl Future<Output = Result<T>>) -> Result<T> {
    tokio::time::timeout(limit, operation)
        .await
        .map_err(|_| Error::Timeout(limit))?
}

/// SMTP connection bound to one [`ServerConfig`].
///
/// Not shareable between tasks: every operation takes `&mut self`, so at
/// most one transaction is in flight. Independent clients share nothing.
#[derive(Debug)]
pub struct SmtpClient {
    config: ServerConfig,
    session: Option<Session>,
    state: ConnectionState,
    messages_sent: usize,
}

impl SmtpClient {
    /// Connects, negotiates TLS and authenticates, all within the
    /// configured connect timeout.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Auth`] if the server rejects the credentials, or
    /// [`Error::Connection`] for any other failure, timeout included.
    pub async fn connect(config: ServerConfig) -> Result<Self> {
        let mut client = Self {
            config,
            session: None,
            state: ConnectionState::Disconnected,
            messages_sent: 0,
        };

        let limit = client.config.connect_timeout();
        match bounded(limit, client.establish()).await {
            Ok(session) => {
                info!(
                    host = client.config.host(),
                    port = client.config.port(),
                    tls = session.is_tls(),
                    "SMTP connection ready"
                );
                client.session = Some(session);
                client.set_state(ConnectionState::Ready);
                Ok(client)
            }
            Err(e) => {
                warn!(?e, host = client.config.host(), "SMTP connection failed");
                client.set_state(ConnectionState::Closed);
                Err(Error::connection(e))
            }
        }
    }

    async fn establish(&mut self) -> Result<Session> {
        let config = self.config.clone();
        let host = config.host();

        self.set_state(ConnectionState::Connecting);
        let mut stream = stream::connect(host, config.port()).await?;

        if config.encryption() == Encryption::SslTls {
            // Implicit TLS: nothing is read before the handshake completes.
            self.set_state(ConnectionState::TlsHandshake);
            stream = stream.upgrade_to_tls(host, config.tls()).await?;
        }

        let mut client = Client::from_stream(stream)
            .await?
            .ehlo(config.helo_name())
            .await?;

        if config.encryption() == Encryption::StartTls {
            self.set_state(ConnectionState::TlsHandshake);
            client = client
                .starttls(host, config.helo_name(), config.tls())
                .await?;
        }

        let Some(credentials) = config.credentials() else {
            return Ok(Session::Connected(client));
        };

        self.set_state(ConnectionState::Authenticating);
        let client = client
            .authenticate(
                config.authentication(),
                credentials.username(),
                credentials.password(),
            )
            .await?;
        Ok(Session::Authenticated(client))
    }

    /// Sends NOOP to keep an idle connection open.
    ///
    /// Callers holding a keep-alive connection should call this about every
    /// 30 seconds while no message is in flight.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Closed`] if the client is closed, or
    /// [`Error::Connection`] if the probe fails or times out. A failed probe
    /// closes the client.
    pub async fn noop(&mut self) -> Result<()> {
        let mut session = self.take_session()?;
        let limit = self.config.send_timeout();

        match bounded(limit, session.noop()).await {
            Ok(()) => {
                debug!("NOOP ok");
                self.session = Some(session);
                Ok(())
            }
            Err(e) => {
                warn!(?e, "NOOP failed, closing connection");
                self.set_state(ConnectionState::Closed);
                Err(Error::connection(e))
            }
        }
    }

    /// Sends one message, within the configured send timeout.
    ///
    /// `message` is the RFC 5322 text; line endings are normalized and dot
    /// stuffing is applied. Without keep-alive the connection is closed
    /// with QUIT after a successful send.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Closed`] if the client is closed, or [`Error::Send`]
    /// if the server rejects the transaction, the transport fails or the
    /// timeout expires. A failed send closes the client.
    pub async fn send(&mut self, envelope: &Envelope, message: &[u8]) -> Result<()> {
        let session = self.take_session()?;
        let limit = self.config.send_timeout();
        let reset = self.messages_sent > 0;

        self.set_state(ConnectionState::Sending);
        let session = match bounded(limit, session.transact(envelope, message, reset)).await {
            Ok(session) => session,
            Err(e) => {
                warn!(?e, "send failed, closing connection");
                self.set_state(ConnectionState::Closed);
                return Err(Error::send(e));
            }
        };

        self.messages_sent += 1;
        info!(
            from = %envelope.from(),
            recipients = envelope.recipients().len(),
            bytes = message.len(),
            "message sent"
        );

        if self.config.keep_alive() {
            self.session = Some(session);
            self.set_state(ConnectionState::Ready);
        } else {
            if let Err(e) = bounded(limit, session.quit()).await {
                warn!(?e, "QUIT after send failed");
            }
            self.set_state(ConnectionState::Closed);
        }

        Ok(())
    }

    /// Sends QUIT and closes the connection.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Closed`] if already closed, or [`Error::Connection`]
    /// if QUIT fails. The client is closed either way.
    pub async fn quit(&mut self) -> Result<()> {
        let session = self.take_session()?;
        let limit = self.config.send_timeout();
        self.set_state(ConnectionState::Closed);

        bounded(limit, session.quit())
            .await
            .map_err(Error::connection)
    }

    /// Current lifecycle state.
    #[must_use]
    pub const fn state(&self) -> ConnectionState {
        self.state
    }

    /// Returns true if a message can be sent now.
    #[must_use]
    pub const fn is_ready(&self) -> bool {
        self.session.is_some() && matches!(self.state, ConnectionState::Ready)
    }

    /// Returns true if the connection is encrypted.
    #[must_use]
    pub fn is_tls(&self) -> bool {
        self.session.as_ref().is_some_and(Session::is_tls)
    }

    /// Capabilities announced by the server, while connected.
    #[must_use]
    pub fn server_info(&self) -> Option<&ServerInfo> {
        self.session.as_ref().map(Session::server_info)
    }

    /// Number of messages accepted on this connection.
    #[must_use]
    pub const fn messages_sent(&self) -> usize {
        self.messages_sent
    }

    /// The configuration this client was connected with.
    #[must_use]
    pub const fn config(&self) -> &ServerConfig {
        &self.config
    }

    fn take_session(&mut self) -> Result<Session> {
        // A send future dropped mid-flight leaves no session behind either.
        self.session.take().ok_or_else(|| {
            self.set_state(ConnectionState::Closed);
            Error::Closed
        })
    }

    fn set_state(&mut self, state: ConnectionState) {
        if self.state != state {
            debug!(from = %self.state, to = %state, "connection state");
            self.state = state;
        }
    }
}
