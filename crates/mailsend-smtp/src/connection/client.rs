//! Type-state SMTP client.

use super::stream::TlsOptions;
use super::{ServerInfo, SmtpStream};
use crate::auth;
use crate::command::Command;
use crate::error::{Error, Result};
use crate::parser::ReplyParser;
use crate::types::{Address, AuthMechanism, Extension, Reply, ReplyCode};
use std::collections::HashSet;
use std::marker::PhantomData;
use tracing::{debug, trace};

/// Type-state marker for connected state.
#[derive(Debug)]
pub struct Connected;

/// Type-state marker for authenticated state.
#[derive(Debug)]
pub struct Authenticated;

/// Type-state marker for mail transaction started from state `S`.
#[derive(Debug)]
pub struct MailTransaction<S>(PhantomData<S>);

/// Type-state marker for recipient added, transaction started from state `S`.
#[derive(Debug)]
pub struct RecipientAdded<S>(PhantomData<S>);

/// Type-state marker for data mode, transaction started from state `S`.
#[derive(Debug)]
pub struct Data<S>(PhantomData<S>);

mod sealed {
    pub trait Sealed {}
    impl Sealed for super::Connected {}
    impl Sealed for super::Authenticated {}
}

/// States from which a mail transaction may start.
///
/// A finished (or reset) transaction returns the client to the state it
/// started from, so an authenticated session stays authenticated.
pub trait Ready: sealed::Sealed {}

impl Ready for Connected {}
impl Ready for Authenticated {}

/// SMTP client with type-state pattern.
#[derive(Debug)]
pub struct Client<State> {
    stream: SmtpStream,
    server_info: ServerInfo,
    _state: PhantomData<State>,
}

/// Connection trait for all states.
pub trait SmtpConnection {
    /// Returns the server information.
    fn server_info(&self) -> &ServerInfo;
}

impl<S> SmtpConnection for Client<S> {
    fn server_info(&self) -> &ServerInfo {
        &self.server_info
    }
}

impl Client<Connected> {
    /// Creates a client from a stream and reads the server greeting.
    ///
    /// # Errors
    ///
    /// Returns an error if reading the greeting fails or if the server returns an error.
    pub async fn from_stream(mut stream: SmtpStream) -> Result<Self> {
        let greeting = Self::read_reply(&mut stream)
            .await?
            .ensure(ReplyCode::SERVICE_READY)?;

        // The greeting starts with the server's name.
        let hostname = greeting
            .first_line()
            .split_whitespace()
            .next()
            .unwrap_or("unknown")
            .to_string();
        debug!(server = %hostname, "received greeting");

        Ok(Self {
            stream,
            server_info: ServerInfo {
                hostname,
                extensions: HashSet::new(),
            },
            _state: PhantomData,
        })
    }

    /// Sends EHLO and discovers server capabilities.
    ///
    /// Falls back to HELO when the server does not understand EHLO.
    ///
    /// # Errors
    ///
    /// Returns an error if both EHLO and HELO are rejected.
    pub async fn ehlo(mut self, client_hostname: &str) -> Result<Self> {
        let cmd = Command::Ehlo {
            hostname: client_hostname.to_string(),
        };
        let reply = self.send_command(cmd).await?;

        if reply.is_permanent_error() {
            debug!(code = %reply.code, "EHLO rejected, falling back to HELO");
            return self.helo(client_hostname).await;
        }

        self.server_info.extensions = parse_extensions(&reply.ensure_success()?);
        Ok(self)
    }

    /// Sends HELO. No extensions are available afterwards.
    ///
    /// # Errors
    ///
    /// Returns an error if the HELO command fails.
    pub async fn helo(mut self, client_hostname: &str) -> Result<Self> {
        let cmd = Command::Helo {
            hostname: client_hostname.to_string(),
        };
        self.send_command(cmd).await?.ensure_success()?;
        self.server_info.extensions.clear();
        Ok(self)
    }

    /// Upgrades the connection to TLS using STARTTLS, then repeats EHLO.
    ///
    /// # Errors
    ///
    /// Returns an error if STARTTLS is not supported or if the upgrade fails.
    pub async fn starttls(
        mut self,
        server_hostname: &str,
        client_hostname: &str,
        options: TlsOptions,
    ) -> Result<Self> {
        if !self.server_info.supports_starttls() {
            return Err(Error::NotSupported("STARTTLS".into()));
        }

        self.send_command(Command::StartTls)
            .await?
            .ensure(ReplyCode::SERVICE_READY)?;

        debug!(server = %server_hostname, "upgrading to TLS");
        self.stream = self.stream.upgrade_to_tls(server_hostname, options).await?;

        // Capabilities announced before the upgrade must be discarded (RFC 3207).
        self.server_info.extensions.clear();
        self.ehlo(client_hostname).await
    }

    /// Authenticates with the given mechanism.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Auth`] if the server rejects the credentials, or a
    /// transport/protocol error.
    pub async fn authenticate(
        self,
        mechanism: AuthMechanism,
        username: &str,
        password: &str,
    ) -> Result<Client<Authenticated>> {
        debug!(%mechanism, "authenticating");
        match mechanism {
            AuthMechanism::Plain => self.auth_plain(username, password).await,
            AuthMechanism::Login => self.auth_login(username, password).await,
            AuthMechanism::CramMd5 => self.auth_cram_md5(username, password).await,
        }
    }

    /// Authenticates using PLAIN mechanism.
    ///
    /// # Errors
    ///
    /// Returns an error if authentication fails.
    pub async fn auth_plain(
        mut self,
        username: &str,
        password: &str,
    ) -> Result<Client<Authenticated>> {
        let cmd = Command::Auth {
            mechanism: AuthMechanism::Plain,
            initial_response: Some(auth::plain_response(username, password)),
        };

        let reply = self.send_command(cmd).await?;
        self.finish_auth(AuthMechanism::Plain, &reply)
    }

    /// Authenticates using LOGIN mechanism.
    ///
    /// # Errors
    ///
    /// Returns an error if authentication fails.
    pub async fn auth_login(
        mut self,
        username: &str,
        password: &str,
    ) -> Result<Client<Authenticated>> {
        let mechanism = AuthMechanism::Login;
        let cmd = Command::Auth {
            mechanism,
            initial_response: None,
        };
        let reply = self.send_command(cmd).await?;
        Self::expect_challenge(mechanism, &reply)?;

        let cmd = Command::AuthResponse(auth::login_response(username));
        let reply = self.send_command(cmd).await?;
        Self::expect_challenge(mechanism, &reply)?;

        let cmd = Command::AuthResponse(auth::login_response(password));
        let reply = self.send_command(cmd).await?;
        self.finish_auth(mechanism, &reply)
    }

    /// Authenticates using CRAM-MD5 mechanism.
    ///
    /// # Errors
    ///
    /// Returns an error if authentication fails.
    pub async fn auth_cram_md5(
        mut self,
        username: &str,
        password: &str,
    ) -> Result<Client<Authenticated>> {
        let mechanism = AuthMechanism::CramMd5;
        let cmd = Command::Auth {
            mechanism,
            initial_response: None,
        };
        let reply = self.send_command(cmd).await?;
        Self::expect_challenge(mechanism, &reply)?;

        let response = auth::cram_md5_response(username, password, reply.first_line())?;
        let reply = self.send_command(Command::AuthResponse(response)).await?;
        self.finish_auth(mechanism, &reply)
    }

    fn expect_challenge(mechanism: AuthMechanism, reply: &Reply) -> Result<()> {
        if reply.code == ReplyCode::AUTH_CONTINUE {
            Ok(())
        } else {
            Err(auth_error(mechanism, reply))
        }
    }

    fn finish_auth(self, mechanism: AuthMechanism, reply: &Reply) -> Result<Client<Authenticated>> {
        if !reply.is_success() {
            return Err(auth_error(mechanism, reply));
        }
        debug!(%mechanism, "authenticated");
        Ok(self.transition())
    }
}

impl<S: Ready> Client<S> {
    /// Starts a mail transaction.
    ///
    /// `size` is announced with the SIZE extension when the server offers it.
    ///
    /// # Errors
    ///
    /// Returns an error if the message exceeds the advertised limit or the
    /// MAIL FROM command fails.
    pub async fn mail_from(
        mut self,
        from: Address,
        size: Option<usize>,
    ) -> Result<Client<MailTransaction<S>>> {
        let size = match (size, self.server_info.max_message_size()) {
            (Some(size), Some(limit)) if limit > 0 && size > limit => {
                return Err(Error::MessageTooLarge(size));
            }
            (size, _) if self.server_info.supports_size() => size,
            _ => None,
        };

        let cmd = Command::MailFrom { from, size };
        self.send_command(cmd).await?.ensure_success()?;
        Ok(self.transition())
    }

    /// Resets any pending transaction state on the server (RSET).
    ///
    /// # Errors
    ///
    /// Returns an error if the RSET command fails.
    pub async fn reset(&mut self) -> Result<()> {
        self.abort().await
    }
}

impl<S: Ready> Client<MailTransaction<S>> {
    /// Adds a recipient to the transaction.
    ///
    /// # Errors
    ///
    /// Returns an error if the RCPT TO command fails.
    pub async fn rcpt_to(mut self, to: Address) -> Result<Client<RecipientAdded<S>>> {
        let cmd = Command::RcptTo { to };
        self.send_command(cmd).await?.ensure_success()?;
        Ok(self.transition())
    }

    /// Aborts the transaction and returns to the state it started from.
    ///
    /// # Errors
    ///
    /// Returns an error if the RSET command fails.
    pub async fn reset(mut self) -> Result<Client<S>> {
        self.abort().await?;
        Ok(self.transition())
    }
}

impl<S: Ready> Client<RecipientAdded<S>> {
    /// Adds another recipient to the transaction.
    ///
    /// # Errors
    ///
    /// Returns an error if the RCPT TO command fails.
    pub async fn rcpt_to(mut self, to: Address) -> Result<Self> {
        let cmd = Command::RcptTo { to };
        self.send_command(cmd).await?.ensure_success()?;
        Ok(self)
    }

    /// Begins sending message data.
    ///
    /// # Errors
    ///
    /// Returns an error if the DATA command fails.
    pub async fn data(mut self) -> Result<Client<Data<S>>> {
        self.send_command(Command::Data)
            .await?
            .ensure(ReplyCode::START_DATA)?;
        Ok(self.transition())
    }

    /// Aborts the transaction and returns to the state it started from.
    ///
    /// # Errors
    ///
    /// Returns an error if the RSET command fails.
    pub async fn reset(mut self) -> Result<Client<S>> {
        self.abort().await?;
        Ok(self.transition())
    }
}

impl<S: Ready> Client<Data<S>> {
    /// Sends the message content and completes the transaction.
    ///
    /// Message should be RFC 5322 formatted. Line endings are normalized to
    /// CRLF, leading dots are doubled, and the terminating "." line is added.
    ///
    /// # Errors
    ///
    /// Returns an error if sending the message fails or server rejects it.
    pub async fn send_message(mut self, message: &[u8]) -> Result<Client<S>> {
        let mut payload = dot_stuff(message);
        payload.extend_from_slice(b".\r\n");
        self.stream.write_all(&payload).await?;

        Self::read_reply(&mut self.stream).await?.ensure_success()?;

        debug!(bytes = payload.len(), "message accepted");
        Ok(self.transition())
    }
}

// Common implementation for all states
impl<S> Client<S> {
    fn transition<T>(self) -> Client<T> {
        Client {
            stream: self.stream,
            server_info: self.server_info,
            _state: PhantomData,
        }
    }

    async fn send_command(&mut self, cmd: Command) -> Result<Reply> {
        trace!(command = %cmd.redacted(), "C:");
        self.stream.write_all(&cmd.serialize()).await?;
        let reply = Self::read_reply(&mut self.stream).await?;
        trace!(%reply, "S:");
        Ok(reply)
    }

    async fn read_reply(stream: &mut SmtpStream) -> Result<Reply> {
        let mut parser = ReplyParser::new();
        loop {
            let line = stream.read_line().await?;
            if line.is_empty() {
                continue;
            }
            if let Some(reply) = parser.feed(&line)? {
                return Ok(reply);
            }
        }
    }

    async fn abort(&mut self) -> Result<()> {
        self.send_command(Command::Rset).await?.ensure_success()?;
        Ok(())
    }

    /// Returns true if the session runs over TLS.
    #[must_use]
    pub const fn is_tls(&self) -> bool {
        self.stream.is_tls()
    }

    /// Sends NOOP (available in any state). Keeps idle sessions alive.
    ///
    /// # Errors
    ///
    /// Returns an error if the NOOP command fails.
    pub async fn noop(&mut self) -> Result<()> {
        self.send_command(Command::Noop).await?.ensure_success()?;
        Ok(())
    }

    /// Sends QUIT and closes the connection (available in any state).
    ///
    /// # Errors
    ///
    /// Returns an error unless the server answers 221 (or another 2xx).
    pub async fn quit(mut self) -> Result<()> {
        self.send_command(Command::Quit).await?.ensure_success()?;
        Ok(())
    }
}

fn parse_extensions(reply: &Reply) -> HashSet<Extension> {
    // First line is the greeting, the rest are keywords.
    reply
        .lines
        .iter()
        .skip(1)
        .map(|line| Extension::parse(line))
        .collect()
}

fn auth_error(mechanism: AuthMechanism, reply: &Reply) -> Error {
    Error::Auth {
        mechanism,
        code: reply.code.as_u16(),
        message: reply.text(),
    }
}

/// Length of the message after [`dot_stuff`], as announced with `SIZE=`.
pub(super) fn stuffed_len(message: &[u8]) -> usize {
    let body = message.strip_suffix(b"\n").unwrap_or(message);
    body.split(|&b| b == b'\n')
        .map(|line| {
            let line = line.strip_suffix(b"\r").unwrap_or(line);
            line.len() + 2 + usize::from(line.first() == Some(&b'.'))
        })
        .sum()
}

/// Normalizes line endings to CRLF and doubles leading dots (RFC 5321 4.5.2).
fn dot_stuff(message: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(message.len() + message.len() / 32 + 2);
    let body = message.strip_suffix(b"\n").unwrap_or(message);

    for line in body.split(|&b| b == b'\n') {
        let line = line.strip_suffix(b"\r").unwrap_or(line);
        if line.first() == Some(&b'.') {
            out.push(b'.');
        }
        out.extend_from_slice(line);
        out.extend_from_slice(b"\r\n");
    }

    out
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::redundant_clone, clippy::manual_string_new, clippy::needless_collect, clippy::unreadable_literal, clippy::used_underscore_items, clippy::similar_names)]
mod tests {
    use super::*;

    #[test]
    fn test_dot_stuff_normalizes_line_endings() {
        assert_eq!(dot_stuff(b"a\nb\r\nc"), b"a\r\nb\r\nc\r\n");
    }

    #[test]
    fn test_dot_stuff_trailing_newline() {
        assert_eq!(dot_stuff(b"Subject: x\r\n\r\nbody\r\n"), b"Subject: x\r\n\r\nbody\r\n");
    }

    #[test]
    fn test_dot_stuff_leading_dots() {
        assert_eq!(dot_stuff(b".\r\n..x\r\nok"), b"..\r\n...x\r\nok\r\n");
    }

    #[test]
    fn test_stuffed_len_matches_payload() {
        for message in [
            &b"a\nb\r\nc"[..],
            b"Subject: x\r\n\r\nbody\r\n",
            b".\r\n..x\r\nok",
            b"",
        ] {
            assert_eq!(stuffed_len(message), dot_stuff(message).len());
        }
        assert_eq!(stuffed_len(b"a\n.b\n"), 8);
    }

    #[test]
    fn test_parse_extensions_skips_greeting() {
        let reply = Reply::new(
            ReplyCode::OK,
            vec![
                "mail.example.com Hello".to_string(),
                "STARTTLS".to_string(),
                "SIZE 1000".to_string(),
            ],
        );
        let extensions = parse_extensions(&reply);
        assert_eq!(extensions.len(), 2);
        assert!(extensions.contains(&Extension::StartTls));
        assert!(extensions.contains(&Extension::Size(Some(1000))));
    }
}
