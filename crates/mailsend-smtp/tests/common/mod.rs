//! Scripted SMTP server for integration tests.
#![allow(dead_code)] // Not every suite uses every knob.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use rustls::pki_types::{CertificateDer, PrivateKeyDer, PrivatePkcs8KeyDer};
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::RwLock;
use tokio_rustls::TlsAcceptor;

/// Challenge sent for `AUTH CRAM-MD5`.
pub const CRAM_CHALLENGE: &str = "<1896.697170952@mock.test>";

/// One message accepted by the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Received {
    /// Reverse-path from `MAIL FROM`.
    pub from: String,
    /// Forward-paths from `RCPT TO`.
    pub recipients: Vec<String>,
    /// Message content with dot stuffing removed, CRLF line endings.
    pub data: String,
    /// Whether the message arrived over TLS.
    pub tls: bool,
}

/// How the server offers TLS.
#[derive(Clone, Default)]
enum TlsMode {
    #[default]
    Off,
    StartTls(TlsAcceptor),
    Implicit(TlsAcceptor),
}

#[derive(Clone)]
struct Script {
    extensions: Vec<String>,
    reject_ehlo: bool,
    username: String,
    password: String,
    reject_recipients: Vec<String>,
    silent: bool,
    tls: TlsMode,
}

impl Default for Script {
    fn default() -> Self {
        Self {
            extensions: vec![
                "SIZE 10240000".into(),
                "8BITMIME".into(),
                "AUTH PLAIN LOGIN CRAM-MD5".into(),
            ],
            reject_ehlo: false,
            username: "user@example.com".into(),
            password: "secret".into(),
            reject_recipients: Vec::new(),
            silent: false,
            tls: TlsMode::Off,
        }
    }
}

/// Builder for [`MockSmtpServer`].
#[derive(Default)]
pub struct MockSmtpServerBuilder {
    script: Script,
}

impl MockSmtpServerBuilder {
    /// Replaces the EHLO keyword lines.
    pub fn extensions(mut self, extensions: &[&str]) -> Self {
        self.script.extensions = extensions.iter().map(ToString::to_string).collect();
        self
    }

    /// Answers EHLO with 502 so clients must fall back to HELO.
    pub const fn reject_ehlo(mut self) -> Self {
        self.script.reject_ehlo = true;
        self
    }

    /// Sets the accepted credentials.
    pub fn credentials(mut self, username: &str, password: &str) -> Self {
        self.script.username = username.into();
        self.script.password = password.into();
        self
    }

    /// Answers `RCPT TO` for this address with 550.
    pub fn reject_recipient(mut self, address: &str) -> Self {
        self.script.reject_recipients.push(address.into());
        self
    }

    /// Accepts connections but never writes anything.
    pub const fn silent(mut self) -> Self {
        self.script.silent = true;
        self
    }

    /// Offers STARTTLS with a self-signed certificate.
    pub fn starttls(mut self) -> Self {
        self.script.tls = TlsMode::StartTls(self_signed_acceptor());
        self
    }

    /// Speaks TLS from the first byte, with a self-signed certificate.
    pub fn implicit_tls(mut self) -> Self {
        self.script.tls = TlsMode::Implicit(self_signed_acceptor());
        self
    }

    /// Binds to an ephemeral port and starts serving.
    pub async fn start(self) -> MockSmtpServer {
        init_tracing();
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = MockSmtpServer {
            addr,
            transcript: Arc::default(),
            received: Arc::default(),
            connections: Arc::default(),
        };

        let script = Arc::new(self.script);
        let transcript = Arc::clone(&server.transcript);
        let received = Arc::clone(&server.received);
        let connections = Arc::clone(&server.connections);
        tokio::spawn(async move {
            while let Ok((socket, _)) = listener.accept().await {
                *connections.write().await += 1;
                let script = Arc::clone(&script);
                let transcript = Arc::clone(&transcript);
                let received = Arc::clone(&received);
                tokio::spawn(async move {
                    let _ = handle(socket, &script, &transcript, &received).await;
                });
            }
        });

        server
    }
}

/// Running mock server.
#[derive(Debug)]
pub struct MockSmtpServer {
    addr: SocketAddr,
    transcript: Arc<RwLock<Vec<String>>>,
    received: Arc<RwLock<Vec<Received>>>,
    connections: Arc<RwLock<usize>>,
}

impl MockSmtpServer {
    /// Starts configuring a server.
    pub fn builder() -> MockSmtpServerBuilder {
        MockSmtpServerBuilder::default()
    }

    /// Starts a server with the default script.
    pub async fn start() -> Self {
        Self::builder().start().await
    }

    /// Listening port.
    pub const fn port(&self) -> u16 {
        self.addr.port()
    }

    /// Every command line received, in order, across all connections.
    pub async fn transcript(&self) -> Vec<String> {
        self.transcript.read().await.clone()
    }

    /// Command verbs received, in order (`EHLO`, `MAIL`, ...).
    pub async fn verbs(&self) -> Vec<String> {
        self.transcript
            .read()
            .await
            .iter()
            .map(|line| {
                line.split_whitespace()
                    .next()
                    .unwrap_or_default()
                    .to_ascii_uppercase()
            })
            .collect()
    }

    /// Messages accepted so far.
    pub async fn received(&self) -> Vec<Received> {
        self.received.read().await.clone()
    }

    /// Number of accepted TCP connections.
    pub async fn connections(&self) -> usize {
        *self.connections.read().await
    }
}

trait Io: AsyncRead + AsyncWrite + Unpin + Send {}
impl<T: AsyncRead + AsyncWrite + Unpin + Send> Io for T {}

/// Server side of one connection, plain or TLS.
struct Conn {
    stream: BufReader<Box<dyn Io>>,
}

impl Conn {
    fn new(stream: Box<dyn Io>) -> Self {
        Self {
            stream: BufReader::new(stream),
        }
    }

    async fn line(&mut self) -> std::io::Result<Option<String>> {
        let mut line = String::new();
        if self.stream.read_line(&mut line).await? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
    }

    async fn reply(&mut self, text: &str) -> std::io::Result<()> {
        let writer = self.stream.get_mut();
        writer.write_all(text.as_bytes()).await?;
        writer.write_all(b"\r\n").await?;
        writer.flush().await
    }

    async fn upgrade(self, acceptor: &TlsAcceptor) -> std::io::Result<Self> {
        let tls = acceptor.accept(self.stream.into_inner()).await?;
        Ok(Self::new(Box::new(tls)))
    }
}

#[allow(clippy::too_many_lines)]
async fn handle(
    socket: TcpStream,
    script: &Script,
    transcript: &RwLock<Vec<String>>,
    received: &RwLock<Vec<Received>>,
) -> std::io::Result<()> {
    if script.silent {
        let mut socket = socket;
        let mut sink = Vec::new();
        // Hold the connection open until the client goes away.
        let _ = tokio::io::AsyncReadExt::read_to_end(&mut socket, &mut sink).await;
        return Ok(());
    }

    let mut conn = Conn::new(Box::new(socket));
    let mut secure = false;
    if let TlsMode::Implicit(acceptor) = &script.tls {
        conn = conn.upgrade(acceptor).await?;
        secure = true;
    }
    conn.reply("220 mock.test ESMTP ready").await?;

    let mut from = None;
    let mut recipients = Vec::new();

    while let Some(line) = conn.line().await? {
        transcript.write().await.push(line.clone());
        let upper = line.to_ascii_uppercase();
        let verb = upper.split_whitespace().next().unwrap_or_default().to_string();

        match verb.as_str() {
            "EHLO" if script.reject_ehlo => conn.reply("502 5.5.1 EHLO not implemented").await?,
            "EHLO" => {
                let mut extensions = script.extensions.clone();
                if matches!(script.tls, TlsMode::StartTls(_)) && !secure {
                    extensions.insert(0, "STARTTLS".into());
                }
                let mut text = String::from("250-mock.test greets you");
                for (i, ext) in extensions.iter().enumerate() {
                    let sep = if i + 1 == extensions.len() { ' ' } else { '-' };
                    text.push_str(&format!("\r\n250{sep}{ext}"));
                }
                if extensions.is_empty() {
                    text = "250 mock.test greets you".into();
                }
                conn.reply(&text).await?;
            }
            "HELO" => conn.reply("250 mock.test").await?,
            "STARTTLS" => match &script.tls {
                TlsMode::StartTls(acceptor) if !secure => {
                    conn.reply("220 2.0.0 Ready to start TLS").await?;
                    conn = conn.upgrade(acceptor).await?;
                    secure = true;
                    from = None;
                    recipients.clear();
                }
                _ => conn.reply("454 4.7.0 TLS not available").await?,
            },
            "AUTH" => {
                let parts: Vec<&str> = line.split_whitespace().collect();
                let mechanism = parts.get(1).map(|m| m.to_ascii_uppercase()).unwrap_or_default();
                let ok = match mechanism.as_str() {
                    "PLAIN" => {
                        let expected = format!("\0{}\0{}", script.username, script.password);
                        parts.get(2).and_then(|r| STANDARD.decode(r).ok())
                            == Some(expected.into_bytes())
                    }
                    "LOGIN" => {
                        conn.reply("334 VXNlcm5hbWU6").await?;
                        let user = conn.line().await?.unwrap_or_default();
                        conn.reply("334 UGFzc3dvcmQ6").await?;
                        let pass = conn.line().await?.unwrap_or_default();
                        decode(&user) == script.username && decode(&pass) == script.password
                    }
                    "CRAM-MD5" => {
                        conn.reply(&format!("334 {}", STANDARD.encode(CRAM_CHALLENGE)))
                            .await?;
                        let answer = decode(&conn.line().await?.unwrap_or_default());
                        let digest = mailsend_smtp::auth::cram_md5_digest(
                            &script.password,
                            CRAM_CHALLENGE.as_bytes(),
                        )
                        .unwrap();
                        answer == format!("{} {digest}", script.username)
                    }
                    _ => false,
                };
                if ok {
                    conn.reply("235 2.7.0 Authentication successful").await?;
                } else {
                    conn.reply("535 5.7.8 Authentication credentials invalid").await?;
                }
            }
            "MAIL" => {
                from = Some(path(&line));
                recipients.clear();
                conn.reply("250 2.1.0 OK").await?;
            }
            "RCPT" => {
                let to = path(&line);
                if script.reject_recipients.contains(&to) {
                    conn.reply("550 5.1.1 No such user").await?;
                } else {
                    recipients.push(to);
                    conn.reply("250 2.1.5 OK").await?;
                }
            }
            "DATA" => {
                conn.reply("354 End data with <CR><LF>.<CR><LF>").await?;
                let mut data = String::new();
                while let Some(line) = conn.line().await? {
                    if line == "." {
                        break;
                    }
                    let line = line.strip_prefix('.').unwrap_or(&line);
                    data.push_str(line);
                    data.push_str("\r\n");
                }
                received.write().await.push(Received {
                    from: from.take().unwrap_or_default(),
                    recipients: std::mem::take(&mut recipients),
                    data,
                    tls: secure,
                });
                conn.reply("250 2.0.0 Queued").await?;
            }
            "RSET" => {
                from = None;
                recipients.clear();
                conn.reply("250 2.0.0 OK").await?;
            }
            "NOOP" => conn.reply("250 2.0.0 OK").await?,
            "QUIT" => {
                conn.reply("221 2.0.0 Bye").await?;
                break;
            }
            _ => conn.reply("500 5.5.2 Command unrecognized").await?,
        }
    }

    Ok(())
}

/// TLS acceptor with a fresh self-signed certificate for `localhost`.
fn self_signed_acceptor() -> TlsAcceptor {
    let cert = rcgen::generate_simple_self_signed(vec!["localhost".to_string()]).unwrap();
    let key = PrivateKeyDer::Pkcs8(PrivatePkcs8KeyDer::from(cert.serialize_private_key_der()));
    let cert = CertificateDer::from(cert.serialize_der().unwrap());

    let config = rustls::ServerConfig::builder()
        .with_no_client_auth()
        .with_single_cert(vec![cert], key)
        .unwrap();
    TlsAcceptor::from(Arc::new(config))
}

/// Sends library logs to the test output, filtered by `RUST_LOG`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn decode(value: &str) -> String {
    STANDARD
        .decode(value.trim())
        .ok()
        .and_then(|bytes| String::from_utf8(bytes).ok())
        .unwrap_or_default()
}

/// Extracts the address between `<` and `>`.
fn path(line: &str) -> String {
    line.split_once('<')
        .and_then(|(_, rest)| rest.split_once('>'))
        .map(|(addr, _)| addr.to_string())
        .unwrap_or_default()
}

/// Waits briefly so the server task can record what it saw.
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(50)).await;
}
