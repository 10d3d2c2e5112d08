//! # mailsend-smtp
//!
//! An async SMTP client (RFC 5321) for sending mail over one long-lived
//! connection.
//!
//! ## Features
//!
//! - **Connection lifecycle**: [`SmtpClient`] connects, negotiates TLS,
//!   authenticates and sends, each phase bounded by a timeout
//! - **TLS support**: Both implicit TLS (port 465) and STARTTLS (port 587)
//! - **Authentication**: PLAIN, LOGIN, CRAM-MD5
//! - **Keep-alive**: several messages per connection, NOOP probes in between
//! - **Type-state protocol client**: compile-time enforcement of valid SMTP
//!   command order underneath [`SmtpClient`]
//!
//! ## Quick Start
//!
//! ```ignore
//! use mailsend_smtp::{Address, Encryption, Envelope, ServerConfig, SmtpClient};
//!
//! #[tokio::main]
//! async fn main() -> mailsend_smtp::Result<()> {
//!     let config = ServerConfig::builder("smtp.example.com")
//!         .encryption(Encryption::StartTls)
//!         .credentials("user@example.com", "password")
//!         .build();
//!
//!     let mut client = SmtpClient::connect(config).await?;
//!
//!     let envelope = Envelope::new(
//!         Address::new("sender@example.com")?,
//!         vec![Address::new("recipient@example.com")?],
//!     )?;
//!     client
//!         .send(&envelope, b"Subject: Test\r\n\r\nHello, World!\r\n")
//!         .await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Connection States
//!
//! The protocol client uses the type-state pattern. Transactions remember
//! the state they started from:
//!
//! ```text
//! Connected ── authenticate() ──→ Authenticated
//!     │                               │
//!     └──────────── mail_from() ──────┘
//!                       │
//!           MailTransaction<S> ── rcpt_to() ──→ RecipientAdded<S>
//!                                                   │
//!                         S ←── send_message() ── Data<S>
//! ```
//!
//! ## Modules
//!
//! - [`auth`]: SASL responses
//! - [`command`]: SMTP command builders
//! - [`connection`]: Configuration, type-state client and [`SmtpClient`]
//! - [`parser`]: Response parser
//! - [`types`]: Core SMTP types (addresses, extensions, replies)

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod auth;
pub mod command;
pub mod connection;
mod error;
pub mod parser;
pub mod types;

pub use connection::{
    Authenticated, Client, ConnectionState, Connected, Credentials, Data, Encryption,
    MailTransaction, RecipientAdded, ServerConfig, ServerConfigBuilder, ServerInfo, SmtpClient,
    SmtpConnection, TlsOptions,
};
pub use error::{Error, Result};
pub use types::{Address, AuthMechanism, Envelope, Extension, Reply, ReplyClass, ReplyCode};

/// SMTP protocol version supported.
pub const SMTP_VERSION: &str = "SMTP/ESMTP (RFC 5321)";
