//! # mailsend
//!
//! Compose email with [`Email`] and deliver it through a long-lived
//! [`SmtpClient`].
//!
//! This crate ties the two building blocks together:
//! - [`mailsend_mime`]: the sticky-error message builder
//! - [`mailsend_smtp`]: connection lifecycle, TLS, authentication, keep-alive
//!
//! and adds a JSON [`Settings`] file format for server configuration.
//!
//! ## Quick Start
//!
//! ```ignore
//! use mailsend::{ContentType, Email, Settings, SmtpClient, send_email};
//!
//! #[tokio::main]
//! async fn main() -> mailsend::Result<()> {
//!     let settings = Settings::load("smtp.json")?;
//!     let mut client = SmtpClient::connect(settings.server_config()?).await?;
//!
//!     let mut email = Email::new();
//!     email
//!         .set_from("From Example <nube@example.com>")
//!         .add_to("xhit@example.com")
//!         .set_subject("New Go Email")
//!         .set_body(ContentType::text_html(), "<h1>Hello Gophers!</h1>");
//!
//!     send_email(&mut client, &email).await?;
//!     client.quit().await?;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod error;
pub mod service;
pub mod settings;

pub use error::{Error, Result};
pub use service::{envelope_for, send_email};
pub use settings::Settings;

pub use mailsend_mime::{Attachment, ContentType, Email, Priority, WireMessage};
pub use mailsend_smtp::{
    AuthMechanism, ConnectionState, Encryption, ServerConfig, SmtpClient,
};

pub use mailsend_mime;
pub use mailsend_smtp;
