//! # mailsend-mime
//!
//! RFC 5322 / MIME message builder for outgoing email.
//!
//! ## Features
//!
//! - **Sticky errors**: setters never fail individually; the first invalid
//!   input is kept and reported by [`Email::error`] and [`Email::build`]
//! - **Bodies**: plain text, HTML and alternatives (`multipart/alternative`)
//! - **Attachments**: files, base64 data or bytes; inline parts with
//!   `Content-ID` (`multipart/related`)
//! - **Encoding**: Base64, Quoted-Printable, RFC 2047 header encoding
//! - **Envelope**: Bcc recipients reach the envelope only
//!
//! ## Quick Start
//!
//! ```ignore
//! use mailsend_mime::{Attachment, ContentType, Email, Priority};
//!
//! let mut email = Email::new();
//! email
//!     .set_from("From Example <nube@example.com>")
//!     .add_to("xhit@example.com")
//!     .add_bcc("archive@example.com")
//!     .set_subject("New Go Email")
//!     .set_priority(Priority::High)
//!     .set_body(ContentType::text_html(), "<h1>Hello</h1>")
//!     .add_alternative(ContentType::text_plain(), "Hello")
//!     .attach(Attachment::from_base64("filename", "Zm9v"));
//!
//! let wire = email.build()?;
//! println!("MAIL FROM:<{}>", wire.sender());
//! for rcpt in wire.recipients() {
//!     println!("RCPT TO:<{rcpt}>");
//! }
//! ```
//!
//! ## Message Structure
//!
//! ```text
//! multipart/mixed            (regular attachments)
//! └── multipart/related      (inline attachments)
//!     └── multipart/alternative  (body + alternatives)
//! ```
//!
//! Each level is only emitted when it has something to wrap.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod address;
mod attachment;
mod content_type;
mod date;
pub mod encoding;
mod error;
mod header;
mod message;
mod part;

pub use address::Mailbox;
pub use attachment::Attachment;
pub use content_type::ContentType;
pub use date::{format_date, parse_date};
pub use error::{Error, Result};
pub use header::Headers;
pub use message::{Body, Email, Priority, WireMessage};
pub use part::{Part, TransferEncoding};
