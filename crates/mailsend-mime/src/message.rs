//! Message builder.
//!
//! [`Email`] collects headers, bodies and attachments and renders them
//! into a [`WireMessage`]. Every setter validates its input. The first
//! failure is kept and turns all later setters into no-ops, so a chain of
//! calls can be checked once at the end:
//!
//! ```ignore
//! let mut email = Email::new();
//! email
//!     .set_from("From Example <nube@example.com>")
//!     .add_to("xhit@example.com")
//!     .set_subject("New Go Email")
//!     .set_body(ContentType::text_html(), "<h1>Hello</h1>");
//!
//! if let Some(err) = email.error() {
//!     eprintln!("invalid message: {err}");
//! }
//! let wire = email.build()?;
//! ```

use chrono::{DateTime, FixedOffset, Local, TimeZone};
use rand::Rng;
use rand::distributions::Alphanumeric;

use crate::address::Mailbox;
use crate::attachment::{Attachment, Resolved};
use crate::content_type::ContentType;
use crate::date::{format_date, parse_date};
use crate::error::{Error, Result};
use crate::header::Headers;
use crate::part::Part;

/// Header names the builder writes itself.
const MANAGED_HEADERS: &[&str] = &[
    "Date",
    "From",
    "Sender",
    "Reply-To",
    "Return-Path",
    "To",
    "Cc",
    "Bcc",
    "Subject",
    "Message-ID",
    "X-Priority",
    "Importance",
    "MIME-Version",
    "Content-Type",
    "Content-Transfer-Encoding",
    "Content-Disposition",
];

/// Message priority, written as `X-Priority` and `Importance`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Priority {
    /// Low priority.
    Low,
    /// No priority headers.
    #[default]
    Normal,
    /// High priority.
    High,
}

impl Priority {
    /// `X-Priority` header value, if any.
    #[must_use]
    pub const fn x_priority(self) -> Option<&'static str> {
        match self {
            Self::High => Some("1 (Highest)"),
            Self::Normal => None,
            Self::Low => Some("5 (Lowest)"),
        }
    }

    /// `Importance` header value, if any.
    #[must_use]
    pub const fn importance(self) -> Option<&'static str> {
        match self {
            Self::High => Some("High"),
            Self::Normal => None,
            Self::Low => Some("Low"),
        }
    }
}

/// A text body or alternative.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Body {
    content_type: ContentType,
    text: String,
}

impl Body {
    /// Content type (always `text/*`).
    #[must_use]
    pub const fn content_type(&self) -> &ContentType {
        &self.content_type
    }

    /// Body text.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }
}

/// Rendered message ready for SMTP.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WireMessage {
    sender: String,
    recipients: Vec<String>,
    message_id: String,
    data: Vec<u8>,
}

impl WireMessage {
    /// Envelope sender (`MAIL FROM`): Return-Path if set, else From.
    #[must_use]
    pub fn sender(&self) -> &str {
        &self.sender
    }

    /// Envelope recipients (`RCPT TO`): To, Cc and Bcc without duplicates.
    #[must_use]
    pub fn recipients(&self) -> &[String] {
        &self.recipients
    }

    /// The generated `Message-ID` header value.
    #[must_use]
    pub fn message_id(&self) -> &str {
        &self.message_id
    }

    /// RFC 5322 message bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Consumes the message, returning its bytes.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }
}

/// Email message builder with sticky error handling.
#[derive(Debug, Clone, Default)]
pub struct Email {
    from: Option<Mailbox>,
    sender: Option<Mailbox>,
    reply_to: Option<Mailbox>,
    return_path: Option<Mailbox>,
    to: Vec<Mailbox>,
    cc: Vec<Mailbox>,
    bcc: Vec<Mailbox>,
    subject: String,
    body: Option<Body>,
    alternatives: Vec<Body>,
    attachments: Vec<Resolved>,
    priority: Priority,
    date: Option<DateTime<FixedOffset>>,
    headers: Headers,
    error: Option<Error>,
}

impl Email {
    /// Creates an empty message.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs `op` unless an earlier call failed, recording its error.
    fn apply(&mut self, op: impl FnOnce(&mut Self) -> Result<()>) -> &mut Self {
        if self.error.is_none() {
            if let Err(err) = op(self) {
                self.error = Some(err);
            }
        }
        self
    }

    /// Sets the From mailbox (`addr` or `Name <addr>`).
    pub fn set_from(&mut self, from: &str) -> &mut Self {
        self.apply(|email| {
            email.from = Some(Mailbox::parse(from)?);
            Ok(())
        })
    }

    /// Sets the Sender mailbox.
    pub fn set_sender(&mut self, sender: &str) -> &mut Self {
        self.apply(|email| {
            email.sender = Some(Mailbox::parse(sender)?);
            Ok(())
        })
    }

    /// Sets the Reply-To mailbox.
    pub fn set_reply_to(&mut self, reply_to: &str) -> &mut Self {
        self.apply(|email| {
            email.reply_to = Some(Mailbox::parse(reply_to)?);
            Ok(())
        })
    }

    /// Sets the Return-Path mailbox, which also becomes the envelope sender.
    pub fn set_return_path(&mut self, return_path: &str) -> &mut Self {
        self.apply(|email| {
            email.return_path = Some(Mailbox::parse(return_path)?);
            Ok(())
        })
    }

    /// Adds a To recipient. Repeated addresses are ignored.
    pub fn add_to(&mut self, address: &str) -> &mut Self {
        self.apply(|email| push_unique(&mut email.to, Mailbox::parse(address)?))
    }

    /// Adds a Cc recipient. Repeated addresses are ignored.
    pub fn add_cc(&mut self, address: &str) -> &mut Self {
        self.apply(|email| push_unique(&mut email.cc, Mailbox::parse(address)?))
    }

    /// Adds a Bcc recipient. Bcc addresses reach the envelope only and
    /// never appear in the headers.
    pub fn add_bcc(&mut self, address: &str) -> &mut Self {
        self.apply(|email| push_unique(&mut email.bcc, Mailbox::parse(address)?))
    }

    /// Sets the subject.
    pub fn set_subject(&mut self, subject: &str) -> &mut Self {
        self.apply(|email| {
            if subject.contains(['\r', '\n']) {
                return Err(Error::InvalidHeader(
                    "Subject contains a line break".to_string(),
                ));
            }
            email.subject = subject.to_string();
            Ok(())
        })
    }

    /// Sets the main body. `content_type` must be `text/*`.
    pub fn set_body(&mut self, content_type: ContentType, text: &str) -> &mut Self {
        self.apply(|email| {
            email.body = Some(text_body(content_type, text)?);
            Ok(())
        })
    }

    /// Adds an alternative rendering of the body (e.g. plain text next to HTML).
    ///
    /// Alternatives are written before the main body, which stays the
    /// preferred rendering.
    pub fn add_alternative(&mut self, content_type: ContentType, text: &str) -> &mut Self {
        self.apply(|email| {
            email.alternatives.push(text_body(content_type, text)?);
            Ok(())
        })
    }

    /// Sets the Date header from text.
    ///
    /// Accepts RFC 2822, RFC 3339 or `YYYY-MM-DD HH:MM:SS ZONE`.
    pub fn set_date(&mut self, date: &str) -> &mut Self {
        self.apply(|email| {
            email.date = Some(parse_date(date)?);
            Ok(())
        })
    }

    /// Sets the Date header.
    pub fn set_date_time<Tz: TimeZone>(&mut self, date: &DateTime<Tz>) -> &mut Self {
        self.apply(|email| {
            email.date = Some(date.fixed_offset());
            Ok(())
        })
    }

    /// Sets the priority.
    pub fn set_priority(&mut self, priority: Priority) -> &mut Self {
        self.apply(|email| {
            email.priority = priority;
            Ok(())
        })
    }

    /// Adds an attachment, reading or decoding its source now.
    pub fn attach(&mut self, attachment: Attachment) -> &mut Self {
        self.apply(|email| {
            email.attachments.push(attachment.resolve()?);
            Ok(())
        })
    }

    /// Adds a custom header. Headers the builder manages are rejected.
    pub fn add_header(&mut self, name: &str, value: &str) -> &mut Self {
        self.apply(|email| {
            if MANAGED_HEADERS.iter().any(|h| h.eq_ignore_ascii_case(name)) {
                return Err(Error::InvalidHeader(format!(
                    "{name} is set by the message builder"
                )));
            }
            email.headers.add(name, value)
        })
    }

    /// Returns the first error recorded by a setter, without clearing it.
    #[must_use]
    pub const fn error(&self) -> Option<&Error> {
        self.error.as_ref()
    }

    /// Returns the From mailbox.
    #[must_use]
    pub const fn from(&self) -> Option<&Mailbox> {
        self.from.as_ref()
    }

    /// Returns the To recipients.
    #[must_use]
    pub fn to(&self) -> &[Mailbox] {
        &self.to
    }

    /// Returns the Cc recipients.
    #[must_use]
    pub fn cc(&self) -> &[Mailbox] {
        &self.cc
    }

    /// Returns the Bcc recipients.
    #[must_use]
    pub fn bcc(&self) -> &[Mailbox] {
        &self.bcc
    }

    /// Returns the subject.
    #[must_use]
    pub fn subject(&self) -> &str {
        &self.subject
    }

    /// Returns the main body, if set.
    #[must_use]
    pub const fn body(&self) -> Option<&Body> {
        self.body.as_ref()
    }

    /// Returns the priority.
    #[must_use]
    pub const fn priority(&self) -> Priority {
        self.priority
    }

    /// Envelope recipients: To, then Cc, then Bcc, without duplicates.
    #[must_use]
    pub fn recipients(&self) -> Vec<&Mailbox> {
        let mut recipients: Vec<&Mailbox> = Vec::new();
        for mailbox in self.to.iter().chain(&self.cc).chain(&self.bcc) {
            if !recipients.iter().any(|r| r.same_address(mailbox)) {
                recipients.push(mailbox);
            }
        }
        recipients
    }

    /// Renders the message.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Poisoned`] carrying the first setter error,
    /// [`Error::MissingSender`] without From, or [`Error::MissingRecipient`]
    /// without any To, Cc or Bcc.
    pub fn build(&self) -> Result<WireMessage> {
        if let Some(err) = &self.error {
            return Err(Error::Poisoned(Box::new(err.clone())));
        }
        let from = self.from.as_ref().ok_or(Error::MissingSender)?;
        let recipients = self.recipients();
        if recipients.is_empty() {
            return Err(Error::MissingRecipient);
        }

        let date = self
            .date
            .unwrap_or_else(|| Local::now().fixed_offset());
        let message_id = generate_message_id(from.domain());

        let mut headers = Headers::new();
        headers.push_raw("Date", format_date(&date));
        headers.push_raw("From", from.to_string());
        if let Some(sender) = &self.sender {
            headers.push_raw("Sender", sender.to_string());
        }
        if let Some(reply_to) = &self.reply_to {
            headers.push_raw("Reply-To", reply_to.to_string());
        }
        if let Some(return_path) = &self.return_path {
            headers.push_raw("Return-Path", format!("<{}>", return_path.address()));
        }
        if !self.to.is_empty() {
            headers.push_raw("To", join_mailboxes(&self.to));
        }
        if !self.cc.is_empty() {
            headers.push_raw("Cc", join_mailboxes(&self.cc));
        }
        headers.push_raw("Subject", Headers::encode_value(&self.subject));
        headers.push_raw("Message-ID", message_id.clone());
        if let (Some(x_priority), Some(importance)) =
            (self.priority.x_priority(), self.priority.importance())
        {
            headers.push_raw("X-Priority", x_priority.to_string());
            headers.push_raw("Importance", importance.to_string());
        }
        for (name, value) in self.headers.iter() {
            headers.push_raw(name, Headers::encode_value(value));
        }
        headers.push_raw("MIME-Version", "1.0".to_string());

        let mut data = headers.to_string();
        self.body_tree().write_to(&mut data);

        let sender = self.return_path.as_ref().unwrap_or(from);
        Ok(WireMessage {
            sender: sender.address().to_string(),
            recipients: recipients
                .iter()
                .map(|r| r.address().to_string())
                .collect(),
            message_id,
            data: data.into_bytes(),
        })
    }

    /// `mixed` wraps `related` wraps `alternative`, each only when needed.
    fn body_tree(&self) -> Part {
        // Receivers prefer the last alternative, so the main body goes last.
        let mut bodies: Vec<Part> = self
            .alternatives
            .iter()
            .chain(&self.body)
            .map(|body| Part::text(&body.content_type, &body.text))
            .collect();

        let mut root = if bodies.len() > 1 {
            Part::multipart("alternative", bodies)
        } else {
            bodies
                .pop()
                .unwrap_or_else(|| Part::text(&ContentType::text_plain(), ""))
        };

        let (inline, regular): (Vec<&Resolved>, Vec<&Resolved>) =
            self.attachments.iter().partition(|a| a.inline);

        if !inline.is_empty() {
            let mut parts = vec![root];
            parts.extend(inline.into_iter().map(Part::attachment));
            root = Part::multipart("related", parts);
        }
        if !regular.is_empty() {
            let mut parts = vec![root];
            parts.extend(regular.into_iter().map(Part::attachment));
            root = Part::multipart("mixed", parts);
        }

        root
    }
}

fn push_unique(list: &mut Vec<Mailbox>, mailbox: Mailbox) -> Result<()> {
    if !list.iter().any(|m| m.same_address(&mailbox)) {
        list.push(mailbox);
    }
    Ok(())
}

fn text_body(content_type: ContentType, text: &str) -> Result<Body> {
    if !content_type.is_text() {
        return Err(Error::InvalidContentType(format!(
            "Body must be text/*, got {}",
            content_type.essence()
        )));
    }
    Ok(Body {
        content_type,
        text: text.to_string(),
    })
}

fn join_mailboxes(mailboxes: &[Mailbox]) -> String {
    mailboxes
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

fn generate_message_id(domain: &str) -> String {
    let id: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(24)
        .map(char::from)
        .collect();
    let timestamp = Local::now().timestamp();
    format!("<{timestamp}.{id}@{domain}>")
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

    fn header_block(wire: &WireMessage) -> String {
        let text = String::from_utf8(wire.as_bytes().to_vec()).unwrap();
        text.split("\r\n\r\n").next().unwrap().to_string()
    }

    fn header_names(wire: &WireMessage) -> Vec<String> {
        header_block(wire)
            .split("\r\n")
            .filter(|line| !line.starts_with(' '))
            .filter_map(|line| line.split_once(':').map(|(name, _)| name.to_string()))
            .collect()
    }

    fn basic() -> Email {
        let mut email = Email::new();
        email
            .set_from("From Example <nube@example.com>")
            .add_to("xhit@example.com")
            .set_subject("Hello")
            .set_body(ContentType::text_plain(), "Hi there");
        email
    }

    #[test]
    fn test_header_order() {
        let mut email = basic();
        email
            .set_sender("Sender <sender@example.com>")
            .set_reply_to("reply@example.com")
            .set_return_path("bounce@example.com")
            .add_cc("cc@example.com")
            .set_priority(Priority::High)
            .add_header("X-Campaign", "spring");

        let wire = email.build().unwrap();
        assert_eq!(
            header_names(&wire),
            [
                "Date",
                "From",
                "Sender",
                "Reply-To",
                "Return-Path",
                "To",
                "Cc",
                "Subject",
                "Message-ID",
                "X-Priority",
                "Importance",
                "X-Campaign",
                "MIME-Version",
                "Content-Type",
                "Content-Transfer-Encoding",
            ]
        );
    }

    #[test]
    fn test_single_part_body() {
        let wire = basic().build().unwrap();
        let text = String::from_utf8(wire.into_bytes()).unwrap();
        assert!(text.contains("Content-Type: text/plain; charset=utf-8\r\n"));
        assert!(text.contains("\r\n\r\nHi there\r\n"));
        assert!(!text.contains("multipart"));
    }

    #[test]
    fn test_priority_headers() {
        let block = header_block(&basic().build().unwrap());
        assert!(!block.contains("X-Priority"));

        let mut email = basic();
        email.set_priority(Priority::Low);
        let block = header_block(&email.build().unwrap());
        assert!(block.contains("X-Priority: 5 (Lowest)"));
        assert!(block.contains("Importance: Low"));
    }

    #[test]
    fn test_envelope_sender_prefers_return_path() {
        assert_eq!(basic().build().unwrap().sender(), "nube@example.com");

        let mut email = basic();
        email.set_return_path("bounce@example.com");
        assert_eq!(email.build().unwrap().sender(), "bounce@example.com");
    }

    #[test]
    fn test_recipients_deduplicated_across_lists() {
        let mut email = basic();
        email
            .add_to("XHIT@example.com")
            .add_cc("cc@example.com")
            .add_bcc("xhit@example.com")
            .add_bcc("hidden@example.com");

        assert_eq!(email.to().len(), 1);
        let wire = email.build().unwrap();
        assert_eq!(
            wire.recipients(),
            ["xhit@example.com", "cc@example.com", "hidden@example.com"]
        );
    }

    #[test]
    fn test_sticky_error_keeps_first_failure() {
        let mut email = Email::new();
        email
            .set_from("not an address")
            .set_date("garbage")
            .add_to("ok@example.com");

        assert!(matches!(email.error(), Some(Error::InvalidAddress(_))));
        // Later setters were skipped.
        assert!(email.to().is_empty());
        assert!(matches!(
            email.build(),
            Err(Error::Poisoned(inner)) if matches!(*inner, Error::InvalidAddress(_))
        ));
        // Inspecting does not clear.
        assert!(email.error().is_some());
    }

    #[test]
    fn test_missing_sender_and_recipient() {
        let mut email = Email::new();
        email.add_to("a@example.com");
        assert_eq!(email.build().unwrap_err(), Error::MissingSender);

        let mut email = Email::new();
        email.set_from("a@example.com");
        assert_eq!(email.build().unwrap_err(), Error::MissingRecipient);
    }

    #[test]
    fn test_body_must_be_text() {
        let mut email = basic();
        email.set_body(ContentType::new("image", "png"), "x");
        assert!(matches!(email.error(), Some(Error::InvalidContentType(_))));
    }

    #[test]
    fn test_managed_and_invalid_custom_headers() {
        let mut email = basic();
        email.add_header("Bcc", "spy@example.com");
        assert!(matches!(email.error(), Some(Error::InvalidHeader(_))));

        let mut email = basic();
        email.add_header("X-Test", "a\r\nBcc: spy@example.com");
        assert!(matches!(email.error(), Some(Error::InvalidHeader(_))));
    }

    #[test]
    fn test_subject_injection_rejected() {
        let mut email = basic();
        email.set_subject("hi\r\nBcc: spy@example.com");
        assert!(matches!(email.error(), Some(Error::InvalidHeader(_))));
    }

    #[test]
    fn test_non_ascii_subject_encoded() {
        let mut email = basic();
        email.set_subject("Grüße");
        let block = header_block(&email.build().unwrap());
        assert!(block.contains("Subject: =?utf-8?B?"));
        assert!(block.is_ascii());
    }

    #[test]
    fn test_message_id_uses_sender_domain() {
        let wire = basic().build().unwrap();
        assert!(wire.message_id().starts_with('<'));
        assert!(wire.message_id().ends_with("@example.com>"));
    }
}
