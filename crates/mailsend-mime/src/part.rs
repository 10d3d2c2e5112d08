//! MIME entity tree and its wire rendering.

use rand::Rng;
use rand::distributions::Alphanumeric;
use std::fmt;

use crate::attachment::Resolved;
use crate::content_type::ContentType;
use crate::encoding::{encode_base64_wrapped, encode_quoted_printable, encode_rfc2047};
use crate::header::Headers;

/// Transfer encoding types used for generated parts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferEncoding {
    /// 7-bit ASCII (multipart containers).
    SevenBit,
    /// Base64 encoding (attachments).
    Base64,
    /// Quoted-Printable encoding (text bodies).
    QuotedPrintable,
}

impl fmt::Display for TransferEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SevenBit => write!(f, "7bit"),
            Self::Base64 => write!(f, "base64"),
            Self::QuotedPrintable => write!(f, "quoted-printable"),
        }
    }
}

#[derive(Debug, Clone)]
enum Content {
    /// Already transfer-encoded body.
    Encoded(String),
    /// Child parts separated by `boundary`.
    Multipart { boundary: String, parts: Vec<Part> },
}

/// MIME part: headers plus an encoded body or nested parts.
#[derive(Debug, Clone)]
pub struct Part {
    headers: Headers,
    content: Content,
}

impl Part {
    /// Creates a quoted-printable text part.
    #[must_use]
    pub fn text(content_type: &ContentType, text: &str) -> Self {
        let mut headers = Headers::new();
        headers.push_raw("Content-Type", content_type.to_string());
        headers.push_raw(
            "Content-Transfer-Encoding",
            TransferEncoding::QuotedPrintable.to_string(),
        );
        Self {
            headers,
            content: Content::Encoded(encode_quoted_printable(text)),
        }
    }

    /// Creates a base64 attachment part.
    ///
    /// Inline attachments get `Content-ID: <name>` so HTML can refer to
    /// them as `cid:name`.
    pub(crate) fn attachment(attachment: &Resolved) -> Self {
        let name = encode_rfc2047(&attachment.name, "utf-8");
        let content_type = attachment
            .content_type
            .clone()
            .with_parameter("name", name.clone());
        let disposition = if attachment.inline {
            "inline"
        } else {
            "attachment"
        };

        let mut headers = Headers::new();
        headers.push_raw("Content-Type", content_type.to_string());
        headers.push_raw(
            "Content-Transfer-Encoding",
            TransferEncoding::Base64.to_string(),
        );
        headers.push_raw(
            "Content-Disposition",
            format!(
                "{disposition}; filename=\"{}\"",
                name.replace('\\', "\\\\").replace('"', "\\\"")
            ),
        );
        if attachment.inline {
            headers.push_raw("Content-ID", format!("<{}>", attachment.name));
        }

        Self {
            headers,
            content: Content::Encoded(encode_base64_wrapped(&attachment.data)),
        }
    }

    /// Wraps parts in a `multipart/<sub_type>` container with a fresh boundary.
    #[must_use]
    pub fn multipart(sub_type: &str, parts: Vec<Self>) -> Self {
        let boundary = generate_boundary();
        let mut headers = Headers::new();
        headers.push_raw(
            "Content-Type",
            ContentType::multipart(sub_type, boundary.clone()).to_string(),
        );
        Self {
            headers,
            content: Content::Multipart { boundary, parts },
        }
    }

    /// Part headers.
    #[must_use]
    pub const fn headers(&self) -> &Headers {
        &self.headers
    }

    /// Child parts (empty for leaf parts).
    #[must_use]
    pub fn parts(&self) -> &[Self] {
        match &self.content {
            Content::Encoded(_) => &[],
            Content::Multipart { parts, .. } => parts,
        }
    }

    /// Appends the headers, a blank line and the body to `out`.
    pub fn write_to(&self, out: &mut String) {
        out.push_str(&self.headers.to_string());
        out.push_str("\r\n");

        match &self.content {
            Content::Encoded(body) => {
                out.push_str(body);
                // Taken by the following boundary delimiter (RFC 2046 5.1.1).
                out.push_str("\r\n");
            }
            Content::Multipart { boundary, parts } => {
                for part in parts {
                    out.push_str("--");
                    out.push_str(boundary);
                    out.push_str("\r\n");
                    part.write_to(out);
                }
                out.push_str("--");
                out.push_str(boundary);
                out.push_str("--\r\n");
            }
        }
    }
}

/// `=_` never occurs in quoted-printable or base64 output, so the
/// boundary cannot collide with encoded content.
fn generate_boundary() -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(28)
        .map(char::from)
        .collect();
    format!("=_{suffix}")
}
