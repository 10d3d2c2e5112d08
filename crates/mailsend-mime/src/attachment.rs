//! File attachments.

use std::path::{Path, PathBuf};

use crate::content_type::ContentType;
use crate::encoding::decode_base64;
use crate::error::{Error, Result};

/// Where the attachment bytes come from.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Source {
    Path(PathBuf),
    Base64(String),
    Bytes(Vec<u8>),
}

/// Attachment description passed to [`Email::attach`](crate::Email::attach).
///
/// Construction never fails; the source is read or decoded when the
/// attachment is added to a message, and failures are recorded there.
///
/// ```ignore
/// email.attach(Attachment::from_path("report.pdf"));
/// email.attach(Attachment::from_base64("filename", "Zm9v"));
/// email.attach(Attachment::from_path("logo.png").inline());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    source: Source,
    name: Option<String>,
    content_type: Option<String>,
    inline: bool,
}

impl Attachment {
    /// Attaches a file. It is read when the attachment is added.
    #[must_use]
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        Self::with_source(Source::Path(path.into()), None)
    }

    /// Attaches base64 encoded data under the given file name.
    #[must_use]
    pub fn from_base64(name: impl Into<String>, data: impl Into<String>) -> Self {
        Self::with_source(Source::Base64(data.into()), Some(name.into()))
    }

    /// Attaches raw bytes under the given file name.
    #[must_use]
    pub fn from_bytes(name: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
        Self::with_source(Source::Bytes(data.into()), Some(name.into()))
    }

    const fn with_source(source: Source, name: Option<String>) -> Self {
        Self {
            source,
            name,
            content_type: None,
            inline: false,
        }
    }

    /// Overrides the file name shown to the recipient.
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets the MIME type instead of guessing it from the file name.
    #[must_use]
    pub fn content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Marks the attachment inline so HTML bodies can reference it as
    /// `cid:<name>`.
    #[must_use]
    pub const fn inline(mut self) -> Self {
        self.inline = true;
        self
    }

    /// Reads or decodes the source.
    pub(crate) fn resolve(self) -> Result<Resolved> {
        let (name, data) = match self.source {
            Source::Path(path) => {
                let data = std::fs::read(&path).map_err(|e| Error::AttachmentRead {
                    path: path.display().to_string(),
                    reason: e.to_string(),
                })?;
                let name = self.name.unwrap_or_else(|| file_name(&path));
                (name, data)
            }
            Source::Base64(encoded) => (self.name.unwrap_or_default(), decode_base64(&encoded)?),
            Source::Bytes(data) => (self.name.unwrap_or_default(), data),
        };

        if name.is_empty() || name.chars().any(char::is_control) {
            return Err(Error::InvalidHeader(format!(
                "Invalid attachment name: {name:?}"
            )));
        }
        if self.inline && !is_content_id_safe(&name) {
            return Err(Error::InvalidHeader(format!(
                "Inline attachment name cannot be used as a Content-ID: {name:?}"
            )));
        }

        let content_type = match self.content_type {
            Some(ct) => ContentType::parse(&ct)?,
            None => ContentType::from_file_name(&name),
        };

        Ok(Resolved {
            name,
            content_type,
            data,
            inline: self.inline,
        })
    }
}

/// Inline names become `Content-ID: <name>`, so they must form a valid
/// msg-id on their own.
fn is_content_id_safe(name: &str) -> bool {
    name.bytes()
        .all(|b| b.is_ascii_graphic() && !matches!(b, b'<' | b'>' | b'"' | b'\\'))
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Attachment with its bytes loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Resolved {
    pub name: String,
    pub content_type: ContentType,
    pub data: Vec<u8>,
    pub inline: bool,
}
