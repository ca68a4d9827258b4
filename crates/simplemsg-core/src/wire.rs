//! simplemsg wire format — the request lines a client sends and the header
//! lines a peer answers with.
//!
//! Everything here is text framed by `\n` (never `\r\n`). Response payload
//! bytes are not text and never pass through this module; the decoder reads
//! them by exact count.
//!
//! Request (client → peer), followed by a half-close of the write side:
//!
//! ```text
//! user=<user>\n
//! img=<image>\n      (only if an image was supplied)
//! <message>\n
//! ```
//!
//! Response (peer → client), followed by the peer closing the connection:
//!
//! ```text
//! status=<integer>\n
//! { file=<name>\n len=<integer>\n <exactly that many raw bytes> }*
//! ```

use bytes::{BufMut, Bytes, BytesMut};

// ── Constants ─────────────────────────────────────────────────────────────────

/// Terminator of every request line and response header line.
pub const LINE_TERMINATOR: u8 = b'\n';

pub const USER_PREFIX: &str = "user=";
pub const IMAGE_PREFIX: &str = "img=";
pub const STATUS_PREFIX: &str = "status=";
pub const FILE_PREFIX: &str = "file=";
pub const LEN_PREFIX: &str = "len=";

/// Status value a peer uses to report success.
pub const STATUS_OK: i32 = 0;

// ── Posting ───────────────────────────────────────────────────────────────────

/// The outgoing request: who is posting, what, and an optional image.
///
/// Construction validates the fields that occupy a single wire line, so a
/// `Posting` can always be encoded without corrupting the framing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Posting {
    user: String,
    message: String,
    image: Option<String>,
}

impl Posting {
    pub fn new(
        user: impl Into<String>,
        message: impl Into<String>,
        image: Option<String>,
    ) -> Result<Self, WireError> {
        let user = user.into();
        let message = message.into();

        if user.is_empty() {
            return Err(WireError::EmptyField("user"));
        }
        if user.contains(LINE_TERMINATOR as char) {
            return Err(WireError::LineBreakInField("user"));
        }
        if let Some(image) = &image {
            if image.is_empty() {
                return Err(WireError::EmptyField("img"));
            }
            if image.contains(LINE_TERMINATOR as char) {
                return Err(WireError::LineBreakInField("img"));
            }
        }

        Ok(Self {
            user,
            message,
            image,
        })
    }

    pub fn user(&self) -> &str {
        &self.user
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn image(&self) -> Option<&str> {
        self.image.as_deref()
    }

    /// Serialize into request lines. The image line is present iff an image
    /// was supplied; the message is always the last line.
    pub fn encode(&self) -> Bytes {
        let image_len = self
            .image
            .as_ref()
            .map_or(0, |i| IMAGE_PREFIX.len() + i.len() + 1);
        let mut buf = BytesMut::with_capacity(
            USER_PREFIX.len() + self.user.len() + 1 + image_len + self.message.len() + 1,
        );

        buf.put_slice(USER_PREFIX.as_bytes());
        buf.put_slice(self.user.as_bytes());
        buf.put_u8(LINE_TERMINATOR);

        if let Some(image) = &self.image {
            buf.put_slice(IMAGE_PREFIX.as_bytes());
            buf.put_slice(image.as_bytes());
            buf.put_u8(LINE_TERMINATOR);
        }

        buf.put_slice(self.message.as_bytes());
        buf.put_u8(LINE_TERMINATOR);

        buf.freeze()
    }
}

// ── Header lines ──────────────────────────────────────────────────────────────

/// Strip one trailing `\n`, then `prefix`. Returns the value as text.
///
/// `None` if the line does not start with `prefix` or is not UTF-8.
pub fn field_value<'a>(line: &'a [u8], prefix: &str) -> Option<&'a str> {
    let line = line.strip_suffix(&[LINE_TERMINATOR]).unwrap_or(line);
    let value = line.strip_prefix(prefix.as_bytes())?;
    std::str::from_utf8(value).ok()
}

/// Parse a `status=<integer>` line.
pub fn parse_status(line: &[u8]) -> Option<i32> {
    field_value(line, STATUS_PREFIX)?.parse().ok()
}

/// Parse a `file=<name>` line. The name is returned verbatim; whether it is
/// acceptable as a destination is the sink's decision.
pub fn parse_file(line: &[u8]) -> Option<&str> {
    field_value(line, FILE_PREFIX)
}

/// Parse a `len=<integer>` line. Negative values are rejected.
pub fn parse_len(line: &[u8]) -> Option<u64> {
    field_value(line, LEN_PREFIX)?.parse().ok()
}

/// True for a line consisting only of its terminator.
pub fn is_blank(line: &[u8]) -> bool {
    line.strip_suffix(&[LINE_TERMINATOR]).unwrap_or(line).is_empty()
}

// ── Errors ────────────────────────────────────────────────────────────────────

/// Errors that can arise when building wire-format data.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WireError {
    #[error("{0} must not be empty")]
    EmptyField(&'static str),

    #[error("{0} must not contain a line break")]
    LineBreakInField(&'static str),
}

// ── Tests ─────────────────────────────────────────────────────────────────────
