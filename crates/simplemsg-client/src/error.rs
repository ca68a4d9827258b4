//! Client error taxonomy. Every error is terminal for the current exchange.

use std::fmt;
use std::io;

/// Failure to produce a connected stream.
#[derive(Debug, thiserror::Error)]
pub enum ConnectError {
    /// Lookup failed or yielded no candidates.
    #[error("cannot resolve {host}:{port}: {source}")]
    ResolutionFailed {
        host: String,
        port: u16,
        #[source]
        source: io::Error,
    },

    /// Every candidate failed. `last` is the error of the final attempt.
    #[error("could not connect to any of {attempts} address(es) for {host}:{port}: {last}")]
    AllCandidatesFailed {
        host: String,
        port: u16,
        attempts: usize,
        #[source]
        last: io::Error,
    },
}

/// Failure while writing the request or signalling its end.
#[derive(Debug, thiserror::Error)]
pub enum SendError {
    #[error("writing request failed: {0}")]
    WriteFailed(#[source] io::Error),

    #[error("flushing request failed: {0}")]
    FlushFailed(#[source] io::Error),

    #[error("half-closing the connection failed: {0}")]
    ShutdownFailed(#[source] io::Error),
}

/// Where the response decoder was when it stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeState {
    AwaitStatus,
    AwaitRecordOrDone,
    AwaitLength,
    StreamPayload,
    Done,
}

impl fmt::Display for DecodeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DecodeState::AwaitStatus => "awaiting status",
            DecodeState::AwaitRecordOrDone => "awaiting record",
            DecodeState::AwaitLength => "awaiting length",
            DecodeState::StreamPayload => "streaming payload",
            DecodeState::Done => "done",
        };
        f.write_str(s)
    }
}

/// Violation of the response framing, or failure of the stream or sink
/// underneath it. `index` is the zero-based position of the record on the
/// wire.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("bad status line {line:?}")]
    BadStatus { line: String },

    #[error("unexpected line {line:?} after {records} record(s)")]
    UnexpectedLine { line: String, records: usize },

    #[error("cannot open sink for record {index} ({name:?}): {source}")]
    SinkOpenFailed {
        index: usize,
        name: String,
        #[source]
        source: io::Error,
    },

    #[error("bad length line {line:?} for record {index} ({name:?})")]
    BadLength {
        index: usize,
        name: String,
        line: String,
    },

    #[error("record {index} ({name:?}) truncated: got {received} of {declared} bytes")]
    TruncatedPayload {
        index: usize,
        name: String,
        declared: u64,
        received: u64,
    },

    #[error("writing record {index} ({name:?}) failed: {source}")]
    SinkWriteFailed {
        index: usize,
        name: String,
        #[source]
        source: io::Error,
    },

    #[error("read failed while {state}: {source}")]
    ReadFailed {
        state: DecodeState,
        #[source]
        source: io::Error,
    },
}

/// Discriminant of [`ProtocolError`], for matching without the context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProtocolErrorKind {
    BadStatus,
    UnexpectedLine,
    SinkOpenFailed,
    BadLength,
    TruncatedPayload,
    SinkWriteFailed,
    ReadFailed,
}

impl ProtocolError {
    pub fn kind(&self) -> ProtocolErrorKind {
        match self {
            ProtocolError::BadStatus { .. } => ProtocolErrorKind::BadStatus,
            ProtocolError::UnexpectedLine { .. } => ProtocolErrorKind::UnexpectedLine,
            ProtocolError::SinkOpenFailed { .. } => ProtocolErrorKind::SinkOpenFailed,
            ProtocolError::BadLength { .. } => ProtocolErrorKind::BadLength,
            ProtocolError::TruncatedPayload { .. } => ProtocolErrorKind::TruncatedPayload,
            ProtocolError::SinkWriteFailed { .. } => ProtocolErrorKind::SinkWriteFailed,
            ProtocolError::ReadFailed { .. } => ProtocolErrorKind::ReadFailed,
        }
    }
}

/// Any failure of a full exchange over an already-validated posting.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error(transparent)]
    Connect(#[from] ConnectError),

    #[error(transparent)]
    Send(#[from] SendError),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}
