//! Response decoder — turns the peer's reply into a status and an ordered
//! series of length-framed records, each streamed into its own sink.
//!
//! ```text
//! AwaitStatus → AwaitRecordOrDone → AwaitLength → StreamPayload ─┐
//!                     ↑  │                                       │
//!                     │  └─ end of stream → Done                  │
//!                     └───────────────────────────────────────────┘
//! ```
//!
//! Header lines and payload bytes share one `BufReader`. Header lines are
//! read up to and including their `\n` and no further; payload is read by
//! exact count and never scanned for terminators. Whatever the buffer holds
//! past a header line is therefore the start of the payload, and whatever it
//! holds past a payload is the next header. Neither discipline ever sees the
//! other's bytes.

use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, BufReader};

use simplemsg_core::wire::{self, STATUS_OK};
use simplemsg_core::DecoderConfig;

use crate::error::{DecodeState, ProtocolError};
use crate::sink::{RecordSink, SinkFactory};

/// A fully decoded response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: i32,
    pub records: Vec<RecordSummary>,
}

impl Response {
    /// Whether the peer reported success. A failure status is still a
    /// complete, valid response.
    pub fn is_success(&self) -> bool {
        self.status == STATUS_OK
    }
}

/// What was delivered for one record. The payload itself went to the sink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordSummary {
    /// Position on the wire, starting at 0.
    pub index: usize,
    pub name: String,
    pub len: u64,
    /// BLAKE3 of the payload, computed while streaming.
    pub digest: [u8; 32],
}

/// Outcome of reading one header line.
enum Line {
    /// End of stream before any byte.
    Eof,
    /// A line, with its terminator unless the stream ended first.
    Complete,
    /// `max_header_line` bytes without a terminator.
    TooLong,
}

/// Decoder state, carrying what each state needs.
enum Step<S> {
    AwaitRecordOrDone,
    AwaitLength { name: String },
    StreamPayload(OpenRecord<S>),
    Done,
}

/// A record whose sink is open and whose payload is being streamed.
struct OpenRecord<S> {
    index: usize,
    name: String,
    declared: u64,
    received: u64,
    sink: S,
    hasher: blake3::Hasher,
}

impl<S: RecordSink> OpenRecord<S> {
    fn summary(&self) -> RecordSummary {
        RecordSummary {
            index: self.index,
            name: self.name.clone(),
            len: self.declared,
            digest: *self.hasher.finalize().as_bytes(),
        }
    }

    /// Close the sink after a failure. The failure being reported takes
    /// precedence over any close error.
    async fn abandon(self) {
        if let Err(e) = self.sink.close().await {
            tracing::debug!(record = %self.name, error = %e, "closing abandoned sink failed");
        }
    }
}

pub struct ResponseDecoder<R> {
    reader: BufReader<R>,
    chunk_size: usize,
    max_header_line: usize,
    state: DecodeState,
}

impl<R: AsyncRead + Unpin> ResponseDecoder<R> {
    pub fn new(reader: R, config: &DecoderConfig) -> Self {
        let config = config.sanitized();
        Self {
            reader: BufReader::with_capacity(config.chunk_size.max(config.max_header_line), reader),
            chunk_size: config.chunk_size,
            max_header_line: config.max_header_line,
            state: DecodeState::AwaitStatus,
        }
    }

    pub fn state(&self) -> DecodeState {
        self.state
    }

    /// Decode the whole response, opening one sink per record.
    ///
    /// Stops at the first protocol error. Any sink open at that point is
    /// closed, never removed; deleting partial output is the caller's call.
    pub async fn decode<F>(&mut self, sinks: &mut F) -> Result<Response, ProtocolError>
    where
        F: SinkFactory,
    {
        let mut line = Vec::with_capacity(128);
        let mut chunk = vec![0u8; self.chunk_size];

        self.state = DecodeState::AwaitStatus;
        let status = self.read_status(&mut line).await?;
        if status != STATUS_OK {
            tracing::warn!(status, "peer reported failure status");
        } else {
            tracing::debug!(status, "status received");
        }

        let mut records: Vec<RecordSummary> = Vec::new();
        let mut step: Step<F::Sink> = Step::AwaitRecordOrDone;

        loop {
            step = match step {
                Step::AwaitRecordOrDone => {
                    self.state = DecodeState::AwaitRecordOrDone;
                    match self.read_line(&mut line).await? {
                        Line::Eof => Step::Done,
                        Line::TooLong => {
                            return Err(ProtocolError::UnexpectedLine {
                                line: printable(&line),
                                records: records.len(),
                            })
                        }
                        Line::Complete if wire::is_blank(&line) => Step::AwaitRecordOrDone,
                        Line::Complete => match wire::parse_file(&line) {
                            Some(name) => Step::AwaitLength {
                                name: name.to_string(),
                            },
                            None => {
                                return Err(ProtocolError::UnexpectedLine {
                                    line: printable(&line),
                                    records: records.len(),
                                })
                            }
                        },
                    }
                }

                Step::AwaitLength { name } => {
                    self.state = DecodeState::AwaitLength;
                    let index = records.len();
                    let declared = match self.read_line(&mut line).await? {
                        Line::Complete => wire::parse_len(&line),
                        Line::Eof | Line::TooLong => None,
                    };
                    let Some(declared) = declared else {
                        return Err(ProtocolError::BadLength {
                            index,
                            name,
                            line: printable(&line),
                        });
                    };

                    let sink = match sinks.open(&name).await {
                        Ok(sink) => sink,
                        Err(source) => {
                            return Err(ProtocolError::SinkOpenFailed {
                                index,
                                name,
                                source,
                            })
                        }
                    };
                    tracing::debug!(index, record = %name, len = declared, "record started");

                    Step::StreamPayload(OpenRecord {
                        index,
                        name,
                        declared,
                        received: 0,
                        sink,
                        hasher: blake3::Hasher::new(),
                    })
                }

                Step::StreamPayload(record) => {
                    self.state = DecodeState::StreamPayload;
                    let summary = self.stream_payload(record, &mut chunk).await?;
                    tracing::info!(
                        index = summary.index,
                        record = %summary.name,
                        bytes = summary.len,
                        digest = hex::encode(&summary.digest[..8]),
                        "record received"
                    );
                    records.push(summary);
                    Step::AwaitRecordOrDone
                }

                Step::Done => break,
            };
        }

        self.state = DecodeState::Done;
        tracing::debug!(status, records = records.len(), "response complete");
        Ok(Response { status, records })
    }

    async fn read_status(&mut self, line: &mut Vec<u8>) -> Result<i32, ProtocolError> {
        let status = match self.read_line(line).await? {
            Line::Complete => wire::parse_status(line),
            Line::Eof | Line::TooLong => None,
        };
        status.ok_or_else(|| ProtocolError::BadStatus {
            line: printable(line),
        })
    }

    /// Read one header line into `line`, through its `\n` and not a byte
    /// further.
    async fn read_line(&mut self, line: &mut Vec<u8>) -> Result<Line, ProtocolError> {
        line.clear();
        let limit = self.max_header_line as u64;
        let state = self.state;

        let n = (&mut self.reader)
            .take(limit)
            .read_until(wire::LINE_TERMINATOR, line)
            .await
            .map_err(|source| ProtocolError::ReadFailed { state, source })?;

        Ok(if n == 0 {
            Line::Eof
        } else if line.last() != Some(&wire::LINE_TERMINATOR) && n as u64 == limit {
            Line::TooLong
        } else {
            Line::Complete
        })
    }

    /// Move exactly `record.declared` bytes from the stream into the sink.
    async fn stream_payload<S>(
        &mut self,
        mut record: OpenRecord<S>,
        chunk: &mut [u8],
    ) -> Result<RecordSummary, ProtocolError>
    where
        S: RecordSink,
    {
        while record.received < record.declared {
            let remaining = record.declared - record.received;
            let want = remaining.min(chunk.len() as u64) as usize;

            let n = match self.reader.read(&mut chunk[..want]).await {
                Ok(n) => n,
                Err(source) => {
                    record.abandon().await;
                    return Err(ProtocolError::ReadFailed {
                        state: DecodeState::StreamPayload,
                        source,
                    });
                }
            };

            if n == 0 {
                let err = ProtocolError::TruncatedPayload {
                    index: record.index,
                    name: record.name.clone(),
                    declared: record.declared,
                    received: record.received,
                };
                record.abandon().await;
                return Err(err);
            }

            if let Err(source) = record.sink.write(&chunk[..n]).await {
                let (index, name) = (record.index, record.name.clone());
                record.abandon().await;
                return Err(ProtocolError::SinkWriteFailed {
                    index,
                    name,
                    source,
                });
            }
            record.hasher.update(&chunk[..n]);
            record.received += n as u64;
        }

        let summary = record.summary();
        record
            .sink
            .close()
            .await
            .map_err(|source| ProtocolError::SinkWriteFailed {
                index: summary.index,
                name: summary.name.clone(),
                source,
            })?;
        Ok(summary)
    }
}

/// A header line as text for diagnostics, without its terminator.
fn printable(line: &[u8]) -> String {
    let line = line.strip_suffix(&[wire::LINE_TERMINATOR]).unwrap_or(line);
    String::from_utf8_lossy(line).into_owned()
}
