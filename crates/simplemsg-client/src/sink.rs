//! Record sinks — where decoded record payloads go.
//!
//! A [`SinkFactory`] opens one [`RecordSink`] per record. Sinks are
//! append-only, start empty, and are closed exactly once: `close` consumes
//! the sink, so a closed sink cannot be written again.

use std::future::Future;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use bytes::{Bytes, BytesMut};
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};

/// Opens a fresh sink for a named record.
pub trait SinkFactory {
    type Sink: RecordSink;

    fn open(&mut self, name: &str) -> impl Future<Output = io::Result<Self::Sink>>;
}

/// Write destination for one record's payload.
pub trait RecordSink {
    fn write(&mut self, bytes: &[u8]) -> impl Future<Output = io::Result<()>>;

    /// Flush and release the destination.
    fn close(self) -> impl Future<Output = io::Result<()>>;
}

// ── Files in a directory ──────────────────────────────────────────────────────

/// Writes each record to `<directory>/<name>`, truncating existing files.
///
/// Names are taken from the peer, so anything that could escape the
/// directory is refused.
#[derive(Debug, Clone)]
pub struct DirSink {
    directory: PathBuf,
}

impl DirSink {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Destination for `name`, or `InvalidInput` if it is not a plain file
    /// name.
    pub fn path_for(&self, name: &str) -> io::Result<PathBuf> {
        let plain = !name.is_empty()
            && name != "."
            && name != ".."
            && !name.contains(['/', '\\', '\0']);
        if !plain {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("refusing record name {name:?}"),
            ));
        }
        Ok(self.directory.join(name))
    }
}

impl SinkFactory for DirSink {
    type Sink = FileSink;

    async fn open(&mut self, name: &str) -> io::Result<FileSink> {
        let path = self.path_for(name)?;
        let file = File::create(&path).await?;
        tracing::debug!(path = %path.display(), "record sink opened");
        Ok(FileSink {
            writer: BufWriter::new(file),
            path,
        })
    }
}

/// One open file inside a [`DirSink`] directory.
#[derive(Debug)]
pub struct FileSink {
    writer: BufWriter<File>,
    path: PathBuf,
}

impl FileSink {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RecordSink for FileSink {
    async fn write(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.writer.write_all(bytes).await
    }

    async fn close(mut self) -> io::Result<()> {
        self.writer.flush().await?;
        self.writer.shutdown().await
    }
}

// ── In memory ─────────────────────────────────────────────────────────────────

/// A record collected by [`MemorySink`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectedRecord {
    pub name: String,
    pub payload: Bytes,
}

/// Collects records in memory, in the order they are closed.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    records: Arc<Mutex<Vec<CollectedRecord>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records closed so far.
    pub fn records(&self) -> Vec<CollectedRecord> {
        self.records
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

impl SinkFactory for MemorySink {
    type Sink = MemoryRecord;

    async fn open(&mut self, name: &str) -> io::Result<MemoryRecord> {
        Ok(MemoryRecord {
            name: name.to_string(),
            buf: BytesMut::new(),
            out: self.records.clone(),
        })
    }
}

#[derive(Debug)]
pub struct MemoryRecord {
    name: String,
    buf: BytesMut,
    out: Arc<Mutex<Vec<CollectedRecord>>>,
}

impl RecordSink for MemoryRecord {
    async fn write(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.buf.extend_from_slice(bytes);
        Ok(())
    }

    async fn close(self) -> io::Result<()> {
        self.out
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(CollectedRecord {
                name: self.name,
                payload: self.buf.freeze(),
            });
        Ok(())
    }
}
