//! Per-file transfer state inside an upload job.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

/// Where a file's bytes come from. The transport streams from this handle;
/// the core itself never reads file contents.
#[derive(Debug, Clone)]
pub enum FileSource {
    /// File on local disk.
    Path(PathBuf),
    /// In-memory contents (small payloads, tests).
    Bytes(Vec<u8>),
}

/// One file inside an upload job: identity, size, and transfer state.
///
/// `bytes_sent` and `confirmed` are written only by the owning job's run
/// loop. Once `confirmed` is set it is never cleared, so a retried job skips
/// the file instead of re-sending it.
#[derive(Debug)]
pub struct UploadableFile {
    name: String,
    size: u64,
    source: FileSource,
    bytes_sent: AtomicU64,
    confirmed: AtomicBool,
}

impl UploadableFile {
    pub fn new(name: impl Into<String>, size: u64, source: FileSource) -> Self {
        Self {
            name: name.into(),
            size,
            source,
            bytes_sent: AtomicU64::new(0),
            confirmed: AtomicBool::new(false),
        }
    }

    /// File whose contents are already in memory; size is taken from the payload.
    pub fn from_bytes(name: impl Into<String>, data: Vec<u8>) -> Self {
        let size = data.len() as u64;
        Self::new(name, size, FileSource::Bytes(data))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn source(&self) -> &FileSource {
        &self.source
    }

    /// Bytes sent so far; equals `size` once the file is confirmed.
    pub fn bytes_sent(&self) -> u64 {
        self.bytes_sent.load(Ordering::Relaxed)
    }

    pub fn is_confirmed(&self) -> bool {
        self.confirmed.load(Ordering::Acquire)
    }

    /// Records in-flight progress from the transport's chunk callback,
    /// clamped to `size` so an over-reporting transport cannot overshoot.
    pub(crate) fn record_sent(&self, bytes: u64) {
        self.bytes_sent.store(bytes.min(self.size), Ordering::Relaxed);
    }

    /// Marks the file as uploaded. Never undone.
    pub(crate) fn confirm(&self) {
        self.bytes_sent.store(self.size, Ordering::Relaxed);
        self.confirmed.store(true, Ordering::Release);
    }
}
