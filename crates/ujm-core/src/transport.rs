//! Pluggable transport interface for per-file transfers.
//!
//! The core job manager only depends on these traits and does not know about
//! HTTP clients or any other wire mechanics; the surrounding application
//! supplies implementations and a resolver that maps each file to its
//! destination.

use async_trait::async_trait;
use std::collections::HashMap;

use crate::job::UploadableFile;

/// Per-file transfer progress callback. Receives the total bytes sent so far
/// for the file being transferred (cumulative, not a delta).
pub type ChunkFn<'a> = dyn Fn(u64) + Send + Sync + 'a;

/// Request method for the transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Post,
    Put,
    Patch,
}

impl HttpMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
        }
    }
}

/// Destination for a single file transfer, produced by a [`TransportResolver`].
#[derive(Debug, Clone)]
pub struct TransportDescriptor {
    pub url: String,
    pub method: HttpMethod,
    /// Minimal headers required to perform the request.
    pub headers: HashMap<String, String>,
}

/// The resolver failed to produce a destination for a file.
///
/// Converted into [`TransferError::Resolver`] by the job's run loop so the
/// manager retries it like any other transfer failure.
#[derive(Debug, Clone, thiserror::Error)]
#[error("resolver failed for {file}: {message}")]
pub struct ResolverError {
    pub file: String,
    pub message: String,
}

/// A single file's transfer failed, aborting the current job attempt.
#[derive(Debug, Clone, thiserror::Error)]
pub enum TransferError {
    /// Response carried a non-success status.
    #[error("transfer of {file} failed: HTTP {status}")]
    Status { file: String, status: u16 },
    /// Network-level failure (connection reset, DNS, timeout).
    #[error("transfer of {file} failed: {message}")]
    Network { file: String, message: String },
    /// No destination could be resolved for the file.
    #[error(transparent)]
    Resolver(#[from] ResolverError),
}

impl TransferError {
    /// Name of the file whose transfer failed.
    pub fn file(&self) -> &str {
        match self {
            TransferError::Status { file, .. } | TransferError::Network { file, .. } => file,
            TransferError::Resolver(e) => &e.file,
        }
    }
}

/// Maps a file to its transfer destination. Supplied per job by the caller
/// (typically backed by an API call that allocates an upload slot).
#[async_trait]
pub trait TransportResolver: Send + Sync {
    async fn resolve(&self, file: &UploadableFile) -> Result<TransportDescriptor, ResolverError>;
}

/// Performs the actual byte transfer for one file.
///
/// Implementations stream the file's contents to `descriptor.url` with
/// `descriptor.method` and `descriptor.headers`, invoking `on_chunk` with the
/// cumulative byte count on every measurable chunk sent. A non-success
/// response must be reported as [`TransferError::Status`], not `Ok`.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(
        &self,
        file: &UploadableFile,
        descriptor: &TransportDescriptor,
        on_chunk: &ChunkFn<'_>,
    ) -> Result<(), TransferError>;
}
