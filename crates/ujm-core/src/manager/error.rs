//! Terminal errors surfaced through a job's completion handle.

use std::sync::Arc;

use crate::job::UploadJob;
use crate::transport::TransferError;

/// Error delivered to the caller when a job cannot complete.
#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    /// Every run attempt failed. `job` exposes which files were confirmed
    /// before the final failure; that partial progress is never rolled back.
    #[error("upload failed after {attempts} attempts: {last}")]
    RetriesExhausted {
        job: Arc<UploadJob>,
        attempts: u32,
        #[source]
        last: TransferError,
    },
    /// The manager went away before the job settled (e.g. runtime shutdown).
    #[error("upload manager shut down before the job completed")]
    Abandoned,
}

impl UploadError {
    /// The failing job, when the error carries one.
    pub fn job(&self) -> Option<&Arc<UploadJob>> {
        match self {
            UploadError::RetriesExhausted { job, .. } => Some(job),
            UploadError::Abandoned => None,
        }
    }
}
