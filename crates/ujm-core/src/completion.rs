//! Single-assignment completion bridge between the scheduler and the caller.
//!
//! `create_job` returns immediately; the caller awaits the [`JobHandle`]
//! while the manager drives the job (including retries) in the background and
//! settles the handle exactly once.

use std::sync::Arc;
use tokio::sync::oneshot;

use crate::job::UploadJob;
use crate::manager::UploadError;

/// Outcome delivered to the caller. The job itself is returned on success so
/// per-file state stays inspectable; on failure the error carries the job.
pub type JobResult = Result<Arc<UploadJob>, UploadError>;

/// Settling half, held by the manager while the job travels through the
/// queue. The first `settle` wins; later calls are no-ops.
pub(crate) struct CompletionHandle {
    tx: Option<oneshot::Sender<JobResult>>,
}

impl CompletionHandle {
    pub(crate) fn new() -> (Self, JobHandle) {
        let (tx, rx) = oneshot::channel();
        (Self { tx: Some(tx) }, JobHandle { rx })
    }

    /// Settles the handle with the job's outcome. Settling after the caller
    /// dropped its half is also a no-op.
    pub(crate) fn settle(&mut self, result: JobResult) {
        if let Some(tx) = self.tx.take() {
            let _ = tx.send(result);
        }
    }
}

/// The caller's half of a submitted job.
pub struct JobHandle {
    rx: oneshot::Receiver<JobResult>,
}

impl JobHandle {
    /// Waits for the job to finish, across all retry attempts.
    pub async fn wait(self) -> JobResult {
        match self.rx.await {
            Ok(result) => result,
            Err(_) => Err(UploadError::Abandoned),
        }
    }
}
