//! Upload job manager: FIFO admission under a bounded concurrency limit.
//!
//! Owns the pending queue and the running set. Jobs are promoted in FIFO
//! order, never more than `max_concurrent_jobs` at once. A failed job is
//! requeued to the tail after an exponential backoff until the retry policy
//! gives up, at which point the caller's completion handle rejects with the
//! last transfer error.
//!
//! The manager is an explicit instance with no ambient global state; an
//! application that wants one shared scheduler constructs it at startup and
//! passes clones around (clones share state).

mod admit;
mod error;

pub use error::UploadError;

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use crate::completion::{CompletionHandle, JobHandle};
use crate::config::UjmConfig;
use crate::job::{JobId, ProgressFn, UploadJob, UploadableFile};
use crate::retry::RetryPolicy;
use crate::transport::{Transport, TransportResolver};

/// A job travelling through the scheduler with its completion handle.
struct Admission {
    job: Arc<UploadJob>,
    done: CompletionHandle,
}

struct ManagerState {
    pending: VecDeque<Admission>,
    running: HashMap<JobId, Arc<UploadJob>>,
}

struct ManagerInner {
    max_concurrent: usize,
    policy: RetryPolicy,
    transport: Arc<dyn Transport>,
    next_id: AtomicU64,
    state: Mutex<ManagerState>,
}

/// Bounded-concurrency scheduler for upload jobs.
#[derive(Clone)]
pub struct UploadManager {
    inner: Arc<ManagerInner>,
}

impl UploadManager {
    /// Creates a manager from config; `transport` performs the per-file sends.
    pub fn new(cfg: &UjmConfig, transport: Arc<dyn Transport>) -> Self {
        Self::with_policy(cfg.max_concurrent_jobs, cfg.retry_policy(), transport)
    }

    /// Creates a manager with an explicit concurrency bound and retry policy.
    /// A bound of 0 is treated as 1.
    pub fn with_policy(
        max_concurrent: usize,
        policy: RetryPolicy,
        transport: Arc<dyn Transport>,
    ) -> Self {
        Self {
            inner: Arc::new(ManagerInner {
                max_concurrent: max_concurrent.max(1),
                policy,
                transport,
                next_id: AtomicU64::new(1),
                state: Mutex::new(ManagerState {
                    pending: VecDeque::new(),
                    running: HashMap::new(),
                }),
            }),
        }
    }

    /// Submits an upload job for the given files and returns immediately.
    ///
    /// The job is appended to the pending tail and promoted as soon as a
    /// concurrency slot frees up. `resolver` maps each file to its transfer
    /// destination; `on_progress` (if any) receives the job's byte-weighted
    /// percentage whenever it changes. Await the returned handle for the
    /// outcome, including retries.
    ///
    /// Must be called from within a tokio runtime.
    pub fn create_job(
        &self,
        files: Vec<UploadableFile>,
        resolver: Arc<dyn TransportResolver>,
        on_progress: Option<Box<ProgressFn>>,
    ) -> JobHandle {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        let job = Arc::new(UploadJob::new(id, files, resolver, on_progress));
        let (done, handle) = CompletionHandle::new();
        self.inner
            .state
            .lock()
            .unwrap()
            .pending
            .push_back(Admission { job, done });
        tracing::debug!(job_id = id, "job queued");
        admit::process(&self.inner);
        handle
    }

    /// Number of jobs currently running; never exceeds the configured bound.
    pub fn running_jobs(&self) -> usize {
        self.inner.state.lock().unwrap().running.len()
    }

    /// Number of jobs waiting for a free slot.
    pub fn pending_jobs(&self) -> usize {
        self.inner.state.lock().unwrap().pending.len()
    }

    /// The configured concurrency bound.
    pub fn max_concurrent_jobs(&self) -> usize {
        self.inner.max_concurrent
    }
}
