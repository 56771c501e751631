//! Upload job: an ordered set of files transferred in sequence.
//!
//! A job attempts every not-yet-confirmed file in original order and stops at
//! the first failure; running the same job again resumes from the first
//! unconfirmed file, so confirmed files are never re-sent. Retry and backoff
//! decisions live in the manager, not here.

mod file;

pub use file::{FileSource, UploadableFile};

use std::sync::atomic::{AtomicU32, AtomicU8, Ordering};
use std::sync::{Arc, Mutex};

use crate::transport::{Transport, TransferError, TransportResolver};

/// Job identifier, assigned by the manager at submission.
pub type JobId = u64;

/// Aggregate progress callback: receives a 0..=100 percentage whenever the
/// job's byte-weighted progress changes.
pub type ProgressFn = dyn Fn(u8) + Send + Sync;

/// Job lifecycle status.
///
/// Transitions are monotonic within one attempt (`Pending` → `Running` →
/// `Done` or `Error`); the manager resets `Error` back to `Pending` when it
/// requeues the job for another attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStatus {
    Pending,
    Running,
    Done,
    Error,
}

impl JobStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Running => "running",
            JobStatus::Done => "done",
            JobStatus::Error => "error",
        }
    }
}

/// The unit of work: uploads an ordered set of files, retried as a whole.
pub struct UploadJob {
    id: JobId,
    files: Vec<UploadableFile>,
    resolver: Arc<dyn TransportResolver>,
    on_progress: Option<Box<ProgressFn>>,
    status: Mutex<JobStatus>,
    runs: AtomicU32,
    last_reported: AtomicU8,
    last_error: Mutex<Option<TransferError>>,
}

impl std::fmt::Debug for UploadJob {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UploadJob")
            .field("id", &self.id)
            .field("files", &self.files.len())
            .field("status", &self.status().as_str())
            .field("runs", &self.runs())
            .finish()
    }
}

impl UploadJob {
    pub(crate) fn new(
        id: JobId,
        files: Vec<UploadableFile>,
        resolver: Arc<dyn TransportResolver>,
        on_progress: Option<Box<ProgressFn>>,
    ) -> Self {
        Self {
            id,
            files,
            resolver,
            on_progress,
            status: Mutex::new(JobStatus::Pending),
            runs: AtomicU32::new(0),
            last_reported: AtomicU8::new(0),
            last_error: Mutex::new(None),
        }
    }

    pub fn id(&self) -> JobId {
        self.id
    }

    /// Files in submission order, with their per-file transfer state.
    pub fn files(&self) -> &[UploadableFile] {
        &self.files
    }

    pub fn status(&self) -> JobStatus {
        *self.status.lock().unwrap()
    }

    /// Number of times `run` has been invoked; drives the retry policy.
    pub fn runs(&self) -> u32 {
        self.runs.load(Ordering::Relaxed)
    }

    /// Last transfer error recorded by a failed attempt.
    pub fn last_error(&self) -> Option<TransferError> {
        self.last_error.lock().unwrap().clone()
    }

    /// Byte-weighted progress in 0..=100.
    ///
    /// Counts bytes confirmed or in flight across all files over the total
    /// byte size, so one large file dominates several small ones. Returns 100
    /// exactly when every file is confirmed; values that would round up to
    /// 100 early are capped at 99.
    pub fn progress(&self) -> u8 {
        if self.files.iter().all(|f| f.is_confirmed()) {
            return 100;
        }
        let total: u64 = self.files.iter().map(|f| f.size()).sum();
        if total == 0 {
            return 0;
        }
        let sent: u64 = self.files.iter().map(|f| f.bytes_sent()).sum();
        let pct = ((sent as f64 / total as f64) * 100.0).round() as u8;
        pct.min(99)
    }

    /// Reset to `Pending` when the manager requeues a failed job.
    pub(crate) fn reset_pending(&self) {
        *self.status.lock().unwrap() = JobStatus::Pending;
    }

    /// One attempt: transfer every unconfirmed file in order, stopping at the
    /// first failure. Increments the run counter.
    pub(crate) async fn run(&self, transport: &dyn Transport) -> Result<(), TransferError> {
        self.runs.fetch_add(1, Ordering::Relaxed);
        *self.status.lock().unwrap() = JobStatus::Running;

        match self.transfer_pending(transport).await {
            Ok(()) => {
                *self.status.lock().unwrap() = JobStatus::Done;
                Ok(())
            }
            Err(err) => {
                *self.last_error.lock().unwrap() = Some(err.clone());
                *self.status.lock().unwrap() = JobStatus::Error;
                Err(err)
            }
        }
    }

    async fn transfer_pending(&self, transport: &dyn Transport) -> Result<(), TransferError> {
        for file in &self.files {
            if file.is_confirmed() {
                continue;
            }
            let descriptor = self.resolver.resolve(file).await?;
            tracing::debug!(
                job_id = self.id,
                file = file.name(),
                url = %descriptor.url,
                method = descriptor.method.as_str(),
                "transferring file"
            );
            let on_chunk = |sent: u64| {
                file.record_sent(sent);
                self.report_progress();
            };
            transport.send(file, &descriptor, &on_chunk).await?;
            file.confirm();
            self.report_progress();
        }
        Ok(())
    }

    /// Invokes the progress callback when the aggregate percentage changed.
    fn report_progress(&self) {
        let pct = self.progress();
        if self.last_reported.swap(pct, Ordering::Relaxed) != pct {
            if let Some(cb) = &self.on_progress {
                cb(pct);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::{
        ChunkFn, HttpMethod, ResolverError, TransportDescriptor, TransportResolver,
    };
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex as StdMutex;

    struct FixedResolver;

    #[async_trait]
    impl TransportResolver for FixedResolver {
        async fn resolve(
            &self,
            file: &UploadableFile,
        ) -> Result<TransportDescriptor, ResolverError> {
            Ok(TransportDescriptor {
                url: format!("https://uploads.test/{}", file.name()),
                method: HttpMethod::Put,
                headers: HashMap::new(),
            })
        }
    }

    /// Transport that fails the files named in `fail` and records every
    /// send() invocation.
    struct RecordingTransport {
        fail: Vec<String>,
        calls: StdMutex<Vec<String>>,
    }

    impl RecordingTransport {
        fn new(fail: &[&str]) -> Self {
            Self {
                fail: fail.iter().map(|s| s.to_string()).collect(),
                calls: StdMutex::new(Vec::new()),
            }
        }

        fn calls_for(&self, name: &str) -> usize {
            self.calls.lock().unwrap().iter().filter(|c| c.as_str() == name).count()
        }
    }

    #[async_trait]
    impl Transport for RecordingTransport {
        async fn send(
            &self,
            file: &UploadableFile,
            _descriptor: &TransportDescriptor,
            on_chunk: &ChunkFn<'_>,
        ) -> Result<(), TransferError> {
            self.calls.lock().unwrap().push(file.name().to_string());
            if self.fail.iter().any(|f| f == file.name()) {
                return Err(TransferError::Status {
                    file: file.name().to_string(),
                    status: 500,
                });
            }
            on_chunk(file.size());
            Ok(())
        }
    }

    fn job_with(files: Vec<UploadableFile>) -> UploadJob {
        UploadJob::new(1, files, Arc::new(FixedResolver), None)
    }

    #[test]
    fn progress_is_weighted_by_bytes_not_file_count() {
        let job = job_with(vec![
            UploadableFile::new("big.bin", 900, FileSource::Bytes(Vec::new())),
            UploadableFile::new("small.bin", 100, FileSource::Bytes(Vec::new())),
        ]);
        assert_eq!(job.progress(), 0);

        job.files()[0].record_sent(450);
        assert_eq!(job.progress(), 45);

        job.files()[0].confirm();
        assert_eq!(job.progress(), 90);

        // All bytes in flight but the small file unconfirmed: capped below 100.
        job.files()[1].record_sent(100);
        assert_eq!(job.progress(), 99);

        job.files()[1].confirm();
        assert_eq!(job.progress(), 100);
    }

    #[test]
    fn progress_of_empty_job_is_complete() {
        let job = job_with(Vec::new());
        assert_eq!(job.progress(), 100);
    }

    #[tokio::test]
    async fn run_stops_at_first_failure_and_skips_remaining() {
        let transport = RecordingTransport::new(&["b.bin"]);
        let job = job_with(vec![
            UploadableFile::new("a.bin", 10, FileSource::Bytes(Vec::new())),
            UploadableFile::new("b.bin", 10, FileSource::Bytes(Vec::new())),
            UploadableFile::new("c.bin", 10, FileSource::Bytes(Vec::new())),
        ]);

        let err = job.run(&transport).await.unwrap_err();
        assert_eq!(err.file(), "b.bin");
        assert_eq!(job.status(), JobStatus::Error);
        assert_eq!(job.runs(), 1);
        assert!(job.files()[0].is_confirmed());
        assert!(!job.files()[1].is_confirmed());
        // The file after the failure was never attempted.
        assert_eq!(transport.calls_for("c.bin"), 0);
        assert!(job.last_error().is_some());
    }

    #[tokio::test]
    async fn rerun_resumes_from_first_unconfirmed_file() {
        let transport = RecordingTransport::new(&["b.bin"]);
        let job = job_with(vec![
            UploadableFile::new("a.bin", 10, FileSource::Bytes(Vec::new())),
            UploadableFile::new("b.bin", 10, FileSource::Bytes(Vec::new())),
        ]);

        assert!(job.run(&transport).await.is_err());
        assert!(job.run(&transport).await.is_err());
        assert_eq!(job.runs(), 2);

        // The confirmed file is transferred exactly once across both attempts.
        assert_eq!(transport.calls_for("a.bin"), 1);
        assert_eq!(transport.calls_for("b.bin"), 2);
    }

    #[tokio::test]
    async fn successful_run_confirms_all_and_reports_done() {
        let transport = RecordingTransport::new(&[]);
        let job = job_with(vec![
            UploadableFile::new("a.bin", 10, FileSource::Bytes(Vec::new())),
            UploadableFile::new("b.bin", 30, FileSource::Bytes(Vec::new())),
        ]);

        job.run(&transport).await.unwrap();
        assert_eq!(job.status(), JobStatus::Done);
        assert_eq!(job.progress(), 100);
        assert!(job.files().iter().all(|f| f.is_confirmed()));
    }
}
