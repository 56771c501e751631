//! Admission routine: promote pending jobs into free slots, handle results.

use std::sync::Arc;

use crate::retry::RetryDecision;

use super::{Admission, ManagerInner, UploadError};

/// Promotes queued jobs while a concurrency slot is free. The queue scan runs
/// synchronously under the state lock; each promoted job is driven on its own
/// tokio task so admission itself never blocks.
pub(super) fn process(inner: &Arc<ManagerInner>) {
    loop {
        let admission = {
            let mut state = inner.state.lock().unwrap();
            if state.running.len() >= inner.max_concurrent {
                return;
            }
            let Some(admission) = state.pending.pop_front() else {
                return;
            };
            state
                .running
                .insert(admission.job.id(), Arc::clone(&admission.job));
            admission
        };
        tracing::debug!(job_id = admission.job.id(), "job admitted");
        let inner = Arc::clone(inner);
        tokio::spawn(drive(inner, admission));
    }
}

/// Runs one attempt of an admitted job, then settles the completion handle or
/// requeues the job per the retry policy.
async fn drive(inner: Arc<ManagerInner>, mut admission: Admission) {
    let job = Arc::clone(&admission.job);
    let result = job.run(inner.transport.as_ref()).await;

    inner.state.lock().unwrap().running.remove(&job.id());

    match result {
        Ok(()) => {
            tracing::debug!(job_id = job.id(), runs = job.runs(), "job done");
            admission.done.settle(Ok(Arc::clone(&job)));
            process(&inner);
        }
        Err(err) => match inner.policy.decide(job.runs()) {
            RetryDecision::RetryAfter(delay) => {
                tracing::warn!(
                    job_id = job.id(),
                    runs = job.runs(),
                    delay_ms = delay.as_millis() as u64,
                    error = %err,
                    "job failed, requeueing after backoff"
                );
                let requeue = Arc::clone(&inner);
                tokio::spawn(async move {
                    tokio::time::sleep(delay).await;
                    admission.job.reset_pending();
                    requeue.state.lock().unwrap().pending.push_back(admission);
                    process(&requeue);
                });
                // The freed slot is usable by other pending jobs right away.
                process(&inner);
            }
            RetryDecision::NoRetry => {
                tracing::warn!(
                    job_id = job.id(),
                    runs = job.runs(),
                    error = %err,
                    "job failed, retries exhausted"
                );
                let attempts = job.runs();
                admission.done.settle(Err(UploadError::RetriesExhausted {
                    job: Arc::clone(&job),
                    attempts,
                    last: err,
                }));
                process(&inner);
            }
        },
    }
}
