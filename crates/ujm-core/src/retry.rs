//! Retry and backoff policy for failed jobs.
//!
//! Retries are entirely the manager's responsibility; a job only reports the
//! failure of one attempt. The policy is keyed on how many times the job has
//! already run, and the delay grows exponentially from `base_delay` up to
//! `max_delay`.

use std::time::Duration;

/// Decision returned by the retry policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Give up; the job's completion handle rejects.
    NoRetry,
    /// Requeue the job after the given delay.
    RetryAfter(Duration),
}

/// Exponential backoff policy with caps.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Maximum number of run attempts per job (including the first).
    pub max_runs: u32,
    /// Base delay for backoff.
    pub base_delay: Duration,
    /// Upper bound on backoff delay.
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_runs: 3,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(30),
        }
    }
}

impl RetryPolicy {
    /// Decide what happens after a failed attempt.
    ///
    /// `runs` is the number of times the job has run so far (1 = the first
    /// attempt just failed). Returns `NoRetry` once the budget is spent.
    pub fn decide(&self, runs: u32) -> RetryDecision {
        if runs >= self.max_runs {
            return RetryDecision::NoRetry;
        }
        // base * 2^(runs-1), capped.
        let exp = 1u32 << runs.saturating_sub(1).min(8);
        let raw = self.base_delay.saturating_mul(exp);
        RetryDecision::RetryAfter(raw.min(self.max_delay))
    }
}
