//! UJM core: a bounded-concurrency upload job manager.
//!
//! Callers submit an ordered batch of files plus a transport resolver; the
//! manager schedules jobs FIFO under a concurrency cap, tracks byte-weighted
//! progress, and retries failed jobs with exponential backoff while never
//! re-sending files already confirmed uploaded. The actual wire mechanics
//! live behind the [`transport::Transport`] trait, supplied by the host
//! application.

pub mod config;
pub mod logging;

pub mod completion;
pub mod job;
pub mod manager;
pub mod retry;
pub mod transport;
