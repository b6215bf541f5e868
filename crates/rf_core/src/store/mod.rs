//! Job store clients.
//!
//! The store is a remote, eventually consistent collection of job
//! records. Mutual exclusion on a job relies entirely on the store's
//! conditional update: `queued -> processing` only succeeds while the
//! row is still `queued`, and a worker whose claim is rejected abandons
//! the job without side effects.

use thiserror::Error;

use crate::models::{JobRecord, JobUpdate};

mod http;
mod memory;

pub use http::HttpJobStore;
pub use memory::MemoryJobStore;

/// Errors from job store operations.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Store URL or credentials are missing.
    #[error("job store not configured: {0}")]
    NotConfigured(String),

    /// Transport-level failure (connect, timeout, TLS).
    #[error("store request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The store answered with a non-success status.
    #[error("store returned status {status}: {body}")]
    Failed { status: u16, body: String },
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Persisted, queryable collection of job records.
///
/// Implementations: `HttpJobStore` (remote, PostgREST-style) and
/// `MemoryJobStore` (single-shot mode and tests).
pub trait JobStore: Send + Sync {
    /// Fetch the oldest `queued` job, if any. Does not claim it.
    fn fetch_candidate(&self) -> StoreResult<Option<JobRecord>>;

    /// Atomically transition a job from `queued` to `processing` with
    /// progress 0. Returns `false` when the job was no longer `queued`
    /// (another worker won the claim, or the job reached a terminal
    /// state).
    fn try_claim(&self, job_id: &str) -> StoreResult<bool>;

    /// Apply a partial update to a job. Only supplied fields change.
    fn update(&self, job_id: &str, update: &JobUpdate) -> StoreResult<()>;
}
