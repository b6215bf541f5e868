//! In-memory job store.
//!
//! Backs single-shot mode and tests so both route through the same
//! lifecycle manager as polling mode. Enforces the same contract as the
//! remote store: conditional claims and immutable terminal states.

use parking_lot::Mutex;

use crate::models::{JobRecord, JobStatus, JobUpdate};

use super::{JobStore, StoreResult};

/// In-memory job collection guarded by a single lock.
#[derive(Default)]
pub struct MemoryJobStore {
    jobs: Mutex<Vec<JobRecord>>,
}

impl MemoryJobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a job.
    pub fn insert(&self, job: JobRecord) {
        self.jobs.lock().push(job);
    }

    /// Get a snapshot of a job by id.
    pub fn get(&self, job_id: &str) -> Option<JobRecord> {
        self.jobs.lock().iter().find(|j| j.id == job_id).cloned()
    }

    /// Number of jobs held.
    pub fn len(&self) -> usize {
        self.jobs.lock().len()
    }

    /// Whether the store holds no jobs.
    pub fn is_empty(&self) -> bool {
        self.jobs.lock().is_empty()
    }
}

impl JobStore for MemoryJobStore {
    fn fetch_candidate(&self) -> StoreResult<Option<JobRecord>> {
        let jobs = self.jobs.lock();
        // Oldest queued first; insertion order breaks creation-time ties.
        let candidate = jobs
            .iter()
            .filter(|j| j.status == JobStatus::Queued)
            .min_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(candidate.cloned())
    }

    fn try_claim(&self, job_id: &str) -> StoreResult<bool> {
        let mut jobs = self.jobs.lock();
        match jobs.iter_mut().find(|j| j.id == job_id) {
            Some(job) if job.status == JobStatus::Queued => {
                job.status = JobStatus::Processing;
                job.progress = Some(0);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    fn update(&self, job_id: &str, update: &JobUpdate) -> StoreResult<()> {
        let mut jobs = self.jobs.lock();
        let Some(job) = jobs.iter_mut().find(|j| j.id == job_id) else {
            return Ok(());
        };

        if job.status.is_terminal() && update.status.is_some() {
            tracing::warn!(job_id, "ignoring status update on terminal job");
            return Ok(());
        }

        if let Some(status) = update.status {
            job.status = status;
        }
        if let Some(ref result_url) = update.result_url {
            job.result_url = Some(result_url.clone());
        }
        if let Some(ref error) = update.error {
            job.error = Some(error.clone());
        }
        if let Some(progress) = update.progress {
            job.progress = Some(progress);
        }
        if let Some(degraded) = update.degraded {
            job.degraded = Some(degraded);
        }
        Ok(())
    }
}
