//! Worker loop: the top-level driver.
//!
//! Two operating modes share the same lifecycle manager and executor:
//! - **Polling**: an unbounded loop that claims and runs one job at a
//!   time, sleeping a fixed interval when the queue is empty.
//! - **Single-shot**: the caller seeds a `MemoryJobStore` with one job
//!   and calls `poll_once`, getting the terminal outcome synchronously.
//!
//! Shutdown is checked only at job boundaries so an in-flight job always
//! reaches a terminal state.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crate::store::StoreResult;

use super::lifecycle::{JobLifecycle, JobOutcome};

/// Handle for stopping a running worker at the next job boundary.
#[derive(Clone)]
pub struct ShutdownHandle {
    flag: Arc<AtomicBool>,
}

impl ShutdownHandle {
    /// Request shutdown. The worker stops before claiming another job.
    pub fn shutdown(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// Check if shutdown has been requested.
    pub fn is_shutdown(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// Single worker: claims one job at a time and runs it to a terminal
/// state before claiming the next.
pub struct Worker {
    lifecycle: JobLifecycle,
    poll_interval: Duration,
    shutdown: Arc<AtomicBool>,
}

impl Worker {
    pub fn new(lifecycle: JobLifecycle, poll_interval: Duration) -> Self {
        Self {
            lifecycle,
            poll_interval,
            shutdown: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Get a shutdown handle for this worker.
    pub fn shutdown_handle(&self) -> ShutdownHandle {
        ShutdownHandle {
            flag: Arc::clone(&self.shutdown),
        }
    }

    /// Claim and process at most one job.
    ///
    /// Returns `None` when nothing was claimed - either the queue is
    /// empty or another worker won the claim. No adapter is called in
    /// that case.
    pub fn poll_once(&self) -> StoreResult<Option<JobOutcome>> {
        match self.lifecycle.claim_next()? {
            Some(job) => Ok(Some(self.lifecycle.process(&job))),
            None => Ok(None),
        }
    }

    /// Run the polling loop until shutdown is requested.
    ///
    /// After finishing a job the worker polls again immediately; it only
    /// sleeps when the queue is empty or the store is unreachable.
    pub fn run_polling(&self) {
        tracing::info!(
            poll_interval_secs = self.poll_interval.as_secs(),
            "worker started in polling mode"
        );

        loop {
            if self.shutdown.load(Ordering::SeqCst) {
                tracing::info!("shutdown requested, stopping worker");
                break;
            }

            match self.poll_once() {
                Ok(Some(outcome)) => {
                    tracing::info!(
                        job_id = %outcome.job_id,
                        status = %outcome.status,
                        degraded = outcome.degraded,
                        "job finished"
                    );
                }
                Ok(None) => thread::sleep(self.poll_interval),
                Err(e) => {
                    tracing::warn!(error = %e, "job store poll failed");
                    thread::sleep(self.poll_interval);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use crate::models::{JobRecord, JobStatus, JobType};
    use crate::orchestrator::executor::PipelineExecutor;
    use crate::orchestrator::testing::{scripted_engines, total_calls, CallCounts, FailAt};
    use crate::store::MemoryJobStore;
    use serde_json::json;
    use tempfile::tempdir;

    fn worker_with(
        store: Arc<MemoryJobStore>,
        dir: &std::path::Path,
        poll_interval: Duration,
    ) -> (Worker, CallCounts) {
        let (engines, counts, _) = scripted_engines(FailAt::None, false);
        let mut settings = Settings::default();
        settings.paths.work_root = dir.join("work").to_string_lossy().to_string();
        settings.paths.logs_folder = dir.join("logs").to_string_lossy().to_string();
        settings.paths.output_folder = dir.join("out").to_string_lossy().to_string();

        let lifecycle = JobLifecycle::new(store, PipelineExecutor::new(engines), settings);
        (Worker::new(lifecycle, poll_interval), counts)
    }

    #[test]
    fn empty_queue_calls_no_adapter() {
        let dir = tempdir().unwrap();
        let store = Arc::new(MemoryJobStore::new());
        let (worker, counts) = worker_with(store, dir.path(), Duration::from_millis(10));

        assert!(worker.poll_once().unwrap().is_none());
        assert_eq!(total_calls(&counts), 0);
    }

    #[test]
    fn poll_once_runs_one_job_to_terminal_state() {
        let dir = tempdir().unwrap();
        let store = Arc::new(MemoryJobStore::new());
        store.insert(JobRecord::new(
            "job-1",
            JobType::Voice,
            json!({"text": "hi"}),
        ));
        let (worker, _) = worker_with(store.clone(), dir.path(), Duration::from_millis(10));

        let outcome = worker.poll_once().unwrap().unwrap();
        assert_eq!(outcome.status, JobStatus::Completed);
        assert_eq!(store.get("job-1").unwrap().status, JobStatus::Completed);
    }

    #[test]
    fn polling_loop_stops_on_shutdown() {
        let dir = tempdir().unwrap();
        let store = Arc::new(MemoryJobStore::new());
        let (worker, counts) = worker_with(store, dir.path(), Duration::from_millis(5));

        let handle = worker.shutdown_handle();
        let join = thread::spawn(move || {
            worker.run_polling();
            worker
        });

        // Let the loop spin against the empty queue, then stop it.
        thread::sleep(Duration::from_millis(30));
        handle.shutdown();
        let worker = join.join().unwrap();

        assert!(worker.shutdown_handle().is_shutdown());
        assert_eq!(total_calls(&counts), 0);
    }

    #[test]
    fn shutdown_before_start_exits_immediately() {
        let dir = tempdir().unwrap();
        let store = Arc::new(MemoryJobStore::new());
        store.insert(JobRecord::new(
            "job-1",
            JobType::Voice,
            json!({"text": "hi"}),
        ));
        let (worker, counts) = worker_with(store.clone(), dir.path(), Duration::from_millis(5));

        worker.shutdown_handle().shutdown();
        worker.run_polling();

        // The job was never claimed.
        assert_eq!(total_calls(&counts), 0);
        assert_eq!(store.get("job-1").unwrap().status, JobStatus::Queued);
    }
}
