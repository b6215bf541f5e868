//! Job lifecycle manager.
//!
//! Owns the claim -> processing -> terminal state machine. The claim is
//! a conditional store update issued before any stage runs; a rejected
//! claim abandons the job with no side effects. The lifecycle manager is
//! the single point that converts an executor result into a persisted
//! terminal status - no failure leaves a job `processing` indefinitely.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;

use crate::config::Settings;
use crate::engines::StageOutput;
use crate::logging::{JobLogger, LogConfig};
use crate::models::{JobRecord, JobStatus, JobUpdate};
use crate::store::{JobStore, StoreResult};

use super::executor::PipelineExecutor;
use super::types::{ProgressCallback, RunContext, RunState};

/// Result of processing a single job to a terminal state.
#[derive(Debug, Clone, Serialize)]
pub struct JobOutcome {
    /// Job that was processed.
    pub job_id: String,
    /// Terminal status reached.
    pub status: JobStatus,
    /// Result reference (if completed).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result_path: Option<PathBuf>,
    /// Audio muxing was skipped; the result is video-only.
    pub degraded: bool,
    /// Failure cause (if errored).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl JobOutcome {
    /// A completed job.
    pub fn completed(job_id: impl Into<String>, output: &StageOutput) -> Self {
        Self {
            job_id: job_id.into(),
            status: JobStatus::Completed,
            result_path: Some(output.path.clone()),
            degraded: output.degraded,
            error: None,
        }
    }

    /// A failed job.
    pub fn failed(job_id: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            job_id: job_id.into(),
            status: JobStatus::Error,
            result_path: None,
            degraded: false,
            error: Some(error.into()),
        }
    }

    /// Whether the job completed (possibly degraded).
    pub fn success(&self) -> bool {
        self.status == JobStatus::Completed
    }
}

/// Claims jobs and runs them through the pipeline executor.
pub struct JobLifecycle {
    store: Arc<dyn JobStore>,
    executor: PipelineExecutor,
    settings: Settings,
}

impl JobLifecycle {
    pub fn new(store: Arc<dyn JobStore>, executor: PipelineExecutor, settings: Settings) -> Self {
        Self {
            store,
            executor,
            settings,
        }
    }

    /// Claim the oldest queued job, if any.
    ///
    /// Returns `None` both when the queue is empty and when the claim
    /// was lost to another worker - in the latter case the job is
    /// abandoned before any adapter call.
    pub fn claim_next(&self) -> StoreResult<Option<JobRecord>> {
        let Some(mut job) = self.store.fetch_candidate()? else {
            return Ok(None);
        };

        if !self.store.try_claim(&job.id)? {
            tracing::debug!(job_id = %job.id, "claim rejected, abandoning job");
            return Ok(None);
        }

        job.status = JobStatus::Processing;
        job.progress = Some(0);
        Ok(Some(job))
    }

    /// Run a claimed job to a terminal state and persist the result.
    pub fn process(&self, job: &JobRecord) -> JobOutcome {
        tracing::info!(job_id = %job.id, job_type = %job.job_type, "processing job");

        let work_dir = Path::new(&self.settings.paths.work_root).join(&job.id);
        if let Err(e) = fs::create_dir_all(&work_dir) {
            return self.fail(&job.id, format!("Failed to create work directory: {}", e));
        }

        let logger = match JobLogger::new(
            &job.id,
            &self.settings.paths.logs_folder,
            self.log_config(),
            None,
        ) {
            Ok(logger) => Arc::new(logger),
            Err(e) => return self.fail(&job.id, format!("Failed to create job logger: {}", e)),
        };

        let ctx = RunContext::new(
            job,
            self.settings.clone(),
            work_dir,
            PathBuf::from(&self.settings.paths.output_folder),
            Arc::clone(&logger),
        )
        .with_progress_callback(self.progress_callback(&job.id));

        let mut state = RunState::new(&job.id);
        logger.info(&format!("Starting job {} ({})", job.id, job.job_type));

        match self.executor.execute(&ctx, &mut state) {
            Ok(output) => {
                let result = output.path.to_string_lossy().to_string();
                logger.success(&format!("Job completed: {}", result));
                self.persist(&job.id, JobUpdate::completed(&result, output.degraded));
                JobOutcome::completed(&job.id, &output)
            }
            Err(e) => {
                let cause = e.to_string();
                logger.error(&cause);
                self.fail(&job.id, cause)
            }
        }
    }

    fn fail(&self, job_id: &str, cause: String) -> JobOutcome {
        tracing::warn!(job_id, error = %cause, "job failed");
        self.persist(job_id, JobUpdate::failed(&cause));
        JobOutcome::failed(job_id, cause)
    }

    /// Persist a terminal update. A store failure here is logged, not
    /// raised: the outcome is already decided and will be reported to
    /// the caller regardless.
    fn persist(&self, job_id: &str, update: JobUpdate) {
        if let Err(e) = self.store.update(job_id, &update) {
            tracing::error!(job_id, error = %e, "failed to persist terminal status");
        }
    }

    fn log_config(&self) -> LogConfig {
        let logging = &self.settings.logging;
        LogConfig {
            compact: logging.compact,
            progress_step: logging.progress_step,
            error_tail: logging.error_tail as usize,
            show_timestamps: logging.show_timestamps,
            ..LogConfig::default()
        }
    }

    /// Best-effort progress reporting to the store.
    fn progress_callback(&self, job_id: &str) -> ProgressCallback {
        let store = Arc::clone(&self.store);
        let job_id = job_id.to_string();
        Box::new(move |percent, message| {
            tracing::debug!(job_id = %job_id, percent, message, "progress");
            if let Err(e) = store.update(&job_id, &JobUpdate::progress(percent)) {
                tracing::warn!(job_id = %job_id, error = %e, "progress update failed");
            }
        })
    }
}
