//! Error types for the pipeline orchestrator.
//!
//! Stage failures bubble up unchanged except for the stage-name tag
//! added on composite jobs, so callers can tell "voice synthesis
//! failed" from "lip-sync failed" without inspecting payloads.

use thiserror::Error;

use crate::engines::StageError;

/// Top-level pipeline error with job context.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// A composite-job stage failed.
    #[error("Job '{job_id}' failed at stage '{stage}': {source}")]
    StageFailed {
        job_id: String,
        stage: String,
        #[source]
        source: StageError,
    },

    /// A single-stage job failed; the adapter result passes through
    /// unchanged.
    #[error(transparent)]
    Stage(#[from] StageError),
}

impl PipelineError {
    /// Tag a stage failure with its stage name.
    pub fn stage_failed(
        job_id: impl Into<String>,
        stage: impl Into<String>,
        source: StageError,
    ) -> Self {
        Self::StageFailed {
            job_id: job_id.into(),
            stage: stage.into(),
            source,
        }
    }
}

/// Result type for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_failed_names_the_stage() {
        let err = PipelineError::stage_failed(
            "job-1",
            "lip-sync",
            StageError::engine_failed("wav2lip", "no frames"),
        );
        let msg = err.to_string();
        assert!(msg.contains("job-1"));
        assert!(msg.contains("lip-sync"));
        assert!(msg.contains("no frames"));
    }

    #[test]
    fn transparent_variant_preserves_cause() {
        let err = PipelineError::from(StageError::invalid_input("no text"));
        assert_eq!(err.to_string(), "Invalid input: no text");
    }
}
