//! Core types for the pipeline orchestrator.

use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::Settings;
use crate::logging::JobLogger;
use crate::models::{JobRecord, JobType};

/// Progress callback type for reporting pipeline progress.
///
/// Arguments: (percent_complete, message)
pub type ProgressCallback = Box<dyn Fn(u8, &str) + Send + Sync>;

/// Read-only context passed through a pipeline run.
///
/// Contains the job and shared resources that stages can read but not
/// modify. Mutable state goes in `RunState`.
pub struct RunContext {
    /// Job identifier.
    pub job_id: String,
    /// Job type, selects the pipeline.
    pub job_type: JobType,
    /// Raw job payload.
    pub payload: Value,
    /// Worker settings.
    pub settings: Settings,
    /// Job-specific working directory (under the work root).
    pub work_dir: PathBuf,
    /// Output directory for final files.
    pub output_dir: PathBuf,
    /// Per-job logger.
    pub logger: Arc<JobLogger>,
    /// Optional progress callback.
    progress_callback: Option<ProgressCallback>,
}

impl RunContext {
    /// Create a context for a claimed job.
    pub fn new(
        job: &JobRecord,
        settings: Settings,
        work_dir: PathBuf,
        output_dir: PathBuf,
        logger: Arc<JobLogger>,
    ) -> Self {
        Self {
            job_id: job.id.clone(),
            job_type: job.job_type,
            payload: job.payload.clone(),
            settings,
            work_dir,
            output_dir,
            logger,
            progress_callback: None,
        }
    }

    /// Set the progress callback.
    pub fn with_progress_callback(mut self, callback: ProgressCallback) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    /// Report progress to the callback (if set). Best-effort.
    pub fn report_progress(&self, percent: u8, message: &str) {
        self.logger.progress(percent as u32);
        if let Some(ref callback) = self.progress_callback {
            callback(percent, message);
        }
    }
}

/// Mutable run state that accumulates results from pipeline stages.
///
/// This is the write-once manifest: stages add new data but never
/// overwrite earlier sections. Each stage's output is stored in its own
/// slot so later stages can thread it into their inputs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunState {
    /// Job identifier.
    pub job_id: String,
    /// When the run started.
    pub started_at: Option<String>,
    /// Voice synthesis output.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub voice: Option<VoiceStageOutput>,
    /// Avatar extraction output.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar: Option<AvatarStageOutput>,
    /// Lip-sync output.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lipsync: Option<LipSyncStageOutput>,
    /// Final encode output.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub encode: Option<EncodeStageOutput>,
}

impl RunState {
    /// Create a new run state for a job.
    pub fn new(job_id: impl Into<String>) -> Self {
        Self {
            job_id: job_id.into(),
            started_at: Some(chrono::Utc::now().to_rfc3339()),
            ..Default::default()
        }
    }

    /// Check if voice synthesis completed.
    pub fn has_voice(&self) -> bool {
        self.voice.is_some()
    }

    /// Check if avatar extraction completed.
    pub fn has_avatar(&self) -> bool {
        self.avatar.is_some()
    }

    /// Check if lip-sync completed.
    pub fn has_lipsync(&self) -> bool {
        self.lipsync.is_some()
    }
}

/// Output from the voice synthesis stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoiceStageOutput {
    /// Path to the synthesized audio.
    pub audio_path: PathBuf,
}

/// Output from the avatar extraction stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvatarStageOutput {
    /// Path to the per-face dataset.
    pub data_path: PathBuf,
    /// Number of usable faces found.
    pub face_count: u32,
}

/// Output from the lip-sync stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LipSyncStageOutput {
    /// Directory of rendered frames.
    pub frames_path: PathBuf,
    /// Number of frames produced.
    pub frame_count: u32,
    /// Frame rate of the archive.
    pub fps: u32,
}

/// Output from the final encode stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncodeStageOutput {
    /// Path to the produced file.
    pub output_path: PathBuf,
    /// Whether the audio merge succeeded.
    pub audio_merged: bool,
    /// The encoder command that was run.
    pub command: String,
}
