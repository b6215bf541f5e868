//! Stage adapters wrapping the external rendering engines.
//!
//! Each adapter exposes one narrow trait so the orchestrator stays
//! engine-agnostic. Adapters normalize engine-specific errors into
//! `StageError` and engine-specific outputs into path references; they
//! never retry internally (retry policy, if any, lives above the core).
//!
//! Every engine has a null (stub) variant behind the same trait so the
//! orchestration core runs without real ML backends.

use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::compose::{CompositionGraph, CompositionInputs};

mod avatar;
mod encoder;
mod http;
mod lipsync;
mod null;
mod video;
mod voice;

pub use avatar::HttpAvatarEngine;
pub use encoder::FfmpegEncoder;
pub use http::EngineClient;
pub use lipsync::HttpLipSyncEngine;
pub use null::{NullAvatarEngine, NullEncoder, NullLipSyncEngine, NullVideoEngine, NullVoiceEngine};
pub use video::HttpVideoEngine;
pub use voice::{HttpVoiceEngine, VoiceFallbackChain};

/// Error from a stage adapter.
#[derive(Error, Debug)]
pub enum StageError {
    /// Input validation failed; never retried.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// No backend is configured for this capability. Fatal configuration
    /// error, spelled out for operators.
    #[error("No {what} backend configured")]
    NotConfigured { what: String },

    /// The engine could not be reached (connect failure, timeout).
    #[error("{engine} unreachable: {message}")]
    EngineUnreachable { engine: String, message: String },

    /// The engine answered but reported a failure.
    #[error("{engine} failed: {message}")]
    EngineFailed { engine: String, message: String },

    /// An external command exited non-zero.
    #[error("{tool} failed with exit code {exit_code}: {message}")]
    CommandFailed {
        tool: String,
        exit_code: i32,
        message: String,
    },

    /// A required track file was not found.
    #[error("Required file not found: {path}")]
    FileNotFound { path: String },

    /// File I/O error with operation context.
    #[error("I/O error in {operation}: {source}")]
    Io {
        operation: String,
        #[source]
        source: io::Error,
    },
}

impl StageError {
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    pub fn not_configured(what: impl Into<String>) -> Self {
        Self::NotConfigured { what: what.into() }
    }

    pub fn unreachable(engine: impl Into<String>, message: impl Into<String>) -> Self {
        Self::EngineUnreachable {
            engine: engine.into(),
            message: message.into(),
        }
    }

    pub fn engine_failed(engine: impl Into<String>, message: impl Into<String>) -> Self {
        Self::EngineFailed {
            engine: engine.into(),
            message: message.into(),
        }
    }

    pub fn command_failed(
        tool: impl Into<String>,
        exit_code: i32,
        message: impl Into<String>,
    ) -> Self {
        Self::CommandFailed {
            tool: tool.into(),
            exit_code,
            message: message.into(),
        }
    }

    pub fn file_not_found(path: impl Into<String>) -> Self {
        Self::FileNotFound { path: path.into() }
    }

    pub fn io_error(operation: impl Into<String>, source: io::Error) -> Self {
        Self::Io {
            operation: operation.into(),
            source,
        }
    }
}

/// Result type for stage adapter operations.
pub type StageResult<T> = Result<T, StageError>;

/// Final outcome of a pipeline run handed back to the lifecycle manager.
///
/// `degraded` is only ever set by the encode adapter (video produced,
/// audio merge skipped) — no other stage produces a partial success.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageOutput {
    /// Reference to the produced output.
    pub path: PathBuf,
    /// Audio muxing was skipped; the result is video-only.
    pub degraded: bool,
}

impl StageOutput {
    /// A fully successful output.
    pub fn complete(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            degraded: false,
        }
    }

    /// A degraded output (video-only, mux skipped).
    pub fn degraded(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            degraded: true,
        }
    }
}

/// Output of the avatar extraction engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvatarOutput {
    /// Path to the per-face dataset.
    pub data_path: PathBuf,
    /// Number of usable faces found.
    pub face_count: u32,
}

/// A rendered frame sequence produced by the lip-sync engine,
/// consumable by the encoder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameArchive {
    /// Directory containing the numbered frames.
    pub path: PathBuf,
    /// Number of frames in the archive.
    pub frame_count: u32,
    /// Frame rate the frames were generated at.
    pub fps: u32,
}

/// Output of the encode adapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodeOutput {
    /// Path to the produced file. On a degraded outcome this is the
    /// video-only intermediate.
    pub output_path: PathBuf,
    /// Whether the audio merge succeeded.
    pub audio_merged: bool,
    /// The encoder command that was run (for diagnostics).
    pub command: String,
}

/// Speech synthesis engine.
pub trait VoiceSynthesizer: Send + Sync {
    /// Backend name (for logging and fallback diagnostics).
    fn name(&self) -> &str;

    /// Synthesize `text` and return the audio path. `voice_id` of `None`
    /// falls back to the adapter's configured default voice.
    fn synthesize(&self, text: &str, voice_id: Option<&str>) -> StageResult<PathBuf>;
}

/// Face/mesh extraction engine.
pub trait AvatarBuilder: Send + Sync {
    fn name(&self) -> &str;

    /// Build a per-face dataset from a directory of photos. Zero usable
    /// faces is a failure.
    fn build_avatar(&self, image_dir: &Path, name: &str) -> StageResult<AvatarOutput>;
}

/// Lip-sync inference engine.
pub trait LipSyncEngine: Send + Sync {
    fn name(&self) -> &str;

    /// Produce lip-synced frames for the avatar dataset and audio track.
    fn sync_frames(&self, avatar_data: &Path, audio: &Path) -> StageResult<FrameArchive>;
}

/// Clip generation engine.
pub trait VideoGenerator: Send + Sync {
    fn name(&self) -> &str;

    /// Generate a clip from a text prompt.
    fn generate(&self, prompt: &str, duration_secs: u32) -> StageResult<PathBuf>;
}

/// Media encoder (audio/video composition and muxing).
pub trait MediaEncoder: Send + Sync {
    fn name(&self) -> &str;

    /// Render a frame archive to a silent video in `out_dir`.
    fn render_frames(&self, frames: &FrameArchive, out_dir: &Path) -> StageResult<PathBuf>;

    /// Execute a composition graph against its input tracks, writing the
    /// result into `out_dir`.
    ///
    /// Fails if any referenced track file is missing. If video
    /// composition succeeds but the audio merge fails, returns the
    /// video-only intermediate with `audio_merged: false` — the only
    /// permitted partially-successful stage outcome.
    fn encode(
        &self,
        inputs: &CompositionInputs,
        graph: &CompositionGraph,
        out_dir: &Path,
    ) -> StageResult<EncodeOutput>;
}

/// The full adapter set handed to the pipeline executor.
pub struct Engines {
    pub voice: Box<dyn VoiceSynthesizer>,
    pub avatar: Box<dyn AvatarBuilder>,
    pub lipsync: Box<dyn LipSyncEngine>,
    pub video: Box<dyn VideoGenerator>,
    pub encoder: Box<dyn MediaEncoder>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_error_displays_context() {
        let err = StageError::command_failed("ffmpeg", 1, "unknown encoder");
        let msg = err.to_string();
        assert!(msg.contains("ffmpeg"));
        assert!(msg.contains("exit code 1"));
        assert!(msg.contains("unknown encoder"));
    }

    #[test]
    fn not_configured_names_capability() {
        let err = StageError::not_configured("voice synthesis");
        assert_eq!(err.to_string(), "No voice synthesis backend configured");
    }

    #[test]
    fn stage_output_degraded_flag() {
        assert!(!StageOutput::complete("/out/a.mp4").degraded);
        assert!(StageOutput::degraded("/out/a.mp4").degraded);
    }
}
