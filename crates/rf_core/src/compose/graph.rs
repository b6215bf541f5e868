//! Composition graph data types.
//!
//! The graph is pure data: an ordered list of encoder operations plus the
//! mapping from graph outputs to the final video/audio streams. All
//! ffmpeg argument construction lives behind the encode adapter; nothing
//! here touches the filesystem or a process.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Stream label for the overlay output.
pub const VIDEO_OUT_LABEL: &str = "vout";
/// Stream label for the voice gain output.
pub const VOICE_GAIN_LABEL: &str = "voice_gain";
/// Stream label for the music gain output.
pub const MUSIC_GAIN_LABEL: &str = "music_gain";
/// Stream label for the mix output.
pub const MIX_LABEL: &str = "mix";

/// Identifies one of the input tracks available to the final compose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackSource {
    /// The avatar/primary video track (mandatory).
    PrimaryVideo,
    /// Optional background video composited under the primary.
    Background,
    /// The synthesized voice track (mandatory).
    Voice,
    /// Optional music bed.
    Music,
}

/// Reference to a stream: either a raw input track or the labeled output
/// of an earlier operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StreamRef {
    Track(TrackSource),
    Labeled(String),
}

impl StreamRef {
    /// The label, if this references an operation output.
    pub fn label(&self) -> Option<&str> {
        match self {
            Self::Labeled(l) => Some(l.as_str()),
            Self::Track(_) => None,
        }
    }
}

/// One encoder operation in the composition graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "op")]
pub enum RenderOp {
    /// Scale `top` to the target resolution and overlay it onto `base`
    /// at the origin.
    Overlay {
        base: TrackSource,
        top: TrackSource,
        scale_width: u32,
        scale_height: u32,
        label: String,
    },
    /// Apply a gain to one audio track.
    Gain {
        input: TrackSource,
        volume: f64,
        label: String,
    },
    /// Mix the labeled audio streams into one output.
    Mix {
        inputs: Vec<String>,
        dropout_transition_secs: u32,
        label: String,
    },
}

impl RenderOp {
    /// The label of this operation's output stream.
    pub fn label(&self) -> &str {
        match self {
            Self::Overlay { label, .. } | Self::Gain { label, .. } | Self::Mix { label, .. } => {
                label
            }
        }
    }
}

/// The ordered operation list plus output mapping consumed by the
/// encoder. Built fresh per job and never mutated after construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompositionGraph {
    /// Operations in execution order.
    pub ops: Vec<RenderOp>,
    /// Final video stream.
    pub video_out: StreamRef,
    /// Final audio stream.
    pub audio_out: StreamRef,
}

impl CompositionGraph {
    /// Number of overlay operations in the graph.
    pub fn overlay_count(&self) -> usize {
        self.ops
            .iter()
            .filter(|op| matches!(op, RenderOp::Overlay { .. }))
            .count()
    }

    /// Number of gain operations in the graph.
    pub fn gain_count(&self) -> usize {
        self.ops
            .iter()
            .filter(|op| matches!(op, RenderOp::Gain { .. }))
            .count()
    }

    /// Number of mix operations in the graph.
    pub fn mix_count(&self) -> usize {
        self.ops
            .iter()
            .filter(|op| matches!(op, RenderOp::Mix { .. }))
            .count()
    }
}

/// Inputs available to the final compose stage.
///
/// The primary video and voice tracks are mandatory and supplied at
/// construction, so the graph builder never sees an incomplete set.
#[derive(Debug, Clone, PartialEq)]
pub struct CompositionInputs {
    primary_video: PathBuf,
    voice: PathBuf,
    background: Option<PathBuf>,
    music: Option<PathBuf>,
    voice_gain: f64,
    music_gain: f64,
    target_width: u32,
    target_height: u32,
}

impl CompositionInputs {
    /// Create an input set from the two mandatory tracks.
    ///
    /// Defaults: no background, no music, voice gain 1.0, music gain 0.4,
    /// 1280x720 overlay target.
    pub fn new(primary_video: impl Into<PathBuf>, voice: impl Into<PathBuf>) -> Self {
        Self {
            primary_video: primary_video.into(),
            voice: voice.into(),
            background: None,
            music: None,
            voice_gain: 1.0,
            music_gain: 0.4,
            target_width: 1280,
            target_height: 720,
        }
    }

    /// Add a background video track.
    pub fn with_background(mut self, path: impl Into<PathBuf>) -> Self {
        self.background = Some(path.into());
        self
    }

    /// Add a music track.
    pub fn with_music(mut self, path: impl Into<PathBuf>) -> Self {
        self.music = Some(path.into());
        self
    }

    /// Set the voice gain.
    pub fn with_voice_gain(mut self, gain: f64) -> Self {
        self.voice_gain = gain;
        self
    }

    /// Set the music gain.
    pub fn with_music_gain(mut self, gain: f64) -> Self {
        self.music_gain = gain;
        self
    }

    /// Set the overlay target resolution.
    pub fn with_target(mut self, width: u32, height: u32) -> Self {
        self.target_width = width;
        self.target_height = height;
        self
    }

    pub fn primary_video(&self) -> &Path {
        &self.primary_video
    }

    pub fn voice(&self) -> &Path {
        &self.voice
    }

    pub fn background(&self) -> Option<&Path> {
        self.background.as_deref()
    }

    pub fn music(&self) -> Option<&Path> {
        self.music.as_deref()
    }

    pub fn voice_gain(&self) -> f64 {
        self.voice_gain
    }

    pub fn music_gain(&self) -> f64 {
        self.music_gain
    }

    pub fn target(&self) -> (u32, u32) {
        (self.target_width, self.target_height)
    }

    /// Resolve a track source to its file path, if present.
    pub fn track_path(&self, source: TrackSource) -> Option<&Path> {
        match source {
            TrackSource::PrimaryVideo => Some(self.primary_video.as_path()),
            TrackSource::Voice => Some(self.voice.as_path()),
            TrackSource::Background => self.background(),
            TrackSource::Music => self.music(),
        }
    }
}
