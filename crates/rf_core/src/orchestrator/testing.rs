//! Scripted engines and context helpers shared by orchestrator tests.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::Value;

use crate::compose::{CompositionGraph, CompositionInputs};
use crate::config::Settings;
use crate::engines::{
    AvatarBuilder, AvatarOutput, EncodeOutput, Engines, FrameArchive, LipSyncEngine, MediaEncoder,
    StageError, StageResult, VideoGenerator, VoiceSynthesizer,
};
use crate::logging::{JobLogger, LogConfig};
use crate::models::{JobRecord, JobType};

use super::types::RunContext;

/// Which scripted engine should fail, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FailAt {
    None,
    Voice,
    Avatar,
    LipSync,
    Encode,
}

/// Per-engine call counters.
#[derive(Clone, Default)]
pub(crate) struct CallCounts {
    pub voice: Arc<AtomicUsize>,
    pub avatar: Arc<AtomicUsize>,
    pub lipsync: Arc<AtomicUsize>,
    pub video: Arc<AtomicUsize>,
    pub render_frames: Arc<AtomicUsize>,
    pub encode: Arc<AtomicUsize>,
}

/// Captures the inputs/graph the encoder last received.
#[derive(Clone, Default)]
pub(crate) struct EncodeCapture {
    pub last: Arc<Mutex<Option<(CompositionInputs, CompositionGraph)>>>,
}

struct MockVoice {
    calls: Arc<AtomicUsize>,
    fail: bool,
}

impl VoiceSynthesizer for MockVoice {
    fn name(&self) -> &str {
        "mock-voice"
    }

    fn synthesize(&self, _text: &str, _voice_id: Option<&str>) -> StageResult<PathBuf> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            Err(StageError::engine_failed("mock-voice", "synthesis refused"))
        } else {
            Ok(PathBuf::from("/mock/voice.wav"))
        }
    }
}

struct MockAvatar {
    calls: Arc<AtomicUsize>,
    fail: bool,
}

impl AvatarBuilder for MockAvatar {
    fn name(&self) -> &str {
        "mock-avatar"
    }

    fn build_avatar(&self, _image_dir: &Path, _name: &str) -> StageResult<AvatarOutput> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            Err(StageError::engine_failed("mock-avatar", "no faces detected"))
        } else {
            Ok(AvatarOutput {
                data_path: PathBuf::from("/mock/avatar_data.json"),
                face_count: 3,
            })
        }
    }
}

struct MockLipSync {
    calls: Arc<AtomicUsize>,
    fail: bool,
}

impl LipSyncEngine for MockLipSync {
    fn name(&self) -> &str {
        "mock-lipsync"
    }

    fn sync_frames(&self, _avatar_data: &Path, _audio: &Path) -> StageResult<FrameArchive> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            Err(StageError::engine_failed("mock-lipsync", "inference failed"))
        } else {
            Ok(FrameArchive {
                path: PathBuf::from("/mock/frames"),
                frame_count: 50,
                fps: 25,
            })
        }
    }
}

struct MockVideo {
    calls: Arc<AtomicUsize>,
}

impl VideoGenerator for MockVideo {
    fn name(&self) -> &str {
        "mock-video"
    }

    fn generate(&self, _prompt: &str, _duration_secs: u32) -> StageResult<PathBuf> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(PathBuf::from("/mock/clip.mp4"))
    }
}

struct MockEncoder {
    render_calls: Arc<AtomicUsize>,
    encode_calls: Arc<AtomicUsize>,
    fail: bool,
    degrade: bool,
    capture: EncodeCapture,
}

impl MediaEncoder for MockEncoder {
    fn name(&self) -> &str {
        "mock-encoder"
    }

    fn render_frames(&self, _frames: &FrameArchive, _out_dir: &Path) -> StageResult<PathBuf> {
        self.render_calls.fetch_add(1, Ordering::SeqCst);
        Ok(PathBuf::from("/mock/silent.mp4"))
    }

    fn encode(
        &self,
        inputs: &CompositionInputs,
        graph: &CompositionGraph,
        _out_dir: &Path,
    ) -> StageResult<EncodeOutput> {
        self.encode_calls.fetch_add(1, Ordering::SeqCst);
        *self.capture.last.lock() = Some((inputs.clone(), graph.clone()));

        if self.fail {
            return Err(StageError::command_failed("ffmpeg", 1, "encode refused"));
        }
        if self.degrade {
            return Ok(EncodeOutput {
                output_path: inputs.primary_video().to_path_buf(),
                audio_merged: false,
                command: "mock".to_string(),
            });
        }
        Ok(EncodeOutput {
            output_path: PathBuf::from("/mock/final.mp4"),
            audio_merged: true,
            command: "mock".to_string(),
        })
    }
}

/// Build a scripted engine set.
pub(crate) fn scripted_engines(
    fail_at: FailAt,
    degrade_encode: bool,
) -> (Engines, CallCounts, EncodeCapture) {
    let counts = CallCounts::default();
    let capture = EncodeCapture::default();

    let engines = Engines {
        voice: Box::new(MockVoice {
            calls: counts.voice.clone(),
            fail: fail_at == FailAt::Voice,
        }),
        avatar: Box::new(MockAvatar {
            calls: counts.avatar.clone(),
            fail: fail_at == FailAt::Avatar,
        }),
        lipsync: Box::new(MockLipSync {
            calls: counts.lipsync.clone(),
            fail: fail_at == FailAt::LipSync,
        }),
        video: Box::new(MockVideo {
            calls: counts.video.clone(),
        }),
        encoder: Box::new(MockEncoder {
            render_calls: counts.render_frames.clone(),
            encode_calls: counts.encode.clone(),
            fail: fail_at == FailAt::Encode,
            degrade: degrade_encode,
            capture: capture.clone(),
        }),
    };

    (engines, counts, capture)
}

/// Sum of all engine invocations.
pub(crate) fn total_calls(counts: &CallCounts) -> usize {
    counts.voice.load(Ordering::SeqCst)
        + counts.avatar.load(Ordering::SeqCst)
        + counts.lipsync.load(Ordering::SeqCst)
        + counts.video.load(Ordering::SeqCst)
        + counts.render_frames.load(Ordering::SeqCst)
        + counts.encode.load(Ordering::SeqCst)
}

/// Build a run context rooted in a temp directory.
pub(crate) fn test_context(dir: &Path, job_type: JobType, payload: Value) -> RunContext {
    let job = JobRecord::new("job-test", job_type, payload);
    let logger = Arc::new(
        JobLogger::new("job-test", dir.join("logs"), LogConfig::default(), None).unwrap(),
    );
    RunContext::new(
        &job,
        Settings::default(),
        dir.join("work"),
        dir.join("out"),
        logger,
    )
}
