//! Null (stub) engine variants.
//!
//! Each null engine satisfies the same trait as its real counterpart but
//! produces placeholder artifacts, so the orchestration core can run
//! end-to-end without real ML backends. Selected via
//! `engines.use_null_engines` in the settings.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use uuid::Uuid;

use crate::compose::{CompositionGraph, CompositionInputs, TrackSource};

use super::{
    AvatarBuilder, AvatarOutput, EncodeOutput, FrameArchive, LipSyncEngine, MediaEncoder,
    StageError, StageResult, VideoGenerator, VoiceSynthesizer,
};

const IMAGE_EXTENSIONS: [&str; 4] = ["jpg", "jpeg", "png", "webp"];

/// Frames the null lip-sync engine produces (two seconds at 25 fps).
const NULL_FRAME_COUNT: u32 = 50;

fn ensure_dir(dir: &Path) -> StageResult<()> {
    fs::create_dir_all(dir).map_err(|e| StageError::io_error("creating engine output dir", e))
}

fn write_placeholder(path: &Path, content: &str) -> StageResult<()> {
    let mut file =
        fs::File::create(path).map_err(|e| StageError::io_error("writing placeholder", e))?;
    file.write_all(content.as_bytes())
        .map_err(|e| StageError::io_error("writing placeholder", e))
}

/// Null voice backend: writes a placeholder wav.
pub struct NullVoiceEngine {
    out_dir: PathBuf,
}

impl NullVoiceEngine {
    pub fn new(out_dir: impl Into<PathBuf>) -> Self {
        Self {
            out_dir: out_dir.into(),
        }
    }
}

impl VoiceSynthesizer for NullVoiceEngine {
    fn name(&self) -> &str {
        "null-voice"
    }

    fn synthesize(&self, text: &str, voice_id: Option<&str>) -> StageResult<PathBuf> {
        ensure_dir(&self.out_dir)?;
        let out_path = self.out_dir.join(format!("{}.wav", Uuid::new_v4()));
        write_placeholder(
            &out_path,
            &format!("voice:{}:{}", voice_id.unwrap_or("default"), text),
        )?;
        Ok(out_path)
    }
}

/// Null avatar engine: scans the image directory and writes the file
/// list as the dataset. Zero usable images is a failure, matching the
/// real engine's contract.
pub struct NullAvatarEngine {
    out_dir: PathBuf,
}

impl NullAvatarEngine {
    pub fn new(out_dir: impl Into<PathBuf>) -> Self {
        Self {
            out_dir: out_dir.into(),
        }
    }
}

impl AvatarBuilder for NullAvatarEngine {
    fn name(&self) -> &str {
        "null-avatar"
    }

    fn build_avatar(&self, image_dir: &Path, name: &str) -> StageResult<AvatarOutput> {
        if image_dir.as_os_str().is_empty() {
            return Err(StageError::invalid_input(
                "no image directory provided for avatar creation",
            ));
        }

        let entries = fs::read_dir(image_dir)
            .map_err(|e| StageError::io_error("reading image directory", e))?;

        let mut images: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| {
                path.extension()
                    .and_then(|ext| ext.to_str())
                    .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
                    .unwrap_or(false)
            })
            .collect();
        images.sort();

        if images.is_empty() {
            return Err(StageError::engine_failed(
                self.name(),
                "no faces detected in any images",
            ));
        }

        ensure_dir(&self.out_dir)?;
        let data_path = self.out_dir.join(format!("{}_data.json", name));
        let json = serde_json::to_string(&images)
            .map_err(|e| StageError::engine_failed(self.name(), e.to_string()))?;
        write_placeholder(&data_path, &json)?;

        Ok(AvatarOutput {
            data_path,
            face_count: images.len() as u32,
        })
    }
}

/// Null lip-sync engine: emits a directory of numbered placeholder
/// frames. An empty avatar dataset is a failure.
pub struct NullLipSyncEngine {
    out_dir: PathBuf,
    fps: u32,
}

impl NullLipSyncEngine {
    pub fn new(out_dir: impl Into<PathBuf>, fps: u32) -> Self {
        Self {
            out_dir: out_dir.into(),
            fps,
        }
    }
}

impl LipSyncEngine for NullLipSyncEngine {
    fn name(&self) -> &str {
        "null-lipsync"
    }

    fn sync_frames(&self, avatar_data: &Path, audio: &Path) -> StageResult<FrameArchive> {
        if avatar_data.as_os_str().is_empty() {
            return Err(StageError::invalid_input("avatar data reference is empty"));
        }
        if audio.as_os_str().is_empty() {
            return Err(StageError::invalid_input("audio reference is empty"));
        }

        let data = fs::read_to_string(avatar_data)
            .map_err(|e| StageError::io_error("reading avatar dataset", e))?;
        let faces: Vec<PathBuf> = serde_json::from_str(&data).unwrap_or_default();
        if faces.is_empty() {
            return Err(StageError::engine_failed(
                self.name(),
                "avatar dataset contains zero frames",
            ));
        }

        let frames_dir = self.out_dir.join(format!("{}_frames", Uuid::new_v4()));
        ensure_dir(&frames_dir)?;
        for idx in 1..=NULL_FRAME_COUNT {
            let frame = frames_dir.join(format!("frame_{:05}.png", idx));
            write_placeholder(&frame, "frame")?;
        }

        Ok(FrameArchive {
            path: frames_dir,
            frame_count: NULL_FRAME_COUNT,
            fps: self.fps,
        })
    }
}

/// Null video engine: writes a placeholder clip.
pub struct NullVideoEngine {
    out_dir: PathBuf,
}

impl NullVideoEngine {
    pub fn new(out_dir: impl Into<PathBuf>) -> Self {
        Self {
            out_dir: out_dir.into(),
        }
    }
}

impl VideoGenerator for NullVideoEngine {
    fn name(&self) -> &str {
        "null-video"
    }

    fn generate(&self, prompt: &str, duration_secs: u32) -> StageResult<PathBuf> {
        if prompt.trim().is_empty() {
            return Err(StageError::invalid_input(
                "no prompt provided for video generation",
            ));
        }
        ensure_dir(&self.out_dir)?;
        let out_path = self.out_dir.join(format!("{}.mp4", Uuid::new_v4()));
        write_placeholder(&out_path, &format!("video:{}s:{}", duration_secs, prompt))?;
        Ok(out_path)
    }
}

/// Null encoder: copies the primary video through and fakes the frame
/// render, keeping the real adapter's input contract (referenced files
/// must exist).
pub struct NullEncoder;

impl MediaEncoder for NullEncoder {
    fn name(&self) -> &str {
        "null-encoder"
    }

    fn render_frames(&self, frames: &FrameArchive, out_dir: &Path) -> StageResult<PathBuf> {
        if frames.frame_count == 0 {
            return Err(StageError::invalid_input("frame archive is empty"));
        }
        if !frames.path.exists() {
            return Err(StageError::file_not_found(frames.path.to_string_lossy()));
        }
        ensure_dir(out_dir)?;
        let out_path = out_dir.join(format!("{}_silent.mp4", Uuid::new_v4()));
        write_placeholder(&out_path, "silent video")?;
        Ok(out_path)
    }

    fn encode(
        &self,
        inputs: &CompositionInputs,
        _graph: &CompositionGraph,
        out_dir: &Path,
    ) -> StageResult<EncodeOutput> {
        for source in [
            TrackSource::PrimaryVideo,
            TrackSource::Voice,
            TrackSource::Background,
            TrackSource::Music,
        ] {
            if let Some(path) = inputs.track_path(source) {
                if !path.exists() {
                    return Err(StageError::file_not_found(path.to_string_lossy()));
                }
            }
        }

        ensure_dir(out_dir)?;
        let out_path = out_dir.join(format!("{}.mp4", Uuid::new_v4()));
        fs::copy(inputs.primary_video(), &out_path)
            .map_err(|e| StageError::io_error("copying primary video", e))?;

        Ok(EncodeOutput {
            output_path: out_path,
            audio_merged: true,
            command: String::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn null_voice_writes_audio_file() {
        let dir = tempdir().unwrap();
        let engine = NullVoiceEngine::new(dir.path());
        let path = engine.synthesize("hello", Some("narrator")).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn null_avatar_fails_on_empty_directory() {
        let dir = tempdir().unwrap();
        let images = dir.path().join("photos");
        fs::create_dir_all(&images).unwrap();

        let engine = NullAvatarEngine::new(dir.path().join("out"));
        let err = engine.build_avatar(&images, "avatar").unwrap_err();
        assert!(matches!(err, StageError::EngineFailed { .. }));
    }

    #[test]
    fn null_avatar_counts_images() {
        let dir = tempdir().unwrap();
        let images = dir.path().join("photos");
        fs::create_dir_all(&images).unwrap();
        fs::write(images.join("a.jpg"), b"x").unwrap();
        fs::write(images.join("b.png"), b"x").unwrap();
        fs::write(images.join("notes.txt"), b"x").unwrap();

        let engine = NullAvatarEngine::new(dir.path().join("out"));
        let output = engine.build_avatar(&images, "avatar").unwrap();
        assert_eq!(output.face_count, 2);
        assert!(output.data_path.exists());
    }

    #[test]
    fn null_lipsync_produces_frames_from_dataset() {
        let dir = tempdir().unwrap();
        let data_path = dir.path().join("avatar_data.json");
        fs::write(&data_path, r#"["/photos/a.jpg"]"#).unwrap();
        let audio = dir.path().join("voice.wav");
        fs::write(&audio, b"x").unwrap();

        let engine = NullLipSyncEngine::new(dir.path().join("cache"), 25);
        let archive = engine.sync_frames(&data_path, &audio).unwrap();
        assert_eq!(archive.frame_count, NULL_FRAME_COUNT);
        assert!(archive.path.join("frame_00001.png").exists());
    }

    #[test]
    fn null_lipsync_rejects_empty_dataset() {
        let dir = tempdir().unwrap();
        let data_path = dir.path().join("avatar_data.json");
        fs::write(&data_path, "[]").unwrap();
        let audio = dir.path().join("voice.wav");
        fs::write(&audio, b"x").unwrap();

        let engine = NullLipSyncEngine::new(dir.path().join("cache"), 25);
        let err = engine.sync_frames(&data_path, &audio).unwrap_err();
        assert!(err.to_string().contains("zero frames"));
    }

    #[test]
    fn null_encoder_copies_primary_video() {
        let dir = tempdir().unwrap();
        let video = dir.path().join("a.mp4");
        let voice = dir.path().join("v.wav");
        fs::write(&video, b"video").unwrap();
        fs::write(&voice, b"audio").unwrap();

        let inputs = CompositionInputs::new(&video, &voice);
        let graph = crate::compose::build_graph(&inputs);

        let output = NullEncoder
            .encode(&inputs, &graph, &dir.path().join("out"))
            .unwrap();
        assert!(output.audio_merged);
        assert!(output.output_path.exists());
    }
}
