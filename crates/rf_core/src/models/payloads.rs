//! Typed payloads decoded from job records.
//!
//! Each job type carries a JSON payload with a known schema. Unknown
//! fields are ignored; missing required fields fail the decode and are
//! reported as validation errors by the executor.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Payload for `voice` jobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoicePayload {
    /// Text to synthesize.
    pub text: String,
    /// Voice identifier; the adapter falls back to the configured default.
    #[serde(default)]
    pub voice_id: Option<String>,
}

/// Payload for `avatar` jobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvatarPayload {
    /// Directory of source face photos. `images` is accepted as an alias.
    #[serde(alias = "images")]
    pub image_dir: PathBuf,
    /// Name for the produced avatar dataset.
    #[serde(default = "default_avatar_name")]
    pub name: String,
}

fn default_avatar_name() -> String {
    "avatar".to_string()
}

/// Payload for `full_avatar` jobs (the composite chain).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FullAvatarPayload {
    /// Script the avatar speaks.
    pub script: String,
    /// Directory of source face photos. `image_dir` is accepted as an alias.
    #[serde(alias = "image_dir")]
    pub images: PathBuf,
    /// Voice identifier; the adapter falls back to the configured default.
    #[serde(default)]
    pub voice_id: Option<String>,
}

/// Payload for `video` jobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoPayload {
    /// Text prompt for the generation engine.
    pub prompt: String,
    /// Clip duration in seconds.
    #[serde(default = "default_video_duration")]
    pub duration: u32,
}

fn default_video_duration() -> u32 {
    5
}

/// Payload for `final` jobs (compose pre-rendered tracks).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinalRenderPayload {
    /// Synthesized voice track.
    pub voice_path: PathBuf,
    /// Pre-rendered avatar video (the primary video track).
    pub avatar_path: PathBuf,
    /// Optional background video to composite under the avatar.
    #[serde(default)]
    pub background_path: Option<PathBuf>,
    /// Optional music bed.
    #[serde(default)]
    pub music_path: Option<PathBuf>,
    /// Voice gain.
    #[serde(default = "default_voice_volume")]
    pub volume: f64,
    /// Music gain.
    #[serde(default = "default_music_volume")]
    pub music_volume: f64,
}

fn default_voice_volume() -> f64 {
    1.0
}

fn default_music_volume() -> f64 {
    0.4
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn voice_payload_requires_text() {
        let err = serde_json::from_value::<VoicePayload>(json!({"voice_id": "v1"}));
        assert!(err.is_err());

        let ok: VoicePayload = serde_json::from_value(json!({"text": "hello"})).unwrap();
        assert_eq!(ok.text, "hello");
        assert!(ok.voice_id.is_none());
    }

    #[test]
    fn avatar_payload_accepts_images_alias() {
        let p: AvatarPayload =
            serde_json::from_value(json!({"images": "/photos/jane"})).unwrap();
        assert_eq!(p.image_dir, PathBuf::from("/photos/jane"));
        assert_eq!(p.name, "avatar");
    }

    #[test]
    fn final_payload_defaults_volumes() {
        let p: FinalRenderPayload = serde_json::from_value(json!({
            "voice_path": "v.wav",
            "avatar_path": "a.mp4"
        }))
        .unwrap();
        assert_eq!(p.volume, 1.0);
        assert_eq!(p.music_volume, 0.4);
        assert!(p.background_path.is_none());
        assert!(p.music_path.is_none());
    }

    #[test]
    fn unknown_fields_are_ignored() {
        let p: VideoPayload = serde_json::from_value(json!({
            "prompt": "a sunset",
            "template": "cinematic"
        }))
        .unwrap();
        assert_eq!(p.prompt, "a sunset");
        assert_eq!(p.duration, 5);
    }
}
