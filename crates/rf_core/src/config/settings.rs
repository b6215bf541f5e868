//! Settings struct with TOML-based sections.
//!
//! Settings are organized into logical sections that map to TOML tables.
//! Each section can be updated independently for atomic section-level
//! updates. Secrets (store URL and service key) can also come from the
//! environment so they stay out of the config file.

use serde::{Deserialize, Serialize};

/// Environment override for the job store URL.
pub const STORE_URL_ENV: &str = "RF_STORE_URL";
/// Environment override for the job store service key.
pub const SERVICE_KEY_ENV: &str = "RF_SERVICE_KEY";

/// Root settings structure containing all configuration sections.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    /// Path-related settings.
    #[serde(default)]
    pub paths: PathSettings,

    /// Job store connection settings.
    #[serde(default)]
    pub store: StoreSettings,

    /// External engine endpoints.
    #[serde(default)]
    pub engines: EngineSettings,

    /// Final render parameters.
    #[serde(default)]
    pub render: RenderSettings,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingSettings,
}

/// Path configuration for output, work, and logs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathSettings {
    /// Output folder for final rendered files.
    #[serde(default = "default_output_folder")]
    pub output_folder: String,

    /// Root folder for per-job working files.
    #[serde(default = "default_work_root")]
    pub work_root: String,

    /// Folder for per-job log files.
    #[serde(default = "default_logs_folder")]
    pub logs_folder: String,
}

fn default_output_folder() -> String {
    "render_output".to_string()
}

fn default_work_root() -> String {
    ".work".to_string()
}

fn default_logs_folder() -> String {
    ".logs".to_string()
}

impl Default for PathSettings {
    fn default() -> Self {
        Self {
            output_folder: default_output_folder(),
            work_root: default_work_root(),
            logs_folder: default_logs_folder(),
        }
    }
}

/// Job store connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreSettings {
    /// Base URL of the job store. Empty means use `RF_STORE_URL`.
    #[serde(default)]
    pub url: String,

    /// Service key. Empty means use `RF_SERVICE_KEY`.
    #[serde(default)]
    pub api_key: String,

    /// Job table name.
    #[serde(default = "default_table")]
    pub table: String,

    /// Delay between polls when no work is queued, in seconds.
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,

    /// Timeout for store requests, in seconds. Store calls are short;
    /// engine calls are the long-running ones.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_table() -> String {
    "render_jobs".to_string()
}

fn default_poll_interval() -> u64 {
    3
}

fn default_request_timeout() -> u64 {
    10
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            url: String::new(),
            api_key: String::new(),
            table: default_table(),
            poll_interval_secs: default_poll_interval(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

impl StoreSettings {
    /// Store URL from config or the environment.
    pub fn resolved_url(&self) -> Option<String> {
        if !self.url.is_empty() {
            return Some(self.url.clone());
        }
        std::env::var(STORE_URL_ENV).ok().filter(|v| !v.is_empty())
    }

    /// Service key from config or the environment.
    pub fn resolved_api_key(&self) -> Option<String> {
        if !self.api_key.is_empty() {
            return Some(self.api_key.clone());
        }
        std::env::var(SERVICE_KEY_ENV).ok().filter(|v| !v.is_empty())
    }
}

/// External engine endpoints and defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineSettings {
    /// Voice backends in fallback priority order. An empty list means no
    /// synthesis backend is configured (voice jobs fail fast).
    #[serde(default = "default_voice_urls")]
    pub voice_urls: Vec<String>,

    /// Avatar extraction engine endpoint.
    #[serde(default = "default_avatar_url")]
    pub avatar_url: String,

    /// Lip-sync engine endpoint.
    #[serde(default = "default_lipsync_url")]
    pub lipsync_url: String,

    /// Video generation engine endpoint.
    #[serde(default = "default_video_url")]
    pub video_url: String,

    /// Path to the ffmpeg executable.
    #[serde(default = "default_ffmpeg_path")]
    pub ffmpeg_path: String,

    /// Voice used when a job does not name one.
    #[serde(default = "default_voice")]
    pub default_voice: String,

    /// Connect timeout for engine calls, in seconds. Engine calls
    /// themselves are long-running and not time-boxed by the worker.
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    /// Swap every engine for its null (stub) variant.
    #[serde(default)]
    pub use_null_engines: bool,
}

fn default_voice_urls() -> Vec<String> {
    vec!["http://127.0.0.1:5002".to_string()]
}

fn default_avatar_url() -> String {
    "http://127.0.0.1:5003".to_string()
}

fn default_lipsync_url() -> String {
    "http://127.0.0.1:5004".to_string()
}

fn default_video_url() -> String {
    "http://127.0.0.1:5005".to_string()
}

fn default_ffmpeg_path() -> String {
    "ffmpeg".to_string()
}

fn default_voice() -> String {
    "default".to_string()
}

fn default_connect_timeout() -> u64 {
    10
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            voice_urls: default_voice_urls(),
            avatar_url: default_avatar_url(),
            lipsync_url: default_lipsync_url(),
            video_url: default_video_url(),
            ffmpeg_path: default_ffmpeg_path(),
            default_voice: default_voice(),
            connect_timeout_secs: default_connect_timeout(),
            use_null_engines: false,
        }
    }
}

/// Final render parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderSettings {
    /// Overlay target width.
    #[serde(default = "default_target_width")]
    pub target_width: u32,

    /// Overlay target height.
    #[serde(default = "default_target_height")]
    pub target_height: u32,

    /// Frame rate for frame-archive renders.
    #[serde(default = "default_fps")]
    pub fps: u32,

    /// Default voice gain.
    #[serde(default = "default_voice_volume")]
    pub voice_volume: f64,

    /// Default music gain.
    #[serde(default = "default_music_volume")]
    pub music_volume: f64,

    /// Video codec.
    #[serde(default = "default_video_codec")]
    pub video_codec: String,

    /// Encoder preset.
    #[serde(default = "default_video_preset")]
    pub video_preset: String,

    /// Constant rate factor.
    #[serde(default = "default_video_crf")]
    pub video_crf: u32,

    /// Audio codec.
    #[serde(default = "default_audio_codec")]
    pub audio_codec: String,

    /// Audio bitrate.
    #[serde(default = "default_audio_bitrate")]
    pub audio_bitrate: String,
}

fn default_target_width() -> u32 {
    1280
}

fn default_target_height() -> u32 {
    720
}

fn default_fps() -> u32 {
    25
}

fn default_voice_volume() -> f64 {
    1.0
}

fn default_music_volume() -> f64 {
    0.4
}

fn default_video_codec() -> String {
    "libx264".to_string()
}

fn default_video_preset() -> String {
    "medium".to_string()
}

fn default_video_crf() -> u32 {
    18
}

fn default_audio_codec() -> String {
    "aac".to_string()
}

fn default_audio_bitrate() -> String {
    "192k".to_string()
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            target_width: default_target_width(),
            target_height: default_target_height(),
            fps: default_fps(),
            voice_volume: default_voice_volume(),
            music_volume: default_music_volume(),
            video_codec: default_video_codec(),
            video_preset: default_video_preset(),
            video_crf: default_video_crf(),
            audio_codec: default_audio_codec(),
            audio_bitrate: default_audio_bitrate(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Use compact per-job log format.
    #[serde(default = "default_true")]
    pub compact: bool,

    /// Progress update step percentage.
    #[serde(default = "default_progress_step")]
    pub progress_step: u32,

    /// Number of engine output lines to keep for the error tail.
    #[serde(default = "default_error_tail")]
    pub error_tail: u32,

    /// Show timestamps in per-job logs.
    #[serde(default = "default_true")]
    pub show_timestamps: bool,
}

fn default_true() -> bool {
    true
}

fn default_progress_step() -> u32 {
    20
}

fn default_error_tail() -> u32 {
    20
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            compact: true,
            progress_step: default_progress_step(),
            error_tail: default_error_tail(),
            show_timestamps: true,
        }
    }
}

/// Identifies one settings section for atomic section updates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSection {
    Paths,
    Store,
    Engines,
    Render,
    Logging,
}

impl ConfigSection {
    /// Get the TOML table name for this section.
    pub fn table_name(&self) -> &'static str {
        match self {
            ConfigSection::Paths => "paths",
            ConfigSection::Store => "store",
            ConfigSection::Engines => "engines",
            ConfigSection::Render => "render",
            ConfigSection::Logging => "logging",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_settings_serializes() {
        let settings = Settings::default();
        let toml = toml::to_string_pretty(&settings).unwrap();
        assert!(toml.contains("[paths]"));
        assert!(toml.contains("[store]"));
        assert!(toml.contains("output_folder"));
    }

    #[test]
    fn settings_round_trip() {
        let settings = Settings::default();
        let toml = toml::to_string_pretty(&settings).unwrap();
        let parsed: Settings = toml::from_str(&toml).unwrap();
        assert_eq!(parsed.paths.output_folder, settings.paths.output_folder);
        assert_eq!(parsed.store.poll_interval_secs, 3);
    }

    #[test]
    fn missing_fields_use_defaults() {
        let minimal = "[paths]\noutput_folder = \"custom_output\"";
        let parsed: Settings = toml::from_str(minimal).unwrap();
        assert_eq!(parsed.paths.output_folder, "custom_output");
        assert_eq!(parsed.logging.compact, true);
        assert_eq!(parsed.render.target_width, 1280);
        assert_eq!(parsed.render.music_volume, 0.4);
    }

    #[test]
    fn explicit_store_url_wins_over_env() {
        let settings = StoreSettings {
            url: "https://configured.example.com".to_string(),
            ..StoreSettings::default()
        };
        assert_eq!(
            settings.resolved_url().as_deref(),
            Some("https://configured.example.com")
        );
    }
}
