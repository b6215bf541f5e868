//! Media encoder adapter backed by ffmpeg.
//!
//! Translates a composition graph into ffmpeg invocations. The encode
//! runs in two passes:
//!
//! 1. **Video pass** — renders a frame archive to a silent video and/or
//!    applies the background overlay, producing the video-only
//!    intermediate. A failure here is a hard stage failure.
//! 2. **Audio pass** — applies the gain/mix operations and muxes the
//!    audio onto the intermediate. A non-zero ffmpeg exit here degrades
//!    the result to the video-only intermediate instead of discarding
//!    the render.
//!
//! All process-argument construction lives here; the graph itself stays
//! pure data.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use uuid::Uuid;

use crate::compose::{CompositionGraph, CompositionInputs, RenderOp, TrackSource};
use crate::config::RenderSettings;

use super::{EncodeOutput, FrameArchive, MediaEncoder, StageError, StageResult};

/// ffmpeg-backed encoder.
pub struct FfmpegEncoder {
    ffmpeg_path: String,
    render: RenderSettings,
}

impl FfmpegEncoder {
    pub fn new(ffmpeg_path: impl Into<String>, render: RenderSettings) -> Self {
        Self {
            ffmpeg_path: ffmpeg_path.into(),
            render,
        }
    }

    /// Run ffmpeg, mapping a non-zero exit to `CommandFailed`.
    fn run_ffmpeg(&self, args: &[String]) -> StageResult<()> {
        tracing::debug!("$ {} {}", self.ffmpeg_path, args.join(" "));

        let output = Command::new(&self.ffmpeg_path)
            .args(args)
            .output()
            .map_err(|e| StageError::io_error("executing ffmpeg", e))?;

        let exit_code = output.status.code().unwrap_or(-1);
        if exit_code != 0 {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(StageError::command_failed(
                "ffmpeg",
                exit_code,
                stderr_tail(&stderr, 5),
            ));
        }
        Ok(())
    }

    fn video_codec_args(&self) -> Vec<String> {
        vec![
            "-c:v".to_string(),
            self.render.video_codec.clone(),
            "-preset".to_string(),
            self.render.video_preset.clone(),
            "-crf".to_string(),
            self.render.video_crf.to_string(),
        ]
    }

    fn audio_codec_args(&self) -> Vec<String> {
        vec![
            "-c:a".to_string(),
            self.render.audio_codec.clone(),
            "-b:a".to_string(),
            self.render.audio_bitrate.clone(),
        ]
    }

    /// Run the overlay pass, returning the composite path.
    fn run_video_pass(
        &self,
        inputs: &CompositionInputs,
        overlay: &RenderOp,
        out_dir: &Path,
        out_id: &Uuid,
    ) -> StageResult<PathBuf> {
        let background = inputs
            .background()
            .ok_or_else(|| StageError::invalid_input("overlay operation without background track"))?;

        let composite = out_dir.join(format!("{}_composite.mp4", out_id));
        let filter = overlay_filter(overlay)
            .ok_or_else(|| StageError::invalid_input("expected overlay operation"))?;

        let mut args = vec![
            "-y".to_string(),
            "-i".to_string(),
            background.to_string_lossy().to_string(),
            "-i".to_string(),
            inputs.primary_video().to_string_lossy().to_string(),
            "-filter_complex".to_string(),
            filter,
            "-map".to_string(),
            format!("[{}]", overlay.label()),
        ];
        args.extend(self.video_codec_args());
        args.push(composite.to_string_lossy().to_string());

        self.run_ffmpeg(&args)?;
        Ok(composite)
    }
}

impl MediaEncoder for FfmpegEncoder {
    fn name(&self) -> &str {
        "ffmpeg"
    }

    fn render_frames(&self, frames: &FrameArchive, out_dir: &Path) -> StageResult<PathBuf> {
        if frames.frame_count == 0 {
            return Err(StageError::invalid_input("frame archive is empty"));
        }
        if !frames.path.exists() {
            return Err(StageError::file_not_found(frames.path.to_string_lossy()));
        }
        fs::create_dir_all(out_dir)
            .map_err(|e| StageError::io_error("creating output directory", e))?;

        let out_path = out_dir.join(format!("{}_silent.mp4", Uuid::new_v4()));
        let pattern = frames.path.join("frame_%05d.png");

        let mut args = vec![
            "-y".to_string(),
            "-framerate".to_string(),
            frames.fps.to_string(),
            "-i".to_string(),
            pattern.to_string_lossy().to_string(),
        ];
        args.extend(self.video_codec_args());
        args.push("-pix_fmt".to_string());
        args.push("yuv420p".to_string());
        args.push(out_path.to_string_lossy().to_string());

        self.run_ffmpeg(&args)?;
        Ok(out_path)
    }

    fn encode(
        &self,
        inputs: &CompositionInputs,
        graph: &CompositionGraph,
        out_dir: &Path,
    ) -> StageResult<EncodeOutput> {
        // Fail fast when any referenced track file is missing.
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

        fs::create_dir_all(out_dir)
            .map_err(|e| StageError::io_error("creating output directory", e))?;

        let out_id = Uuid::new_v4();

        // Video pass: background overlay when the graph asks for it.
        let overlay = graph
            .ops
            .iter()
            .find(|op| matches!(op, RenderOp::Overlay { .. }));
        let (video_ref, intermediate) = match overlay {
            Some(op) => {
                let composite = self.run_video_pass(inputs, op, out_dir, &out_id)?;
                (composite.clone(), Some(composite))
            }
            None => (inputs.primary_video().to_path_buf(), None),
        };

        // Audio pass: gains, optional mix, mux onto the video reference.
        let (filter, audio_label) = audio_filter(graph)?;
        let out_path = out_dir.join(format!("{}.mp4", out_id));

        let mut args = vec![
            "-y".to_string(),
            "-i".to_string(),
            video_ref.to_string_lossy().to_string(),
            "-i".to_string(),
            inputs.voice().to_string_lossy().to_string(),
        ];
        if let Some(music) = inputs.music() {
            args.push("-i".to_string());
            args.push(music.to_string_lossy().to_string());
        }
        args.push("-filter_complex".to_string());
        args.push(filter);
        args.push("-map".to_string());
        args.push("0:v".to_string());
        args.push("-map".to_string());
        args.push(format!("[{}]", audio_label));
        args.extend(self.video_codec_args());
        args.extend(self.audio_codec_args());
        args.push(out_path.to_string_lossy().to_string());

        let command = format!("{} {}", self.ffmpeg_path, args.join(" "));

        match self.run_ffmpeg(&args) {
            Ok(()) => {
                // The composite intermediate is no longer needed once the
                // mux succeeded; cleanup must never block completion.
                if let Some(tmp) = intermediate {
                    if let Err(e) = fs::remove_file(&tmp) {
                        tracing::warn!(path = %tmp.display(), error = %e, "intermediate cleanup failed");
                    }
                }
                Ok(EncodeOutput {
                    output_path: out_path,
                    audio_merged: true,
                    command,
                })
            }
            Err(StageError::CommandFailed { exit_code, message, .. }) => {
                // The render already succeeded; keep the video-only
                // intermediate rather than discarding it over the mux.
                tracing::warn!(
                    exit_code,
                    %message,
                    "audio mux failed, returning video-only output"
                );
                Ok(EncodeOutput {
                    output_path: video_ref,
                    audio_merged: false,
                    command,
                })
            }
            Err(e) => Err(e),
        }
    }
}

/// Filter string for the overlay pass. Input 0 is the background, input
/// 1 the primary video.
fn overlay_filter(op: &RenderOp) -> Option<String> {
    match op {
        RenderOp::Overlay {
            scale_width,
            scale_height,
            label,
            ..
        } => Some(format!(
            "[1:v]scale={}:{}[scaled];[0:v][scaled]overlay=0:0[{}]",
            scale_width, scale_height, label
        )),
        _ => None,
    }
}

/// Build the audio-pass `-filter_complex` string and the output label.
///
/// Audio input indices: 0 is the video reference, 1 the voice track,
/// 2 the music track (when present).
fn audio_filter(graph: &CompositionGraph) -> StageResult<(String, String)> {
    let mut parts = Vec::new();

    for op in &graph.ops {
        match op {
            RenderOp::Gain {
                input,
                volume,
                label,
            } => {
                let idx = match input {
                    TrackSource::Voice => 1,
                    TrackSource::Music => 2,
                    other => {
                        return Err(StageError::invalid_input(format!(
                            "gain over non-audio track {:?}",
                            other
                        )))
                    }
                };
                parts.push(format!("[{}:a]volume={}[{}]", idx, volume, label));
            }
            RenderOp::Mix {
                inputs,
                dropout_transition_secs,
                label,
            } => {
                let streams: String = inputs.iter().map(|l| format!("[{}]", l)).collect();
                parts.push(format!(
                    "{}amix=inputs={}:dropout_transition={}[{}]",
                    streams,
                    inputs.len(),
                    dropout_transition_secs,
                    label
                ));
            }
            RenderOp::Overlay { .. } => {} // handled in the video pass
        }
    }

    let audio_label = graph
        .audio_out
        .label()
        .ok_or_else(|| StageError::invalid_input("composition graph has unlabeled audio output"))?
        .to_string();

    Ok((parts.join(";"), audio_label))
}

/// Last `n` non-empty lines of command stderr.
fn stderr_tail(stderr: &str, n: usize) -> String {
    let lines: Vec<&str> = stderr.lines().filter(|l| !l.trim().is_empty()).collect();
    let start = lines.len().saturating_sub(n);
    lines[start..].join("\n")
}
