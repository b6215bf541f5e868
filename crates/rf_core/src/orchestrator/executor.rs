//! Pipeline executor: dispatches a claimed job to its stage sequence.
//!
//! Simple job types invoke exactly one adapter and return its result
//! unchanged. `full_avatar` runs four stages in strict sequence - each
//! stage's output is a required input to the next, so execution is
//! sequential by construction and halts at the first failure with the
//! failing stage's name tagged onto the error.

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::compose::{build_graph, CompositionInputs};
use crate::engines::{Engines, StageError, StageOutput, StageResult};
use crate::models::{
    AvatarPayload, FinalRenderPayload, FullAvatarPayload, JobType, VideoPayload, VoicePayload,
};

use super::errors::{PipelineError, PipelineResult};
use super::types::{
    AvatarStageOutput, EncodeStageOutput, LipSyncStageOutput, RunContext, RunState,
    VoiceStageOutput,
};

/// Stage names used in logs and failure tags.
pub const STAGE_VOICE: &str = "voice";
pub const STAGE_AVATAR: &str = "avatar";
pub const STAGE_LIPSYNC: &str = "lip-sync";
pub const STAGE_RENDER: &str = "render";

/// Executes a single job's stage sequence against the engine adapters.
pub struct PipelineExecutor {
    engines: Engines,
}

impl PipelineExecutor {
    pub fn new(engines: Engines) -> Self {
        Self { engines }
    }

    /// Run the job described by `ctx` to completion or first failure.
    pub fn execute(&self, ctx: &RunContext, state: &mut RunState) -> PipelineResult<StageOutput> {
        match ctx.job_type {
            JobType::Voice => Ok(self.run_voice(ctx, state)?),
            JobType::Avatar => Ok(self.run_avatar(ctx, state)?),
            JobType::Video => Ok(self.run_video(ctx)?),
            JobType::Final => Ok(self.run_final(ctx, state)?),
            JobType::FullAvatar => self.run_full_avatar(ctx, state),
        }
    }

    fn run_voice(&self, ctx: &RunContext, state: &mut RunState) -> StageResult<StageOutput> {
        let payload: VoicePayload = decode_payload("voice", &ctx.payload)?;
        ctx.logger.stage(STAGE_VOICE);

        let audio_path = self
            .engines
            .voice
            .synthesize(&payload.text, payload.voice_id.as_deref())?;
        state.voice = Some(VoiceStageOutput {
            audio_path: audio_path.clone(),
        });
        Ok(StageOutput::complete(audio_path))
    }

    fn run_avatar(&self, ctx: &RunContext, state: &mut RunState) -> StageResult<StageOutput> {
        let payload: AvatarPayload = decode_payload("avatar", &ctx.payload)?;
        ctx.logger.stage(STAGE_AVATAR);

        let output = self
            .engines
            .avatar
            .build_avatar(&payload.image_dir, &payload.name)?;
        ctx.logger
            .info(&format!("Avatar created from {} face(s)", output.face_count));
        state.avatar = Some(AvatarStageOutput {
            data_path: output.data_path.clone(),
            face_count: output.face_count,
        });
        Ok(StageOutput::complete(output.data_path))
    }

    fn run_video(&self, ctx: &RunContext) -> StageResult<StageOutput> {
        let payload: VideoPayload = decode_payload("video", &ctx.payload)?;
        ctx.logger.stage("video");

        let clip = self
            .engines
            .video
            .generate(&payload.prompt, payload.duration)?;
        Ok(StageOutput::complete(clip))
    }

    /// Compose pre-rendered tracks. This is the degenerate render path
    /// where the frame sequence is already encoded.
    fn run_final(&self, ctx: &RunContext, state: &mut RunState) -> StageResult<StageOutput> {
        let payload: FinalRenderPayload = decode_payload("final", &ctx.payload)?;
        ctx.logger.stage(STAGE_RENDER);

        let render = &ctx.settings.render;
        let mut inputs = CompositionInputs::new(&payload.avatar_path, &payload.voice_path)
            .with_voice_gain(payload.volume)
            .with_music_gain(payload.music_volume)
            .with_target(render.target_width, render.target_height);
        if let Some(ref background) = payload.background_path {
            inputs = inputs.with_background(background);
        }
        if let Some(ref music) = payload.music_path {
            inputs = inputs.with_music(music);
        }

        let graph = build_graph(&inputs);
        ctx.logger.info(&format!(
            "Composition graph: {} op(s), {} overlay, {} mix",
            graph.ops.len(),
            graph.overlay_count(),
            graph.mix_count()
        ));

        let output = self.engines.encoder.encode(&inputs, &graph, &ctx.output_dir)?;
        self.record_encode(ctx, state, output)
    }

    /// The composite chain: voice -> avatar -> lip-sync -> render.
    fn run_full_avatar(
        &self,
        ctx: &RunContext,
        state: &mut RunState,
    ) -> PipelineResult<StageOutput> {
        let payload: FullAvatarPayload = decode_payload("full_avatar", &ctx.payload)?;

        ctx.report_progress(0, "starting full avatar pipeline");
        let audio_path = self.stage(ctx, STAGE_VOICE, || {
            self.engines
                .voice
                .synthesize(&payload.script, payload.voice_id.as_deref())
        })?;
        state.voice = Some(VoiceStageOutput {
            audio_path: audio_path.clone(),
        });

        ctx.report_progress(25, "voice synthesized");
        let avatar = self.stage(ctx, STAGE_AVATAR, || {
            self.engines.avatar.build_avatar(&payload.images, "avatar")
        })?;
        state.avatar = Some(AvatarStageOutput {
            data_path: avatar.data_path.clone(),
            face_count: avatar.face_count,
        });

        ctx.report_progress(50, "avatar mesh created");
        let frames = self.stage(ctx, STAGE_LIPSYNC, || {
            self.engines
                .lipsync
                .sync_frames(&avatar.data_path, &audio_path)
        })?;
        state.lipsync = Some(LipSyncStageOutput {
            frames_path: frames.path.clone(),
            frame_count: frames.frame_count,
            fps: frames.fps,
        });

        ctx.report_progress(75, "lip-sync applied");
        let render = &ctx.settings.render;
        let output = self.stage(ctx, STAGE_RENDER, || {
            // Render the lip-synced frames to a silent video, then mux
            // the synthesized voice through the composition graph.
            let silent = self.engines.encoder.render_frames(&frames, &ctx.work_dir)?;
            let inputs = CompositionInputs::new(silent, audio_path.clone())
                .with_voice_gain(render.voice_volume)
                .with_target(render.target_width, render.target_height);
            let graph = build_graph(&inputs);
            self.engines.encoder.encode(&inputs, &graph, &ctx.output_dir)
        })?;

        ctx.report_progress(100, "final render complete");
        Ok(self.record_encode(ctx, state, output)?)
    }

    /// Record the encode output and map the degraded case.
    fn record_encode(
        &self,
        ctx: &RunContext,
        state: &mut RunState,
        output: crate::engines::EncodeOutput,
    ) -> StageResult<StageOutput> {
        if !output.command.is_empty() {
            ctx.logger.command(&output.command);
        }
        state.encode = Some(EncodeStageOutput {
            output_path: output.output_path.clone(),
            audio_merged: output.audio_merged,
            command: output.command,
        });

        if output.audio_merged {
            ctx.logger
                .success(&format!("Rendered: {}", output.output_path.display()));
            Ok(StageOutput::complete(output.output_path))
        } else {
            ctx.logger
                .warn("audio mux skipped; result is video-only");
            Ok(StageOutput::degraded(output.output_path))
        }
    }

    /// Run one composite stage, tagging any failure with the stage name.
    fn stage<T>(
        &self,
        ctx: &RunContext,
        name: &str,
        f: impl FnOnce() -> StageResult<T>,
    ) -> PipelineResult<T> {
        ctx.logger.stage(name);
        f().map_err(|e| {
            ctx.logger.error(&e.to_string());
            ctx.logger.show_tail("engine output");
            PipelineError::stage_failed(&ctx.job_id, name, e)
        })
    }
}

/// Decode a typed payload, reporting failures as validation errors.
fn decode_payload<T: DeserializeOwned>(what: &str, payload: &Value) -> StageResult<T> {
    serde_json::from_value(payload.clone())
        .map_err(|e| StageError::invalid_input(format!("{} payload: {}", what, e)))
}
