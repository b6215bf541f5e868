//! Job orchestration: claiming, stage dispatch, and the worker loop.
//!
//! # Architecture
//!
//! ```text
//! Worker (polling / single-shot)
//!     └── JobLifecycle (claim -> processing -> terminal)
//!         └── PipelineExecutor
//!             ├── voice      (simple)
//!             ├── avatar     (simple)
//!             ├── video      (simple)
//!             ├── final      (compose pre-rendered tracks)
//!             └── full_avatar (voice -> avatar -> lip-sync -> render)
//! ```
//!
//! The worker claims one job at a time and runs it to a terminal state
//! before claiming the next. Stage adapters and the composition graph
//! builder do the per-stage work; the lifecycle manager is the single
//! point that persists terminal status to the job store.

mod errors;
mod executor;
mod lifecycle;
#[cfg(test)]
pub(crate) mod testing;
mod types;
mod worker;

pub use errors::{PipelineError, PipelineResult};
pub use executor::{
    PipelineExecutor, STAGE_AVATAR, STAGE_LIPSYNC, STAGE_RENDER, STAGE_VOICE,
};
pub use lifecycle::{JobLifecycle, JobOutcome};
pub use types::{
    AvatarStageOutput, EncodeStageOutput, LipSyncStageOutput, ProgressCallback, RunContext,
    RunState, VoiceStageOutput,
};
pub use worker::{ShutdownHandle, Worker};
