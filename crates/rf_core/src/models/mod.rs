//! Data models for RenderForge.
//!
//! This module contains the core data structures used throughout the
//! worker:
//! - Enums for job types and job status
//! - The job record/update shapes exchanged with the job store
//! - Typed payloads decoded per job type

mod enums;
mod jobs;
mod payloads;

pub use enums::{JobStatus, JobType};
pub use jobs::{JobDescription, JobRecord, JobUpdate};
pub use payloads::{
    AvatarPayload, FinalRenderPayload, FullAvatarPayload, VideoPayload, VoicePayload,
};
