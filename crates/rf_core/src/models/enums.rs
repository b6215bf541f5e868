//! Core enums used throughout the worker.

use serde::{Deserialize, Serialize};

/// Type of a render job, dispatched to the matching pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobType {
    /// Synthesize speech from text.
    Voice,
    /// Extract a face dataset from a photo collection.
    Avatar,
    /// Composite chain: voice -> avatar -> lip-sync -> final render.
    FullAvatar,
    /// Generate a clip from a text prompt.
    Video,
    /// Compose pre-rendered tracks into the final output.
    Final,
}

impl JobType {
    /// Wire/display string for this job type.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Voice => "voice",
            Self::Avatar => "avatar",
            Self::FullAvatar => "full_avatar",
            Self::Video => "video",
            Self::Final => "final",
        }
    }
}

impl std::fmt::Display for JobType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Status of a job in the store.
///
/// Transitions are monotonic: `queued -> processing -> completed | error`.
/// Terminal states are never left.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    /// Submitted, waiting for a worker claim.
    #[default]
    Queued,
    /// Claimed by a worker, stages running.
    Processing,
    /// Finished successfully (possibly degraded).
    Completed,
    /// Finished with a failure.
    Error,
}

impl JobStatus {
    /// Wire/display string for this status.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Error => "error",
        }
    }

    /// Whether this status is terminal (no further transitions).
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Error)
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn job_type_serializes_snake_case() {
        let json = serde_json::to_string(&JobType::FullAvatar).unwrap();
        assert_eq!(json, "\"full_avatar\"");
    }

    #[test]
    fn job_type_deserializes_snake_case() {
        let ty: JobType = serde_json::from_str("\"full_avatar\"").unwrap();
        assert_eq!(ty, JobType::FullAvatar);
    }

    #[test]
    fn job_status_serializes_lowercase() {
        let json = serde_json::to_string(&JobStatus::Processing).unwrap();
        assert_eq!(json, "\"processing\"");
    }

    #[test]
    fn terminal_states() {
        assert!(!JobStatus::Queued.is_terminal());
        assert!(!JobStatus::Processing.is_terminal());
        assert!(JobStatus::Completed.is_terminal());
        assert!(JobStatus::Error.is_terminal());
    }
}
