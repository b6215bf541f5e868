//! Job record and update structures exchanged with the job store.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::enums::{JobStatus, JobType};

/// A single job row as stored in the job store.
///
/// Created externally by a submitter, claimed by exactly one worker, and
/// mutated only by the worker that claimed it. Workers never delete jobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobRecord {
    /// Unique job identifier.
    pub id: String,
    /// Job type, selects the pipeline to run.
    #[serde(rename = "type")]
    pub job_type: JobType,
    /// Type-specific payload. Unknown fields are ignored on decode.
    #[serde(default)]
    pub payload: Value,
    /// Current status.
    #[serde(default)]
    pub status: JobStatus,
    /// Progress percentage (0-100), best-effort.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress: Option<u8>,
    /// Result reference (output path/URL) once completed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result_url: Option<String>,
    /// Failure cause if status is `error`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Audio muxing was skipped; the result is video-only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub degraded: Option<bool>,
    /// Submission timestamp (RFC 3339), set by the submitter.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

impl JobRecord {
    /// Create a new queued job.
    pub fn new(id: impl Into<String>, job_type: JobType, payload: Value) -> Self {
        Self {
            id: id.into(),
            job_type,
            payload,
            status: JobStatus::Queued,
            progress: None,
            result_url: None,
            error: None,
            degraded: None,
            created_at: Some(chrono::Utc::now().to_rfc3339()),
        }
    }
}

/// A job description supplied externally in single-shot mode.
///
/// The worker assigns an id and queues it in the in-memory store so the
/// single-shot path routes through the same lifecycle as polling mode.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobDescription {
    /// Job type.
    #[serde(rename = "type")]
    pub job_type: JobType,
    /// Type-specific payload.
    #[serde(default)]
    pub payload: Value,
}

impl JobDescription {
    /// Convert into a queued job record with a fresh id.
    pub fn into_record(self) -> JobRecord {
        JobRecord::new(uuid::Uuid::new_v4().to_string(), self.job_type, self.payload)
    }
}

/// Partial update sent to the job store.
///
/// Only supplied fields change; `None` fields are omitted from the wire
/// body entirely.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<JobStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub degraded: Option<bool>,
}

impl JobUpdate {
    /// Update for a freshly claimed job: `processing`, progress 0.
    pub fn processing() -> Self {
        Self {
            status: Some(JobStatus::Processing),
            progress: Some(0),
            ..Default::default()
        }
    }

    /// Progress-only update (best-effort).
    pub fn progress(percent: u8) -> Self {
        Self {
            progress: Some(percent),
            ..Default::default()
        }
    }

    /// Terminal success update. `degraded` is only sent when set.
    pub fn completed(result_url: impl Into<String>, degraded: bool) -> Self {
        Self {
            status: Some(JobStatus::Completed),
            result_url: Some(result_url.into()),
            progress: Some(100),
            degraded: degraded.then_some(true),
            ..Default::default()
        }
    }

    /// Terminal failure update with the cause preserved verbatim.
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            status: Some(JobStatus::Error),
            error: Some(error.into()),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn record_deserializes_store_row() {
        let row = json!({
            "id": "job-1",
            "type": "full_avatar",
            "payload": {"script": "hello", "images": "/photos"},
            "status": "queued",
            "created_at": "2026-01-10T12:00:00Z"
        });
        let job: JobRecord = serde_json::from_value(row).unwrap();
        assert_eq!(job.job_type, JobType::FullAvatar);
        assert_eq!(job.status, JobStatus::Queued);
        assert!(job.result_url.is_none());
    }

    #[test]
    fn update_omits_unset_fields() {
        let update = JobUpdate::failed("voice synthesis failed");
        let json = serde_json::to_string(&update).unwrap();
        assert!(json.contains("\"status\":\"error\""));
        assert!(json.contains("voice synthesis failed"));
        assert!(!json.contains("result_url"));
        assert!(!json.contains("progress"));
        assert!(!json.contains("degraded"));
    }

    #[test]
    fn completed_update_sets_degraded_only_when_degraded() {
        let normal = JobUpdate::completed("/out/final.mp4", false);
        assert_eq!(normal.degraded, None);

        let degraded = JobUpdate::completed("/out/silent.mp4", true);
        assert_eq!(degraded.degraded, Some(true));
        assert_eq!(degraded.progress, Some(100));
    }

    #[test]
    fn description_becomes_queued_record() {
        let desc: JobDescription =
            serde_json::from_value(json!({"type": "voice", "payload": {"text": "hi"}})).unwrap();
        let record = desc.into_record();
        assert_eq!(record.status, JobStatus::Queued);
        assert!(!record.id.is_empty());
        assert!(record.created_at.is_some());
    }
}
