//! Shared HTTP client for engine services.
//!
//! All engine services share one call convention: `POST {base}/generate`
//! with a JSON payload, answering `200` with `{"path": "..."}` plus
//! engine-specific extras. Engine calls may be long-running, so only the
//! connect phase is time-boxed here; total call timeouts are owned by
//! the engine side.

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;
use serde_json::Value;

use super::{StageError, StageResult};

/// Response body from an engine's `/generate` endpoint.
#[derive(Debug, Deserialize)]
pub struct GenerateResponse {
    /// Path to the produced artifact.
    pub path: PathBuf,
    /// Faces found (avatar engine).
    #[serde(default)]
    pub face_count: Option<u32>,
    /// Frames produced (lip-sync engine).
    #[serde(default)]
    pub frames: Option<u32>,
    /// Frame rate of the produced frames (lip-sync engine).
    #[serde(default)]
    pub fps: Option<u32>,
}

/// Blocking HTTP client for one engine service.
pub struct EngineClient {
    name: String,
    base_url: String,
    client: reqwest::blocking::Client,
}

impl EngineClient {
    /// Create a client for the engine at `base_url`.
    pub fn new(
        name: impl Into<String>,
        base_url: impl Into<String>,
        connect_timeout: Duration,
    ) -> StageResult<Self> {
        let name = name.into();
        let client = reqwest::blocking::Client::builder()
            .connect_timeout(connect_timeout)
            .build()
            .map_err(|e| StageError::engine_failed(&name, format!("client setup: {}", e)))?;

        Ok(Self {
            name,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        })
    }

    /// Engine name (for logging).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Call the engine's `/generate` endpoint.
    pub fn generate(&self, body: &Value) -> StageResult<GenerateResponse> {
        let url = format!("{}/generate", self.base_url);
        tracing::debug!(engine = %self.name, %url, "calling engine");

        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .map_err(|e| self.map_transport_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(StageError::engine_failed(
                &self.name,
                format!("status {}: {}", status.as_u16(), truncate(&body, 300)),
            ));
        }

        response
            .json::<GenerateResponse>()
            .map_err(|e| StageError::engine_failed(&self.name, format!("bad response: {}", e)))
    }

    fn map_transport_error(&self, err: reqwest::Error) -> StageError {
        if err.is_connect() || err.is_timeout() {
            StageError::unreachable(&self.name, err.to_string())
        } else {
            StageError::engine_failed(&self.name, err.to_string())
        }
    }
}

fn truncate(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
