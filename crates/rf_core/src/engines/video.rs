//! Clip generation adapter.

use std::path::PathBuf;

use serde_json::json;

use super::http::EngineClient;
use super::{StageError, StageResult, VideoGenerator};

/// HTTP-backed video generation engine.
pub struct HttpVideoEngine {
    client: EngineClient,
}

impl HttpVideoEngine {
    pub fn new(client: EngineClient) -> Self {
        Self { client }
    }
}

impl VideoGenerator for HttpVideoEngine {
    fn name(&self) -> &str {
        self.client.name()
    }

    fn generate(&self, prompt: &str, duration_secs: u32) -> StageResult<PathBuf> {
        if prompt.trim().is_empty() {
            return Err(StageError::invalid_input(
                "no prompt provided for video generation",
            ));
        }

        let body = json!({
            "prompt": prompt,
            "duration": duration_secs,
        });
        let response = self.client.generate(&body)?;
        Ok(response.path)
    }
}
