//! Avatar mesh/face extraction adapter.

use std::path::Path;

use serde_json::json;

use super::http::EngineClient;
use super::{AvatarBuilder, AvatarOutput, StageError, StageResult};

/// HTTP-backed avatar extraction engine.
pub struct HttpAvatarEngine {
    client: EngineClient,
}

impl HttpAvatarEngine {
    pub fn new(client: EngineClient) -> Self {
        Self { client }
    }
}

impl AvatarBuilder for HttpAvatarEngine {
    fn name(&self) -> &str {
        self.client.name()
    }

    fn build_avatar(&self, image_dir: &Path, name: &str) -> StageResult<AvatarOutput> {
        if image_dir.as_os_str().is_empty() {
            return Err(StageError::invalid_input(
                "no image directory provided for avatar creation",
            ));
        }

        let body = json!({
            "image_dir": image_dir,
            "name": name,
        });
        let response = self.client.generate(&body)?;

        // The engine reports how many faces it extracted; an empty
        // dataset is useless downstream.
        let face_count = response.face_count.unwrap_or(0);
        if face_count == 0 {
            return Err(StageError::engine_failed(
                self.name(),
                "no faces detected in any images",
            ));
        }

        Ok(AvatarOutput {
            data_path: response.path,
            face_count,
        })
    }
}
