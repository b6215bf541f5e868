//! Lip-sync inference adapter.

use std::path::Path;

use serde_json::json;

use super::http::EngineClient;
use super::{FrameArchive, LipSyncEngine, StageError, StageResult};

/// Frame rate lip-synced frames are generated at.
pub const LIPSYNC_FPS: u32 = 25;

/// HTTP-backed lip-sync engine.
pub struct HttpLipSyncEngine {
    client: EngineClient,
}

impl HttpLipSyncEngine {
    pub fn new(client: EngineClient) -> Self {
        Self { client }
    }
}

impl LipSyncEngine for HttpLipSyncEngine {
    fn name(&self) -> &str {
        self.client.name()
    }

    fn sync_frames(&self, avatar_data: &Path, audio: &Path) -> StageResult<FrameArchive> {
        if avatar_data.as_os_str().is_empty() {
            return Err(StageError::invalid_input("avatar data reference is empty"));
        }
        if audio.as_os_str().is_empty() {
            return Err(StageError::invalid_input("audio reference is empty"));
        }

        let body = json!({
            "avatar_data": avatar_data,
            "audio_path": audio,
        });
        let response = self.client.generate(&body)?;

        let frame_count = response.frames.unwrap_or(0);
        if frame_count == 0 {
            return Err(StageError::engine_failed(
                self.name(),
                "avatar dataset produced zero frames",
            ));
        }

        Ok(FrameArchive {
            path: response.path,
            frame_count,
            fps: response.fps.unwrap_or(LIPSYNC_FPS),
        })
    }
}
