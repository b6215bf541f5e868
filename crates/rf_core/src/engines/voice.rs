//! Voice synthesis adapters.
//!
//! Production setup is an ordered fallback chain: backends are tried in
//! priority order until one succeeds. An empty chain is a fatal
//! configuration error.

use std::path::PathBuf;

use serde_json::json;

use super::http::EngineClient;
use super::{StageError, StageResult, VoiceSynthesizer};

/// HTTP-backed voice synthesis backend.
pub struct HttpVoiceEngine {
    client: EngineClient,
}

impl HttpVoiceEngine {
    pub fn new(client: EngineClient) -> Self {
        Self { client }
    }
}

impl VoiceSynthesizer for HttpVoiceEngine {
    fn name(&self) -> &str {
        self.client.name()
    }

    fn synthesize(&self, text: &str, voice_id: Option<&str>) -> StageResult<PathBuf> {
        let body = json!({
            "text": text,
            "voice_id": voice_id,
        });
        let response = self.client.generate(&body)?;
        Ok(response.path)
    }
}

/// Ordered chain of capability-equivalent voice backends.
///
/// Backends are tried in order until one succeeds; each failure is
/// logged with the backend name. The chain also owns input validation
/// and the default-voice fallback so individual backends stay dumb.
pub struct VoiceFallbackChain {
    backends: Vec<Box<dyn VoiceSynthesizer>>,
    default_voice: String,
}

impl VoiceFallbackChain {
    pub fn new(backends: Vec<Box<dyn VoiceSynthesizer>>, default_voice: impl Into<String>) -> Self {
        Self {
            backends,
            default_voice: default_voice.into(),
        }
    }

    /// Number of configured backends.
    pub fn backend_count(&self) -> usize {
        self.backends.len()
    }
}

impl VoiceSynthesizer for VoiceFallbackChain {
    fn name(&self) -> &str {
        "voice-chain"
    }

    fn synthesize(&self, text: &str, voice_id: Option<&str>) -> StageResult<PathBuf> {
        if text.trim().is_empty() {
            return Err(StageError::invalid_input(
                "no text provided for voice synthesis",
            ));
        }
        if self.backends.is_empty() {
            return Err(StageError::not_configured("voice synthesis"));
        }

        let voice = voice_id.unwrap_or(&self.default_voice);

        let mut last_error = None;
        for backend in &self.backends {
            match backend.synthesize(text, Some(voice)) {
                Ok(path) => return Ok(path),
                Err(e) => {
                    tracing::warn!(backend = backend.name(), error = %e, "voice backend failed");
                    last_error = Some((backend.name().to_string(), e));
                }
            }
        }

        let (backend, cause) = last_error.expect("at least one backend was tried");
        Err(StageError::engine_failed(
            "voice synthesis",
            format!("all {} backend(s) failed; last ({}): {}", self.backends.len(), backend, cause),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct ScriptedBackend {
        name: &'static str,
        fail: bool,
        calls: Arc<AtomicUsize>,
        seen_voice: Arc<parking_lot::Mutex<Option<String>>>,
    }

    impl ScriptedBackend {
        fn new(name: &'static str, fail: bool) -> Self {
            Self {
                name,
                fail,
                calls: Arc::new(AtomicUsize::new(0)),
                seen_voice: Arc::new(parking_lot::Mutex::new(None)),
            }
        }
    }

    impl VoiceSynthesizer for ScriptedBackend {
        fn name(&self) -> &str {
            self.name
        }

        fn synthesize(&self, _text: &str, voice_id: Option<&str>) -> StageResult<PathBuf> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.seen_voice.lock() = voice_id.map(String::from);
            if self.fail {
                Err(StageError::unreachable(self.name, "connection refused"))
            } else {
                Ok(PathBuf::from("/out/voice.wav"))
            }
        }
    }

    #[test]
    fn empty_chain_is_fatal_configuration_error() {
        let chain = VoiceFallbackChain::new(Vec::new(), "default");
        let err = chain.synthesize("hello", None).unwrap_err();
        assert!(matches!(err, StageError::NotConfigured { .. }));
    }

    #[test]
    fn empty_text_is_invalid_input() {
        let chain = VoiceFallbackChain::new(
            vec![Box::new(ScriptedBackend::new("a", false))],
            "default",
        );
        let err = chain.synthesize("   ", None).unwrap_err();
        assert!(matches!(err, StageError::InvalidInput(_)));
    }

    #[test]
    fn falls_back_to_second_backend() {
        let first = ScriptedBackend::new("first", true);
        let second = ScriptedBackend::new("second", false);
        let first_calls = first.calls.clone();
        let second_calls = second.calls.clone();

        let chain =
            VoiceFallbackChain::new(vec![Box::new(first), Box::new(second)], "default");
        let path = chain.synthesize("hello", None).unwrap();

        assert_eq!(path, PathBuf::from("/out/voice.wav"));
        assert_eq!(first_calls.load(Ordering::SeqCst), 1);
        assert_eq!(second_calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn reports_last_failure_when_all_backends_fail() {
        let chain = VoiceFallbackChain::new(
            vec![
                Box::new(ScriptedBackend::new("a", true)),
                Box::new(ScriptedBackend::new("b", true)),
            ],
            "default",
        );
        let err = chain.synthesize("hello", None).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("2 backend(s)"));
        assert!(msg.contains("(b)"));
    }

    #[test]
    fn default_voice_applied_when_unset() {
        let backend = ScriptedBackend::new("a", false);
        let seen = backend.seen_voice.clone();
        let chain = VoiceFallbackChain::new(vec![Box::new(backend)], "narrator");
        chain.synthesize("hello", None).unwrap();
        assert_eq!(seen.lock().as_deref(), Some("narrator"));
    }
}
