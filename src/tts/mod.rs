pub mod loader;
pub mod piper;
pub mod remote;
pub mod speaker;
pub mod voice;

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::error::AppError;

pub use loader::{load_first_available, LoadedModel, ModelSpec};

/// What a loaded engine can do, derived once at load time.
#[derive(Debug, Clone, Copy)]
pub struct EngineCapabilities {
    pub multilingual: bool,
    pub voice_cloning: bool,
}

impl EngineCapabilities {
    pub fn model_type(&self) -> &'static str {
        if self.multilingual {
            "multilingual"
        } else {
            "single_speaker"
        }
    }
}

/// A speech synthesis backend.
///
/// Engines write the rendered audio directly to `out_path`; callers never see
/// raw sample buffers. Single-speaker engines may ignore `language` and
/// `speaker_sample`.
#[async_trait]
pub trait SpeechEngine: Send + Sync {
    fn capabilities(&self) -> EngineCapabilities;

    async fn synthesize_to_file(
        &self,
        text: &str,
        language: &str,
        speaker_sample: Option<&Path>,
        out_path: &Path,
    ) -> Result<(), AppError>;
}

/// Process-wide synthesis state: the engine selected at startup (if any) and
/// the optional voice-cloning reference sample. Constructed once in `main`
/// and read-only afterwards.
pub struct TtsService {
    model: Option<LoadedModel>,
    speaker_sample: Option<PathBuf>,
}

impl TtsService {
    pub fn new(model: Option<LoadedModel>, speaker_sample: Option<PathBuf>) -> Self {
        Self {
            model,
            speaker_sample,
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.model.is_some()
    }

    /// Reported by the health endpoint; `None` when no model could be loaded.
    pub fn model_type(&self) -> Option<&'static str> {
        self.model
            .as_ref()
            .map(|m| m.engine.capabilities().model_type())
    }

    pub async fn synthesize(
        &self,
        text: &str,
        language: &str,
        out_path: &Path,
    ) -> Result<(), AppError> {
        let model = self.model.as_ref().ok_or(AppError::ModelNotLoaded)?;

        tracing::info!(
            "Generating speech with {} for text of length {} characters",
            model.id,
            text.chars().count()
        );

        let speaker = if model.engine.capabilities().voice_cloning {
            self.speaker_sample.as_deref()
        } else {
            None
        };

        model
            .engine
            .synthesize_to_file(text, language, speaker, out_path)
            .await
    }
}
