use std::fmt;
use std::path::Path;

use crate::error::AppError;
use crate::tts::piper::PiperEngine;
use crate::tts::remote::RemoteEngine;
use crate::tts::SpeechEngine;

/// One candidate in the startup fallback chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelSpec {
    /// Local Piper voice, loaded from `<voices_dir>/<voice_id>.onnx`.
    Piper { voice_id: String },
    /// Coqui-compatible HTTP server (multilingual, voice cloning).
    Coqui { base_url: String },
}

impl ModelSpec {
    pub fn parse(s: &str) -> Result<Self, AppError> {
        let s = s.trim();
        match s.split_once(':') {
            Some(("piper", voice_id)) if !voice_id.is_empty() => Ok(ModelSpec::Piper {
                voice_id: voice_id.to_string(),
            }),
            Some(("coqui", base_url)) if !base_url.is_empty() => Ok(ModelSpec::Coqui {
                base_url: base_url.trim_end_matches('/').to_string(),
            }),
            _ => Err(AppError::BadRequest(format!(
                "Invalid model candidate '{}': expected piper:<voice-id> or coqui:<base-url>",
                s
            ))),
        }
    }

    /// Parse a comma-separated candidate list, e.g.
    /// `piper:en_US-amy-medium,piper:en_US-lessac-low,coqui:http://localhost:5002`.
    pub fn parse_list(s: &str) -> Result<Vec<Self>, AppError> {
        s.split(',')
            .filter(|part| !part.trim().is_empty())
            .map(Self::parse)
            .collect()
    }

    async fn load(&self, voices_dir: &Path) -> Result<Box<dyn SpeechEngine>, AppError> {
        match self {
            ModelSpec::Piper { voice_id } => {
                let engine = PiperEngine::load(voices_dir, voice_id)?;
                Ok(Box::new(engine))
            }
            ModelSpec::Coqui { base_url } => {
                let engine = RemoteEngine::connect(base_url).await?;
                Ok(Box::new(engine))
            }
        }
    }
}

impl fmt::Display for ModelSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelSpec::Piper { voice_id } => write!(f, "piper:{}", voice_id),
            ModelSpec::Coqui { base_url } => write!(f, "coqui:{}", base_url),
        }
    }
}

/// The engine that won the startup fallback chain.
pub struct LoadedModel {
    pub id: String,
    pub engine: Box<dyn SpeechEngine>,
}

/// Try each candidate in order and keep the first that loads.
///
/// Every failure is logged as it happens; if the whole chain fails, one
/// summary diagnostic lists all collected reasons and the service continues
/// degraded (health reports `model_loaded: false`).
pub async fn load_first_available(
    candidates: &[ModelSpec],
    voices_dir: &Path,
) -> Option<LoadedModel> {
    let mut failures: Vec<String> = Vec::new();

    for spec in candidates {
        tracing::info!("Attempting to load {}...", spec);
        match spec.load(voices_dir).await {
            Ok(engine) => {
                tracing::info!(
                    "TTS model loaded successfully: {} ({})",
                    spec,
                    engine.capabilities().model_type()
                );
                return Some(LoadedModel {
                    id: spec.to_string(),
                    engine,
                });
            }
            Err(e) => {
                tracing::error!("Error loading {}: {}", spec, e);
                failures.push(format!("{}: {}", spec, e));
            }
        }
    }

    if failures.is_empty() {
        tracing::error!("No model candidates configured");
    } else {
        tracing::error!(
            "All model loading attempts failed: [{}]",
            failures.join("; ")
        );
    }
    None
}
