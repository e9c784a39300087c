use std::path::Path;

use async_trait::async_trait;
use serde::Serialize;

use crate::error::AppError;
use crate::tts::{EngineCapabilities, SpeechEngine};

/// Multilingual engine delegating to a Coqui-compatible TTS server.
///
/// Voice cloning works by sending the reference sample's path along with the
/// request; the server is expected to share a filesystem with this process
/// (the usual sidecar-container deployment).
pub struct RemoteEngine {
    base_url: String,
    client: reqwest::Client,
}

#[derive(Serialize)]
struct RemoteRequest<'a> {
    text: &'a str,
    language: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    speaker_wav: Option<&'a str>,
}

impl RemoteEngine {
    /// Probe the server so an unreachable candidate fails during the startup
    /// fallback chain instead of on the first request.
    pub async fn connect(base_url: &str) -> Result<Self, AppError> {
        let client = reqwest::Client::new();
        client
            .get(base_url)
            .send()
            .await
            .map_err(|e| AppError::Synthesis(format!("TTS server unreachable: {}", e)))?;

        tracing::info!("Connected to remote TTS server at {}", base_url);

        Ok(Self {
            base_url: base_url.to_string(),
            client,
        })
    }
}

#[async_trait]
impl SpeechEngine for RemoteEngine {
    fn capabilities(&self) -> EngineCapabilities {
        EngineCapabilities {
            multilingual: true,
            voice_cloning: true,
        }
    }

    async fn synthesize_to_file(
        &self,
        text: &str,
        language: &str,
        speaker_sample: Option<&Path>,
        out_path: &Path,
    ) -> Result<(), AppError> {
        let speaker_wav = speaker_sample.and_then(|p| p.to_str());

        let payload = RemoteRequest {
            text,
            language,
            speaker_wav,
        };

        let response = self
            .client
            .post(format!("{}/api/tts", self.base_url))
            .json(&payload)
            .send()
            .await
            .map_err(|e| AppError::Synthesis(format!("TTS request failed: {}", e)))?
            .error_for_status()
            .map_err(|e| AppError::Synthesis(format!("TTS server error: {}", e)))?;

        let bytes = response
            .bytes()
            .await
            .map_err(|e| AppError::Synthesis(format!("Failed to read TTS response: {}", e)))?;

        tokio::fs::write(out_path, &bytes).await?;
        Ok(())
    }
}
