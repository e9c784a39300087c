use std::collections::HashMap;
use std::fs::File;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::AppError;

/// Sidecar config shipped next to every Piper `.onnx` voice model.
#[derive(Debug, Clone, Deserialize)]
pub struct VoiceConfig {
    pub audio: AudioConfig,
    pub espeak: Option<EspeakConfig>,
    #[serde(default)]
    pub phoneme_id_map: HashMap<String, Vec<i64>>,
    #[serde(default)]
    pub inference: Option<InferenceConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AudioConfig {
    pub sample_rate: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EspeakConfig {
    pub voice: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InferenceConfig {
    #[serde(default = "default_noise_scale")]
    pub noise_scale: f32,
    #[serde(default = "default_length_scale")]
    pub length_scale: f32,
    #[serde(default = "default_noise_w")]
    pub noise_w: f32,
}

fn default_noise_scale() -> f32 {
    0.667
}

fn default_length_scale() -> f32 {
    1.0
}

fn default_noise_w() -> f32 {
    0.8
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            noise_scale: default_noise_scale(),
            length_scale: default_length_scale(),
            noise_w: default_noise_w(),
        }
    }
}

#[derive(Debug)]
pub struct Voice {
    pub config: VoiceConfig,
    pub model_path: PathBuf,
}

impl Voice {
    pub fn load(voices_dir: &Path, voice_id: &str) -> Result<Self, AppError> {
        let model_path = voices_dir.join(format!("{}.onnx", voice_id));
        let config_path = voices_dir.join(format!("{}.onnx.json", voice_id));

        if !model_path.exists() {
            return Err(AppError::Synthesis(format!(
                "Voice model '{}' not found in {}",
                voice_id,
                voices_dir.display()
            )));
        }

        if !config_path.exists() {
            return Err(AppError::Synthesis(format!(
                "Voice '{}' is missing its config file",
                voice_id
            )));
        }

        let config: VoiceConfig = serde_json::from_reader(File::open(&config_path)?)?;

        Ok(Self { config, model_path })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_model_is_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        assert!(Voice::load(tmp.path(), "ghost").is_err());
    }

    #[test]
    fn loads_config_next_to_model() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("v.onnx"), b"").unwrap();
        std::fs::write(
            tmp.path().join("v.onnx.json"),
            r#"{"audio": {"sample_rate": 22050}, "espeak": {"voice": "en-us"}}"#,
        )
        .unwrap();

        let voice = Voice::load(tmp.path(), "v").unwrap();
        assert_eq!(voice.config.audio.sample_rate, 22050);
        assert_eq!(voice.config.espeak.unwrap().voice, "en-us");
    }
}
