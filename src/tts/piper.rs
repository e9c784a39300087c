use std::collections::HashMap;
use std::path::Path;
use std::process::Command;
use std::sync::Mutex;

use async_trait::async_trait;
use hound::{SampleFormat, WavSpec, WavWriter};
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::Value;

use crate::error::AppError;
use crate::tts::voice::Voice;
use crate::tts::{EngineCapabilities, SpeechEngine};

/// Local single-speaker engine backed by a Piper ONNX voice.
///
/// The ort session is not assumed reentrant, so inference serializes on the
/// mutex; concurrent requests queue rather than race the runtime.
pub struct PiperEngine {
    session: Mutex<Session>,
    sample_rate: u32,
    espeak_voice: String,
    phoneme_id_map: HashMap<String, Vec<i64>>,
    noise_scale: f32,
    length_scale: f32,
    noise_w: f32,
}

impl PiperEngine {
    pub fn load(voices_dir: &Path, voice_id: &str) -> Result<Self, AppError> {
        let voice = Voice::load(voices_dir, voice_id)?;

        let session = Session::builder()
            .map_err(|e| AppError::Synthesis(format!("Failed to create session builder: {}", e)))?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(|e| AppError::Synthesis(format!("Failed to set optimization level: {}", e)))?
            .with_intra_threads(4)
            .map_err(|e| AppError::Synthesis(format!("Failed to set threads: {}", e)))?
            .commit_from_file(&voice.model_path)
            .map_err(|e| AppError::Synthesis(format!("Failed to load model: {}", e)))?;

        let inference = voice.config.inference.clone().unwrap_or_default();
        let espeak_voice = voice
            .config
            .espeak
            .as_ref()
            .map(|e| e.voice.clone())
            .unwrap_or_else(|| "en".to_string());

        Ok(Self {
            session: Mutex::new(session),
            sample_rate: voice.config.audio.sample_rate,
            espeak_voice,
            phoneme_id_map: voice.config.phoneme_id_map.clone(),
            noise_scale: inference.noise_scale,
            length_scale: inference.length_scale,
            noise_w: inference.noise_w,
        })
    }

    fn render(&self, text: &str) -> Result<Vec<f32>, AppError> {
        let phonemes = phonemize(text, &self.espeak_voice)?;
        let ids = phonemes_to_ids(&phonemes, &self.phoneme_id_map);
        let input_len = ids.len();

        // input: [batch, sequence] = [1, phoneme_count]
        let input_value = Value::from_array((vec![1, input_len], ids))
            .map_err(|e| AppError::Synthesis(format!("Failed to create input tensor: {}", e)))?;

        // input_lengths: [batch] = [1]
        let lengths_value = Value::from_array((vec![1], vec![input_len as i64]))
            .map_err(|e| AppError::Synthesis(format!("Failed to create lengths tensor: {}", e)))?;

        // scales: [noise_scale, length_scale, noise_w]
        let scales_value = Value::from_array((
            vec![3],
            vec![self.noise_scale, self.length_scale, self.noise_w],
        ))
        .map_err(|e| AppError::Synthesis(format!("Failed to create scales tensor: {}", e)))?;

        let mut session = self
            .session
            .lock()
            .map_err(|_| AppError::Synthesis("Synthesis session poisoned".to_string()))?;
        let outputs = session
            .run(ort::inputs![input_value, lengths_value, scales_value])
            .map_err(|e| AppError::Synthesis(format!("Inference failed: {}", e)))?;

        let output = outputs
            .get("output")
            .or_else(|| outputs.get("audio"))
            .ok_or_else(|| AppError::Synthesis("Missing output tensor".to_string()))?;

        let output_view = output
            .try_extract_tensor::<f32>()
            .map_err(|e| AppError::Synthesis(format!("Failed to extract output tensor: {}", e)))?;

        Ok(output_view.1.iter().copied().collect())
    }
}

#[async_trait]
impl SpeechEngine for PiperEngine {
    fn capabilities(&self) -> EngineCapabilities {
        EngineCapabilities {
            multilingual: false,
            voice_cloning: false,
        }
    }

    async fn synthesize_to_file(
        &self,
        text: &str,
        _language: &str,
        _speaker_sample: Option<&Path>,
        out_path: &Path,
    ) -> Result<(), AppError> {
        let samples = self.render(text)?;
        write_wav(out_path, &samples, self.sample_rate)
    }
}

/// Convert text to phonemes using espeak-ng.
fn phonemize(text: &str, voice: &str) -> Result<String, AppError> {
    if text.is_empty() {
        return Ok(String::new());
    }

    let output = Command::new("espeak-ng")
        .args(["--ipa", "-q", "-v", voice, text])
        .output()
        .map_err(|e| {
            AppError::Synthesis(format!("Failed to run espeak-ng (is it installed?): {}", e))
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(AppError::Synthesis(format!("espeak-ng failed: {}", stderr)));
    }

    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

/// Map phonemes through the voice's phoneme-id table, with BOS/EOS markers
/// and inter-phoneme padding where the table defines them.
fn phonemes_to_ids(phonemes: &str, id_map: &HashMap<String, Vec<i64>>) -> Vec<i64> {
    let mut ids = Vec::new();

    match id_map.get("^") {
        Some(bos) => ids.extend(bos),
        None => ids.push(0),
    }

    for ch in phonemes.chars() {
        if let Some(mapped) = id_map.get(ch.to_string().as_str()) {
            ids.extend(mapped);
        }
        if let Some(pad) = id_map.get("_") {
            ids.extend(pad);
        }
    }

    match id_map.get("$") {
        Some(eos) => ids.extend(eos),
        None => ids.push(0),
    }

    ids
}

/// Write f32 samples as 16-bit mono PCM directly to `path`.
fn write_wav(path: &Path, samples: &[f32], sample_rate: u32) -> Result<(), AppError> {
    let spec = WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };

    let mut writer = WavWriter::create(path, spec)
        .map_err(|e| AppError::Synthesis(format!("Failed to create WAV file: {}", e)))?;

    for sample in samples {
        // f32 [-1.0, 1.0] to i16 with 2x gain boost
        let scaled = (sample * 2.0 * 32767.0).clamp(-32768.0, 32767.0) as i16;
        writer
            .write_sample(scaled)
            .map_err(|e| AppError::Synthesis(format!("Failed to write sample: {}", e)))?;
    }

    writer
        .finalize()
        .map_err(|e| AppError::Synthesis(format!("Failed to finalize WAV: {}", e)))?;

    Ok(())
}
