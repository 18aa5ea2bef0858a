//! Sherpa-ONNX Kokoro backend, implements [`SpeechPipeline`] via `sherpa-rs`.
//!
//! `KokoroTts::create` takes `&mut self`, so the engine sits behind an
//! `Arc<Mutex<…>>` and every call runs on the blocking pool. Concurrent
//! requests for different sessions therefore serialize on the engine.

use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use sherpa_rs::tts::{KokoroTts, KokoroTtsConfig};
use speakd_core::{DEFAULT_SAMPLE_RATE, PipelineError, SpeechPipeline};

use super::PipelineConfig;
use crate::error::VoiceError;
use crate::speakers::{SpeakerTable, VOICES_FILE};

/// Kokoro via sherpa-onnx.
pub struct SherpaPipeline {
    engine: Arc<Mutex<KokoroTts>>,
    speakers: SpeakerTable,
}

impl SherpaPipeline {
    /// Load the model from `config.model_dir`.
    ///
    /// The directory must contain:
    /// - `model.onnx`
    /// - `voices.bin` (packed style embeddings)
    /// - `tokens.txt`
    /// - `espeak-ng-data/`
    ///
    /// An optional `speakers.txt` lists one voice key per line, in
    /// speaker-id order.
    pub fn load(config: &PipelineConfig) -> Result<Self, VoiceError> {
        let model_dir = config.model_dir.as_path();
        if !model_dir.exists() {
            return Err(VoiceError::ModelNotFound(model_dir.to_path_buf()));
        }

        let model_path = model_dir.join("model.onnx");
        let voices_path = model_dir.join(VOICES_FILE);
        let tokens_path = model_dir.join("tokens.txt");
        let data_dir = model_dir.join("espeak-ng-data");

        for path in [&model_path, &voices_path, &tokens_path, &data_dir] {
            if !path.exists() {
                return Err(VoiceError::ModelNotFound(path.clone()));
            }
            tracing::debug!(path = %path.display(), "Found TTS model file");
        }

        let speakers = SpeakerTable::load(model_dir)?;

        tracing::info!(
            dir = %model_dir.display(),
            voices = speakers.len(),
            threads = config.num_threads,
            "Loading Sherpa Kokoro TTS model"
        );

        let sherpa_config = KokoroTtsConfig {
            model: path_to_string(&model_path)?,
            voices: path_to_string(&voices_path)?,
            tokens: path_to_string(&tokens_path)?,
            data_dir: path_to_string(&data_dir)?,
            length_scale: 1.0,
            onnx_config: sherpa_rs::OnnxConfig {
                num_threads: config.num_threads,
                ..Default::default()
            },
            ..Default::default()
        };

        let engine = KokoroTts::new(sherpa_config);

        tracing::info!("Sherpa Kokoro TTS model loaded successfully");

        Ok(Self {
            engine: Arc::new(Mutex::new(engine)),
            speakers,
        })
    }
}

#[async_trait]
impl SpeechPipeline for SherpaPipeline {
    async fn synthesize(
        &self,
        text: &str,
        voice_key: &str,
        speed: f32,
    ) -> Result<Vec<f32>, PipelineError> {
        if text.trim().is_empty() {
            return Ok(Vec::new());
        }

        let Some(sid) = self.speakers.id(voice_key) else {
            return Err(PipelineError::new(format!("Unknown voice: {voice_key}")));
        };

        tracing::debug!(
            text_len = text.len(),
            voice = %voice_key,
            speaker_id = sid,
            "Synthesizing speech (Sherpa Kokoro)"
        );

        let engine = Arc::clone(&self.engine);
        let text = text.to_string();

        let audio = tokio::task::spawn_blocking(move || {
            engine
                .lock()
                .map_err(|e| PipelineError::new(format!("TTS engine lock poisoned: {e}")))
                .and_then(|mut guard| {
                    guard
                        .create(&text, sid, speed)
                        .map_err(|e| PipelineError::new(e.to_string()))
                })
        })
        .await
        .map_err(|e| PipelineError::new(format!("spawn_blocking join error: {e}")))??;

        if audio.sample_rate != DEFAULT_SAMPLE_RATE {
            tracing::warn!(
                sample_rate = audio.sample_rate,
                "Model produced unexpected sample rate"
            );
        }

        Ok(audio.samples)
    }

    fn has_voice(&self, voice_key: &str) -> bool {
        self.speakers.has_voice(voice_key)
    }

    fn voices(&self) -> Vec<String> {
        self.speakers.voices()
    }

    fn sample_rate(&self) -> u32 {
        DEFAULT_SAMPLE_RATE
    }
}

fn path_to_string(path: &Path) -> Result<String, VoiceError> {
    path.to_str()
        .map(ToString::to_string)
        .ok_or_else(|| VoiceError::ModelLoadError(format!("Invalid path: {}", path.display())))
}
