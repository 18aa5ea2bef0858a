//! Collaborator ports: the narrow interfaces speakd consumes.
//!
//! The synthesis model, the audio device, and the audio file encoder are all
//! external. Adapters for each live in `speakd-voice`; tests substitute their
//! own implementations.

use std::path::Path;

use async_trait::async_trait;
use thiserror::Error;

use crate::error::SpeakError;

/// Failure reported by a [`SpeechPipeline`].
#[derive(Debug, Clone, Error)]
#[error("{0}")]
pub struct PipelineError(pub String);

impl PipelineError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

impl From<PipelineError> for SpeakError {
    fn from(err: PipelineError) -> Self {
        Self::SynthesisFailed(err.0)
    }
}

/// The external neural synthesis pipeline.
///
/// Implementations must be `Send + Sync`; one instance is shared by every
/// connection.
#[async_trait]
pub trait SpeechPipeline: Send + Sync {
    /// Synthesize `text` with an already-resolved voice key.
    ///
    /// Returns mono PCM f32 samples at [`sample_rate`](Self::sample_rate).
    async fn synthesize(
        &self,
        text: &str,
        voice_key: &str,
        speed: f32,
    ) -> Result<Vec<f32>, PipelineError>;

    /// Whether `voice_key` is among the loaded voices.
    fn has_voice(&self, voice_key: &str) -> bool;

    /// Every loaded voice key.
    fn voices(&self) -> Vec<String>;

    /// Output sample rate in Hz.
    fn sample_rate(&self) -> u32;
}

/// The local audio output device.
#[async_trait]
pub trait AudioOutput: Send + Sync {
    /// Play `samples` and resolve once playback has drained or been stopped.
    ///
    /// Starting a new playback interrupts the current one.
    async fn play(&self, samples: Vec<f32>, sample_rate: u32) -> Result<(), SpeakError>;

    /// Stop any active playback immediately. Best-effort; never fails.
    fn stop(&self);
}

/// Audio file encoder.
pub trait AudioFileWriter: Send + Sync {
    /// Write mono samples to `path`, creating parent directories as needed.
    fn write(&self, path: &Path, samples: &[f32], sample_rate: u32) -> Result<(), SpeakError>;
}

/// Output used when no audio device is available or playback is disabled.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullAudioOutput;

#[async_trait]
impl AudioOutput for NullAudioOutput {
    async fn play(&self, samples: Vec<f32>, sample_rate: u32) -> Result<(), SpeakError> {
        tracing::debug!(
            samples = samples.len(),
            sample_rate,
            "Playback disabled, discarding audio"
        );
        Ok(())
    }

    fn stop(&self) {}
}
