//! Voice adapter error types.

use std::path::PathBuf;

use speakd_core::{MergeError, SpeakError};

/// Errors raised while loading models, talking to the audio device, or
/// reading and writing audio files.
#[derive(Debug, thiserror::Error)]
pub enum VoiceError {
    /// Model or voice file not found at expected path.
    #[error("Voice model not found at {0}")]
    ModelNotFound(PathBuf),

    /// The synthesis model failed to load.
    #[error("Failed to load TTS model: {0}")]
    ModelLoadError(String),

    /// No synthesis backend was compiled in.
    #[error("No TTS backend available, rebuild with the `sherpa` feature")]
    NoBackend,

    /// Failed to synthesize speech.
    #[error("Speech synthesis failed: {0}")]
    SynthesisError(String),

    /// Failed to open audio output stream.
    #[error("Failed to open audio output stream: {0}")]
    OutputStreamError(String),

    /// The dedicated audio thread is gone.
    #[error("Audio thread terminated unexpectedly")]
    AudioThreadDied,

    /// WAV encoding failed.
    #[error("Failed to write WAV file {}: {message}", path.display())]
    WavError { path: PathBuf, message: String },

    /// A voice embedding file is unusable.
    #[error("Invalid voice file {}: {message}", path.display())]
    InvalidVoiceFile { path: PathBuf, message: String },

    /// A voice key without a region prefix.
    #[error("Invalid voice key {0}: expected a region prefix such as af_ or bm_")]
    InvalidVoiceKey(String),

    /// The model already has a voice with this key.
    #[error("Voice already registered: {0}")]
    DuplicateVoice(String),

    /// Voice merge parameters were rejected.
    #[error(transparent)]
    Merge(#[from] MergeError),

    /// IO error (model files, voice files, output directories).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<VoiceError> for SpeakError {
    fn from(err: VoiceError) -> Self {
        match err {
            VoiceError::SynthesisError(message) => Self::SynthesisFailed(message),
            VoiceError::WavError { path, message } => Self::PersistFailed { path, message },
            VoiceError::OutputStreamError(_) | VoiceError::AudioThreadDied => {
                Self::PlaybackFailed(err.to_string())
            }
            other => Self::SynthesisFailed(other.to_string()),
        }
    }
}
