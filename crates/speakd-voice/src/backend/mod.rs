//! Speech pipeline construction.
//!
//! ## Backend implementations
//!
//! | Feature  | Module     | Engine |
//! |----------|------------|--------|
//! | `sherpa` | [`sherpa`] | Kokoro via sherpa-onnx |
//!
//! Without a backend feature, [`load_pipeline`] fails with
//! [`VoiceError::NoBackend`].

#[cfg(feature = "sherpa")]
pub mod sherpa;

use std::path::PathBuf;
use std::sync::Arc;

use speakd_core::SpeechPipeline;

use crate::error::VoiceError;

/// Where the synthesis model lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    /// Directory holding `model.onnx`, `voices.bin`, `tokens.txt` and
    /// `espeak-ng-data/`.
    pub model_dir: PathBuf,

    /// Inference threads handed to ONNX Runtime.
    pub num_threads: i32,
}

impl PipelineConfig {
    pub fn new(model_dir: impl Into<PathBuf>) -> Self {
        Self {
            model_dir: model_dir.into(),
            num_threads: 2,
        }
    }
}

/// Load the compiled-in synthesis backend.
///
/// Called once at startup; the returned pipeline is shared by every
/// connection.
#[cfg(feature = "sherpa")]
pub fn load_pipeline(config: &PipelineConfig) -> Result<Arc<dyn SpeechPipeline>, VoiceError> {
    let pipeline = sherpa::SherpaPipeline::load(config)?;
    Ok(Arc::new(pipeline))
}

/// Load the compiled-in synthesis backend.
#[cfg(not(feature = "sherpa"))]
pub fn load_pipeline(config: &PipelineConfig) -> Result<Arc<dyn SpeechPipeline>, VoiceError> {
    tracing::error!(
        model_dir = %config.model_dir.display(),
        "speakd was built without a TTS backend"
    );
    Err(VoiceError::NoBackend)
}
