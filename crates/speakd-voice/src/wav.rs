//! WAV persistence for finalized sessions.

use std::path::Path;

use speakd_core::{AudioFileWriter, SpeakError};

use crate::error::VoiceError;

/// Writes mono 32-bit float WAV files.
#[derive(Debug, Clone, Copy, Default)]
pub struct WavFileWriter;

impl WavFileWriter {
    /// Encode `samples` to `path`, creating parent directories first.
    pub fn write_wav(path: &Path, samples: &[f32], sample_rate: u32) -> Result<(), VoiceError> {
        let wav_error = |e: &dyn std::fmt::Display| VoiceError::WavError {
            path: path.to_path_buf(),
            message: e.to_string(),
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| wav_error(&e))?;
        }

        let spec = hound::WavSpec {
            channels: 1,
            sample_rate,
            bits_per_sample: 32,
            sample_format: hound::SampleFormat::Float,
        };

        let mut writer = hound::WavWriter::create(path, spec).map_err(|e| wav_error(&e))?;
        for &sample in samples {
            writer.write_sample(sample).map_err(|e| wav_error(&e))?;
        }
        writer.finalize().map_err(|e| wav_error(&e))?;

        tracing::info!(
            path = %path.display(),
            samples = samples.len(),
            sample_rate,
            "Saved session audio"
        );
        Ok(())
    }
}

impl AudioFileWriter for WavFileWriter {
    fn write(&self, path: &Path, samples: &[f32], sample_rate: u32) -> Result<(), SpeakError> {
        Ok(Self::write_wav(path, samples, sample_rate)?)
    }
}
