//! Synthesis invoker: the only caller of the speech pipeline.
//!
//! One [`invoke`](SynthesisInvoker::invoke) call synthesizes one chunk of
//! text. Dropping the returned future abandons the call. Failures are
//! reported once and never retried.

use std::sync::Arc;
use std::time::{Duration, Instant};

use speakd_core::{PipelineError, SpeakError, SpeechPipeline};

/// Silence trimming settings for one chunk.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SilenceTrim {
    pub enabled: bool,
    /// Seconds removed from each end.
    pub seconds: f64,
}

impl SilenceTrim {
    pub const fn disabled() -> Self {
        Self {
            enabled: false,
            seconds: 0.0,
        }
    }

    pub const fn seconds(seconds: f64) -> Self {
        Self {
            enabled: true,
            seconds,
        }
    }
}

impl Default for SilenceTrim {
    fn default() -> Self {
        Self::disabled()
    }
}

/// Remove `sample_rate * seconds` samples from both ends of `samples`.
///
/// Buffers no longer than twice the trim length are returned unmodified.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
pub fn trim_silence(mut samples: Vec<f32>, sample_rate: u32, seconds: f64) -> Vec<f32> {
    let trim = (f64::from(sample_rate) * seconds) as usize;
    if trim == 0 || samples.len() <= trim.saturating_mul(2) {
        return samples;
    }
    samples.truncate(samples.len() - trim);
    samples.drain(..trim);
    samples
}

/// Calls the pipeline for one chunk at a time.
#[derive(Clone)]
pub struct SynthesisInvoker {
    pipeline: Arc<dyn SpeechPipeline>,
    timeout: Option<Duration>,
}

impl SynthesisInvoker {
    pub fn new(pipeline: Arc<dyn SpeechPipeline>) -> Self {
        Self {
            pipeline,
            timeout: None,
        }
    }

    /// Bound each pipeline call. `None` waits indefinitely.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn has_voice(&self, voice_key: &str) -> bool {
        self.pipeline.has_voice(voice_key)
    }

    pub fn sample_rate(&self) -> u32 {
        self.pipeline.sample_rate()
    }

    pub fn pipeline(&self) -> &Arc<dyn SpeechPipeline> {
        &self.pipeline
    }

    /// Synthesize one chunk and apply the trim policy.
    pub async fn invoke(
        &self,
        text: &str,
        voice_key: &str,
        speed: f32,
        trim: SilenceTrim,
    ) -> Result<Vec<f32>, SpeakError> {
        tracing::debug!(
            text_len = text.len(),
            voice = %voice_key,
            speed,
            "Synthesizing chunk"
        );
        let started = Instant::now();

        let synthesis = self.pipeline.synthesize(text, voice_key, speed);
        let result = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, synthesis).await.unwrap_or_else(|_| {
                Err(PipelineError::new(format!(
                    "timed out after {}s",
                    limit.as_secs_f32()
                )))
            }),
            None => synthesis.await,
        };

        let samples = result.map_err(|e| {
            tracing::error!(voice = %voice_key, error = %e, "Failed to generate speech");
            SpeakError::from(e)
        })?;

        let raw_len = samples.len();
        let samples = if trim.enabled {
            trim_silence(samples, self.pipeline.sample_rate(), trim.seconds)
        } else {
            samples
        };

        tracing::debug!(
            samples = samples.len(),
            trimmed = raw_len - samples.len(),
            duration_ms = started.elapsed().as_millis(),
            "Chunk synthesized"
        );

        Ok(samples)
    }
}
