//! Test collaborators shared by the speakd-ws integration tests.

// Each test binary uses a different subset of these helpers.
#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use speakd_core::{
    AudioFileWriter, AudioOutput, PipelineError, Response, ServiceConfig, SpeakError,
    SpeechPipeline,
};
use speakd_ws::{AppState, ServerDeps, build_state};
use tokio::sync::Notify;

pub const TEST_SAMPLE_RATE: u32 = 24_000;

/// Samples produced per character of input text.
pub const SAMPLES_PER_CHAR: usize = 10;

/// Pipeline that renders each chunk as a constant block whose value is the
/// chunk's character count, so merged audio reveals chunk order.
///
/// Text containing `FAIL` is rejected. Text containing `HOLD` signals
/// `entered` and then waits for `release` before rendering.
pub struct MockPipeline {
    voices: Vec<String>,
    pub calls: Mutex<Vec<(String, String)>>,
    pub entered: Notify,
    pub release: Notify,
}

impl MockPipeline {
    pub fn new() -> Self {
        Self {
            // `bf_blend` stands in for a voice registered after a merge.
            voices: ["af_bella", "am_adam", "bf_emma", "bm_george", "bf_blend"]
                .into_iter()
                .map(String::from)
                .collect(),
            calls: Mutex::new(Vec::new()),
            entered: Notify::new(),
            release: Notify::new(),
        }
    }

    /// The samples this pipeline returns for `text`.
    #[allow(clippy::cast_precision_loss)]
    pub fn render(text: &str) -> Vec<f32> {
        let chars = text.chars().count();
        vec![chars as f32; chars * SAMPLES_PER_CHAR]
    }
}

#[async_trait]
impl SpeechPipeline for MockPipeline {
    async fn synthesize(
        &self,
        text: &str,
        voice_key: &str,
        _speed: f32,
    ) -> Result<Vec<f32>, PipelineError> {
        self.calls
            .lock()
            .unwrap()
            .push((text.to_string(), voice_key.to_string()));
        if text.contains("FAIL") {
            return Err(PipelineError::new("model rejected input"));
        }
        if text.contains("HOLD") {
            self.entered.notify_one();
            self.release.notified().await;
        }
        Ok(Self::render(text))
    }

    fn has_voice(&self, voice_key: &str) -> bool {
        self.voices.iter().any(|v| v == voice_key)
    }

    fn voices(&self) -> Vec<String> {
        self.voices.clone()
    }

    fn sample_rate(&self) -> u32 {
        TEST_SAMPLE_RATE
    }
}

/// Records every played buffer.
#[derive(Default)]
pub struct RecordingOutput {
    pub played: Mutex<Vec<Vec<f32>>>,
    pub stops: AtomicUsize,
    pub fail: AtomicBool,
}

#[async_trait]
impl AudioOutput for RecordingOutput {
    async fn play(&self, samples: Vec<f32>, _sample_rate: u32) -> Result<(), SpeakError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(SpeakError::PlaybackFailed("no output device".to_string()));
        }
        self.played.lock().unwrap().push(samples);
        Ok(())
    }

    fn stop(&self) {
        self.stops.fetch_add(1, Ordering::SeqCst);
    }
}

/// Records every write instead of touching the filesystem.
#[derive(Default)]
pub struct RecordingWriter {
    pub written: Mutex<Vec<(PathBuf, Vec<f32>, u32)>>,
    pub fail: AtomicBool,
}

impl AudioFileWriter for RecordingWriter {
    fn write(&self, path: &Path, samples: &[f32], sample_rate: u32) -> Result<(), SpeakError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(SpeakError::PersistFailed {
                path: path.to_path_buf(),
                message: "disk full".to_string(),
            });
        }
        self.written
            .lock()
            .unwrap()
            .push((path.to_path_buf(), samples.to_vec(), sample_rate));
        Ok(())
    }
}

pub struct Harness {
    pub state: AppState,
    pub pipeline: Arc<MockPipeline>,
    pub output: Arc<RecordingOutput>,
    pub writer: Arc<RecordingWriter>,
}

pub fn harness() -> Harness {
    harness_with_writer(None)
}

/// Build state with mocks. `writer` overrides the recording writer.
pub fn harness_with_writer(writer: Option<Arc<dyn AudioFileWriter>>) -> Harness {
    let pipeline = Arc::new(MockPipeline::new());
    let output = Arc::new(RecordingOutput::default());
    let recording = Arc::new(RecordingWriter::default());

    let state = build_state(
        ServiceConfig::default(),
        ServerDeps {
            pipeline: pipeline.clone(),
            output: output.clone(),
            writer: writer.unwrap_or_else(|| recording.clone() as Arc<dyn AudioFileWriter>),
        },
    )
    .expect("default config is valid");

    Harness {
        state,
        pipeline,
        output,
        writer: recording,
    }
}

/// The `status` tags of a reply sequence, for order assertions.
pub fn statuses(responses: &[Response]) -> Vec<String> {
    responses
        .iter()
        .map(|r| {
            serde_json::to_value(r.status)
                .unwrap()
                .as_str()
                .unwrap()
                .to_string()
        })
        .collect()
}
