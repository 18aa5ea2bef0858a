#![doc = include_str!("../README.md")]
#![deny(unused_crate_dependencies)]

// Only the feature-gated adapters implement the async ports
#[cfg(not(any(feature = "sherpa", feature = "playback")))]
use async_trait as _;

pub mod backend;
pub mod error;
pub mod invoker;
#[cfg(feature = "playback")]
pub mod playback;
pub mod speakers;
pub mod voice_file;
pub mod wav;

// Re-export key types for convenience
pub use backend::{PipelineConfig, load_pipeline};
pub use error::VoiceError;
pub use invoker::{SilenceTrim, SynthesisInvoker, trim_silence};
#[cfg(feature = "playback")]
pub use playback::LocalPlayback;
pub use speakers::{SpeakerTable, register_voice};
pub use voice_file::{MergeSummary, load_voice, merge_voice_files, save_voice};
pub use wav::WavFileWriter;
