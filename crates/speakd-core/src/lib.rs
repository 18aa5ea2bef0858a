#![doc = include_str!("../README.md")]
#![deny(unused_crate_dependencies)]

pub mod error;
pub mod merge;
pub mod ports;
pub mod protocol;
pub mod session;
pub mod settings;
pub mod voice;

// Re-export commonly used types for convenience
pub use error::{SessionErrorKind, SpeakError};
pub use merge::{MergeError, WEIGHT_SUM_TOLERANCE, merge_embeddings, validate_weights};
pub use ports::{AudioFileWriter, AudioOutput, NullAudioOutput, PipelineError, SpeechPipeline};
pub use protocol::{Request, Response, ResponseStatus, SpeakRequest, StartSessionRequest};
pub use session::{
    AudioAccumulator, FinalizedSession, SessionInfo, SessionLease, SessionOptions,
    SessionRegistry, SessionStats,
};
pub use settings::{
    DEFAULT_HOST, DEFAULT_PORT, DEFAULT_SAMPLE_RATE, DEFAULT_VOICE, ServiceConfig, SettingsError,
    validate_config,
};
pub use voice::{Region, VoiceDescriptor, VoiceResolver};
