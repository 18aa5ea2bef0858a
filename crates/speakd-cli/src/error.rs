//! CLI error types and exit codes.

use speakd_voice::VoiceError;
use speakd_ws::ServerError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    /// Argument validation error.
    #[error("Invalid arguments: {0}")]
    Arguments(String),

    /// IO error (missing files, permissions).
    #[error("IO error: {0}")]
    Io(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Model or audio device failed to initialize.
    #[error("Initialization failed: {0}")]
    Init(String),

    /// The server could not bind or stopped abnormally.
    #[error("{0}")]
    Server(String),
}

impl CliError {
    /// Map error to a sysexits-style exit code.
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::Arguments(_) => 2, // EX_USAGE
            Self::Io(_) => 74,       // EX_IOERR
            Self::Config(_) => 78,   // EX_CONFIG
            Self::Init(_) => 69,     // EX_UNAVAILABLE
            Self::Server(_) => 71,   // EX_OSERR
        }
    }
}

impl From<VoiceError> for CliError {
    fn from(err: VoiceError) -> Self {
        match err {
            VoiceError::Merge(_)
            | VoiceError::InvalidVoiceKey(_)
            | VoiceError::DuplicateVoice(_) => Self::Arguments(err.to_string()),
            VoiceError::Io(_)
            | VoiceError::InvalidVoiceFile { .. }
            | VoiceError::ModelNotFound(_) => Self::Io(err.to_string()),
            _ => Self::Init(err.to_string()),
        }
    }
}

impl From<ServerError> for CliError {
    fn from(err: ServerError) -> Self {
        match err {
            ServerError::Config(_) => Self::Config(err.to_string()),
            ServerError::Bind { .. } | ServerError::Serve(_) => Self::Server(err.to_string()),
        }
    }
}
