//! Per-request error taxonomy.
//!
//! Every failure that can happen while serving one protocol request maps to a
//! [`SpeakError`]. The protocol handler converts these into `error` replies;
//! none of them terminate the connection or the process.

use std::fmt;
use std::path::PathBuf;

/// Why a session identifier was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionErrorKind {
    /// No open session has this identifier.
    NotFound,
    /// A session with this identifier is already open.
    Duplicate,
}

impl fmt::Display for SessionErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => f.write_str("Invalid session ID"),
            Self::Duplicate => f.write_str("Session already open"),
        }
    }
}

/// Errors surfaced to a client as an `error` reply.
#[derive(Debug, thiserror::Error)]
pub enum SpeakError {
    /// The request body could not be decoded.
    #[error("{0}")]
    MalformedRequest(String),

    /// Unknown or duplicate session identifier.
    #[error("{kind}: {id}")]
    InvalidSession { id: String, kind: SessionErrorKind },

    /// The resolved voice key is not among the loaded voices.
    #[error("Voice not found: {0}")]
    VoiceNotFound(String),

    /// The synthesis pipeline failed for this chunk.
    #[error("Speech synthesis failed: {0}")]
    SynthesisFailed(String),

    /// The audio device could not play the merged audio.
    #[error("Audio playback failed: {0}")]
    PlaybackFailed(String),

    /// The merged audio could not be written to disk.
    #[error("Failed to save audio to {}: {message}", path.display())]
    PersistFailed { path: PathBuf, message: String },
}

impl SpeakError {
    /// An unknown session identifier.
    pub fn session_not_found(id: impl Into<String>) -> Self {
        Self::InvalidSession {
            id: id.into(),
            kind: SessionErrorKind::NotFound,
        }
    }

    /// A session identifier that is already open.
    pub fn duplicate_session(id: impl Into<String>) -> Self {
        Self::InvalidSession {
            id: id.into(),
            kind: SessionErrorKind::Duplicate,
        }
    }

    /// Whether this is an unknown-session error.
    pub fn is_session_not_found(&self) -> bool {
        matches!(
            self,
            Self::InvalidSession {
                kind: SessionErrorKind::NotFound,
                ..
            }
        )
    }

    /// Whether this is a duplicate-session error.
    pub fn is_duplicate_session(&self) -> bool {
        matches!(
            self,
            Self::InvalidSession {
                kind: SessionErrorKind::Duplicate,
                ..
            }
        )
    }

    /// Stable label for structured logging.
    pub const fn label(&self) -> &'static str {
        match self {
            Self::MalformedRequest(_) => "malformed_request",
            Self::InvalidSession { .. } => "invalid_session",
            Self::VoiceNotFound(_) => "voice_not_found",
            Self::SynthesisFailed(_) => "synthesis_failed",
            Self::PlaybackFailed(_) => "playback_failed",
            Self::PersistFailed { .. } => "persist_failed",
        }
    }
}
