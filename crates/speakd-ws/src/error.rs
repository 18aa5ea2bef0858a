//! Server error types.

use speakd_core::SettingsError;
use thiserror::Error;

/// Fatal server errors. Per-request failures never surface here; they
/// become `error` replies on the connection.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Configuration rejected at startup.
    #[error("Invalid configuration: {0}")]
    Config(#[from] SettingsError),

    /// The listen address could not be bound.
    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    /// The accept loop failed.
    #[error("Server error: {0}")]
    Serve(#[source] std::io::Error),
}
