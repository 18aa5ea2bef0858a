//! Service configuration types and validation.
//!
//! Resolved once at startup (CLI flags, environment) and passed into the
//! server; nothing reads configuration ad hoc afterwards.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default listen address. The protocol is for a single trusted local
/// client, so the service binds to loopback.
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Default WebSocket port.
pub const DEFAULT_PORT: u16 = 7851;

/// Kokoro output sample rate, also used for saved audio files.
pub const DEFAULT_SAMPLE_RATE: u32 = 24_000;

/// Voice used when a `speak` request names none.
pub const DEFAULT_VOICE: &str = "af_bella";

/// Service settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ServiceConfig {
    /// Interface to bind.
    pub host: String,

    /// Port to bind.
    pub port: u16,

    /// Sample rate for playback and saved files.
    pub sample_rate: u32,

    /// Voice used when a request does not name one.
    pub default_voice: String,

    /// Upper bound on one synthesis call, in seconds.
    ///
    /// `None` waits indefinitely.
    pub synthesis_timeout_secs: Option<u64>,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            sample_rate: DEFAULT_SAMPLE_RATE,
            default_voice: DEFAULT_VOICE.to_string(),
            synthesis_timeout_secs: None,
        }
    }
}

impl ServiceConfig {
    /// `host:port` for the listener.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn synthesis_timeout(&self) -> Option<Duration> {
        self.synthesis_timeout_secs.map(Duration::from_secs)
    }
}

/// Configuration validation error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SettingsError {
    #[error("Host cannot be empty")]
    EmptyHost,

    #[error("Sample rate must be greater than zero")]
    InvalidSampleRate,

    #[error("Default voice cannot be empty")]
    EmptyDefaultVoice,

    #[error("Synthesis timeout must be at least one second, got {0}")]
    InvalidTimeout(u64),
}

/// Validate configuration values.
pub fn validate_config(config: &ServiceConfig) -> Result<(), SettingsError> {
    if config.host.trim().is_empty() {
        return Err(SettingsError::EmptyHost);
    }

    if config.sample_rate == 0 {
        return Err(SettingsError::InvalidSampleRate);
    }

    if config.default_voice.trim().is_empty() {
        return Err(SettingsError::EmptyDefaultVoice);
    }

    if let Some(secs) = config.synthesis_timeout_secs {
        if secs == 0 {
            return Err(SettingsError::InvalidTimeout(secs));
        }
    }

    Ok(())
}
