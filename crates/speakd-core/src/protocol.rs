//! Wire protocol: one JSON object per message in each direction.
//!
//! ## Requests
//!
//! | `action` | fields |
//! |---|---|
//! | `ping` | none |
//! | `start_session` | `session_id`, `save_path?`, `autoplay` (true), `total_chunks` (0) |
//! | `speak` | `session_id`, `text` (""), `voice?`, `speed` (1.0), `language?`, `trim_silence` (false), `trim_amount` (0.1), `is_last_chunk` (false) |
//! | `stop` | none |
//!
//! Unknown fields are ignored.
//!
//! ## Responses
//!
//! `{ "status": …, "message": …, "is_last_chunk"?: bool, "stats"?: {…} }`
//! with `status` one of `pong`, `session_started`, `generating`,
//! `generated`, `session_stats`, `stopped`, `error`.

use std::path::PathBuf;

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::SpeakError;
use crate::session::{SessionOptions, SessionStats};

const fn default_true() -> bool {
    true
}

const fn default_speed() -> f32 {
    1.0
}

const fn default_trim_amount() -> f64 {
    0.1
}

/// An empty `save_path` means "do not save".
fn deserialize_save_path<'de, D>(deserializer: D) -> Result<Option<PathBuf>, D::Error>
where
    D: Deserializer<'de>,
{
    let path = Option::<String>::deserialize(deserializer)?;
    Ok(path.filter(|p| !p.is_empty()).map(PathBuf::from))
}

/// `total_chunks` is advisory; values that are not a count read as 0.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::float_cmp
)]
fn deserialize_chunk_hint<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(value
        .as_u64()
        .or_else(|| {
            value
                .as_f64()
                .filter(|n| n.fract() == 0.0 && *n >= 0.0)
                .map(|n| n as u64)
        })
        .and_then(|n| u32::try_from(n).ok())
        .unwrap_or(0))
}

/// A decoded client request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Request {
    Ping,
    StartSession(StartSessionRequest),
    Speak(SpeakRequest),
    Stop,
}

/// `start_session` fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartSessionRequest {
    pub session_id: String,
    #[serde(default, deserialize_with = "deserialize_save_path")]
    pub save_path: Option<PathBuf>,
    #[serde(default = "default_true")]
    pub autoplay: bool,
    #[serde(default, deserialize_with = "deserialize_chunk_hint")]
    pub total_chunks: u32,
}

impl StartSessionRequest {
    pub fn options(&self) -> SessionOptions {
        SessionOptions {
            save_path: self.save_path.clone(),
            autoplay: self.autoplay,
            expected_chunks: self.total_chunks,
        }
    }
}

/// `speak` fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeakRequest {
    pub session_id: String,
    #[serde(default)]
    pub text: String,
    /// Voice name; the service default is used when absent.
    #[serde(default)]
    pub voice: Option<String>,
    #[serde(default = "default_speed")]
    pub speed: f32,
    /// Region preference such as `en-us` / `en-gb`.
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub trim_silence: bool,
    /// Seconds trimmed from each end when `trim_silence` is set.
    #[serde(default = "default_trim_amount")]
    pub trim_amount: f64,
    #[serde(default)]
    pub is_last_chunk: bool,
}

impl Request {
    /// Decode one incoming message.
    ///
    /// Unparseable JSON, a missing or unknown `action`, and badly typed
    /// fields all map to [`SpeakError::MalformedRequest`].
    pub fn decode(raw: &str) -> Result<Self, SpeakError> {
        let value: serde_json::Value = serde_json::from_str(raw)
            .map_err(|_| SpeakError::MalformedRequest("Invalid JSON".to_string()))?;

        let Some(action) = value.get("action") else {
            return Err(SpeakError::MalformedRequest(
                "Missing 'action' field".to_string(),
            ));
        };
        if let Some(name) = action.as_str() {
            if !matches!(name, "ping" | "start_session" | "speak" | "stop") {
                return Err(SpeakError::MalformedRequest(format!(
                    "Unknown action: {name}"
                )));
            }
        }

        serde_json::from_value(value)
            .map_err(|e| SpeakError::MalformedRequest(format!("Invalid request: {e}")))
    }

    /// The `action` name, for logging.
    pub const fn action(&self) -> &'static str {
        match self {
            Self::Ping => "ping",
            Self::StartSession(_) => "start_session",
            Self::Speak(_) => "speak",
            Self::Stop => "stop",
        }
    }
}

/// Response status tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseStatus {
    Pong,
    SessionStarted,
    Generating,
    Generated,
    SessionStats,
    Stopped,
    Error,
}

/// An outgoing message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub status: ResponseStatus,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_last_chunk: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stats: Option<SessionStats>,
}

impl Response {
    fn new(status: ResponseStatus, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            is_last_chunk: None,
            stats: None,
        }
    }

    pub fn pong() -> Self {
        Self::new(ResponseStatus::Pong, "Backend is alive")
    }

    pub fn session_started() -> Self {
        Self::new(ResponseStatus::SessionStarted, "Started new TTS session")
    }

    pub fn generating() -> Self {
        Self::new(ResponseStatus::Generating, "Generating speech...")
    }

    pub fn generated(is_last_chunk: bool) -> Self {
        Self {
            is_last_chunk: Some(is_last_chunk),
            ..Self::new(ResponseStatus::Generated, "Speech generated")
        }
    }

    pub fn session_stats(stats: SessionStats) -> Self {
        Self {
            stats: Some(stats),
            ..Self::new(ResponseStatus::SessionStats, stats.summary())
        }
    }

    pub fn stopped() -> Self {
        Self::new(ResponseStatus::Stopped, "Speech stopped")
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(ResponseStatus::Error, message)
    }

    /// Serialize to the JSON text frame sent to the client.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

impl From<&SpeakError> for Response {
    fn from(err: &SpeakError) -> Self {
        Self::error(err.to_string())
    }
}
