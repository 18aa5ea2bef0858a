//! Speaker table of a Kokoro model directory.
//!
//! `voices.bin` packs one style embedding per speaker, back to back, and the
//! speaker id of a voice is its position in that file. `speakers.txt` names
//! the speakers in the same order, one key per line. Without a listing the
//! table of the stock `kokoro-en-v0_19` model applies.
//!
//! [`register_voice`] appends a new embedding and its key to both files, so
//! a merged voice becomes addressable by name the next time the model loads.

use std::collections::HashMap;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

use speakd_core::voice::base_name;

use crate::error::VoiceError;

/// Speakers of `kokoro-en-v0_19`, in speaker-id order.
pub const BUNDLED_SPEAKERS: &[&str] = &[
    "af",
    "af_bella",
    "af_nicole",
    "af_sarah",
    "af_sky",
    "am_adam",
    "am_michael",
    "bf_emma",
    "bf_isabella",
    "bm_george",
    "bm_lewis",
];

pub const SPEAKERS_FILE: &str = "speakers.txt";
pub const VOICES_FILE: &str = "voices.bin";

/// Voice key to speaker id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpeakerTable {
    names: Vec<String>,
    ids: HashMap<String, i32>,
}

impl SpeakerTable {
    /// Read `speakers.txt` from `model_dir`, or fall back to the bundled table.
    pub fn load(model_dir: &Path) -> Result<Self, VoiceError> {
        let listing = model_dir.join(SPEAKERS_FILE);
        let names = if listing.exists() {
            std::fs::read_to_string(&listing)?
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(ToString::to_string)
                .collect()
        } else {
            BUNDLED_SPEAKERS.iter().map(ToString::to_string).collect()
        };
        Self::from_names(names)
    }

    fn from_names(names: Vec<String>) -> Result<Self, VoiceError> {
        let ids = names
            .iter()
            .enumerate()
            .map(|(sid, name)| {
                i32::try_from(sid)
                    .map(|sid| (name.clone(), sid))
                    .map_err(|_| VoiceError::ModelLoadError("too many speakers".to_string()))
            })
            .collect::<Result<_, _>>()?;
        Ok(Self { names, ids })
    }

    pub fn id(&self, voice_key: &str) -> Option<i32> {
        self.ids.get(voice_key).copied()
    }

    pub fn has_voice(&self, voice_key: &str) -> bool {
        self.ids.contains_key(voice_key)
    }

    /// Voice keys in speaker-id order.
    pub fn voices(&self) -> Vec<String> {
        self.names.clone()
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Append `embedding` to the model's `voices.bin` under `voice_key`.
///
/// The key needs a region prefix (`af_`, `bm_`, ...) so the resolver can
/// place it. `voices.bin` must hold exactly one embedding of the same size
/// per listed speaker. Returns the new speaker id.
pub fn register_voice(
    model_dir: &Path,
    voice_key: &str,
    embedding: &[f32],
) -> Result<i32, VoiceError> {
    if base_name(voice_key) == voice_key {
        return Err(VoiceError::InvalidVoiceKey(voice_key.to_string()));
    }

    let voices_path = model_dir.join(VOICES_FILE);
    if !voices_path.exists() {
        return Err(VoiceError::ModelNotFound(voices_path));
    }

    let table = SpeakerTable::load(model_dir)?;
    if table.has_voice(voice_key) {
        return Err(VoiceError::DuplicateVoice(voice_key.to_string()));
    }

    let stride = std::mem::size_of_val(embedding) as u64;
    let packed = std::fs::metadata(&voices_path)?.len();
    if stride == 0 || packed % stride != 0 || packed / stride != table.len() as u64 {
        return Err(VoiceError::InvalidVoiceFile {
            path: voices_path,
            message: format!(
                "{packed} bytes do not hold {} voices of {stride} bytes",
                table.len()
            ),
        });
    }

    let bytes: Vec<u8> = embedding.iter().flat_map(|v| v.to_le_bytes()).collect();
    OpenOptions::new()
        .append(true)
        .open(&voices_path)?
        .write_all(&bytes)?;

    let mut names = table.voices();
    names.push(voice_key.to_string());
    let mut listing = names.join("\n");
    listing.push('\n');
    std::fs::write(model_dir.join(SPEAKERS_FILE), listing)?;

    let table = SpeakerTable::from_names(names)?;
    let sid = table
        .id(voice_key)
        .ok_or_else(|| VoiceError::ModelLoadError("too many speakers".to_string()))?;

    tracing::info!(
        voice = %voice_key,
        speaker_id = sid,
        model_dir = %model_dir.display(),
        "Registered voice"
    );
    Ok(sid)
}
