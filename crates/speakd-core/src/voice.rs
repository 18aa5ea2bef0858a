//! Voice resolution: user-supplied voice names to concrete voice keys.
//!
//! Kokoro voice keys have the shape `<region><gender>_<name>`, e.g. `af_bella`
//! (region `a`, female) or `bm_george` (region `b`, male). Clients may send a
//! full key, a bare base name (`f_bella`), and an optional language
//! preference. [`VoiceResolver`] turns that into the key the pipeline knows.
//!
//! The resolver is pure: whether the resulting key is actually loaded is
//! checked by the caller against the pipeline.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// The two language/accent variants a Kokoro voice can be rendered in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Region {
    /// Prefix `a` (American English).
    A,
    /// Prefix `b` (British English).
    B,
}

impl Region {
    /// The single-character key prefix.
    pub const fn prefix(self) -> char {
        match self {
            Self::A => 'a',
            Self::B => 'b',
        }
    }

    /// Parse a key prefix character.
    pub const fn from_prefix(c: char) -> Option<Self> {
        match c {
            'a' => Some(Self::A),
            'b' => Some(Self::B),
            _ => None,
        }
    }

    /// Interpret a client language preference.
    ///
    /// Returns `None` for anything that does not name a region explicitly
    /// (`"default"`, empty string, other languages), meaning "use the
    /// voice's default".
    pub fn from_preference(preference: &str) -> Option<Self> {
        match preference.trim().to_ascii_lowercase().as_str() {
            "a" | "en-us" | "en_us" | "american" => Some(Self::A),
            "b" | "en-gb" | "en_gb" | "british" => Some(Self::B),
            _ => None,
        }
    }

    /// Human-readable label.
    pub const fn label(self) -> &'static str {
        match self {
            Self::A => "American English",
            Self::B => "British English",
        }
    }
}

/// A voice split into base name and region. Recomputed per request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoiceDescriptor {
    pub base_name: String,
    pub region: Region,
}

impl VoiceDescriptor {
    /// The `<prefix><base_name>` key understood by the pipeline.
    pub fn key(&self) -> String {
        format!("{}{}", self.region.prefix(), self.base_name)
    }
}

impl fmt::Display for VoiceDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.region.prefix(), self.base_name)
    }
}

/// Default region for each base name in the Kokoro v1.0 voice set.
const DEFAULT_REGIONS: &[(&str, Region)] = &[
    // Region A, female
    ("f_alloy", Region::A),
    ("f_aoede", Region::A),
    ("f_bella", Region::A),
    ("f_heart", Region::A),
    ("f_jessica", Region::A),
    ("f_kore", Region::A),
    ("f_nicole", Region::A),
    ("f_nova", Region::A),
    ("f_river", Region::A),
    ("f_sarah", Region::A),
    ("f_sky", Region::A),
    // Region A, male
    ("m_adam", Region::A),
    ("m_echo", Region::A),
    ("m_eric", Region::A),
    ("m_fenrir", Region::A),
    ("m_liam", Region::A),
    ("m_michael", Region::A),
    ("m_onyx", Region::A),
    ("m_puck", Region::A),
    // Region B, female
    ("f_alice", Region::B),
    ("f_emma", Region::B),
    ("f_isabella", Region::B),
    ("f_lily", Region::B),
    // Region B, male
    ("m_daniel", Region::B),
    ("m_fable", Region::B),
    ("m_george", Region::B),
    ("m_lewis", Region::B),
];

/// Strip a region prefix from a voice name.
///
/// Only names with the full `<a|b><f|m>_` shape are treated as prefixed, so
/// a bare base name such as `f_bella` or an arbitrary custom name is
/// returned unchanged.
pub fn base_name(voice_name: &str) -> &str {
    let bytes = voice_name.as_bytes();
    let prefixed = bytes.len() > 3
        && Region::from_prefix(char::from(bytes[0])).is_some()
        && matches!(bytes[1], b'f' | b'm')
        && bytes[2] == b'_';
    if prefixed { &voice_name[1..] } else { voice_name }
}

/// Resolves voice names against the per-voice default region table.
#[derive(Debug, Clone)]
pub struct VoiceResolver {
    defaults: HashMap<String, Region>,
}

impl Default for VoiceResolver {
    fn default() -> Self {
        Self {
            defaults: DEFAULT_REGIONS
                .iter()
                .map(|&(name, region)| (name.to_string(), region))
                .collect(),
        }
    }
}

impl VoiceResolver {
    /// Resolver backed by the built-in Kokoro table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or override) the default region for a base name, e.g. for
    /// a merged custom voice.
    #[must_use]
    pub fn with_default(mut self, base_name: impl Into<String>, region: Region) -> Self {
        self.defaults.insert(base_name.into(), region);
        self
    }

    /// Learn the region of every prefixed key whose base name is not in the
    /// table yet, e.g. voices registered with a model after merging.
    #[must_use]
    pub fn with_voice_keys<I, S>(self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        keys.into_iter().fold(self, |resolver, key| {
            let key = key.as_ref();
            let base = base_name(key);
            let region = key.chars().next().and_then(Region::from_prefix);
            match region {
                Some(region) if base != key && !resolver.defaults.contains_key(base) => {
                    resolver.with_default(base, region)
                }
                _ => resolver,
            }
        })
    }

    /// Default region for a base name; unknown names default to region A.
    pub fn default_region(&self, base_name: &str) -> Region {
        self.defaults.get(base_name).copied().unwrap_or(Region::A)
    }

    /// Split `voice_name` and pick a region.
    ///
    /// An explicit region preference wins over the table default.
    pub fn describe(&self, voice_name: &str, preference: Option<&str>) -> VoiceDescriptor {
        let base = base_name(voice_name);
        let region = preference
            .and_then(Region::from_preference)
            .unwrap_or_else(|| self.default_region(base));
        VoiceDescriptor {
            base_name: base.to_string(),
            region,
        }
    }

    /// Resolve to the concrete voice key.
    pub fn resolve(&self, voice_name: &str, preference: Option<&str>) -> String {
        self.describe(voice_name, preference).key()
    }

    /// All known voices as full keys with their default region, sorted.
    pub fn known_voices(&self) -> Vec<(String, Region)> {
        let mut voices: Vec<_> = self
            .defaults
            .iter()
            .map(|(base, &region)| (format!("{}{base}", region.prefix()), region))
            .collect();
        voices.sort();
        voices
    }
}
