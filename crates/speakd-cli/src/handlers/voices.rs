//! `speakd voices`.

use speakd_core::VoiceResolver;

pub fn execute() {
    for line in catalogue(&VoiceResolver::new()) {
        println!("{line}");
    }
}

/// One line per known voice: key and default region.
pub fn catalogue(resolver: &VoiceResolver) -> Vec<String> {
    resolver
        .known_voices()
        .into_iter()
        .map(|(key, region)| format!("{key:<14} {}", region.label()))
        .collect()
}
