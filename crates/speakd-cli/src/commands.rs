//! Subcommands and their arguments.

use std::path::PathBuf;

use clap::{Args, Subcommand};
use speakd_core::{DEFAULT_HOST, DEFAULT_PORT, DEFAULT_VOICE, ServiceConfig};

#[derive(Subcommand)]
pub enum Commands {
    /// Run the WebSocket TTS service
    Serve(ServeArgs),

    /// Merge voice embedding files into a new voice
    MergeVoices(MergeVoicesArgs),

    /// List built-in voices with their default region
    Voices,
}

#[derive(Debug, Clone, Args)]
pub struct ServeArgs {
    /// Interface to bind
    #[arg(long, env = "SPEAKD_HOST", default_value = DEFAULT_HOST)]
    pub host: String,

    /// Port to listen on
    #[arg(short, long, env = "SPEAKD_PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Directory containing the Kokoro model files
    #[arg(long, env = "SPEAKD_MODEL_DIR", default_value = "models/kokoro")]
    pub model_dir: PathBuf,

    /// Voice used when a request names none
    #[arg(long, env = "SPEAKD_DEFAULT_VOICE", default_value = DEFAULT_VOICE)]
    pub default_voice: String,

    /// Never play audio on the local device
    #[arg(long, env = "SPEAKD_NO_PLAYBACK")]
    pub no_playback: bool,

    /// Abandon a synthesis call after this many seconds
    #[arg(long, env = "SPEAKD_SYNTHESIS_TIMEOUT_SECS")]
    pub synthesis_timeout_secs: Option<u64>,
}

impl ServeArgs {
    pub fn service_config(&self) -> ServiceConfig {
        ServiceConfig {
            host: self.host.clone(),
            port: self.port,
            default_voice: self.default_voice.clone(),
            synthesis_timeout_secs: self.synthesis_timeout_secs,
            ..ServiceConfig::default()
        }
    }
}

#[derive(Debug, Clone, Args)]
pub struct MergeVoicesArgs {
    /// Voice files to merge
    #[arg(long, num_args = 1.., required = true)]
    pub voices: Vec<PathBuf>,

    /// One weight per voice, summing to 1 (default: equal weights)
    #[arg(long, num_args = 1..)]
    pub weights: Option<Vec<f32>>,

    /// Where to write the merged voice
    #[arg(short, long)]
    pub output: PathBuf,

    /// Also add the merged voice to this model directory's speaker table
    #[arg(long, value_name = "MODEL_DIR")]
    pub register: Option<PathBuf>,

    /// Voice key to register under (default: the output file stem)
    #[arg(long, requires = "register")]
    pub name: Option<String>,
}

impl MergeVoicesArgs {
    /// Key the merged voice is registered under.
    pub fn voice_key(&self) -> Option<String> {
        self.name.clone().or_else(|| {
            self.output
                .file_stem()
                .and_then(|stem| stem.to_str())
                .map(ToString::to_string)
        })
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;
    use crate::parser::Cli;

    fn parse(args: &[&str]) -> Commands {
        Cli::parse_from(std::iter::once("speakd").chain(args.iter().copied())).command
    }

    #[test]
    fn test_serve_defaults() {
        let Commands::Serve(args) = parse(&["serve"]) else {
            panic!("expected serve");
        };
        // Environment may override, so only check the non-env-backed shape.
        let config = args.service_config();
        assert_eq!(config.sample_rate, 24_000);
        assert_eq!(config.bind_address(), format!("{}:{}", args.host, args.port));
    }

    #[test]
    fn test_serve_flags() {
        let Commands::Serve(args) = parse(&[
            "serve",
            "--host",
            "0.0.0.0",
            "--port",
            "9000",
            "--model-dir",
            "/opt/kokoro",
            "--default-voice",
            "bf_emma",
            "--no-playback",
            "--synthesis-timeout-secs",
            "30",
        ]) else {
            panic!("expected serve");
        };
        assert!(args.no_playback);
        assert_eq!(args.model_dir, PathBuf::from("/opt/kokoro"));

        let config = args.service_config();
        assert_eq!(config.bind_address(), "0.0.0.0:9000");
        assert_eq!(config.default_voice, "bf_emma");
        assert_eq!(config.synthesis_timeout_secs, Some(30));
    }

    #[test]
    fn test_merge_voices_args() {
        let Commands::MergeVoices(args) = parse(&[
            "merge-voices",
            "--voices",
            "a.bin",
            "b.bin",
            "--weights",
            "0.3",
            "0.7",
            "--output",
            "out/merged.bin",
        ]) else {
            panic!("expected merge-voices");
        };
        assert_eq!(args.voices.len(), 2);
        assert_eq!(args.weights, Some(vec![0.3, 0.7]));
        assert_eq!(args.output, PathBuf::from("out/merged.bin"));
    }

    #[test]
    fn test_merge_voices_register_key() {
        let Commands::MergeVoices(args) = parse(&[
            "merge-voices",
            "--voices",
            "a.bin",
            "--output",
            "out/bf_blend.bin",
            "--register",
            "models/kokoro",
        ]) else {
            panic!("expected merge-voices");
        };
        assert_eq!(args.register, Some(PathBuf::from("models/kokoro")));
        assert_eq!(args.voice_key().as_deref(), Some("bf_blend"));

        let Commands::MergeVoices(args) = parse(&[
            "merge-voices",
            "--voices",
            "a.bin",
            "--output",
            "out/merged.bin",
            "--register",
            "models/kokoro",
            "--name",
            "am_mix",
        ]) else {
            panic!("expected merge-voices");
        };
        assert_eq!(args.voice_key().as_deref(), Some("am_mix"));
    }

    #[test]
    fn test_merge_voices_name_requires_register() {
        assert!(
            Cli::try_parse_from([
                "speakd",
                "merge-voices",
                "--voices",
                "a.bin",
                "--output",
                "m.bin",
                "--name",
                "af_mix"
            ])
            .is_err()
        );
    }

    #[test]
    fn test_merge_voices_requires_output() {
        assert!(Cli::try_parse_from(["speakd", "merge-voices", "--voices", "a.bin"]).is_err());
    }
}
