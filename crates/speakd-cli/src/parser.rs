//! Root CLI parser.

use clap::Parser;

use crate::commands::Commands;

/// Local text-to-speech session service.
#[derive(Parser)]
#[command(name = "speakd")]
#[command(about = "Local text-to-speech session service")]
#[command(version)]
pub struct Cli {
    /// Enable verbose/debug output
    #[arg(short = 'v', long = "verbose", global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Log filter used when `RUST_LOG` is unset.
    pub const fn default_log_filter(&self) -> &'static str {
        if self.verbose { "debug" } else { "info" }
    }
}
