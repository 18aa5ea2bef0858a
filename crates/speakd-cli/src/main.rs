//! CLI entry point.

use clap::Parser;
use speakd_cli::{Cli, CliError, Commands, handlers};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(cli.default_log_filter()));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    if let Err(err) = run(cli).await {
        let code = err.downcast_ref::<CliError>().map_or(1, CliError::exit_code);
        tracing::error!(error = %err, "speakd failed");
        eprintln!("Error: {err:#}");
        std::process::exit(code);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Serve(args) => handlers::serve::execute(&args).await,
        Commands::MergeVoices(args) => handlers::merge_voices::execute(&args),
        Commands::Voices => {
            handlers::voices::execute();
            Ok(())
        }
    }
}
