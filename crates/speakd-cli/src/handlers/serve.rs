//! `speakd serve`.

use anyhow::Result;
use speakd_ws::build_state;

use crate::bootstrap::build_deps;
use crate::commands::ServeArgs;
use crate::error::CliError;

/// Load everything, then serve until a shutdown signal.
pub async fn execute(args: &ServeArgs) -> Result<()> {
    tracing::info!(
        model_dir = %args.model_dir.display(),
        playback = !args.no_playback,
        "Starting speakd"
    );

    let deps = build_deps(args)?;
    let state = build_state(args.service_config(), deps).map_err(CliError::from)?;

    speakd_ws::serve(state).await.map_err(CliError::from)?;
    Ok(())
}
