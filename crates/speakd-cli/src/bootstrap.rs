//! CLI composition root: builds the adapters the server is wired with.

use std::sync::Arc;

use speakd_core::{AudioOutput, NullAudioOutput};
use speakd_voice::{PipelineConfig, WavFileWriter, load_pipeline};
use speakd_ws::ServerDeps;

use crate::commands::ServeArgs;
use crate::error::CliError;

/// Load the model and open the audio device.
///
/// A missing model is fatal. A missing audio device is not: the service
/// still synthesizes and saves, it just cannot play.
pub fn build_deps(args: &ServeArgs) -> Result<ServerDeps, CliError> {
    let pipeline = load_pipeline(&PipelineConfig::new(&args.model_dir))?;

    Ok(ServerDeps {
        pipeline,
        output: audio_output(args.no_playback),
        writer: Arc::new(WavFileWriter),
    })
}

#[cfg(feature = "playback")]
fn audio_output(disabled: bool) -> Arc<dyn AudioOutput> {
    if disabled {
        tracing::info!("Local playback disabled");
        return Arc::new(NullAudioOutput);
    }
    match speakd_voice::LocalPlayback::spawn() {
        Ok(playback) => Arc::new(playback),
        Err(e) => {
            tracing::warn!(error = %e, "No audio output available, playback disabled");
            Arc::new(NullAudioOutput)
        }
    }
}

#[cfg(not(feature = "playback"))]
fn audio_output(disabled: bool) -> Arc<dyn AudioOutput> {
    if !disabled {
        tracing::info!("Built without the `playback` feature, audio will not be played");
    }
    Arc::new(NullAudioOutput)
}
