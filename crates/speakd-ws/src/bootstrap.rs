//! Server bootstrap, the composition root for the WebSocket service.
//!
//! Adapters (pipeline, audio device, file writer) are built by the caller and
//! injected through [`ServerDeps`]; this module only wires them into
//! [`AppState`] and runs the accept loop.

use std::sync::Arc;
use std::time::Duration;

use speakd_core::{
    AudioFileWriter, AudioOutput, ServiceConfig, SpeechPipeline, validate_config,
};
use speakd_voice::SynthesisInvoker;
use tokio::net::TcpListener;

use crate::error::ServerError;
use crate::routes::create_router;
use crate::shutdown::shutdown_signal;
use crate::state::{AppState, ServiceContext};

/// How long connections get to wind down after shutdown is triggered.
pub const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// Injected collaborators.
pub struct ServerDeps {
    pub pipeline: Arc<dyn SpeechPipeline>,
    pub output: Arc<dyn AudioOutput>,
    pub writer: Arc<dyn AudioFileWriter>,
}

/// Validate `config` and assemble the shared state.
pub fn build_state(config: ServiceConfig, deps: ServerDeps) -> Result<AppState, ServerError> {
    validate_config(&config)?;

    let pipeline_rate = deps.pipeline.sample_rate();
    if pipeline_rate != config.sample_rate {
        tracing::warn!(
            pipeline_rate,
            configured_rate = config.sample_rate,
            "Pipeline sample rate differs from configured output rate"
        );
    }

    let invoker = SynthesisInvoker::new(deps.pipeline).with_timeout(config.synthesis_timeout());
    let voices = invoker.pipeline().voices().len();

    tracing::info!(
        voices,
        default_voice = %config.default_voice,
        sample_rate = config.sample_rate,
        synthesis_timeout_secs = ?config.synthesis_timeout_secs,
        "Service initialized"
    );

    Ok(Arc::new(ServiceContext::new(
        config,
        invoker,
        deps.output,
        deps.writer,
    )))
}

/// Bind the configured address and serve until Ctrl-C / SIGTERM.
pub async fn serve(state: AppState) -> Result<(), ServerError> {
    let addr = state.config.bind_address();
    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|source| ServerError::Bind {
            addr: addr.clone(),
            source,
        })?;

    let shutdown = state.shutdown.clone();
    tokio::spawn(async move {
        shutdown_signal().await;
        shutdown.trigger();
    });

    serve_on(listener, state).await
}

/// Serve on an already-bound listener until the shutdown token fires, then
/// drain connection tasks.
pub async fn serve_on(listener: TcpListener, state: AppState) -> Result<(), ServerError> {
    let shutdown = state.shutdown.clone();
    let token = shutdown.token();

    if let Ok(local) = listener.local_addr() {
        tracing::info!("speakd listening on ws://{local}");
    }

    axum::serve(listener, create_router(state))
        .with_graceful_shutdown(async move { token.cancelled().await })
        .await
        .map_err(ServerError::Serve)?;

    shutdown.drain(SHUTDOWN_GRACE).await;
    tracing::info!("speakd stopped");
    Ok(())
}
