//! Shared application state.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use speakd_core::{AudioFileWriter, AudioOutput, ServiceConfig, SessionRegistry, VoiceResolver};
use speakd_voice::SynthesisInvoker;

use crate::shutdown::ShutdownCoordinator;

/// Everything a connection needs. Built once at startup.
pub struct ServiceContext {
    pub config: ServiceConfig,
    pub registry: Arc<SessionRegistry>,
    pub resolver: VoiceResolver,
    pub invoker: SynthesisInvoker,
    pub output: Arc<dyn AudioOutput>,
    pub writer: Arc<dyn AudioFileWriter>,
    pub shutdown: ShutdownCoordinator,
    next_connection: AtomicU64,
}

impl ServiceContext {
    pub fn new(
        config: ServiceConfig,
        invoker: SynthesisInvoker,
        output: Arc<dyn AudioOutput>,
        writer: Arc<dyn AudioFileWriter>,
    ) -> Self {
        let shutdown = ShutdownCoordinator::new(Arc::clone(&output));
        let resolver = VoiceResolver::new().with_voice_keys(invoker.pipeline().voices());
        Self {
            config,
            registry: Arc::new(SessionRegistry::new()),
            resolver,
            invoker,
            output,
            writer,
            shutdown,
            next_connection: AtomicU64::new(1),
        }
    }

    /// Id used to tag a connection's log lines.
    pub fn next_connection_id(&self) -> u64 {
        self.next_connection.fetch_add(1, Ordering::Relaxed)
    }
}

/// Application state shared across all handlers.
pub type AppState = Arc<ServiceContext>;
