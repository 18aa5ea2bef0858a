//! Process shutdown.
//!
//! One [`ShutdownCoordinator`] per server. [`trigger`](ShutdownCoordinator::trigger)
//! stops playback, closes the task tracker, and cancels the token every
//! connection selects on; the accept loop stops through axum's graceful
//! shutdown hook on the same token.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use speakd_core::AudioOutput;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

#[derive(Clone)]
pub struct ShutdownCoordinator {
    token: CancellationToken,
    tracker: TaskTracker,
    output: Arc<dyn AudioOutput>,
    triggered: Arc<AtomicBool>,
}

impl ShutdownCoordinator {
    pub fn new(output: Arc<dyn AudioOutput>) -> Self {
        Self {
            token: CancellationToken::new(),
            tracker: TaskTracker::new(),
            output,
            triggered: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Begin shutdown. Returns `false` if it was already under way.
    pub fn trigger(&self) -> bool {
        if self.triggered.swap(true, Ordering::SeqCst) {
            return false;
        }
        tracing::info!(connections = self.tracker.len(), "Shutting down");
        self.output.stop();
        self.tracker.close();
        self.token.cancel();
        true
    }

    pub fn is_triggered(&self) -> bool {
        self.triggered.load(Ordering::SeqCst)
    }

    /// Token cancelled by [`trigger`](Self::trigger).
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Tracker for connection tasks.
    pub fn tracker(&self) -> &TaskTracker {
        &self.tracker
    }

    /// Wait up to `grace` for tracked connection tasks to finish.
    ///
    /// Returns `false` if some were still running when the grace period ran
    /// out.
    pub async fn drain(&self, grace: Duration) -> bool {
        self.tracker.close();
        let drained = tokio::time::timeout(grace, self.tracker.wait())
            .await
            .is_ok();
        if drained {
            tracing::debug!("All connections closed");
        } else {
            tracing::warn!(
                remaining = self.tracker.len(),
                "Connections still open after shutdown grace period"
            );
        }
        drained
    }
}

/// Resolve on Ctrl-C, or SIGTERM on Unix.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => tracing::info!("Received Ctrl-C"),
        () = terminate => tracing::info!("Received SIGTERM"),
    }
}
