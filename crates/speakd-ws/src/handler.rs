//! Request dispatch for one connection.
//!
//! | action | effect | replies |
//! |---|---|---|
//! | `ping` | none | `pong` |
//! | `start_session` | open a session | `session_started` |
//! | `speak` | synthesize and record one chunk; on the last chunk persist, play and report | `generating`, `session_stats` (last chunk), `generated` |
//! | `stop` | stop playback, drop every session | `stopped` |
//!
//! Any failure becomes a single `error` reply and the connection stays open.

use std::path::PathBuf;

use speakd_core::{
    FinalizedSession, Request, Response, SpeakError, SpeakRequest, StartSessionRequest,
};
use speakd_voice::SilenceTrim;
use tokio::sync::mpsc;

use crate::state::AppState;

/// Where a handler is in its request cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandlerPhase {
    Idle,
    Dispatching,
}

/// Per-connection protocol state machine.
///
/// Holds no session data of its own; session ids in the shared registry
/// are the only memory carried between requests.
pub struct ProtocolHandler {
    state: AppState,
    connection_id: u64,
    phase: HandlerPhase,
}

impl ProtocolHandler {
    pub fn new(state: AppState, connection_id: u64) -> Self {
        Self {
            state,
            connection_id,
            phase: HandlerPhase::Idle,
        }
    }

    pub const fn phase(&self) -> HandlerPhase {
        self.phase
    }

    /// Handle one raw text frame, sending every reply through `tx`.
    pub async fn handle_message(&mut self, raw: &str, tx: &mpsc::Sender<Response>) {
        self.phase = HandlerPhase::Dispatching;

        match Request::decode(raw) {
            Ok(request) => {
                let action = request.action();
                tracing::debug!(connection = self.connection_id, action, "Request received");
                if let Err(e) = self.dispatch(request, tx).await {
                    tracing::error!(
                        connection = self.connection_id,
                        action,
                        kind = e.label(),
                        error = %e,
                        "Request failed"
                    );
                    reply(tx, Response::from(&e)).await;
                }
            }
            Err(e) => {
                tracing::warn!(connection = self.connection_id, error = %e, "Malformed request");
                reply(tx, Response::from(&e)).await;
            }
        }

        self.phase = HandlerPhase::Idle;
    }

    async fn dispatch(
        &self,
        request: Request,
        tx: &mpsc::Sender<Response>,
    ) -> Result<(), SpeakError> {
        match request {
            Request::Ping => {
                reply(tx, Response::pong()).await;
                Ok(())
            }
            Request::StartSession(start) => self.start_session(&start, tx).await,
            Request::Speak(speak) => self.speak(speak, tx).await,
            Request::Stop => {
                self.stop(tx).await;
                Ok(())
            }
        }
    }

    async fn start_session(
        &self,
        start: &StartSessionRequest,
        tx: &mpsc::Sender<Response>,
    ) -> Result<(), SpeakError> {
        self.state
            .registry
            .create(start.session_id.as_str(), start.options())?;

        tracing::info!(
            connection = self.connection_id,
            session_id = %start.session_id,
            autoplay = start.autoplay,
            save_path = ?start.save_path,
            total_chunks = start.total_chunks,
            "Session started"
        );
        reply(tx, Response::session_started()).await;
        Ok(())
    }

    async fn speak(
        &self,
        request: SpeakRequest,
        tx: &mpsc::Sender<Response>,
    ) -> Result<(), SpeakError> {
        let mut lease = self.state.registry.checkout(&request.session_id).await?;

        let voice_name = request
            .voice
            .as_deref()
            .unwrap_or(&self.state.config.default_voice);
        let voice_key = self
            .state
            .resolver
            .resolve(voice_name, request.language.as_deref());
        if !self.state.invoker.has_voice(&voice_key) {
            return Err(SpeakError::VoiceNotFound(voice_key));
        }

        reply(tx, Response::generating()).await;

        let trim = if request.trim_silence {
            SilenceTrim::seconds(request.trim_amount)
        } else {
            SilenceTrim::disabled()
        };
        let samples = self
            .state
            .invoker
            .invoke(&request.text, &voice_key, request.speed, trim)
            .await?;
        lease.record_chunk(&request.text, samples)?;

        if request.is_last_chunk {
            let finished = lease.finalize()?;
            self.complete_session(finished, tx).await?;
        }

        reply(tx, Response::generated(request.is_last_chunk)).await;
        Ok(())
    }

    /// Persist, play, and report a finalized session.
    async fn complete_session(
        &self,
        finished: FinalizedSession,
        tx: &mpsc::Sender<Response>,
    ) -> Result<(), SpeakError> {
        let FinalizedSession {
            id,
            samples,
            stats,
            save_path,
            autoplay,
            ..
        } = finished;
        let sample_rate = self.state.config.sample_rate;

        let samples = match save_path {
            Some(path) => self.persist(path, samples, sample_rate).await?,
            None => samples,
        };

        if autoplay {
            if let Err(e) = self.state.output.play(samples, sample_rate).await {
                tracing::warn!(session_id = %id, error = %e, "Playback failed");
            }
        }

        tracing::info!(
            connection = self.connection_id,
            session_id = %id,
            characters = stats.total_characters,
            chunks = stats.chunks,
            elapsed_secs = stats.elapsed_seconds,
            chars_per_second = stats.chars_per_second,
            "Session complete"
        );
        reply(tx, Response::session_stats(stats)).await;
        Ok(())
    }

    /// Write the merged audio on the blocking pool and hand the samples back.
    async fn persist(
        &self,
        path: PathBuf,
        samples: Vec<f32>,
        sample_rate: u32,
    ) -> Result<Vec<f32>, SpeakError> {
        let writer = std::sync::Arc::clone(&self.state.writer);
        let target = path.clone();
        let (samples, result) = tokio::task::spawn_blocking(move || {
            let result = writer.write(&target, &samples, sample_rate);
            (samples, result)
        })
        .await
        .map_err(|e| SpeakError::PersistFailed {
            path,
            message: e.to_string(),
        })?;

        result?;
        Ok(samples)
    }

    async fn stop(&self, tx: &mpsc::Sender<Response>) {
        self.state.output.stop();
        let cleared = self.state.registry.clear();
        tracing::info!(connection = self.connection_id, cleared, "Speech stopped");
        reply(tx, Response::stopped()).await;
    }
}

/// Queue a reply for the egress task. A closed channel means the peer is
/// gone; the reply is dropped.
async fn reply(tx: &mpsc::Sender<Response>, response: Response) {
    if tx.send(response).await.is_err() {
        tracing::debug!("Peer disconnected, dropping reply");
    }
}
