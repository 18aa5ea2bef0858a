//! Local speaker output via `rodio`, confined to a dedicated audio thread.
//!
//! `rodio::OutputStream` is `!Send` on some platforms, so it lives on one OS
//! thread for its whole lifetime. [`LocalPlayback`] is the `Send + Sync`
//! proxy that routes every operation through an [`AudioCommand`].

use std::sync::{Arc, mpsc};
use std::thread;

use async_trait::async_trait;
use rodio::{OutputStream, OutputStreamHandle, Sink};
use speakd_core::{AudioOutput, SpeakError};
use tokio::sync::oneshot;

use crate::error::VoiceError;

/// A command sent to the audio thread.
enum AudioCommand {
    /// Replace the current sink with one playing `samples`. `done` fires
    /// when that sink drains or is stopped.
    Play {
        samples: Vec<f32>,
        sample_rate: u32,
        done: oneshot::Sender<Result<(), VoiceError>>,
    },

    /// Stop any active playback (fire-and-forget).
    Stop,

    Shutdown,
}

/// Handle to the audio thread.
pub struct LocalPlayback {
    cmd_tx: mpsc::Sender<AudioCommand>,
    thread: Option<thread::JoinHandle<()>>,
}

impl LocalPlayback {
    /// Spawn the audio thread and open the default output device.
    ///
    /// Device errors are reported back through a one-shot init channel.
    pub fn spawn() -> Result<Self, VoiceError> {
        let (cmd_tx, cmd_rx) = mpsc::channel::<AudioCommand>();
        let (init_tx, init_rx) = mpsc::channel::<Result<(), VoiceError>>();

        let thread = thread::Builder::new()
            .name("speakd-audio".into())
            .spawn(move || Self::run(&cmd_rx, &init_tx))
            .map_err(|e| {
                VoiceError::OutputStreamError(format!("failed to spawn audio thread: {e}"))
            })?;

        init_rx.recv().map_err(|_| VoiceError::AudioThreadDied)??;

        Ok(Self {
            cmd_tx,
            thread: Some(thread),
        })
    }

    fn run(
        cmd_rx: &mpsc::Receiver<AudioCommand>,
        init_tx: &mpsc::Sender<Result<(), VoiceError>>,
    ) {
        let (_stream, handle) = match OutputStream::try_default() {
            Ok(pair) => pair,
            Err(e) => {
                let _ = init_tx.send(Err(VoiceError::OutputStreamError(e.to_string())));
                return;
            }
        };

        if init_tx.send(Ok(())).is_err() {
            return;
        }
        tracing::info!("Audio playback initialized on default output device");

        let mut current: Option<Arc<Sink>> = None;

        while let Ok(cmd) = cmd_rx.recv() {
            match cmd {
                AudioCommand::Play {
                    samples,
                    sample_rate,
                    done,
                } => {
                    if let Some(sink) = current.take() {
                        sink.stop();
                    }
                    match start_sink(&handle, samples, sample_rate) {
                        Ok(sink) => {
                            spawn_completion_watcher(Arc::clone(&sink), done);
                            current = Some(sink);
                        }
                        Err(e) => {
                            let _ = done.send(Err(e));
                        }
                    }
                }

                AudioCommand::Stop => {
                    if let Some(sink) = current.take() {
                        sink.stop();
                        tracing::debug!("Audio playback stopped");
                    }
                }

                AudioCommand::Shutdown => break,
            }
        }

        if let Some(sink) = current.take() {
            sink.stop();
        }
        tracing::debug!("Audio thread shutting down");
    }
}

fn start_sink(
    handle: &OutputStreamHandle,
    samples: Vec<f32>,
    sample_rate: u32,
) -> Result<Arc<Sink>, VoiceError> {
    let sink =
        Sink::try_new(handle).map_err(|e| VoiceError::OutputStreamError(e.to_string()))?;
    sink.append(rodio::buffer::SamplesBuffer::new(1, sample_rate, samples));
    tracing::debug!(sample_rate, "Audio playback started");
    Ok(Arc::new(sink))
}

/// Block a helper thread on the sink and report when it drains.
fn spawn_completion_watcher(sink: Arc<Sink>, done: oneshot::Sender<Result<(), VoiceError>>) {
    let spawned = thread::Builder::new()
        .name("speakd-playback-watch".into())
        .spawn(move || {
            sink.sleep_until_end();
            let _ = done.send(Ok(()));
        });
    if let Err(e) = spawned {
        tracing::warn!(error = %e, "Failed to spawn playback watcher");
    }
}

#[async_trait]
impl AudioOutput for LocalPlayback {
    async fn play(&self, samples: Vec<f32>, sample_rate: u32) -> Result<(), SpeakError> {
        let (done_tx, done_rx) = oneshot::channel();
        self.cmd_tx
            .send(AudioCommand::Play {
                samples,
                sample_rate,
                done: done_tx,
            })
            .map_err(|_| VoiceError::AudioThreadDied)?;

        done_rx.await.map_err(|_| VoiceError::AudioThreadDied)??;
        Ok(())
    }

    fn stop(&self) {
        let _ = self.cmd_tx.send(AudioCommand::Stop);
    }
}

impl Drop for LocalPlayback {
    fn drop(&mut self) {
        let _ = self.cmd_tx.send(AudioCommand::Shutdown);
        if let Some(handle) = self.thread.take() {
            let _ = handle.join();
        }
    }
}
