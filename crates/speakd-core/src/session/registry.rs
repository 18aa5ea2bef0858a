//! Process-wide session registry.
//!
//! # Locking discipline
//!
//! The id → session map sits behind a `std::sync::Mutex` that is only ever
//! held for a map lookup, insert, or removal, never across an `.await`.
//! Each session body sits behind its own `tokio::sync::Mutex`; a `speak`
//! holds that lock (through a [`SessionLease`]) from lookup until the chunk
//! is recorded, so two `speak`s for the same id never interleave even when
//! they arrive on different connections.
//!
//! A lease re-checks that its session is still the registered one before
//! every mutation. `clear()` can therefore drop sessions at any time: an
//! in-flight `speak` on a cleared session fails with an invalid-session
//! error instead of writing into an orphan.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tokio::time::Instant;

use super::accumulator::AudioAccumulator;
use super::stats::SessionStats;
use crate::error::SpeakError;

/// Client-supplied settings captured at `start_session`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionOptions {
    /// Where to write the merged audio; `None` means do not persist.
    pub save_path: Option<PathBuf>,
    /// Play the merged audio on the local device when the session completes.
    pub autoplay: bool,
    /// Advisory total chunk count. Not enforced.
    pub expected_chunks: u32,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            save_path: None,
            autoplay: true,
            expected_chunks: 0,
        }
    }
}

/// One open session.
#[derive(Debug)]
struct Session {
    id: String,
    options: SessionOptions,
    audio: AudioAccumulator,
    chunk_count: usize,
    total_characters: usize,
    started_at: Instant,
}

impl Session {
    fn new(id: String, options: SessionOptions) -> Self {
        Self {
            id,
            options,
            audio: AudioAccumulator::new(),
            chunk_count: 0,
            total_characters: 0,
            started_at: Instant::now(),
        }
    }

    fn record(&mut self, text: &str, samples: Vec<f32>) {
        self.audio.append(samples);
        self.chunk_count += 1;
        self.total_characters += text.chars().count();
        debug_assert_eq!(self.chunk_count, self.audio.len());
    }

    fn info(&self) -> SessionInfo {
        SessionInfo {
            id: self.id.clone(),
            save_path: self.options.save_path.clone(),
            autoplay: self.options.autoplay,
            expected_chunks: self.options.expected_chunks,
            chunk_count: self.chunk_count,
            total_characters: self.total_characters,
            buffered_samples: self.audio.total_samples(),
        }
    }
}

/// Read-only snapshot of a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionInfo {
    pub id: String,
    pub save_path: Option<PathBuf>,
    pub autoplay: bool,
    pub expected_chunks: u32,
    pub chunk_count: usize,
    pub total_characters: usize,
    pub buffered_samples: usize,
}

/// Everything left of a session after its final chunk.
#[derive(Debug, Clone, PartialEq)]
pub struct FinalizedSession {
    pub id: String,
    /// All chunks concatenated in arrival order.
    pub samples: Vec<f32>,
    pub elapsed: Duration,
    pub stats: SessionStats,
    pub save_path: Option<PathBuf>,
    pub autoplay: bool,
}

type SessionSlot = Arc<AsyncMutex<Session>>;

/// Mapping from session id to open session.
///
/// Shared by every connection (`Arc<SessionRegistry>`); there is no global
/// instance.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    slots: Mutex<HashMap<String, SessionSlot>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn slots(&self) -> MutexGuard<'_, HashMap<String, SessionSlot>> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn slot(&self, id: &str) -> Option<SessionSlot> {
        self.slots().get(id).cloned()
    }

    fn is_current(&self, id: &str, slot: &SessionSlot) -> bool {
        self.slots()
            .get(id)
            .is_some_and(|current| Arc::ptr_eq(current, slot))
    }

    fn remove_if_current(&self, id: &str, slot: &SessionSlot) -> bool {
        let mut slots = self.slots();
        match slots.get(id) {
            Some(current) if Arc::ptr_eq(current, slot) => {
                slots.remove(id);
                true
            }
            _ => false,
        }
    }

    /// Open a new session.
    ///
    /// Rejects an id that is already open rather than replacing it, so a
    /// live session's buffered audio is never orphaned.
    pub fn create(&self, id: impl Into<String>, options: SessionOptions) -> Result<(), SpeakError> {
        match self.slots().entry(id.into()) {
            Entry::Occupied(entry) => Err(SpeakError::duplicate_session(entry.key().as_str())),
            Entry::Vacant(entry) => {
                let session = Session::new(entry.key().clone(), options);
                tracing::debug!(session_id = %entry.key(), "Session created");
                entry.insert(Arc::new(AsyncMutex::new(session)));
                Ok(())
            }
        }
    }

    /// Take exclusive access to an open session.
    ///
    /// Waits for any other lease on the same session to be released.
    pub async fn checkout(&self, id: &str) -> Result<SessionLease<'_>, SpeakError> {
        let slot = self
            .slot(id)
            .ok_or_else(|| SpeakError::session_not_found(id))?;
        let guard = Arc::clone(&slot).lock_owned().await;

        // The session may have been finalized or cleared while we waited.
        if !self.is_current(id, &slot) {
            return Err(SpeakError::session_not_found(id));
        }

        Ok(SessionLease {
            registry: self,
            slot,
            guard,
        })
    }

    /// Snapshot of an open session.
    pub async fn get(&self, id: &str) -> Result<SessionInfo, SpeakError> {
        Ok(self.checkout(id).await?.info())
    }

    /// Append one chunk to an open session.
    pub async fn record_chunk(
        &self,
        id: &str,
        text: &str,
        samples: Vec<f32>,
    ) -> Result<(), SpeakError> {
        self.checkout(id).await?.record_chunk(text, samples)
    }

    /// Merge and remove an open session.
    ///
    /// A second call for the same id fails with an invalid-session error.
    pub async fn finalize(&self, id: &str) -> Result<FinalizedSession, SpeakError> {
        self.checkout(id).await?.finalize()
    }

    /// Drop every open session without flushing its audio.
    ///
    /// Returns how many sessions were dropped.
    pub fn clear(&self) -> usize {
        let mut slots = self.slots();
        let dropped = slots.len();
        slots.clear();
        dropped
    }

    /// Whether `id` is currently open.
    pub fn contains(&self, id: &str) -> bool {
        self.slots().contains_key(id)
    }

    /// Number of open sessions.
    pub fn len(&self) -> usize {
        self.slots().len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots().is_empty()
    }
}

/// Exclusive access to one open session.
///
/// Obtained from [`SessionRegistry::checkout`]; released on drop.
#[derive(Debug)]
pub struct SessionLease<'a> {
    registry: &'a SessionRegistry,
    slot: SessionSlot,
    guard: OwnedMutexGuard<Session>,
}

impl SessionLease<'_> {
    pub fn id(&self) -> &str {
        &self.guard.id
    }

    pub fn info(&self) -> SessionInfo {
        self.guard.info()
    }

    fn ensure_registered(&self) -> Result<(), SpeakError> {
        if self.registry.is_current(&self.guard.id, &self.slot) {
            Ok(())
        } else {
            Err(SpeakError::session_not_found(self.guard.id.as_str()))
        }
    }

    /// Append a chunk: stores the samples, bumps the chunk count, and adds
    /// the text's character count to the running total.
    pub fn record_chunk(&mut self, text: &str, samples: Vec<f32>) -> Result<(), SpeakError> {
        self.ensure_registered()?;
        self.guard.record(text, samples);
        tracing::debug!(
            session_id = %self.guard.id,
            chunk = self.guard.chunk_count,
            total_characters = self.guard.total_characters,
            "Chunk recorded"
        );
        Ok(())
    }

    /// Remove the session from the registry and merge its audio.
    pub fn finalize(mut self) -> Result<FinalizedSession, SpeakError> {
        if !self.registry.remove_if_current(&self.guard.id, &self.slot) {
            return Err(SpeakError::session_not_found(self.guard.id.as_str()));
        }

        let elapsed = self.guard.started_at.elapsed();
        let audio = std::mem::take(&mut self.guard.audio);
        let stats = SessionStats::new(self.guard.total_characters, self.guard.chunk_count, elapsed);

        tracing::debug!(
            session_id = %self.guard.id,
            chunks = stats.chunks,
            elapsed_ms = elapsed.as_millis(),
            "Session finalized"
        );

        Ok(FinalizedSession {
            id: self.guard.id.clone(),
            samples: audio.into_merged(),
            elapsed,
            stats,
            save_path: self.guard.options.save_path.take(),
            autoplay: self.guard.options.autoplay,
        })
    }
}
