use std::sync::{Arc, Weak};
use tokio::sync::{mpsc, Mutex};
use tracing::{info, warn};

use crate::device::{PlaybackBackend, PlaybackHandle};
use crate::error::SessionError;
use crate::model::RecordingRecord;
use crate::state::StateCell;
use crate::store::RecordingStore;

/// Playback session state. Non-idle variants carry a snapshot of the record
/// taken when play was requested, not a live store reference.
#[derive(Debug, Clone, PartialEq)]
pub enum PlaybackState {
    Idle,
    Playing(RecordingRecord),
    Paused(RecordingRecord),
    /// The media ran to its natural end. Stable until the next command; the
    /// aggregator's auto-advance is what usually moves past it.
    Finished(RecordingRecord),
}

impl PlaybackState {
    /// The record being acted on, if any.
    pub fn recording(&self) -> Option<&RecordingRecord> {
        match self {
            PlaybackState::Idle => None,
            PlaybackState::Playing(r) | PlaybackState::Paused(r) | PlaybackState::Finished(r) => {
                Some(r)
            }
        }
    }
}

struct Inner {
    player: Option<Box<dyn PlaybackHandle>>,

    /// Bumped whenever the device is started or torn down, so a completion
    /// raised by a replaced device is ignored.
    generation: u64,
}

/// Coordinator for playing back saved memos.
///
/// All transitions are serialized behind one lock; the asynchronous device
/// completion is funnelled through the same lock before it can mutate state.
pub struct PlaybackSession {
    backend: Arc<dyn PlaybackBackend>,
    store: Arc<dyn RecordingStore>,
    state: StateCell<PlaybackState>,
    inner: Mutex<Inner>,
    weak: Weak<PlaybackSession>,
}

impl PlaybackSession {
    pub fn new(backend: Arc<dyn PlaybackBackend>, store: Arc<dyn RecordingStore>) -> Arc<Self> {
        Arc::new_cyclic(|weak| Self {
            backend,
            store,
            state: StateCell::new(PlaybackState::Idle),
            inner: Mutex::new(Inner {
                player: None,
                generation: 0,
            }),
            weak: weak.clone(),
        })
    }

    /// Current state.
    pub fn state(&self) -> PlaybackState {
        self.state.get()
    }

    /// Live state stream: current state immediately, then every transition.
    pub fn subscribe(&self) -> mpsc::UnboundedReceiver<PlaybackState> {
        self.state.subscribe()
    }

    /// Play `record` — the single entry point for start, pause, and resume:
    ///
    /// - already playing this record: pause (toggle)
    /// - playing a different record: stop it, then start this one
    /// - paused on this record: resume
    /// - otherwise: mark it played in the store (fire-and-forget) and start
    ///   it from the beginning
    pub async fn play(&self, record: RecordingRecord) -> Result<(), SessionError> {
        let mut inner = self.inner.lock().await;

        match self.state.get() {
            PlaybackState::Playing(current) if current.id == record.id => {
                self.pause_locked(&mut inner, current).await;
                return Ok(());
            }
            PlaybackState::Paused(current) if current.id == record.id => {
                if let Some(player) = inner.player.as_mut() {
                    if let Err(e) = player.resume().await {
                        warn!("Playback device resume failed: {}", e);
                    }
                }
                self.state.set(PlaybackState::Playing(current));
                return Ok(());
            }
            _ => {}
        }

        // Release whatever device is still held (playing or paused on a
        // different record) before starting fresh. No intermediate state is
        // broadcast for this step.
        if let Some(mut player) = inner.player.take() {
            if let Err(e) = player.stop().await {
                warn!("Playback device stop failed: {}", e);
            }
            inner.generation += 1;
        }

        if !record.path.exists() {
            self.state.set(PlaybackState::Idle);
            return Err(SessionError::NotFound {
                path: record.path.clone(),
            });
        }

        // Mark played up front; a store failure is logged but never blocks
        // playback.
        let store = Arc::clone(&self.store);
        let mut played = record.clone();
        played.played = true;
        tokio::spawn(async move {
            if let Err(e) = store.update(played).await {
                warn!("Failed to mark recording played: {}", e);
            }
        });

        let mut handle = match self.backend.open(&record.path).await {
            Ok(handle) => handle,
            Err(e) => {
                self.state.set(PlaybackState::Idle);
                return Err(SessionError::DeviceUnavailable(e.to_string()));
            }
        };
        let completion = match handle.start().await {
            Ok(completion) => completion,
            Err(e) => {
                self.state.set(PlaybackState::Idle);
                return Err(SessionError::DeviceUnavailable(e.to_string()));
            }
        };

        inner.generation += 1;
        let generation = inner.generation;
        inner.player = Some(handle);
        self.state.set(PlaybackState::Playing(record.clone()));

        info!("Playing recording {}", record.id);

        // Funnel the device completion through the session lock.
        let weak = self.weak.clone();
        tokio::spawn(async move {
            if completion.await.is_ok() {
                if let Some(session) = weak.upgrade() {
                    session.finish_playing(generation).await;
                }
            }
        });

        Ok(())
    }

    /// Pause the running playback. No-op unless playing.
    pub async fn pause(&self) {
        let mut inner = self.inner.lock().await;

        if let PlaybackState::Playing(current) = self.state.get() {
            self.pause_locked(&mut inner, current).await;
        }
    }

    async fn pause_locked(&self, inner: &mut Inner, current: RecordingRecord) {
        if let Some(player) = inner.player.as_mut() {
            if let Err(e) = player.pause().await {
                warn!("Playback device pause failed: {}", e);
            }
        }
        self.state.set(PlaybackState::Paused(current));
    }

    /// The media ran to its natural end: release the device and move to
    /// `Finished`. Ignored when the device that raised it has since been
    /// stopped or replaced.
    async fn finish_playing(&self, generation: u64) {
        let mut inner = self.inner.lock().await;

        if inner.generation != generation {
            return;
        }
        if let PlaybackState::Playing(current) = self.state.get() {
            inner.player = None;
            info!("Finished playing recording {}", current.id);
            self.state.set(PlaybackState::Finished(current));
        }
    }
}
