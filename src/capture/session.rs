use chrono::Utc;
use std::path::PathBuf;
use std::sync::{Arc, Weak};
use tokio::sync::{mpsc, Mutex};
use tracing::{info, warn};

use crate::device::{CaptureBackend, CaptureHandle, PlaybackBackend, PlaybackHandle};
use crate::error::SessionError;
use crate::model::DraftRecording;
use crate::probe::DurationProbe;
use crate::state::StateCell;

/// Capture session state.
///
/// `recording_complete` remembers whether a finished-but-unsaved take exists
/// on the scratch path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureState {
    Idle { recording_complete: bool },
    Recording,
    PreviewPlaying,
}

/// Paths the capture session works with.
#[derive(Debug, Clone)]
pub struct CaptureConfig {
    /// Single-slot location for the in-progress, not-yet-saved take.
    pub scratch_path: PathBuf,

    /// Directory saved memos are copied into.
    pub recordings_dir: PathBuf,
}

/// Device handles and bookkeeping behind the session's single-writer lock.
struct Inner {
    recorder: Option<Box<dyn CaptureHandle>>,
    preview: Option<Box<dyn PlaybackHandle>>,

    /// Bumped whenever the preview device is started or torn down, so a
    /// completion raised by a replaced device is ignored.
    preview_generation: u64,

    /// Whether the current take was already handed out by `save_recording`.
    take_saved: bool,
}

/// Coordinator for recording a new memo: record to the scratch path, preview
/// it, save it as a [`DraftRecording`] for the store.
///
/// All transitions are serialized behind one lock; the asynchronous preview
/// completion is funnelled through the same lock before it can mutate state.
pub struct CaptureSession {
    capture: Arc<dyn CaptureBackend>,
    playback: Arc<dyn PlaybackBackend>,
    probe: Arc<dyn DurationProbe>,
    config: CaptureConfig,
    state: StateCell<CaptureState>,
    inner: Mutex<Inner>,
    weak: Weak<CaptureSession>,
}

impl CaptureSession {
    pub fn new(
        capture: Arc<dyn CaptureBackend>,
        playback: Arc<dyn PlaybackBackend>,
        probe: Arc<dyn DurationProbe>,
        config: CaptureConfig,
    ) -> Arc<Self> {
        Arc::new_cyclic(|weak| Self {
            capture,
            playback,
            probe,
            config,
            state: StateCell::new(CaptureState::Idle {
                recording_complete: false,
            }),
            inner: Mutex::new(Inner {
                recorder: None,
                preview: None,
                preview_generation: 0,
                take_saved: false,
            }),
            weak: weak.clone(),
        })
    }

    /// Current state.
    pub fn state(&self) -> CaptureState {
        self.state.get()
    }

    /// Live state stream: current state immediately, then every transition.
    pub fn subscribe(&self) -> mpsc::UnboundedReceiver<CaptureState> {
        self.state.subscribe()
    }

    /// Begin recording a new take to the scratch path.
    ///
    /// Stops a running preview first. No-op when already recording. Starting
    /// over a completed take discards it.
    pub async fn start_recording(&self) -> Result<(), SessionError> {
        let mut inner = self.inner.lock().await;

        if self.state.get() == CaptureState::PreviewPlaying {
            self.stop_preview_locked(&mut inner).await;
        }
        if !matches!(self.state.get(), CaptureState::Idle { .. }) {
            return Ok(());
        }

        let mut handle = self
            .capture
            .open(&self.config.scratch_path)
            .await
            .map_err(|e| SessionError::DeviceUnavailable(e.to_string()))?;
        handle
            .start()
            .await
            .map_err(|e| SessionError::DeviceUnavailable(e.to_string()))?;

        inner.recorder = Some(handle);
        inner.take_saved = false;
        self.state.set(CaptureState::Recording);

        info!("Recording started: {}", self.config.scratch_path.display());

        Ok(())
    }

    /// Stop the running recording, leaving a completed take on the scratch
    /// path. No-op unless recording.
    pub async fn stop_recording(&self) {
        let mut inner = self.inner.lock().await;

        if self.state.get() != CaptureState::Recording {
            return;
        }

        if let Some(mut recorder) = inner.recorder.take() {
            if let Err(e) = recorder.stop().await {
                warn!("Capture device stop failed: {}", e);
            }
        }

        self.state.set(CaptureState::Idle {
            recording_complete: true,
        });

        info!("Recording stopped");
    }

    /// Play back the completed take on the scratch path. No-op unless a
    /// completed take exists. Returns to idle on its own when the preview
    /// runs to the end.
    pub async fn play_preview(&self) -> Result<(), SessionError> {
        let mut inner = self.inner.lock().await;

        if !matches!(
            self.state.get(),
            CaptureState::Idle {
                recording_complete: true
            }
        ) {
            return Ok(());
        }

        let mut handle = self
            .playback
            .open(&self.config.scratch_path)
            .await
            .map_err(|e| SessionError::DeviceUnavailable(e.to_string()))?;
        let completion = handle
            .start()
            .await
            .map_err(|e| SessionError::DeviceUnavailable(e.to_string()))?;

        inner.preview_generation += 1;
        let generation = inner.preview_generation;
        inner.preview = Some(handle);
        self.state.set(CaptureState::PreviewPlaying);

        // Funnel the device completion through the session lock.
        let weak = self.weak.clone();
        tokio::spawn(async move {
            if completion.await.is_ok() {
                if let Some(session) = weak.upgrade() {
                    session.finish_preview(generation).await;
                }
            }
        });

        Ok(())
    }

    /// Stop a running preview. No-op otherwise.
    pub async fn stop_preview(&self) {
        let mut inner = self.inner.lock().await;
        self.stop_preview_locked(&mut inner).await;
    }

    /// Save the completed take: probe its duration, copy the scratch file to
    /// a permanent time-named path, and return the draft for the store.
    ///
    /// Stops a running preview first so the file is not read while a decoder
    /// holds it. Fails cleanly when there is no completed take, when the
    /// take was already saved, or when the probe fails — no partial record
    /// is ever produced.
    pub async fn save_recording(&self) -> Result<DraftRecording, SessionError> {
        let mut inner = self.inner.lock().await;

        match self.state.get() {
            CaptureState::PreviewPlaying => self.stop_preview_locked(&mut inner).await,
            CaptureState::Idle {
                recording_complete: true,
            } => {}
            _ => return Err(SessionError::NothingToSave),
        }

        if inner.take_saved {
            return Err(SessionError::AlreadySaved);
        }

        let scratch = &self.config.scratch_path;
        let duration_ms = self.probe.probe(scratch)?;

        tokio::fs::create_dir_all(&self.config.recordings_dir).await?;

        let ext = scratch
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("wav");
        let target = self
            .config
            .recordings_dir
            .join(format!("{}.{}", Utc::now().timestamp_millis(), ext));

        tokio::fs::copy(scratch, &target).await?;
        inner.take_saved = true;

        info!("Saved recording: {} ({}ms)", target.display(), duration_ms);

        Ok(DraftRecording::new(duration_ms, target))
    }

    async fn stop_preview_locked(&self, inner: &mut Inner) {
        if self.state.get() != CaptureState::PreviewPlaying {
            return;
        }

        if let Some(mut preview) = inner.preview.take() {
            if let Err(e) = preview.stop().await {
                warn!("Preview device stop failed: {}", e);
            }
        }
        inner.preview_generation += 1;

        self.state.set(CaptureState::Idle {
            recording_complete: true,
        });
    }

    /// Preview ran to its natural end. Ignored when the device that raised
    /// it has since been stopped or replaced.
    async fn finish_preview(&self, generation: u64) {
        let mut inner = self.inner.lock().await;

        if inner.preview_generation != generation {
            return;
        }
        if self.state.get() != CaptureState::PreviewPlaying {
            return;
        }

        inner.preview = None;
        self.state.set(CaptureState::Idle {
            recording_complete: true,
        });

        info!("Preview finished");
    }
}
