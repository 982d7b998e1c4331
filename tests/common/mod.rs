// Shared test doubles: controllable in-memory devices and a fake duration
// probe. The playback mock exposes the completion triggers of every start so
// tests decide exactly when (and whether) a "finished" event arrives.

#![allow(dead_code)]

use anyhow::{bail, Result};
use chrono::{Duration as ChronoDuration, Utc};
use dictaphone::{
    CaptureBackend, CaptureHandle, Completion, DurationProbe, PlaybackBackend, PlaybackHandle,
    RecordingRecord, SessionError,
};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::oneshot;
use uuid::Uuid;

/// Chronological log of device calls, shared between a backend and its
/// handles.
#[derive(Default)]
pub struct DeviceLog(Mutex<Vec<String>>);

impl DeviceLog {
    pub fn push(&self, event: &str) {
        self.0.lock().unwrap().push(event.to_string());
    }

    pub fn events(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }
}

/// Capture backend whose handles record call order and track how many are
/// live at once.
#[derive(Default)]
pub struct MockCaptureBackend {
    pub log: Arc<DeviceLog>,
    pub fail_open: AtomicBool,
    pub open_count: AtomicUsize,
    live: Arc<AtomicUsize>,
}

impl MockCaptureBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Number of capture handles currently held.
    pub fn live_handles(&self) -> usize {
        self.live.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl CaptureBackend for MockCaptureBackend {
    async fn open(&self, path: &Path) -> Result<Box<dyn CaptureHandle>> {
        if self.fail_open.load(Ordering::SeqCst) {
            bail!("capture device busy");
        }
        self.open_count.fetch_add(1, Ordering::SeqCst);
        self.live.fetch_add(1, Ordering::SeqCst);
        self.log.push(&format!("capture-open {}", path.display()));
        Ok(Box::new(MockCaptureHandle {
            log: Arc::clone(&self.log),
            live: Arc::clone(&self.live),
        }))
    }

    fn name(&self) -> &str {
        "mock-capture"
    }
}

struct MockCaptureHandle {
    log: Arc<DeviceLog>,
    live: Arc<AtomicUsize>,
}

#[async_trait::async_trait]
impl CaptureHandle for MockCaptureHandle {
    async fn start(&mut self) -> Result<()> {
        self.log.push("capture-start");
        Ok(())
    }

    async fn stop(&mut self) -> Result<()> {
        self.log.push("capture-stop");
        Ok(())
    }
}

impl Drop for MockCaptureHandle {
    fn drop(&mut self) {
        self.live.fetch_sub(1, Ordering::SeqCst);
        self.log.push("capture-release");
    }
}

/// Playback backend that hands the completion trigger of every `start` back
/// to the test. Triggers deliberately survive `stop` so tests can also
/// deliver stale completions.
#[derive(Default)]
pub struct MockPlaybackBackend {
    pub log: Arc<DeviceLog>,
    pub fail_open: AtomicBool,
    pub open_count: AtomicUsize,
    triggers: Arc<Mutex<Vec<Option<oneshot::Sender<()>>>>>,
}

impl MockPlaybackBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Fire the completion of the `index`-th start. Returns false when it
    /// was already fired or its receiver is gone.
    pub fn fire(&self, index: usize) -> bool {
        let mut triggers = self.triggers.lock().unwrap();
        match triggers.get_mut(index).and_then(Option::take) {
            Some(tx) => tx.send(()).is_ok(),
            None => false,
        }
    }

    /// Fire the completion of the most recent start.
    pub fn fire_latest(&self) -> bool {
        let index = {
            let triggers = self.triggers.lock().unwrap();
            match triggers.len() {
                0 => return false,
                n => n - 1,
            }
        };
        self.fire(index)
    }

    pub fn starts(&self) -> usize {
        self.triggers.lock().unwrap().len()
    }
}

#[async_trait::async_trait]
impl PlaybackBackend for MockPlaybackBackend {
    async fn open(&self, path: &Path) -> Result<Box<dyn PlaybackHandle>> {
        if self.fail_open.load(Ordering::SeqCst) {
            bail!("playback device busy");
        }
        self.open_count.fetch_add(1, Ordering::SeqCst);
        self.log.push(&format!("playback-open {}", path.display()));
        Ok(Box::new(MockPlaybackHandle {
            log: Arc::clone(&self.log),
            triggers: Arc::clone(&self.triggers),
        }))
    }

    fn name(&self) -> &str {
        "mock-playback"
    }
}

struct MockPlaybackHandle {
    log: Arc<DeviceLog>,
    triggers: Arc<Mutex<Vec<Option<oneshot::Sender<()>>>>>,
}

#[async_trait::async_trait]
impl PlaybackHandle for MockPlaybackHandle {
    async fn start(&mut self) -> Result<Completion> {
        self.log.push("playback-start");
        let (tx, rx) = oneshot::channel();
        self.triggers.lock().unwrap().push(Some(tx));
        Ok(rx)
    }

    async fn pause(&mut self) -> Result<()> {
        self.log.push("playback-pause");
        Ok(())
    }

    async fn resume(&mut self) -> Result<()> {
        self.log.push("playback-resume");
        Ok(())
    }

    async fn stop(&mut self) -> Result<()> {
        self.log.push("playback-stop");
        Ok(())
    }
}

/// Probe returning a fixed duration, or `MediaCorrupt` when unset.
pub struct FakeProbe {
    pub duration_ms: Option<u64>,
}

impl FakeProbe {
    pub fn ok(duration_ms: u64) -> Arc<Self> {
        Arc::new(Self {
            duration_ms: Some(duration_ms),
        })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self { duration_ms: None })
    }
}

impl DurationProbe for FakeProbe {
    fn probe(&self, path: &Path) -> Result<u64, SessionError> {
        match self.duration_ms {
            Some(ms) => Ok(ms),
            None => Err(SessionError::MediaCorrupt {
                path: path.to_path_buf(),
            }),
        }
    }
}

/// Record pointing at `path`, `age_secs` back from now. Newer records sort
/// first in the catalog.
pub fn record_at(path: impl Into<PathBuf>, age_secs: i64) -> RecordingRecord {
    let path = path.into();
    RecordingRecord {
        id: Uuid::new_v4(),
        created_at: Utc::now() - ChronoDuration::seconds(age_secs),
        duration_ms: 1_000,
        exists: path.exists(),
        path,
        played: false,
    }
}
