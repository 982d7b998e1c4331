//! Simulated audio devices
//!
//! Stand-ins for real hardware used by the demo binary and end-to-end flows:
//! the capture backend synthesizes a WAV tone covering the elapsed recording
//! time, and the playback backend sleeps out the probed media duration before
//! firing its completion. Both honor the same exclusive-handle contract a
//! hardware driver would.

use anyhow::{Context, Result};
use std::f32::consts::PI;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::info;

use super::{CaptureBackend, CaptureHandle, Completion, PlaybackBackend, PlaybackHandle};
use crate::probe::{DurationProbe, MediaProbe};

const TONE_HZ: f32 = 440.0;
const TONE_AMPLITUDE: f32 = 0.3;

/// Capture backend that writes a sine tone WAV on stop, sized to the
/// wall-clock time between start and stop.
pub struct SimCaptureBackend {
    sample_rate: u32,
}

impl SimCaptureBackend {
    pub fn new() -> Self {
        Self { sample_rate: 16000 }
    }
}

impl Default for SimCaptureBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl CaptureBackend for SimCaptureBackend {
    async fn open(&self, path: &Path) -> Result<Box<dyn CaptureHandle>> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }

        Ok(Box::new(SimCaptureHandle {
            path: path.to_path_buf(),
            sample_rate: self.sample_rate,
            started: None,
        }))
    }

    fn name(&self) -> &str {
        "sim-capture"
    }
}

struct SimCaptureHandle {
    path: PathBuf,
    sample_rate: u32,
    started: Option<Instant>,
}

#[async_trait::async_trait]
impl CaptureHandle for SimCaptureHandle {
    async fn start(&mut self) -> Result<()> {
        self.started = Some(Instant::now());
        Ok(())
    }

    async fn stop(&mut self) -> Result<()> {
        let started = self
            .started
            .take()
            .context("Capture was never started")?;
        let elapsed = started.elapsed();

        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: self.sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };

        let mut writer = hound::WavWriter::create(&self.path, spec)
            .with_context(|| format!("Failed to create WAV file: {}", self.path.display()))?;

        let sample_count = (elapsed.as_secs_f64() * self.sample_rate as f64) as u64;
        for n in 0..sample_count {
            let t = n as f32 / self.sample_rate as f32;
            let sample = (TONE_HZ * 2.0 * PI * t).sin() * TONE_AMPLITUDE * i16::MAX as f32;
            writer
                .write_sample(sample as i16)
                .context("Failed to write sample to WAV")?;
        }

        writer.finalize().context("Failed to finalize WAV file")?;

        info!(
            "Simulated capture complete: {} ({:.1}s, {} samples)",
            self.path.display(),
            elapsed.as_secs_f64(),
            sample_count
        );

        Ok(())
    }
}

/// Playback backend that fires the completion after the probed media
/// duration has elapsed in real time.
pub struct SimPlaybackBackend {
    probe: MediaProbe,
}

impl SimPlaybackBackend {
    pub fn new() -> Self {
        Self { probe: MediaProbe }
    }
}

impl Default for SimPlaybackBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl PlaybackBackend for SimPlaybackBackend {
    async fn open(&self, path: &Path) -> Result<Box<dyn PlaybackHandle>> {
        let duration_ms = self
            .probe
            .probe(path)
            .with_context(|| format!("Failed to probe {}", path.display()))?;

        Ok(Box::new(SimPlaybackHandle {
            remaining: Duration::from_millis(duration_ms),
            done: Arc::new(Mutex::new(None)),
            timer: None,
            resumed_at: None,
        }))
    }

    fn name(&self) -> &str {
        "sim-playback"
    }
}

struct SimPlaybackHandle {
    /// Media time left to play; updated on pause.
    remaining: Duration,
    /// Completion sender, consumed exactly once when the timer expires.
    done: Arc<Mutex<Option<oneshot::Sender<()>>>>,
    timer: Option<JoinHandle<()>>,
    resumed_at: Option<Instant>,
}

impl SimPlaybackHandle {
    fn spawn_timer(&mut self) {
        let wait = self.remaining;
        let done = Arc::clone(&self.done);
        self.resumed_at = Some(Instant::now());
        self.timer = Some(tokio::spawn(async move {
            tokio::time::sleep(wait).await;
            let sender = done.lock().unwrap_or_else(|e| e.into_inner()).take();
            if let Some(tx) = sender {
                let _ = tx.send(());
            }
        }));
    }

    fn halt_timer(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
        if let Some(resumed_at) = self.resumed_at.take() {
            self.remaining = self.remaining.saturating_sub(resumed_at.elapsed());
        }
    }
}

#[async_trait::async_trait]
impl PlaybackHandle for SimPlaybackHandle {
    async fn start(&mut self) -> Result<Completion> {
        let (tx, rx) = oneshot::channel();
        *self.done.lock().unwrap_or_else(|e| e.into_inner()) = Some(tx);
        self.spawn_timer();
        Ok(rx)
    }

    async fn pause(&mut self) -> Result<()> {
        self.halt_timer();
        Ok(())
    }

    async fn resume(&mut self) -> Result<()> {
        self.spawn_timer();
        Ok(())
    }

    async fn stop(&mut self) -> Result<()> {
        self.halt_timer();
        // Drop the sender so the completion can never fire after stop.
        self.done.lock().unwrap_or_else(|e| e.into_inner()).take();
        Ok(())
    }
}

impl Drop for SimPlaybackHandle {
    fn drop(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
        self.done.lock().unwrap_or_else(|e| e.into_inner()).take();
    }
}
