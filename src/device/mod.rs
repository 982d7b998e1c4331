//! Audio device interfaces
//!
//! The physical capture and playback devices are external collaborators; the
//! sessions drive them exclusively through these traits. A handle is the
//! exclusive-access grant to the underlying hardware — at most one handle of
//! each kind is ever live per session, and dropping the handle releases the
//! device.

mod sim;

pub use sim::{SimCaptureBackend, SimPlaybackBackend};

use anyhow::Result;
use std::path::Path;
use tokio::sync::oneshot;

/// Signalled exactly once when playback runs to its natural end. Dropped
/// without firing when the handle is stopped or released first.
pub type Completion = oneshot::Receiver<()>;

/// An open microphone/encoder writing to a fixed path.
#[async_trait::async_trait]
pub trait CaptureHandle: Send {
    /// Begin writing audio to the path the handle was opened on.
    async fn start(&mut self) -> Result<()>;

    /// Stop writing and finalize the file.
    async fn stop(&mut self) -> Result<()>;
}

/// Factory for capture handles.
#[async_trait::async_trait]
pub trait CaptureBackend: Send + Sync {
    /// Acquire the capture device for exclusive use, targeting `path`.
    async fn open(&self, path: &Path) -> Result<Box<dyn CaptureHandle>>;

    /// Backend name for logging.
    fn name(&self) -> &str;
}

/// An open speaker/decoder reading from a fixed path.
#[async_trait::async_trait]
pub trait PlaybackHandle: Send {
    /// Start playback from the beginning; the returned [`Completion`] fires
    /// once if the media plays to its natural end.
    async fn start(&mut self) -> Result<Completion>;

    async fn pause(&mut self) -> Result<()>;

    async fn resume(&mut self) -> Result<()>;

    /// Stop playback. The completion for the current start will never fire
    /// after this returns.
    async fn stop(&mut self) -> Result<()>;
}

/// Factory for playback handles.
#[async_trait::async_trait]
pub trait PlaybackBackend: Send + Sync {
    /// Acquire the playback device for exclusive use on `path`.
    async fn open(&self, path: &Path) -> Result<Box<dyn PlaybackHandle>>;

    /// Backend name for logging.
    fn name(&self) -> &str;
}
