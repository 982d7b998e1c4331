use std::path::PathBuf;
use thiserror::Error;

/// Failure taxonomy for session operations.
///
/// Device-open failures leave the session in (or revert it to) `Idle`; a
/// failed save never produces a partial record.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The capture or playback device could not be opened or started.
    #[error("audio device unavailable: {0}")]
    DeviceUnavailable(String),

    /// The media file exists but could not be probed or decoded.
    #[error("media corrupt or unreadable: {}", path.display())]
    MediaCorrupt { path: PathBuf },

    /// The scratch or stored file is missing at use time.
    #[error("file not found: {}", path.display())]
    NotFound { path: PathBuf },

    /// `save_recording` was called with no completed take on the scratch path.
    #[error("no completed take to save")]
    NothingToSave,

    /// The current take was already saved; record a new take first.
    #[error("take already saved")]
    AlreadySaved,

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
