use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// A memo saved by the user.
///
/// The identifier is assigned by the store at insert time and is stable for
/// the lifetime of the record. `played` only ever transitions false -> true.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordingRecord {
    pub id: Uuid,

    /// When the memo was saved.
    pub created_at: DateTime<Utc>,

    /// Media duration in milliseconds, probed at save time.
    pub duration_ms: u64,

    /// Path of the saved media file.
    pub path: PathBuf,

    /// Whether playback of this memo was ever started.
    pub played: bool,

    /// Whether the backing file is present. Computed at read time, never
    /// persisted; a missing file is a first-class state, not an error.
    #[serde(skip, default = "default_exists")]
    pub exists: bool,
}

fn default_exists() -> bool {
    true
}

impl RecordingRecord {
    /// Recheck the backing file.
    pub fn refresh_exists(&mut self) {
        self.exists = self.path.exists();
    }
}

/// Recompute the `exists` flag for every record in a list snapshot.
pub fn refresh_exists(records: &mut [RecordingRecord]) {
    for record in records.iter_mut() {
        record.refresh_exists();
    }
}

/// A saved take that has not been handed to the store yet.
///
/// Produced by `CaptureSession::save_recording`; the store assigns the
/// identifier when it is inserted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DraftRecording {
    pub created_at: DateTime<Utc>,
    pub duration_ms: u64,
    pub path: PathBuf,
}

impl DraftRecording {
    pub fn new(duration_ms: u64, path: impl AsRef<Path>) -> Self {
        Self {
            created_at: Utc::now(),
            duration_ms,
            path: path.as_ref().to_path_buf(),
        }
    }
}
