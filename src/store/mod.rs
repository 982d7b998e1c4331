//! Recording catalog
//!
//! The sessions only ever see the [`RecordingStore`] trait: an ordered, live
//! collection of saved memos with subscribe/insert/update. [`JsonStore`] is
//! the local implementation — an in-memory list, newest first, optionally
//! mirrored to a JSON file on every mutation.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;
use tracing::info;
use uuid::Uuid;

use crate::model::{refresh_exists, DraftRecording, RecordingRecord};
use crate::state::StateCell;

/// Ordered, live-updating collection of saved recordings.
#[async_trait::async_trait]
pub trait RecordingStore: Send + Sync {
    /// Live stream of the ordered list. The current list is delivered
    /// immediately, then every change.
    fn subscribe(&self) -> mpsc::UnboundedReceiver<Vec<RecordingRecord>>;

    /// Current ordered list.
    fn snapshot(&self) -> Vec<RecordingRecord>;

    /// Persist a new recording; the store assigns its identifier.
    async fn insert(&self, draft: DraftRecording) -> Result<RecordingRecord>;

    /// Persist changed fields of an existing recording, keyed by id.
    /// `played` can only be raised, never reset.
    async fn update(&self, record: RecordingRecord) -> Result<()>;
}

/// In-memory catalog, newest first, optionally backed by a JSON file.
pub struct JsonStore {
    records: StateCell<Vec<RecordingRecord>>,
    catalog_path: Option<PathBuf>,
    // Serializes read-modify-write cycles; the StateCell alone only
    // serializes individual get/set calls.
    write_lock: tokio::sync::Mutex<()>,
}

impl JsonStore {
    /// Catalog with no persistence.
    pub fn in_memory() -> Self {
        Self {
            records: StateCell::new(Vec::new()),
            catalog_path: None,
            write_lock: tokio::sync::Mutex::new(()),
        }
    }

    /// Open (or create) a file-backed catalog.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let mut records: Vec<RecordingRecord> = if path.exists() {
            let raw = std::fs::read(path)
                .with_context(|| format!("Failed to read catalog: {}", path.display()))?;
            serde_json::from_slice(&raw)
                .with_context(|| format!("Failed to parse catalog: {}", path.display()))?
        } else {
            Vec::new()
        };

        refresh_exists(&mut records);
        sort_newest_first(&mut records);

        info!("Opened catalog: {} ({} recordings)", path.display(), records.len());

        Ok(Self {
            records: StateCell::new(records),
            catalog_path: Some(path.to_path_buf()),
            write_lock: tokio::sync::Mutex::new(()),
        })
    }

    async fn persist(&self, records: &[RecordingRecord]) -> Result<()> {
        let Some(path) = &self.catalog_path else {
            return Ok(());
        };

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }

        let raw = serde_json::to_vec_pretty(records).context("Failed to encode catalog")?;
        tokio::fs::write(path, raw)
            .await
            .with_context(|| format!("Failed to write catalog: {}", path.display()))?;

        Ok(())
    }
}

#[async_trait::async_trait]
impl RecordingStore for JsonStore {
    fn subscribe(&self) -> mpsc::UnboundedReceiver<Vec<RecordingRecord>> {
        self.records.subscribe()
    }

    fn snapshot(&self) -> Vec<RecordingRecord> {
        self.records.get()
    }

    async fn insert(&self, draft: DraftRecording) -> Result<RecordingRecord> {
        let _guard = self.write_lock.lock().await;

        let mut record = RecordingRecord {
            id: Uuid::new_v4(),
            created_at: draft.created_at,
            duration_ms: draft.duration_ms,
            path: draft.path,
            played: false,
            exists: true,
        };
        record.refresh_exists();

        let mut records = self.records.get();
        records.push(record.clone());
        sort_newest_first(&mut records);
        refresh_exists(&mut records);

        self.persist(&records).await?;
        self.records.set(records);

        info!("Inserted recording {} ({}ms)", record.id, record.duration_ms);

        Ok(record)
    }

    async fn update(&self, record: RecordingRecord) -> Result<()> {
        let _guard = self.write_lock.lock().await;

        let mut records = self.records.get();
        let existing = records
            .iter_mut()
            .find(|r| r.id == record.id)
            .with_context(|| format!("No recording with id {}", record.id))?;

        let played = existing.played || record.played;
        *existing = record;
        existing.played = played;

        refresh_exists(&mut records);

        self.persist(&records).await?;
        self.records.set(records);

        Ok(())
    }
}

fn sort_newest_first(records: &mut [RecordingRecord]) {
    records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
}
