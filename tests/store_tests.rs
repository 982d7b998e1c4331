// Tests for the JSON-backed recording catalog: id assignment, newest-first
// ordering, the one-way played flag, live subscription, and persistence.

mod common;

use anyhow::Result;
use chrono::{Duration as ChronoDuration, Utc};
use dictaphone::{DraftRecording, JsonStore, RecordingStore};
use tempfile::TempDir;

fn draft(age_secs: i64) -> DraftRecording {
    DraftRecording {
        created_at: Utc::now() - ChronoDuration::seconds(age_secs),
        duration_ms: 2_500,
        path: "/nonexistent/memo.wav".into(),
    }
}

#[tokio::test]
async fn test_insert_assigns_unique_ids() -> Result<()> {
    let store = JsonStore::in_memory();

    let a = store.insert(draft(0)).await?;
    let b = store.insert(draft(1)).await?;

    assert_ne!(a.id, b.id);
    assert!(!a.played, "New recordings start unplayed");

    Ok(())
}

#[tokio::test]
async fn test_list_is_ordered_newest_first() -> Result<()> {
    let store = JsonStore::in_memory();

    let oldest = store.insert(draft(30)).await?;
    let newest = store.insert(draft(0)).await?;
    let middle = store.insert(draft(10)).await?;

    let ids: Vec<_> = store.snapshot().iter().map(|r| r.id).collect();
    assert_eq!(ids, vec![newest.id, middle.id, oldest.id]);

    Ok(())
}

#[tokio::test]
async fn test_update_flips_played() -> Result<()> {
    let store = JsonStore::in_memory();
    let record = store.insert(draft(0)).await?;

    let mut played = record.clone();
    played.played = true;
    store.update(played).await?;

    assert!(store.snapshot()[0].played);

    Ok(())
}

#[tokio::test]
async fn test_played_is_never_reset() -> Result<()> {
    let store = JsonStore::in_memory();
    let record = store.insert(draft(0)).await?;

    let mut played = record.clone();
    played.played = true;
    store.update(played).await?;

    // An update carrying played=false must not lower the flag.
    store.update(record).await?;
    assert!(store.snapshot()[0].played);

    Ok(())
}

#[tokio::test]
async fn test_update_unknown_id_fails() {
    let store = JsonStore::in_memory();

    let stray = common::record_at("/nonexistent/memo.wav", 0);
    assert!(store.update(stray).await.is_err());
}

#[tokio::test]
async fn test_subscription_replays_then_follows() -> Result<()> {
    let store = JsonStore::in_memory();
    store.insert(draft(10)).await?;

    let mut rx = store.subscribe();
    let initial = rx.try_recv().expect("current list replayed on subscribe");
    assert_eq!(initial.len(), 1);

    let second = store.insert(draft(0)).await?;
    let updated = rx.try_recv().expect("insert emits a new list");
    assert_eq!(updated.len(), 2);
    assert_eq!(updated[0].id, second.id);

    Ok(())
}

#[tokio::test]
async fn test_catalog_survives_reopen() -> Result<()> {
    let dir = TempDir::new()?;
    let catalog = dir.path().join("catalog.json");

    let saved = {
        let store = JsonStore::open(&catalog)?;
        store.insert(draft(0)).await?
    };

    let reopened = JsonStore::open(&catalog)?;
    let records = reopened.snapshot();

    assert_eq!(records.len(), 1);
    assert_eq!(records[0].id, saved.id);
    assert_eq!(records[0].duration_ms, 2_500);
    assert!(
        !records[0].exists,
        "exists is recomputed at read time, and the file was never written"
    );

    Ok(())
}

#[tokio::test]
async fn test_exists_recomputed_on_read() -> Result<()> {
    let dir = TempDir::new()?;
    let media = dir.path().join("memo.wav");
    std::fs::write(&media, b"riff")?;

    let store = JsonStore::in_memory();
    let record = store
        .insert(DraftRecording {
            created_at: Utc::now(),
            duration_ms: 1_000,
            path: media.clone(),
        })
        .await?;
    assert!(record.exists);

    std::fs::remove_file(&media)?;

    // Any mutation republished the list; exists reflects the deletion.
    let mut played = record.clone();
    played.played = true;
    store.update(played).await?;

    assert!(!store.snapshot()[0].exists);

    Ok(())
}
