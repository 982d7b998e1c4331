//! Session aggregation
//!
//! Combines the live recordings list with the playback session state into a
//! single derived view, and implements auto-advance: when a memo finishes
//! naturally, play the first later entry in the list whose backing file still
//! exists.

use std::sync::{Arc, Weak};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::warn;
use uuid::Uuid;

use crate::model::{refresh_exists, RecordingRecord};
use crate::playback::{PlaybackSession, PlaybackState};
use crate::state::StateCell;
use crate::store::RecordingStore;

/// Derived view over the recordings list and playback state.
///
/// Recomputed whenever either input changes; consumers always observe the
/// latest combination, never a stale cross of old list and new state. The
/// `exists` flag of every record is rechecked on each recombination.
#[derive(Debug, Clone, PartialEq)]
pub struct ListView {
    pub recordings: Vec<RecordingRecord>,
    pub playback: PlaybackState,
}

/// Combines store and playback updates and drives auto-advance.
pub struct SessionAggregator {
    view: StateCell<ListView>,
    task: JoinHandle<()>,
}

impl SessionAggregator {
    pub fn new(store: Arc<dyn RecordingStore>, playback: Arc<PlaybackSession>) -> Arc<Self> {
        let mut recordings = store.snapshot();
        refresh_exists(&mut recordings);
        let view = StateCell::new(ListView {
            recordings,
            playback: playback.state(),
        });

        let list_rx = store.subscribe();
        let play_rx = playback.subscribe();
        let cell = view.clone();
        let playback = Arc::downgrade(&playback);

        let task = tokio::spawn(async move {
            combine_loop(list_rx, play_rx, cell, playback).await;
        });

        Arc::new(Self { view, task })
    }

    /// Current combined view.
    pub fn view(&self) -> ListView {
        self.view.get()
    }

    /// Live view stream: current view immediately, then every recombination.
    pub fn subscribe(&self) -> mpsc::UnboundedReceiver<ListView> {
        self.view.subscribe()
    }
}

impl Drop for SessionAggregator {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn combine_loop(
    mut list_rx: mpsc::UnboundedReceiver<Vec<RecordingRecord>>,
    mut play_rx: mpsc::UnboundedReceiver<PlaybackState>,
    cell: StateCell<ListView>,
    playback: Weak<PlaybackSession>,
) {
    // Both subscriptions replay their current value, so the first two recvs
    // seed the combination.
    let Some(mut latest_list) = list_rx.recv().await else {
        return;
    };
    let Some(mut latest_play) = play_rx.recv().await else {
        return;
    };

    // Advance at most once per distinct Finished occupancy; reset when
    // playback leaves Finished.
    let mut advanced_from: Option<Uuid> = None;

    loop {
        let mut recordings = latest_list.clone();
        refresh_exists(&mut recordings);
        let view = ListView {
            recordings,
            playback: latest_play.clone(),
        };

        if cell.get() != view {
            cell.set(view.clone());
        }

        match &view.playback {
            PlaybackState::Finished(finished) if advanced_from != Some(finished.id) => {
                if let Some(next) = next_playable(&view.recordings, finished) {
                    advanced_from = Some(finished.id);
                    auto_advance(&playback, next.clone());
                }
            }
            PlaybackState::Finished(_) => {}
            _ => advanced_from = None,
        }

        tokio::select! {
            maybe_list = list_rx.recv() => match maybe_list {
                Some(list) => latest_list = list,
                None => break,
            },
            maybe_play = play_rx.recv() => match maybe_play {
                Some(state) => latest_play = state,
                None => break,
            },
        }
    }
}

/// First recording strictly after `finished` in list order whose backing
/// file exists. None when `finished` left the list or no later entry is
/// playable.
fn next_playable<'a>(
    recordings: &'a [RecordingRecord],
    finished: &RecordingRecord,
) -> Option<&'a RecordingRecord> {
    let index = recordings.iter().position(|r| r.id == finished.id)?;
    recordings[index + 1..].iter().find(|r| r.exists)
}

fn auto_advance(playback: &Weak<PlaybackSession>, next: RecordingRecord) {
    let Some(session) = playback.upgrade() else {
        return;
    };
    // Through the same serialized entry point a user call would take.
    tokio::spawn(async move {
        if let Err(e) = session.play(next).await {
            warn!("Auto-advance failed: {}", e);
        }
    });
}
