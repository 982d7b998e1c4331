use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use dictaphone::{
    CaptureConfig, CaptureSession, CaptureState, Config, JsonStore, MediaProbe, PlaybackSession,
    PlaybackState, RecordingStore, SessionAggregator, SimCaptureBackend, SimPlaybackBackend,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::info;

#[derive(Parser)]
#[command(name = "dictaphone")]
#[command(about = "Personal audio-note recorder (simulated devices)")]
struct Args {
    /// Config file; built-in defaults are used when omitted
    #[arg(short, long)]
    config: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Record a memo for a fixed duration and save it to the catalog
    Record {
        /// Recording duration in seconds
        #[arg(short, long, default_value = "3")]
        seconds: u64,

        /// Play the take back before saving
        #[arg(long)]
        preview: bool,
    },
    /// List saved memos
    List,
    /// Play a memo, auto-advancing through the rest of the list
    Play {
        /// Zero-based index into the list
        #[arg(short, long, default_value = "0")]
        index: usize,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    let cfg = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };

    let store: Arc<dyn RecordingStore> = Arc::new(JsonStore::open(&cfg.store.catalog_path)?);

    match args.command {
        Command::Record { seconds, preview } => record(cfg, store, seconds, preview).await,
        Command::List => list(store),
        Command::Play { index } => play(store, index).await,
    }
}

async fn record(
    cfg: Config,
    store: Arc<dyn RecordingStore>,
    seconds: u64,
    preview: bool,
) -> Result<()> {
    let session = CaptureSession::new(
        Arc::new(SimCaptureBackend::new()),
        Arc::new(SimPlaybackBackend::new()),
        Arc::new(MediaProbe),
        CaptureConfig {
            scratch_path: PathBuf::from(&cfg.audio.scratch_path),
            recordings_dir: PathBuf::from(&cfg.audio.recordings_dir),
        },
    );

    info!("Recording for {} seconds", seconds);
    session.start_recording().await?;
    sleep(Duration::from_secs(seconds)).await;
    session.stop_recording().await;

    if preview {
        info!("Playing preview");
        session.play_preview().await?;
        // The subscription replays the current state first, so this loop
        // ends immediately if the preview already finished.
        let mut states = session.subscribe();
        while let Some(state) = states.recv().await {
            if matches!(state, CaptureState::Idle { .. }) {
                break;
            }
        }
    }

    let draft = session.save_recording().await?;
    let record = store.insert(draft).await?;

    println!("Saved memo {} ({}ms)", record.id, record.duration_ms);

    Ok(())
}

fn list(store: Arc<dyn RecordingStore>) -> Result<()> {
    let records = store.snapshot();

    if records.is_empty() {
        println!("No memos recorded yet");
        return Ok(());
    }

    for (index, record) in records.iter().enumerate() {
        let played = if record.played { "played" } else { "new" };
        let missing = if record.exists { "" } else { " [missing]" };
        println!(
            "{:3}  {}  {:6}ms  {}{}  {}",
            index,
            record.created_at.format("%Y-%m-%d %H:%M:%S"),
            record.duration_ms,
            played,
            missing,
            record.path.display()
        );
    }

    Ok(())
}

async fn play(store: Arc<dyn RecordingStore>, index: usize) -> Result<()> {
    let records = store.snapshot();
    let Some(record) = records.get(index) else {
        bail!("No memo at index {} ({} in catalog)", index, records.len());
    };

    let playback = PlaybackSession::new(Arc::new(SimPlaybackBackend::new()), Arc::clone(&store));
    let aggregator = SessionAggregator::new(Arc::clone(&store), Arc::clone(&playback));

    let mut views = aggregator.subscribe();
    playback.play(record.clone()).await?;

    let mut last_playback = None;
    while let Some(view) = views.recv().await {
        if last_playback.as_ref() == Some(&view.playback) {
            continue;
        }
        last_playback = Some(view.playback.clone());

        match &view.playback {
            PlaybackState::Playing(r) => println!("Playing {} ({}ms)", r.id, r.duration_ms),
            PlaybackState::Finished(r) => {
                println!("Finished {}", r.id);

                // Exit once there is nothing left to auto-advance to.
                let position = view.recordings.iter().position(|x| x.id == r.id);
                let has_next = position
                    .map(|p| view.recordings[p + 1..].iter().any(|x| x.exists))
                    .unwrap_or(false);
                if !has_next {
                    break;
                }
            }
            _ => {}
        }
    }

    println!("Playback queue complete");

    Ok(())
}
