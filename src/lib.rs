pub mod aggregator;
pub mod capture;
pub mod config;
pub mod device;
pub mod error;
pub mod model;
pub mod playback;
pub mod probe;
pub mod state;
pub mod store;

pub use aggregator::{ListView, SessionAggregator};
pub use capture::{CaptureConfig, CaptureSession, CaptureState};
pub use config::Config;
pub use device::{
    CaptureBackend, CaptureHandle, Completion, PlaybackBackend, PlaybackHandle,
    SimCaptureBackend, SimPlaybackBackend,
};
pub use error::SessionError;
pub use model::{DraftRecording, RecordingRecord};
pub use playback::{PlaybackSession, PlaybackState};
pub use probe::{DurationProbe, MediaProbe};
pub use state::StateCell;
pub use store::{JsonStore, RecordingStore};
