//! Playback session
//!
//! The single owner of all playback of saved memos (the preview player inside
//! the capture session is a separate instance reading the scratch path). One
//! `play` entry point disambiguates start, pause, and resume from the current
//! state so callers never race a state read against a command.

mod session;

pub use session::{PlaybackSession, PlaybackState};
