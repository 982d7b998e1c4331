//! Capture session
//!
//! Stateful coordinator for recording a new memo and previewing it before it
//! is saved. The session owns at most one capture handle and one transient
//! preview playback handle, and broadcasts every state transition.

mod session;

pub use session::{CaptureConfig, CaptureSession, CaptureState};
