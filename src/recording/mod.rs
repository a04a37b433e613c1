//! Microphone capture lifecycle
//!
//! `RecordingSession` moves between `Idle`, `Recording` and `Stopping`,
//! holding at most one device handle and producing one `AudioArtifact`
//! per completed recording.

mod session;

pub use session::{RecordingSession, RecordingState};
