mod recorder;

pub use recorder::{PressOutcome, VoiceRecorder};
