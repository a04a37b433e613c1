pub mod audio;
pub mod chat;
pub mod config;
pub mod error;
pub mod http;
pub mod persona;
pub mod recording;
pub mod session;
pub mod transcription;
pub mod voice;

pub use audio::{AudioArtifact, AudioCaptureDevice, AudioFrame, CaptureConfig, DeviceProbe, ReplayDevice};
pub use chat::{ChatPipeline, ConsolePipeline, Message};
pub use config::Config;
pub use error::{ClientError, EditError};
pub use http::BackendClient;
pub use persona::{
    format_value, parse_field, EditMode, FieldKind, PersonaRecord, PersonaSync, PersonaSyncState,
    PersonaValue, PollOutcome, SaveStatus,
};
pub use recording::{RecordingSession, RecordingState};
pub use session::{SessionEndEvent, SessionTerminator};
pub use transcription::{Ingestion, SubmitOutcome, TranscriptionClient};
pub use voice::{PressOutcome, VoiceRecorder};
