use std::sync::Arc;
use tracing::{error, info};

use crate::chat::ChatPipeline;
use crate::recording::{RecordingSession, RecordingState};
use crate::transcription::{SubmitOutcome, TranscriptionClient};

/// Result of one press of the record button
#[derive(Debug)]
pub enum PressOutcome {
    Started,
    /// Ignored: a round-trip or playback is still outstanding
    Disabled,
    /// The device could not be acquired (already logged)
    StartFailed,
    Stopped(SubmitOutcome),
    /// The recording ended but no artifact could be built (already logged)
    StopFailed,
}

/// The record button: one press starts capture, the next stops it and
/// sends the recording off for transcription.
pub struct VoiceRecorder {
    session: RecordingSession,
    transcription: TranscriptionClient,
    pipeline: Arc<dyn ChatPipeline>,
}

impl VoiceRecorder {
    pub fn new(
        session: RecordingSession,
        transcription: TranscriptionClient,
        pipeline: Arc<dyn ChatPipeline>,
    ) -> Self {
        Self {
            session,
            transcription,
            pipeline,
        }
    }

    pub fn session(&self) -> &RecordingSession {
        &self.session
    }

    pub fn transcription(&self) -> &TranscriptionClient {
        &self.transcription
    }

    /// Backpressure against overlapping voice submissions.
    ///
    /// Only gates starting a recording; an active one can always be stopped.
    pub fn is_disabled(&self) -> bool {
        self.transcription.is_processing()
            || self.pipeline.is_loading()
            || self.pipeline.has_pending_message()
    }

    pub async fn press(&mut self) -> PressOutcome {
        if self.session.state() == RecordingState::Recording {
            return self.finish().await;
        }

        if self.is_disabled() {
            info!("Recorder disabled; ignoring press");
            return PressOutcome::Disabled;
        }

        match self.session.start().await {
            Ok(()) => PressOutcome::Started,
            Err(_) => PressOutcome::StartFailed,
        }
    }

    async fn finish(&mut self) -> PressOutcome {
        match self.session.stop().await {
            Ok(Some(artifact)) => {
                PressOutcome::Stopped(self.transcription.submit(artifact, self.pipeline.as_ref()).await)
            }
            Ok(None) => PressOutcome::StopFailed,
            Err(e) => {
                error!("Failed to finalize recording: {}", e);
                PressOutcome::StopFailed
            }
        }
    }
}
