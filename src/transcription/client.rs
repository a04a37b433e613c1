use serde::Deserialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::audio::AudioArtifact;
use crate::chat::ChatPipeline;
use crate::error::ClientError;
use crate::http::BackendClient;

/// Pipeline entry point that receives transcribed messages
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Ingestion {
    #[default]
    AddMessage,
    Chat,
}

#[derive(Debug)]
pub enum SubmitOutcome {
    /// Messages handed to the pipeline (possibly zero)
    Forwarded(usize),
    /// The backend answered without a message list
    NoMessages,
    /// Logged and dropped; nothing was forwarded
    Failed(ClientError),
    /// Another submission was still in flight
    Refused,
}

/// Clears the processing flag on every exit path, including cancellation
struct ProcessingGuard<'a> {
    flag: &'a AtomicBool,
    pipeline: &'a dyn ChatPipeline,
}

impl<'a> ProcessingGuard<'a> {
    fn acquire(flag: &'a AtomicBool, pipeline: &'a dyn ChatPipeline) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .ok()?;
        pipeline.set_loading(true);
        Some(Self { flag, pipeline })
    }
}

impl Drop for ProcessingGuard<'_> {
    fn drop(&mut self) {
        self.pipeline.set_loading(false);
        self.flag.store(false, Ordering::SeqCst);
    }
}

/// Uploads finished recordings and forwards the resulting messages.
///
/// Owns the processing flag that keeps the recorder disabled while a
/// round-trip is outstanding.
pub struct TranscriptionClient {
    backend: BackendClient,
    ingestion: Ingestion,
    processing: Arc<AtomicBool>,
}

impl TranscriptionClient {
    pub fn new(backend: BackendClient, ingestion: Ingestion) -> Self {
        Self {
            backend,
            ingestion,
            processing: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn is_processing(&self) -> bool {
        self.processing.load(Ordering::SeqCst)
    }

    /// Shared handle to the processing flag, for observers such as a UI
    pub fn processing_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.processing)
    }

    /// Run one transcription round-trip.
    ///
    /// Failures are logged and never retried. A second call while one is in
    /// flight is refused rather than racing the first to clear the flag.
    pub async fn submit(&self, artifact: AudioArtifact, pipeline: &dyn ChatPipeline) -> SubmitOutcome {
        let Some(_guard) = ProcessingGuard::acquire(&self.processing, pipeline) else {
            warn!("Transcription already in progress; dropping recording");
            return SubmitOutcome::Refused;
        };

        match self.backend.transcribe(artifact).await {
            Ok(result) => match result.messages {
                Some(messages) => {
                    let count = messages.len();
                    info!("Transcription returned {} messages", count);
                    match self.ingestion {
                        Ingestion::AddMessage => pipeline.add_message(messages),
                        Ingestion::Chat => pipeline.chat(messages),
                    }
                    SubmitOutcome::Forwarded(count)
                }
                None => {
                    info!("Transcription returned no messages");
                    SubmitOutcome::NoMessages
                }
            },
            Err(e) => {
                error!("Error processing audio: {}", e);
                SubmitOutcome::Failed(e)
            }
        }
    }
}
