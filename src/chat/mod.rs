//! Seam to the externally owned chat pipeline
//!
//! Messages are opaque here: they are forwarded verbatim from the
//! transcription backend to whichever ingestion entry point is configured.

use std::sync::atomic::{AtomicBool, Ordering};
use tracing::info;

/// A chat message as returned by the backend; never interpreted by this crate
pub type Message = serde_json::Value;

/// Chat pipeline collaborator (message reducer, avatar playback, ...).
pub trait ChatPipeline: Send + Sync {
    /// Bulk ingestion from voice-assisted text input
    fn chat(&self, messages: Vec<Message>);

    /// Ingestion from a transcription round-trip
    fn add_message(&self, messages: Vec<Message>);

    fn set_loading(&self, loading: bool);

    fn is_loading(&self) -> bool;

    /// Whether a message is currently being played back
    fn has_pending_message(&self) -> bool;
}

/// Pipeline that prints every ingested message to stdout
#[derive(Debug, Default)]
pub struct ConsolePipeline {
    loading: AtomicBool,
}

impl ConsolePipeline {
    pub fn new() -> Self {
        Self::default()
    }

    fn print(&self, entry_point: &str, messages: &[Message]) {
        info!("{} received {} messages", entry_point, messages.len());
        for message in messages {
            println!("{}", message);
        }
    }
}

impl ChatPipeline for ConsolePipeline {
    fn chat(&self, messages: Vec<Message>) {
        self.print("chat", &messages);
    }

    fn add_message(&self, messages: Vec<Message>) {
        self.print("add_message", &messages);
    }

    fn set_loading(&self, loading: bool) {
        self.loading.store(loading, Ordering::SeqCst);
    }

    fn is_loading(&self) -> bool {
        self.loading.load(Ordering::SeqCst)
    }

    fn has_pending_message(&self) -> bool {
        false
    }
}
