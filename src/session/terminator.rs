use tracing::{error, info};

use super::event::SessionEndEvent;
use crate::http::BackendClient;

/// Completion callback run after the backend acknowledged the end of a session
pub type OnSessionEnded = Box<dyn FnOnce() + Send>;

pub struct SessionTerminator {
    backend: BackendClient,
}

impl SessionTerminator {
    pub fn new(backend: BackendClient) -> Self {
        Self { backend }
    }

    /// Send one end-of-session notification.
    ///
    /// `on_complete` runs only on an ok response. Failures are logged and
    /// not retried. Returns whether the backend acknowledged.
    pub async fn end_session(&self, transcript_reference: &str, on_complete: Option<OnSessionEnded>) -> bool {
        let event = SessionEndEvent::now(transcript_reference);

        match self.backend.end_chat(&event).await {
            Ok(result) => {
                info!("Chat ended: {}", result);
                if let Some(callback) = on_complete {
                    callback();
                }
                true
            }
            Err(e) => {
                error!("Error ending chat: {}", e);
                false
            }
        }
    }
}
