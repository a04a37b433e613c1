//! HTTP client for the conversation backend
//!
//! One method per endpoint:
//! - POST /transcribe - upload a recording, receive chat messages
//! - GET /get-user-persona - fetch the persona document
//! - POST /update-user-persona - save an edited persona
//! - POST /end-chat - notify that the conversation ended

mod client;
pub mod messages;

pub use client::BackendClient;
pub use messages::{TranscriptionResult, UpdatePersonaRequest, UpdatePersonaResponse};
