use serde::{Deserialize, Serialize};

use crate::chat::Message;
use crate::persona::PersonaRecord;

/// Response of POST /transcribe
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TranscriptionResult {
    #[serde(default)]
    pub messages: Option<Vec<Message>>,
}

/// Body of POST /update-user-persona
#[derive(Debug, Serialize)]
pub struct UpdatePersonaRequest<'a> {
    pub data: &'a PersonaRecord,
}

/// Response of POST /update-user-persona
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdatePersonaResponse {
    /// A missing flag counts as a rejection
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
}
