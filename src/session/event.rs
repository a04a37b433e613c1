use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Serialize, Serializer};

/// Body of POST /end-chat
#[derive(Debug, Clone, Serialize)]
pub struct SessionEndEvent {
    #[serde(rename = "endedAt", serialize_with = "iso_millis")]
    pub ended_at: DateTime<Utc>,

    /// Where the backend persisted the conversation transcript
    #[serde(rename = "json_file_path")]
    pub transcript_reference: String,
}

impl SessionEndEvent {
    pub fn now(transcript_reference: impl Into<String>) -> Self {
        Self {
            ended_at: Utc::now(),
            transcript_reference: transcript_reference.into(),
        }
    }
}

/// `2025-10-27T14:30:00.000Z`, the form browsers produce with `toISOString`
fn iso_millis<S: Serializer>(ts: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&ts.to_rfc3339_opts(SecondsFormat::Millis, true))
}
