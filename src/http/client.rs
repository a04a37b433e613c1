use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, info};

use super::messages::{TranscriptionResult, UpdatePersonaRequest, UpdatePersonaResponse};
use crate::audio::AudioArtifact;
use crate::error::ClientError;
use crate::persona::PersonaRecord;
use crate::session::SessionEndEvent;

const TRANSCRIBE: &str = "/transcribe";
const GET_PERSONA: &str = "/get-user-persona";
const UPDATE_PERSONA: &str = "/update-user-persona";
const END_CHAT: &str = "/end-chat";

/// Multipart field the recording is uploaded under
const AUDIO_FIELD: &str = "audio";

/// Thin client over the backend's JSON endpoints
#[derive(Debug, Clone)]
pub struct BackendClient {
    http: Client,
    base_url: String,
}

impl BackendClient {
    /// `request_timeout` of `None` lets requests wait indefinitely
    pub fn new(base_url: &str, request_timeout: Option<Duration>) -> Result<Self, ClientError> {
        let mut builder = Client::builder();
        if let Some(timeout) = request_timeout {
            builder = builder.timeout(timeout);
        }

        let http = builder
            .build()
            .map_err(|e| ClientError::HttpClient(e.to_string()))?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Upload a recording and return the backend's message list
    pub async fn transcribe(&self, artifact: AudioArtifact) -> Result<TranscriptionResult, ClientError> {
        let size = artifact.bytes().len();
        let file_name = artifact.file_name();
        let media_type = artifact.media_type();

        let part = Part::bytes(artifact.into_bytes())
            .file_name(file_name)
            .mime_str(media_type)
            .map_err(|e| ClientError::Encoding(e.to_string()))?;
        let form = Form::new().part(AUDIO_FIELD, part);

        debug!("Uploading {} bytes to {}", size, TRANSCRIBE);

        let response = self
            .http
            .post(self.url(TRANSCRIBE))
            .multipart(form)
            .send()
            .await
            .map_err(|e| ClientError::network(TRANSCRIBE, e))?;

        read_json(TRANSCRIBE, response).await
    }

    pub async fn fetch_persona(&self) -> Result<PersonaRecord, ClientError> {
        let response = self
            .http
            .get(self.url(GET_PERSONA))
            .send()
            .await
            .map_err(|e| ClientError::network(GET_PERSONA, e))?;

        read_json(GET_PERSONA, response).await
    }

    /// Save the full persona; an ok status with `success: false` is a rejection
    pub async fn update_persona(&self, persona: &PersonaRecord) -> Result<(), ClientError> {
        let response = self
            .http
            .post(self.url(UPDATE_PERSONA))
            .json(&UpdatePersonaRequest { data: persona })
            .send()
            .await
            .map_err(|e| ClientError::network(UPDATE_PERSONA, e))?;

        let result: UpdatePersonaResponse = read_json(UPDATE_PERSONA, response).await?;
        if !result.success {
            return Err(ClientError::ServerRejected(
                result.message.unwrap_or_else(|| "Unknown error".to_string()),
            ));
        }

        info!("Persona saved ({} fields)", persona.len());
        Ok(())
    }

    pub async fn end_chat(&self, event: &SessionEndEvent) -> Result<serde_json::Value, ClientError> {
        let response = self
            .http
            .post(self.url(END_CHAT))
            .json(event)
            .send()
            .await
            .map_err(|e| ClientError::network(END_CHAT, e))?;

        read_json(END_CHAT, response).await
    }
}

/// Reject non-2xx statuses, then decode the body
async fn read_json<T: DeserializeOwned>(endpoint: &'static str, response: Response) -> Result<T, ClientError> {
    let status = response.status();
    if !status.is_success() {
        return Err(ClientError::network(endpoint, format!("HTTP {}", status)));
    }

    let body = response
        .bytes()
        .await
        .map_err(|e| ClientError::network(endpoint, e))?;

    serde_json::from_slice(&body).map_err(|e| ClientError::malformed(endpoint, e))
}
