// Shared fixtures: an in-process mock backend and a recording chat pipeline.

#![allow(dead_code)]

use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;
use voice_persona_client::audio::AudioFrame;
use voice_persona_client::{BackendClient, ChatPipeline, Message};

/// Multipart part as received by the mock /transcribe
#[derive(Debug, Clone)]
pub struct Upload {
    pub field: String,
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

pub struct MockState {
    /// Raw JSON text served by GET /get-user-persona (keeps field order)
    pub persona: Mutex<String>,
    pub persona_status: Mutex<StatusCode>,
    pub persona_fetches: AtomicUsize,
    /// Held after the body is read, so a delayed GET answers with old data
    pub persona_delay: Mutex<Duration>,
    pub saved: Mutex<Vec<Value>>,
    /// Save bodies exactly as sent
    pub saved_raw: Mutex<Vec<String>>,
    pub save_response: Mutex<(StatusCode, String)>,
    pub save_delay: Mutex<Duration>,
    pub transcribe_response: Mutex<(StatusCode, String)>,
    pub transcribe_delay: Mutex<Duration>,
    pub uploads: Mutex<Vec<Upload>>,
    pub end_chat_requests: Mutex<Vec<Value>>,
    pub end_chat_status: Mutex<StatusCode>,
}

impl Default for MockState {
    fn default() -> Self {
        Self {
            persona: Mutex::new("{}".to_string()),
            persona_status: Mutex::new(StatusCode::OK),
            persona_fetches: AtomicUsize::new(0),
            persona_delay: Mutex::new(Duration::ZERO),
            saved: Mutex::new(Vec::new()),
            saved_raw: Mutex::new(Vec::new()),
            save_response: Mutex::new((StatusCode::OK, json!({"success": true}).to_string())),
            save_delay: Mutex::new(Duration::ZERO),
            transcribe_response: Mutex::new((StatusCode::OK, json!({"messages": []}).to_string())),
            transcribe_delay: Mutex::new(Duration::ZERO),
            uploads: Mutex::new(Vec::new()),
            end_chat_requests: Mutex::new(Vec::new()),
            end_chat_status: Mutex::new(StatusCode::OK),
        }
    }
}

impl MockState {
    pub fn set_persona(&self, body: &str) {
        *self.persona.lock().unwrap() = body.to_string();
    }

    pub fn set_save_response(&self, status: StatusCode, body: Value) {
        *self.save_response.lock().unwrap() = (status, body.to_string());
    }

    pub fn set_transcribe_response(&self, status: StatusCode, body: &str) {
        *self.transcribe_response.lock().unwrap() = (status, body.to_string());
    }

    pub fn fetches(&self) -> usize {
        self.persona_fetches.load(Ordering::SeqCst)
    }
}

pub struct MockBackend {
    pub base_url: String,
    pub state: Arc<MockState>,
    handle: JoinHandle<()>,
}

impl MockBackend {
    pub async fn start() -> Self {
        let state = Arc::new(MockState::default());

        let app = Router::new()
            .route("/get-user-persona", get(get_persona))
            .route("/update-user-persona", post(update_persona))
            .route("/transcribe", post(transcribe))
            .route("/end-chat", post(end_chat))
            .with_state(Arc::clone(&state));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("mock backend should bind");
        let addr = listener.local_addr().expect("mock backend address");

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.expect("mock backend serve");
        });

        Self {
            base_url: format!("http://{}", addr),
            state,
            handle,
        }
    }

    pub fn client(&self) -> BackendClient {
        BackendClient::new(&self.base_url, Some(Duration::from_secs(5))).expect("backend client")
    }
}

impl Drop for MockBackend {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn get_persona(State(state): State<Arc<MockState>>) -> (StatusCode, String) {
    state.persona_fetches.fetch_add(1, Ordering::SeqCst);
    let status = *state.persona_status.lock().unwrap();
    let body = state.persona.lock().unwrap().clone();
    let delay = *state.persona_delay.lock().unwrap();
    tokio::time::sleep(delay).await;
    (status, body)
}

async fn update_persona(State(state): State<Arc<MockState>>, body: String) -> (StatusCode, String) {
    let parsed = serde_json::from_str(&body).unwrap_or(Value::Null);
    state.saved.lock().unwrap().push(parsed);
    state.saved_raw.lock().unwrap().push(body);
    let delay = *state.save_delay.lock().unwrap();
    tokio::time::sleep(delay).await;
    state.save_response.lock().unwrap().clone()
}

async fn transcribe(State(state): State<Arc<MockState>>, mut multipart: Multipart) -> (StatusCode, String) {
    while let Ok(Some(field)) = multipart.next_field().await {
        let name = field.name().unwrap_or_default().to_string();
        let file_name = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(str::to_string);
        let bytes = field.bytes().await.map(|b| b.to_vec()).unwrap_or_default();
        state.uploads.lock().unwrap().push(Upload {
            field: name,
            file_name,
            content_type,
            bytes,
        });
    }

    let delay = *state.transcribe_delay.lock().unwrap();
    tokio::time::sleep(delay).await;
    state.transcribe_response.lock().unwrap().clone()
}

async fn end_chat(State(state): State<Arc<MockState>>, Json(body): Json<Value>) -> (StatusCode, String) {
    state.end_chat_requests.lock().unwrap().push(body);
    let status = *state.end_chat_status.lock().unwrap();
    (status, json!({"status": "ended"}).to_string())
}

/// Chat pipeline that records every call
#[derive(Default)]
pub struct RecordingPipeline {
    pub chat_calls: Mutex<Vec<Vec<Message>>>,
    pub add_message_calls: Mutex<Vec<Vec<Message>>>,
    pub loading_history: Mutex<Vec<bool>>,
    pub loading: AtomicBool,
    pub pending_message: AtomicBool,
}

impl RecordingPipeline {
    pub fn add_message_calls(&self) -> Vec<Vec<Message>> {
        self.add_message_calls.lock().unwrap().clone()
    }

    pub fn chat_calls(&self) -> Vec<Vec<Message>> {
        self.chat_calls.lock().unwrap().clone()
    }
}

impl ChatPipeline for RecordingPipeline {
    fn chat(&self, messages: Vec<Message>) {
        self.chat_calls.lock().unwrap().push(messages);
    }

    fn add_message(&self, messages: Vec<Message>) {
        self.add_message_calls.lock().unwrap().push(messages);
    }

    fn set_loading(&self, loading: bool) {
        self.loading_history.lock().unwrap().push(loading);
        self.loading.store(loading, Ordering::SeqCst);
    }

    fn is_loading(&self) -> bool {
        self.loading.load(Ordering::SeqCst)
    }

    fn has_pending_message(&self) -> bool {
        self.pending_message.load(Ordering::SeqCst)
    }
}

/// `count` chunks of 100ms non-silent 16kHz mono audio
pub fn speech_frames(count: usize) -> Vec<AudioFrame> {
    (0..count)
        .map(|i| AudioFrame {
            samples: vec![(i as i16 + 1) * 100; 1600],
            sample_rate: 16000,
            channels: 1,
            timestamp_ms: i as u64 * 100,
        })
        .collect()
}
