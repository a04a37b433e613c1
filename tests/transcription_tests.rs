// Integration tests for the transcription round-trip
//
// These tests upload artifacts to an in-process mock backend and verify
// what reaches the chat pipeline and that the processing flag always clears.

mod common;

use anyhow::Result;
use axum::http::StatusCode;
use common::{speech_frames, MockBackend, RecordingPipeline};
use serde_json::json;
use std::time::Duration;
use voice_persona_client::audio::{AudioArtifact, CaptureConfig};
use voice_persona_client::{
    BackendClient, ChatPipeline, ClientError, Ingestion, SubmitOutcome, TranscriptionClient,
};

fn artifact(chunks: usize) -> Result<AudioArtifact> {
    Ok(AudioArtifact::from_frames(&speech_frames(chunks), &CaptureConfig::default())?)
}

#[tokio::test]
async fn test_empty_message_list_is_forwarded() -> Result<()> {
    let backend = MockBackend::start().await;
    backend.state.set_transcribe_response(StatusCode::OK, r#"{"messages": []}"#);
    let client = TranscriptionClient::new(backend.client(), Ingestion::AddMessage);
    let pipeline = RecordingPipeline::default();

    let outcome = client.submit(artifact(2)?, &pipeline).await;

    assert!(matches!(outcome, SubmitOutcome::Forwarded(0)));
    assert_eq!(pipeline.add_message_calls(), vec![Vec::<serde_json::Value>::new()]);
    assert!(!client.is_processing());
    assert!(!pipeline.is_loading());

    Ok(())
}

#[tokio::test]
async fn test_messages_forwarded_verbatim() -> Result<()> {
    let backend = MockBackend::start().await;
    let messages = json!([
        {"text": "Hi there!", "facialExpression": "smile", "animation": "Talking_1"},
        {"text": "How can I help?", "audio": "UklGRg=="}
    ]);
    backend
        .state
        .set_transcribe_response(StatusCode::OK, &json!({ "messages": messages }).to_string());
    let client = TranscriptionClient::new(backend.client(), Ingestion::AddMessage);
    let pipeline = RecordingPipeline::default();

    let outcome = client.submit(artifact(3)?, &pipeline).await;

    assert!(matches!(outcome, SubmitOutcome::Forwarded(2)));
    let calls = pipeline.add_message_calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(json!(calls[0]), messages);
    assert!(pipeline.chat_calls().is_empty());
    assert_eq!(*pipeline.loading_history.lock().unwrap(), vec![true, false]);

    Ok(())
}

#[tokio::test]
async fn test_upload_is_multipart_wav() -> Result<()> {
    let backend = MockBackend::start().await;
    let client = TranscriptionClient::new(backend.client(), Ingestion::AddMessage);
    let pipeline = RecordingPipeline::default();
    let upload = artifact(2)?;
    let expected_bytes = upload.bytes().to_vec();

    client.submit(upload, &pipeline).await;

    let uploads = backend.state.uploads.lock().unwrap().clone();
    assert_eq!(uploads.len(), 1);
    assert_eq!(uploads[0].field, "audio");
    assert_eq!(uploads[0].file_name.as_deref(), Some("recording.wav"));
    assert_eq!(uploads[0].content_type.as_deref(), Some("audio/wav"));
    assert_eq!(uploads[0].bytes, expected_bytes);
    assert!(uploads[0].bytes.starts_with(b"RIFF"));

    Ok(())
}

#[tokio::test]
async fn test_missing_message_list_forwards_nothing() -> Result<()> {
    let backend = MockBackend::start().await;
    backend.state.set_transcribe_response(StatusCode::OK, r#"{"text": "hello"}"#);
    let client = TranscriptionClient::new(backend.client(), Ingestion::AddMessage);
    let pipeline = RecordingPipeline::default();

    let outcome = client.submit(artifact(1)?, &pipeline).await;

    assert!(matches!(outcome, SubmitOutcome::NoMessages));
    assert!(pipeline.add_message_calls().is_empty());
    assert!(!client.is_processing());

    Ok(())
}

#[tokio::test]
async fn test_server_error_is_dropped_and_flag_cleared() -> Result<()> {
    let backend = MockBackend::start().await;
    backend
        .state
        .set_transcribe_response(StatusCode::INTERNAL_SERVER_ERROR, "<html>boom</html>");
    let client = TranscriptionClient::new(backend.client(), Ingestion::AddMessage);
    let pipeline = RecordingPipeline::default();

    let outcome = client.submit(artifact(1)?, &pipeline).await;

    assert!(matches!(
        outcome,
        SubmitOutcome::Failed(ClientError::NetworkFailure { .. })
    ));
    assert!(pipeline.add_message_calls().is_empty());
    assert!(!client.is_processing());
    assert!(!pipeline.is_loading());

    Ok(())
}

#[tokio::test]
async fn test_malformed_body_is_dropped() -> Result<()> {
    let backend = MockBackend::start().await;
    backend.state.set_transcribe_response(StatusCode::OK, "not json");
    let client = TranscriptionClient::new(backend.client(), Ingestion::AddMessage);
    let pipeline = RecordingPipeline::default();

    let outcome = client.submit(artifact(1)?, &pipeline).await;

    assert!(matches!(
        outcome,
        SubmitOutcome::Failed(ClientError::MalformedResponse { .. })
    ));
    assert!(!client.is_processing());

    Ok(())
}

#[tokio::test]
async fn test_unreachable_backend_clears_flag() -> Result<()> {
    let backend = MockBackend::start().await;
    let url = backend.base_url.clone();
    drop(backend);
    tokio::time::sleep(Duration::from_millis(50)).await;

    let client = TranscriptionClient::new(
        BackendClient::new(&url, Some(Duration::from_secs(2)))?,
        Ingestion::AddMessage,
    );
    let pipeline = RecordingPipeline::default();

    let outcome = client.submit(artifact(1)?, &pipeline).await;

    assert!(matches!(outcome, SubmitOutcome::Failed(_)));
    assert!(!client.is_processing());

    Ok(())
}

#[tokio::test]
async fn test_concurrent_submission_is_refused() -> Result<()> {
    let backend = MockBackend::start().await;
    *backend.state.transcribe_delay.lock().unwrap() = Duration::from_millis(200);
    backend
        .state
        .set_transcribe_response(StatusCode::OK, r#"{"messages": [{"text": "one"}]}"#);
    let client = TranscriptionClient::new(backend.client(), Ingestion::AddMessage);
    let pipeline = RecordingPipeline::default();

    let (first, second) = tokio::join!(
        client.submit(artifact(1)?, &pipeline),
        client.submit(artifact(1)?, &pipeline)
    );

    assert!(matches!(first, SubmitOutcome::Forwarded(1)));
    assert!(matches!(second, SubmitOutcome::Refused));
    assert_eq!(backend.state.uploads.lock().unwrap().len(), 1);
    assert!(!client.is_processing());

    Ok(())
}

#[tokio::test]
async fn test_cancelled_submission_clears_flag() -> Result<()> {
    let backend = MockBackend::start().await;
    *backend.state.transcribe_delay.lock().unwrap() = Duration::from_secs(5);
    let client = TranscriptionClient::new(backend.client(), Ingestion::AddMessage);
    let pipeline = RecordingPipeline::default();

    let upload = artifact(1)?;
    let timed_out =
        tokio::time::timeout(Duration::from_millis(200), client.submit(upload, &pipeline)).await;

    assert!(timed_out.is_err(), "Submission should still be in flight");
    assert!(!client.is_processing(), "Dropping the submission releases the flag");
    assert!(!pipeline.is_loading());

    Ok(())
}

#[tokio::test]
async fn test_chat_ingestion_routes_to_chat() -> Result<()> {
    let backend = MockBackend::start().await;
    backend
        .state
        .set_transcribe_response(StatusCode::OK, r#"{"messages": [{"text": "hey"}]}"#);
    let client = TranscriptionClient::new(backend.client(), Ingestion::Chat);
    let pipeline = RecordingPipeline::default();

    let outcome = client.submit(artifact(1)?, &pipeline).await;

    assert!(matches!(outcome, SubmitOutcome::Forwarded(1)));
    assert_eq!(pipeline.chat_calls(), vec![vec![json!({"text": "hey"})]]);
    assert!(pipeline.add_message_calls().is_empty());

    Ok(())
}

#[tokio::test]
async fn test_configured_timeout_is_enforced() -> Result<()> {
    let backend = MockBackend::start().await;
    *backend.state.transcribe_delay.lock().unwrap() = Duration::from_secs(3);
    let client = TranscriptionClient::new(
        BackendClient::new(&backend.base_url, Some(Duration::from_millis(200)))?,
        Ingestion::AddMessage,
    );
    let pipeline = RecordingPipeline::default();

    let started = std::time::Instant::now();
    let outcome = client.submit(artifact(1)?, &pipeline).await;

    assert!(matches!(
        outcome,
        SubmitOutcome::Failed(ClientError::NetworkFailure { .. })
    ));
    assert!(started.elapsed() < Duration::from_secs(2), "Request should time out early");
    assert!(!client.is_processing());

    Ok(())
}

#[tokio::test]
async fn test_processing_flag_visible_while_in_flight() -> Result<()> {
    let backend = MockBackend::start().await;
    *backend.state.transcribe_delay.lock().unwrap() = Duration::from_millis(200);
    let client = TranscriptionClient::new(backend.client(), Ingestion::AddMessage);
    let pipeline = RecordingPipeline::default();
    let flag = client.processing_flag();

    let (outcome, seen_mid_flight) = tokio::join!(client.submit(artifact(1)?, &pipeline), async {
        tokio::time::sleep(Duration::from_millis(50)).await;
        flag.load(std::sync::atomic::Ordering::SeqCst)
    });

    assert!(matches!(outcome, SubmitOutcome::Forwarded(0)));
    assert!(seen_mid_flight, "Observers see the flag while the upload is out");
    assert!(!flag.load(std::sync::atomic::Ordering::SeqCst));

    Ok(())
}
