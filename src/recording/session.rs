use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::audio::{AudioArtifact, AudioCaptureDevice, AudioFrame, CaptureConfig};
use crate::error::ClientError;

/// Resolution of the elapsed-time indicator
const TICK_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordingState {
    Idle,
    Recording,
    Stopping,
}

/// Background task accumulating chunks until told to stop
struct ChunkCollector {
    stop_tx: oneshot::Sender<()>,
    task: JoinHandle<Vec<AudioFrame>>,
}

/// Runs `teardown` when dropped, finished or not
struct TeardownGuard<'a> {
    session: &'a mut RecordingSession,
}

impl Drop for TeardownGuard<'_> {
    fn drop(&mut self) {
        self.session.teardown();
    }
}

/// Owns the microphone handle and the recorder lifecycle.
///
/// The device is acquired on `start` and released on every exit from
/// `Recording`: `stop`, `abort`, and drop.
pub struct RecordingSession {
    device: Box<dyn AudioCaptureDevice>,
    config: CaptureConfig,
    state: RecordingState,
    recording_id: Option<Uuid>,
    elapsed_secs: Arc<AtomicU64>,
    chunks_received: Arc<AtomicUsize>,
    collector: Option<ChunkCollector>,
    ticker: Option<JoinHandle<()>>,
}

impl RecordingSession {
    pub fn new(device: Box<dyn AudioCaptureDevice>, config: CaptureConfig) -> Self {
        Self {
            device,
            config,
            state: RecordingState::Idle,
            recording_id: None,
            elapsed_secs: Arc::new(AtomicU64::new(0)),
            chunks_received: Arc::new(AtomicUsize::new(0)),
            collector: None,
            ticker: None,
        }
    }

    pub fn state(&self) -> RecordingState {
        self.state
    }

    pub fn is_recording(&self) -> bool {
        self.state == RecordingState::Recording
    }

    /// Whole seconds since `start`, for the recording indicator
    pub fn elapsed_secs(&self) -> u64 {
        self.elapsed_secs.load(Ordering::SeqCst)
    }

    /// Chunks accumulated so far in the current recording
    pub fn chunk_count(&self) -> usize {
        self.chunks_received.load(Ordering::SeqCst)
    }

    /// Acquire the device and begin accumulating chunks.
    ///
    /// A no-op while already recording. On `DeviceUnavailable` the session
    /// stays `Idle`; the error is logged here and returned for the caller
    /// to swallow.
    pub async fn start(&mut self) -> Result<(), ClientError> {
        if self.state != RecordingState::Idle {
            warn!("Recording already started");
            return Ok(());
        }

        let audio_rx = match self.device.acquire().await {
            Ok(rx) => rx,
            Err(e) => {
                error!("Error accessing microphone ({}): {}", self.device.name(), e);
                return Err(e);
            }
        };

        let recording_id = Uuid::new_v4();
        info!("Recording {} started on {}", recording_id, self.device.name());

        self.chunks_received.store(0, Ordering::SeqCst);
        self.elapsed_secs.store(0, Ordering::SeqCst);

        let (stop_tx, stop_rx) = oneshot::channel();
        let task = tokio::spawn(collect_chunks(
            audio_rx,
            stop_rx,
            Arc::clone(&self.chunks_received),
        ));
        self.collector = Some(ChunkCollector { stop_tx, task });

        let elapsed = Arc::clone(&self.elapsed_secs);
        self.ticker = Some(tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + TICK_INTERVAL, TICK_INTERVAL);
            loop {
                ticker.tick().await;
                elapsed.fetch_add(1, Ordering::SeqCst);
            }
        }));

        self.recording_id = Some(recording_id);
        self.state = RecordingState::Recording;

        Ok(())
    }

    /// Finish the recording and hand back its artifact.
    ///
    /// Returns `Ok(None)` without side effects unless `Recording`. The device
    /// is released and the session is `Idle` again even when encoding fails.
    pub async fn stop(&mut self) -> Result<Option<AudioArtifact>, ClientError> {
        if self.state != RecordingState::Recording {
            warn!("Recording not active");
            return Ok(None);
        }

        self.state = RecordingState::Stopping;

        // Closing the device ends the chunk stream; the collector then drains it
        self.device.release();

        let collector = self.collector.take();
        let recording_id = self.recording_id;

        // Back to Idle even if this future is dropped while draining
        let guard = TeardownGuard { session: &mut *self };

        let chunks = match collector {
            Some(collector) => {
                let _ = collector.stop_tx.send(());
                match collector.task.await {
                    Ok(chunks) => chunks,
                    Err(e) => {
                        error!("Chunk collector panicked: {}", e);
                        Vec::new()
                    }
                }
            }
            None => Vec::new(),
        };

        drop(guard);

        info!(
            "Recording {} stopped: {} chunks",
            recording_id.map(|id| id.to_string()).unwrap_or_default(),
            chunks.len()
        );

        AudioArtifact::from_frames(&chunks, &self.config).map(Some)
    }

    /// Abandon the recording after a capture error, discarding its chunks
    pub fn abort(&mut self) {
        if self.state == RecordingState::Idle {
            return;
        }

        warn!(
            "Recording {} aborted",
            self.recording_id.map(|id| id.to_string()).unwrap_or_default()
        );

        if let Some(collector) = self.collector.take() {
            collector.task.abort();
        }
        self.teardown();
    }

    fn teardown(&mut self) {
        self.device.release();

        if let Some(ticker) = self.ticker.take() {
            ticker.abort();
        }

        self.elapsed_secs.store(0, Ordering::SeqCst);
        self.chunks_received.store(0, Ordering::SeqCst);
        self.recording_id = None;
        self.state = RecordingState::Idle;
    }
}

impl Drop for RecordingSession {
    fn drop(&mut self) {
        if let Some(collector) = self.collector.take() {
            collector.task.abort();
        }
        if let Some(ticker) = self.ticker.take() {
            ticker.abort();
        }
        if self.device.is_acquired() {
            warn!("Releasing {} on drop", self.device.name());
            self.device.release();
        }
    }
}

async fn collect_chunks(
    mut audio_rx: mpsc::Receiver<AudioFrame>,
    mut stop_rx: oneshot::Receiver<()>,
    received: Arc<AtomicUsize>,
) -> Vec<AudioFrame> {
    let mut chunks = Vec::new();

    loop {
        tokio::select! {
            frame = audio_rx.recv() => match frame {
                Some(frame) => {
                    chunks.push(frame);
                    received.fetch_add(1, Ordering::SeqCst);
                }
                None => break,
            },
            _ = &mut stop_rx => {
                while let Ok(frame) = audio_rx.try_recv() {
                    chunks.push(frame);
                    received.fetch_add(1, Ordering::SeqCst);
                }
                break;
            }
        }
    }

    chunks
}
