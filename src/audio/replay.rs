use anyhow::{Context, Result};
use hound::WavReader;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::info;

use super::backend::{AudioCaptureDevice, AudioFrame};
use crate::error::ClientError;

/// Counters shared with a [`ReplayDevice`] after it has been handed off
#[derive(Debug, Clone, Default)]
pub struct DeviceProbe {
    open_handles: Arc<AtomicUsize>,
    acquisitions: Arc<AtomicUsize>,
    releases: Arc<AtomicUsize>,
}

impl DeviceProbe {
    /// Handles currently held open
    pub fn open_handles(&self) -> usize {
        self.open_handles.load(Ordering::SeqCst)
    }

    pub fn acquisitions(&self) -> usize {
        self.acquisitions.load(Ordering::SeqCst)
    }

    pub fn releases(&self) -> usize {
        self.releases.load(Ordering::SeqCst)
    }
}

/// Capture device that replays a fixed chunk sequence.
///
/// Every acquisition delivers the whole script up front and keeps the
/// stream open until `release`. Backs the CLI (WAV file input) and tests.
pub struct ReplayDevice {
    name: String,
    script: Vec<AudioFrame>,
    unavailable: Option<String>,
    sender: Option<mpsc::Sender<AudioFrame>>,
    probe: DeviceProbe,
}

impl ReplayDevice {
    pub fn new(script: Vec<AudioFrame>) -> Self {
        Self {
            name: "replay".to_string(),
            script,
            unavailable: None,
            sender: None,
            probe: DeviceProbe::default(),
        }
    }

    /// A device whose every acquisition is denied, like a refused mic prompt
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self {
            unavailable: Some(reason.into()),
            ..Self::new(Vec::new())
        }
    }

    /// Split a WAV file into chunks of `frame_duration_ms`
    pub fn from_wav_file(path: impl AsRef<Path>, frame_duration_ms: u64) -> Result<Self> {
        let path = path.as_ref();
        info!("Opening audio file: {}", path.display());

        let reader = WavReader::open(path).context("Failed to open WAV file")?;

        let spec = reader.spec();
        let samples: Vec<i16> = reader
            .into_samples::<i16>()
            .collect::<Result<Vec<_>, _>>()
            .context("Failed to read audio samples")?;

        let samples_per_frame = (spec.sample_rate as u64 * spec.channels as u64 * frame_duration_ms / 1000)
            .max(spec.channels as u64) as usize;

        let script: Vec<AudioFrame> = samples
            .chunks(samples_per_frame)
            .enumerate()
            .map(|(i, chunk)| AudioFrame {
                samples: chunk.to_vec(),
                sample_rate: spec.sample_rate,
                channels: spec.channels,
                timestamp_ms: i as u64 * frame_duration_ms,
            })
            .collect();

        info!(
            "Audio file loaded: {}Hz, {} channels, {} samples in {} chunks",
            spec.sample_rate,
            spec.channels,
            samples.len(),
            script.len()
        );

        Ok(Self {
            name: path.display().to_string(),
            ..Self::new(script)
        })
    }

    pub fn probe(&self) -> DeviceProbe {
        self.probe.clone()
    }
}

#[async_trait::async_trait]
impl AudioCaptureDevice for ReplayDevice {
    async fn acquire(&mut self) -> Result<mpsc::Receiver<AudioFrame>, ClientError> {
        if let Some(reason) = &self.unavailable {
            return Err(ClientError::DeviceUnavailable(reason.clone()));
        }
        if self.sender.is_some() {
            return Err(ClientError::DeviceUnavailable(format!(
                "{} is already in use",
                self.name
            )));
        }

        let (tx, rx) = mpsc::channel(self.script.len().max(100));
        for frame in &self.script {
            // Capacity covers the whole script
            let _ = tx.try_send(frame.clone());
        }
        self.sender = Some(tx);

        self.probe.open_handles.fetch_add(1, Ordering::SeqCst);
        self.probe.acquisitions.fetch_add(1, Ordering::SeqCst);

        Ok(rx)
    }

    fn release(&mut self) {
        if self.sender.take().is_some() {
            self.probe.open_handles.fetch_sub(1, Ordering::SeqCst);
            self.probe.releases.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn is_acquired(&self) -> bool {
        self.sender.is_some()
    }

    fn name(&self) -> &str {
        &self.name
    }
}
