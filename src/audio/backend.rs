use tokio::sync::mpsc;

use crate::error::ClientError;

/// One chunk of captured audio (16-bit PCM, interleaved)
#[derive(Debug, Clone, PartialEq)]
pub struct AudioFrame {
    /// Raw audio samples (i16 PCM, interleaved)
    pub samples: Vec<i16>,
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Number of channels
    pub channels: u16,
    /// Timestamp in milliseconds since capture started
    pub timestamp_ms: u64,
}

/// Capture format used when a recording produced no chunks to take it from
#[derive(Debug, Clone)]
pub struct CaptureConfig {
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Channel count (1 = mono, 2 = stereo)
    pub channels: u16,
    /// Duration of each chunk in milliseconds
    pub frame_duration_ms: u64,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            sample_rate: 16000,     // 16kHz for speech transcription
            channels: 1,            // Mono
            frame_duration_ms: 100, // 100ms chunks
        }
    }
}

/// Exclusive handle to an audio input device.
///
/// `acquire` opens the device and returns the chunk stream (push-only, in
/// arrival order). `release` must stop every underlying track and close the
/// stream; it is synchronous so it can run from `Drop`.
#[async_trait::async_trait]
pub trait AudioCaptureDevice: Send {
    /// Open the device and start delivering chunks
    async fn acquire(&mut self) -> Result<mpsc::Receiver<AudioFrame>, ClientError>;

    /// Stop every track and close the chunk stream
    fn release(&mut self);

    /// Whether the device is currently held open
    fn is_acquired(&self) -> bool;

    /// Device name for logging
    fn name(&self) -> &str;
}
