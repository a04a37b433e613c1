use std::io::Cursor;
use tracing::{info, warn};

use super::backend::{AudioFrame, CaptureConfig};
use crate::error::ClientError;

/// Media type every artifact is tagged with
pub const WAV_MEDIA_TYPE: &str = "audio/wav";

/// File name the artifact is uploaded under
pub const ARTIFACT_FILE_NAME: &str = "recording.wav";

/// Finalized recording, assembled from the chunk sequence at stop time.
///
/// Immutable once built. Ownership moves into the transcription upload.
#[derive(Debug, Clone)]
pub struct AudioArtifact {
    bytes: Vec<u8>,
    sample_rate: u32,
    channels: u16,
    sample_count: usize,
}

impl AudioArtifact {
    /// Encode chunks, in order, into one in-memory WAV file.
    ///
    /// The format is taken from the first chunk; `fallback` applies only
    /// when no chunk arrived.
    pub fn from_frames(frames: &[AudioFrame], fallback: &CaptureConfig) -> Result<Self, ClientError> {
        let (sample_rate, channels) = frames
            .first()
            .map(|f| (f.sample_rate, f.channels))
            .unwrap_or((fallback.sample_rate, fallback.channels));

        let spec = hound::WavSpec {
            channels,
            sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };

        let mut cursor = Cursor::new(Vec::new());
        let mut sample_count = 0;
        {
            let mut writer = hound::WavWriter::new(&mut cursor, spec)?;
            for frame in frames {
                if frame.sample_rate != sample_rate || frame.channels != channels {
                    warn!(
                        "Chunk at {}ms has format {}Hz/{}ch, expected {}Hz/{}ch",
                        frame.timestamp_ms, frame.sample_rate, frame.channels, sample_rate, channels
                    );
                }
                for &sample in &frame.samples {
                    writer.write_sample(sample)?;
                }
                sample_count += frame.samples.len();
            }
            writer.finalize()?;
        }

        let artifact = Self {
            bytes: cursor.into_inner(),
            sample_rate,
            channels,
            sample_count,
        };

        info!(
            "Audio artifact assembled: {} chunks, {:.1}s, {} bytes",
            frames.len(),
            artifact.duration_seconds(),
            artifact.bytes.len()
        );

        Ok(artifact)
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    pub fn media_type(&self) -> &'static str {
        WAV_MEDIA_TYPE
    }

    pub fn file_name(&self) -> &'static str {
        ARTIFACT_FILE_NAME
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }

    pub fn sample_count(&self) -> usize {
        self.sample_count
    }

    pub fn duration_seconds(&self) -> f64 {
        self.sample_count as f64 / (self.sample_rate as f64 * self.channels as f64)
    }
}
