use anyhow::{bail, Result};
use serde::Deserialize;
use std::time::Duration;

use crate::audio::CaptureConfig;
use crate::transcription::Ingestion;

/// Prefix for environment overrides, e.g. `VOICE_CLIENT_API__BASE_URL`
const ENV_PREFIX: &str = "VOICE_CLIENT";

/// Floor for the persona poll period; a zero period would stall the ticker
const MIN_POLL_INTERVAL: Duration = Duration::from_millis(10);

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub service: ServiceConfig,
    pub api: ApiConfig,
    pub audio: AudioConfig,
    pub persona: PersonaConfig,
    pub session: SessionConfig,
    pub voice: VoiceConfig,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub name: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: "voice-client".to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    /// Unset: requests may wait indefinitely
    pub request_timeout_secs: Option<u64>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            request_timeout_secs: None,
        }
    }
}

impl ApiConfig {
    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    pub sample_rate: u32,
    pub channels: u16,
    pub frame_duration_ms: u64,
}

impl Default for AudioConfig {
    fn default() -> Self {
        let capture = CaptureConfig::default();
        Self {
            sample_rate: capture.sample_rate,
            channels: capture.channels,
            frame_duration_ms: capture.frame_duration_ms,
        }
    }
}

impl AudioConfig {
    pub fn capture(&self) -> CaptureConfig {
        CaptureConfig {
            sample_rate: self.sample_rate,
            channels: self.channels,
            frame_duration_ms: self.frame_duration_ms,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PersonaConfig {
    pub poll_interval_ms: u64,
    /// How long a Saved/Error status stays visible
    pub status_reset_ms: u64,
}

impl Default for PersonaConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 5000,
            status_reset_ms: 2000,
        }
    }
}

impl PersonaConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms).max(MIN_POLL_INTERVAL)
    }

    pub fn status_reset_delay(&self) -> Duration {
        Duration::from_millis(self.status_reset_ms)
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Transcript reference sent with the end-of-session notification
    pub transcript_path: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            transcript_path: "./chat_data.json".to_string(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct VoiceConfig {
    pub forward_to: Ingestion,
}

impl Config {
    /// Load `path` (any extension the config crate knows, optional) with
    /// environment overrides on top
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?;

        let config: Config = settings.try_deserialize()?;
        if config.persona.poll_interval_ms == 0 {
            bail!("persona.poll_interval_ms must be greater than zero");
        }

        Ok(config)
    }
}
