use anyhow::{Context, Result};
use serde::Deserialize;
use std::time::Duration;

use crate::speech::Voice;

#[derive(Debug, Deserialize)]
pub struct Config {
    pub service: ServiceConfig,
    pub backend: BackendConfig,
    #[serde(default)]
    pub session: SessionDefaults,
    #[serde(default)]
    pub audio: AudioConfig,
    #[serde(default)]
    pub video: VideoConfig,
    #[serde(default)]
    pub analysis: AnalysisConfig,
}

#[derive(Debug, Deserialize)]
pub struct ServiceConfig {
    pub name: String,
    pub http: HttpConfig,
}

#[derive(Debug, Deserialize)]
pub struct HttpConfig {
    pub bind: String,
    pub port: u16,
}

#[derive(Debug, Deserialize)]
pub struct BackendConfig {
    /// Base URL of the interview backend (e.g. "http://127.0.0.1:8000")
    pub base_url: String,
}

/// Per-session defaults, overridable from the command line
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SessionDefaults {
    pub scenario: String,
    pub language: String,
    pub difficulty: u8,
    /// Fixed TTS voice; a random one is picked when absent
    pub voice: Option<Voice>,
}

impl Default for SessionDefaults {
    fn default() -> Self {
        Self {
            scenario: "tech_backend".to_string(),
            language: "zh-CN".to_string(),
            difficulty: 5,
            voice: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    pub sample_rate: u32,
    /// Samples per captured block
    pub block_size: usize,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            sample_rate: 16000,
            block_size: 4096,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct VideoConfig {
    /// Rendering tick driving face tracking and frame sampling
    pub tick_interval_ms: u64,
    pub sampling_interval_ms: u64,
    /// Long-edge size of sampled frames in pixels
    pub max_dimension: u32,
    pub jpeg_quality: u8,
    pub ring_capacity: usize,
}

impl Default for VideoConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 16,
            sampling_interval_ms: 1000,
            max_dimension: 320,
            jpeg_quality: 60,
            ring_capacity: 10,
        }
    }
}

impl VideoConfig {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    pub fn sampling_interval(&self) -> Duration {
        Duration::from_millis(self.sampling_interval_ms)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub interval_ms: u64,
    /// Frames sent per analysis request
    pub batch_size: usize,
    pub alert_display_ms: u64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            interval_ms: 5000,
            batch_size: 5,
            alert_display_ms: 5000,
        }
    }
}

impl AnalysisConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    pub fn alert_display(&self) -> Duration {
        Duration::from_millis(self.alert_display_ms)
    }
}

impl Config {
    /// Load configuration from a file (extension optional) with `INTERVIEW__*` overrides
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path))
            .add_source(config::Environment::with_prefix("INTERVIEW").separator("__"))
            .build()
            .with_context(|| format!("Failed to read config from {}", path))?;

        settings
            .try_deserialize()
            .context("Failed to parse configuration")
    }
}
