use std::path::PathBuf;
use tokio::sync::mpsc;

use super::file::FileBackend;
use crate::error::{Result, SessionError};

/// One block of captured microphone samples (mono, f32 in [-1.0, 1.0])
#[derive(Debug, Clone)]
pub struct AudioFrame {
    pub samples: Vec<f32>,
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Timestamp in milliseconds since capture started
    pub timestamp_ms: u64,
}

/// Configuration for audio backend
#[derive(Debug, Clone)]
pub struct AudioBackendConfig {
    /// Capture sample rate
    pub sample_rate: u32,
    /// Samples delivered per block (the hardware callback cadence)
    pub block_size: usize,
}

impl Default for AudioBackendConfig {
    fn default() -> Self {
        Self {
            sample_rate: 16000, // 16kHz mono for speech recognition
            block_size: 4096,
        }
    }
}

impl AudioBackendConfig {
    /// Wall-clock duration of one block
    pub fn block_duration_ms(&self) -> u64 {
        (self.block_size as u64 * 1000) / self.sample_rate.max(1) as u64
    }
}

/// Audio capture backend trait
///
/// Implementations own the microphone handle. `start` hands out the receiving
/// end of the block queue; `stop` releases the device and drops the sender so
/// the consumer can drain whatever is still queued.
#[async_trait::async_trait]
pub trait AudioBackend: Send + Sync {
    /// Start capturing audio
    async fn start(&mut self) -> Result<mpsc::Receiver<AudioFrame>>;

    /// Stop capturing audio
    async fn stop(&mut self) -> Result<()>;

    /// Check if backend is currently capturing
    fn is_capturing(&self) -> bool;

    /// Get backend name for logging
    fn name(&self) -> &str;
}

/// Audio backend factory
pub struct AudioBackendFactory;

impl AudioBackendFactory {
    /// Create audio backend for the given source
    pub fn create(source: AudioSource, config: AudioBackendConfig) -> Result<Box<dyn AudioBackend>> {
        match source {
            AudioSource::Microphone => Err(SessionError::Device(
                "no live microphone driver is available in this build; use a file source".into(),
            )),
            AudioSource::Files(paths) => Ok(Box::new(FileBackend::new(paths, config)?)),
        }
    }
}

/// Audio source type
#[derive(Debug, Clone)]
pub enum AudioSource {
    /// Live microphone input
    Microphone,
    /// Pre-recorded answers, one WAV file per recording (cycled)
    Files(Vec<PathBuf>),
}
