use serde::Serialize;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::info;

use super::decode::DecodedAudio;
use super::wav::encode_wav;
use crate::error::Result;

/// How a playback ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaybackOutcome {
    /// Played to the end
    Completed,
    /// Stopped by the caller (e.g. the user started speaking)
    Interrupted,
    /// Nothing was played (synthesis failed, empty or stale result)
    Skipped,
}

/// Output device for synthesized speech
///
/// `play` must return promptly with `Interrupted` once `cancel` fires.
#[async_trait::async_trait]
pub trait AudioSink: Send + Sync {
    async fn play(&self, audio: DecodedAudio, cancel: CancellationToken) -> Result<PlaybackOutcome>;

    fn name(&self) -> &str;
}

/// Headless sink: writes each utterance to a WAV file and stays "playing"
/// for the audio's real duration
pub struct FileSink {
    output_dir: PathBuf,
    counter: AtomicUsize,
}

impl FileSink {
    pub fn new(output_dir: impl Into<PathBuf>) -> Result<Self> {
        let output_dir = output_dir.into();
        std::fs::create_dir_all(&output_dir)?;

        info!("Speech output written to {}", output_dir.display());

        Ok(Self {
            output_dir,
            counter: AtomicUsize::new(0),
        })
    }
}

#[async_trait::async_trait]
impl AudioSink for FileSink {
    async fn play(&self, audio: DecodedAudio, cancel: CancellationToken) -> Result<PlaybackOutcome> {
        if cancel.is_cancelled() {
            return Ok(PlaybackOutcome::Interrupted);
        }

        let index = self.counter.fetch_add(1, Ordering::SeqCst);
        let path = self.output_dir.join(format!("ai-turn-{:03}.wav", index));
        let duration = Duration::from_secs_f64(audio.duration_secs());

        let wav = encode_wav(&audio.samples, audio.sample_rate)?;
        tokio::fs::write(&path, wav).await?;
        info!("Speaking {:.1}s -> {}", duration.as_secs_f64(), path.display());

        tokio::select! {
            _ = cancel.cancelled() => Ok(PlaybackOutcome::Interrupted),
            _ = tokio::time::sleep(duration) => Ok(PlaybackOutcome::Completed),
        }
    }

    fn name(&self) -> &str {
        "wav file"
    }
}
