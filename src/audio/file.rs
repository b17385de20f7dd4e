use hound::{SampleFormat, WavReader};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::backend::{AudioBackend, AudioBackendConfig, AudioFrame};
use crate::error::{Result, SessionError};

/// A WAV file decoded to mono f32 samples
pub struct AudioFile {
    pub path: String,
    pub duration_seconds: f64,
    pub sample_rate: u32,
    pub samples: Vec<f32>,
}

impl AudioFile {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        info!("Opening audio file: {}", path.display());

        let reader = WavReader::open(path)
            .map_err(|e| SessionError::Device(format!("cannot open {}: {e}", path.display())))?;

        let spec = reader.spec();
        let interleaved: Vec<f32> = match spec.sample_format {
            SampleFormat::Float => reader.into_samples::<f32>().collect::<std::result::Result<_, _>>()?,
            SampleFormat::Int => {
                let scale = (1i64 << (spec.bits_per_sample.max(1) - 1)) as f32;
                reader
                    .into_samples::<i32>()
                    .map(|s| s.map(|v| v as f32 / scale))
                    .collect::<std::result::Result<_, _>>()?
            }
        };

        let channels = spec.channels.max(1) as usize;
        let samples: Vec<f32> = if channels == 1 {
            interleaved
        } else {
            interleaved
                .chunks_exact(channels)
                .map(|frame| frame.iter().sum::<f32>() / channels as f32)
                .collect()
        };

        let duration_seconds = samples.len() as f64 / spec.sample_rate as f64;

        info!(
            "Audio file loaded: {:.1}s, {}Hz, {} channels, {} samples",
            duration_seconds,
            spec.sample_rate,
            spec.channels,
            samples.len()
        );

        Ok(Self {
            path: path.display().to_string(),
            duration_seconds,
            sample_rate: spec.sample_rate,
            samples,
        })
    }
}

/// Replays WAV files as if they were spoken into the microphone
///
/// Each `start()` replays the next file in fixed-size blocks at real-time
/// cadence; the list wraps around.
pub struct FileBackend {
    config: AudioBackendConfig,
    files: Vec<PathBuf>,
    next_file: usize,
    replay: Option<Replay>,
}

struct Replay {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl FileBackend {
    pub fn new(files: Vec<PathBuf>, config: AudioBackendConfig) -> Result<Self> {
        if files.is_empty() {
            return Err(SessionError::Device("no answer files configured".into()));
        }
        if let Some(missing) = files.iter().find(|p| !p.exists()) {
            return Err(SessionError::Device(format!("answer file not found: {}", missing.display())));
        }

        info!(
            "File backend initialized ({} files, {}Hz, {} samples per block)",
            files.len(),
            config.sample_rate,
            config.block_size
        );

        Ok(Self {
            config,
            files,
            next_file: 0,
            replay: None,
        })
    }
}

#[async_trait::async_trait]
impl AudioBackend for FileBackend {
    async fn start(&mut self) -> Result<mpsc::Receiver<AudioFrame>> {
        if self.replay.is_some() {
            return Err(SessionError::InvalidState("file backend already capturing".into()));
        }

        let path = self.files[self.next_file % self.files.len()].clone();
        self.next_file += 1;

        let file = AudioFile::open(&path)?;
        if file.sample_rate != self.config.sample_rate {
            warn!(
                "{} is {}Hz, replaying as {}Hz",
                file.path, file.sample_rate, self.config.sample_rate
            );
        }

        let (tx, rx) = mpsc::channel(64);
        let cancel = CancellationToken::new();
        let token = cancel.clone();
        let block_size = self.config.block_size.max(1);
        let sample_rate = self.config.sample_rate;
        let block_period = Duration::from_millis(self.config.block_duration_ms().max(1));

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(block_period);
            for (index, block) in file.samples.chunks(block_size).enumerate() {
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = ticker.tick() => {}
                }
                let frame = AudioFrame {
                    samples: block.to_vec(),
                    sample_rate,
                    timestamp_ms: index as u64 * block_period.as_millis() as u64,
                };
                if tx.send(frame).await.is_err() {
                    break;
                }
            }
            debug!("File replay finished: {}", file.path);
        });

        self.replay = Some(Replay { cancel, task });
        info!("Replaying {} as microphone input", path.display());

        Ok(rx)
    }

    async fn stop(&mut self) -> Result<()> {
        let Some(replay) = self.replay.take() else {
            return Ok(());
        };

        replay.cancel.cancel();
        if let Err(e) = replay.task.await {
            warn!("File replay task failed: {}", e);
        }

        info!("File backend stopped");
        Ok(())
    }

    fn is_capturing(&self) -> bool {
        self.replay.is_some()
    }

    fn name(&self) -> &str {
        "file replay"
    }
}
