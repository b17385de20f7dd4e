use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::backend::{AudioBackend, AudioFrame};
use super::wav::Utterance;
use crate::error::{Result, SessionError};
use crate::session::SessionHandle;

/// Records one utterance at a time from the session's microphone
///
/// Blocks arrive from the backend's queue and are appended to the session's
/// `audio_chunks` in arrival order. The collector task is the only writer of
/// that buffer while recording.
pub struct AudioCaptureEncoder {
    state: SessionHandle,
    backend: Box<dyn AudioBackend>,
    sample_rate: u32,
    collector: Option<JoinHandle<usize>>,
}

impl AudioCaptureEncoder {
    pub fn new(state: SessionHandle, backend: Box<dyn AudioBackend>, sample_rate: u32) -> Self {
        info!("Audio capture initialized: {} ({}Hz mono)", backend.name(), sample_rate);

        Self {
            state,
            backend,
            sample_rate,
            collector: None,
        }
    }

    pub fn is_recording(&self) -> bool {
        self.collector.is_some()
    }

    /// Open the capture path and start buffering blocks
    pub async fn start(&mut self) -> Result<()> {
        if self.collector.is_some() {
            return Err(SessionError::InvalidState("capture already recording".into()));
        }

        let audio_rx = self.backend.start().await.map_err(|e| match e {
            SessionError::Device(_) => e,
            other => SessionError::Device(format!("{} failed to start: {other}", self.backend.name())),
        })?;

        self.state.update(|s| {
            s.audio_chunks.clear();
            s.is_recording = true;
        });

        self.collector = Some(tokio::spawn(collect_blocks(self.state.clone(), audio_rx)));

        info!("Recording started");
        Ok(())
    }

    /// Release the device, drain queued blocks and hand back the utterance
    ///
    /// Returns `None` when nothing was recording.
    pub async fn stop(&mut self) -> Result<Option<Utterance>> {
        let Some(collector) = self.collector.take() else {
            debug!("Stop requested while idle");
            return Ok(None);
        };

        // Stopping the backend drops its sender; the collector then drains
        // whatever is still queued and exits.
        if let Err(e) = self.backend.stop().await {
            warn!("Audio backend {} failed to stop cleanly: {}", self.backend.name(), e);
        }

        let blocks = match collector.await {
            Ok(n) => n,
            Err(e) => {
                warn!("Audio collector failed: {}", e);
                0
            }
        };

        let chunks = self.state.update(|s| {
            s.is_recording = false;
            std::mem::take(&mut s.audio_chunks)
        });

        let utterance = Utterance::from_chunks(chunks, self.sample_rate);
        info!(
            "Recording stopped: {} blocks, {} samples ({:.1}s)",
            blocks,
            utterance.len(),
            utterance.duration_secs()
        );

        Ok(Some(utterance))
    }
}

async fn collect_blocks(state: SessionHandle, mut audio_rx: mpsc::Receiver<AudioFrame>) -> usize {
    let mut blocks = 0;
    while let Some(frame) = audio_rx.recv().await {
        state.update(|s| s.audio_chunks.push(frame.samples));
        blocks += 1;
    }
    blocks
}
