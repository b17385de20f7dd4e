use std::sync::{Arc, Mutex, PoisonError};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::voice::Voice;
use crate::api::{InterviewApi, SpeechRequest};
use crate::audio::{decode_audio, AudioSink, PlaybackOutcome};
use crate::session::{EventBus, SessionEvent};

#[derive(Default)]
struct PlaybackSlot {
    /// Bumped by every `play` and `stop`; a task whose generation no longer
    /// matches has been superseded and must not touch the sink.
    generation: u64,
    active: Option<CancellationToken>,
    /// Set at session teardown; no playback starts afterwards
    closed: bool,
}

/// Sole owner of AI speech output: at most one playback at a time
pub struct SpeechPlaybackController {
    api: Arc<dyn InterviewApi>,
    sink: Arc<dyn AudioSink>,
    voice: Voice,
    events: EventBus,
    slot: Mutex<PlaybackSlot>,
}

impl SpeechPlaybackController {
    pub fn new(api: Arc<dyn InterviewApi>, sink: Arc<dyn AudioSink>, voice: Voice, events: EventBus) -> Self {
        info!("Speech playback via {} (voice: {})", sink.name(), voice);

        Self {
            api,
            sink,
            voice,
            events,
            slot: Mutex::new(PlaybackSlot::default()),
        }
    }

    pub fn is_playing(&self) -> bool {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner).active.is_some()
    }

    /// Synthesize and speak `text`, replacing any current playback
    ///
    /// The returned task resolves when playback ends. Synthesis or decode
    /// failures are logged and resolve as `Skipped`.
    pub fn play(self: &Arc<Self>, text: &str) -> JoinHandle<PlaybackOutcome> {
        let (generation, cancel) = {
            let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
            if slot.closed {
                debug!("Playback closed, not speaking");
                return tokio::spawn(async { PlaybackOutcome::Skipped });
            }
            if let Some(previous) = slot.active.take() {
                previous.cancel();
            }
            slot.generation += 1;
            let cancel = CancellationToken::new();
            slot.active = Some(cancel.clone());
            (slot.generation, cancel)
        };

        let controller = Arc::clone(self);
        let request = SpeechRequest {
            text: text.to_string(),
            voice: self.voice,
        };

        tokio::spawn(async move {
            let outcome = controller.run(generation, request, cancel).await;
            controller.finish(generation);
            controller.events.publish(SessionEvent::PlaybackFinished(outcome));
            outcome
        })
    }

    /// Stop the current playback; a no-op when nothing is playing
    pub fn stop(&self) {
        let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        slot.generation += 1;
        if let Some(active) = slot.active.take() {
            active.cancel();
            info!("Speech playback stopped");
        }
    }

    /// Stop the current playback and refuse every later `play`
    pub fn close(&self) {
        let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        slot.closed = true;
        slot.generation += 1;
        if let Some(active) = slot.active.take() {
            active.cancel();
        }
        info!("Speech playback closed");
    }

    pub fn is_closed(&self) -> bool {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner).closed
    }

    fn is_current(&self, generation: u64) -> bool {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner).generation == generation
    }

    fn finish(&self, generation: u64) {
        let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        if slot.generation == generation {
            slot.active = None;
        }
    }

    async fn run(&self, generation: u64, request: SpeechRequest, cancel: CancellationToken) -> PlaybackOutcome {
        let payload = match self.api.synthesize(request).await {
            Ok(payload) => payload,
            Err(e) => {
                warn!("Speech synthesis failed: {}", e);
                return PlaybackOutcome::Skipped;
            }
        };

        // The request may outlive a stop() or a newer play().
        if !self.is_current(generation) {
            debug!("Discarding stale synthesis result (generation {})", generation);
            return PlaybackOutcome::Skipped;
        }

        if payload.is_empty() {
            warn!("Speech synthesis returned an empty payload");
            return PlaybackOutcome::Skipped;
        }

        let audio = match decode_audio(&payload) {
            Ok(audio) if !audio.is_empty() => audio,
            Ok(_) => {
                warn!("Synthesized audio decoded to zero samples");
                return PlaybackOutcome::Skipped;
            }
            Err(e) => {
                warn!("Synthesized audio could not be decoded: {}", e);
                return PlaybackOutcome::Skipped;
            }
        };

        if cancel.is_cancelled() || !self.is_current(generation) {
            return PlaybackOutcome::Skipped;
        }

        self.events.publish(SessionEvent::PlaybackStarted);
        match self.sink.play(audio, cancel).await {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!("Audio sink {} failed: {}", self.sink.name(), e);
                PlaybackOutcome::Skipped
            }
        }
    }
}
