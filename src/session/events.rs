//! Observer notifications.
//!
//! The pipeline publishes what happened; nothing in the pipeline waits for or
//! depends on a subscriber. Slow subscribers lag and lose old events.

use serde::Serialize;
use tokio::sync::broadcast;

use super::plan::{ItemChange, Plan};
use super::state::TranscriptEntry;
use crate::analysis::{CheatAlert, Metrics};
use crate::api::FinalResult;
use crate::conversation::TurnPhase;
use crate::speech::PlaybackOutcome;
use crate::video::FaceBox;

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum SessionEvent {
    PhaseChanged(TurnPhase),
    FaceTracked(FaceBox),
    FrameSampled { buffered: usize },
    MetricsUpdated(Metrics),
    AlertRaised(CheatAlert),
    AlertDismissed,
    TranscriptAppended(TranscriptEntry),
    QuestionChanged(String),
    PlanUpdated { plan: Plan, changes: Vec<(String, ItemChange)> },
    InterviewComplete(Option<FinalResult>),
    TurnFailed(String),
    PlaybackStarted,
    PlaybackFinished(PlaybackOutcome),
}

/// Broadcast channel for `SessionEvent`s
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<SessionEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Fire-and-forget; having no subscribers is not an error
    pub fn publish(&self, event: SessionEvent) {
        let _ = self.tx.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.tx.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}
