//! Integrity alerts raised by video analysis, with single-slot auto-dismiss.

use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::session::{EventBus, SessionEvent};

pub const FALLBACK_ALERT_MESSAGE: &str = "Please adjust your camera or lighting.";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertLevel {
    #[default]
    None,
    Warning,
    Critical,
}

/// Alert block of an analysis response
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AlertPayload {
    #[serde(default)]
    pub level: AlertLevel,
    #[serde(default)]
    pub message_cn: Option<String>,
    #[serde(default)]
    pub message_en: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheatAlert {
    pub level: AlertLevel,
    pub message: String,
}

impl CheatAlert {
    /// `None` when the service reported nothing worth showing
    pub fn from_payload(payload: &AlertPayload) -> Option<Self> {
        if payload.level == AlertLevel::None {
            return None;
        }

        let message = [&payload.message_cn, &payload.message_en]
            .into_iter()
            .flatten()
            .find(|m| !m.trim().is_empty())
            .cloned()
            .unwrap_or_else(|| FALLBACK_ALERT_MESSAGE.to_string());

        Some(Self {
            level: payload.level,
            message,
        })
    }

    pub fn is_critical(&self) -> bool {
        self.level == AlertLevel::Critical
    }
}

#[derive(Default)]
struct AlertSlot {
    generation: u64,
    current: Option<CheatAlert>,
    dismiss: Option<JoinHandle<()>>,
    closed: bool,
}

/// Shows at most one alert; only the newest alert's dismiss timer counts
pub struct AlertPresenter {
    events: EventBus,
    display_for: Duration,
    slot: Mutex<AlertSlot>,
}

impl AlertPresenter {
    pub fn new(events: EventBus, display_for: Duration) -> Self {
        Self {
            events,
            display_for,
            slot: Mutex::new(AlertSlot::default()),
        }
    }

    /// Display `alert`, replacing whatever is shown and re-arming the dismiss timer
    ///
    /// Returns `false` once the presenter has been cleared.
    pub fn raise(self: &Arc<Self>, alert: CheatAlert) -> bool {
        let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        if slot.closed {
            debug!("Alert presenter closed, ignoring {:?} alert", alert.level);
            return false;
        }
        slot.generation += 1;
        let generation = slot.generation;

        if let Some(previous) = slot.dismiss.take() {
            previous.abort();
        }

        info!(level = ?alert.level, "Integrity alert: {}", alert.message);
        slot.current = Some(alert.clone());
        self.events.publish(SessionEvent::AlertRaised(alert));

        let presenter = Arc::clone(self);
        slot.dismiss = Some(tokio::spawn(async move {
            tokio::time::sleep(presenter.display_for).await;
            presenter.dismiss_if_current(generation);
        }));
        true
    }

    fn dismiss_if_current(&self, generation: u64) {
        let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        if slot.generation != generation {
            debug!("Stale alert timer ignored");
            return;
        }
        slot.current = None;
        slot.dismiss = None;
        drop(slot);
        self.events.publish(SessionEvent::AlertDismissed);
    }

    pub fn current(&self) -> Option<CheatAlert> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner).current.clone()
    }

    /// Drop the visible alert and its timer and accept no new alerts (session teardown)
    pub fn clear(&self) {
        let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        slot.closed = true;
        slot.generation += 1;
        slot.current = None;
        if let Some(timer) = slot.dismiss.take() {
            timer.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_preference() {
        let both = AlertPayload {
            level: AlertLevel::Warning,
            message_cn: Some("请看镜头".into()),
            message_en: Some("Look at the camera".into()),
        };
        assert_eq!(CheatAlert::from_payload(&both).unwrap().message, "请看镜头");

        let english = AlertPayload {
            level: AlertLevel::Critical,
            message_cn: None,
            message_en: Some("Second person detected".into()),
        };
        let alert = CheatAlert::from_payload(&english).unwrap();
        assert_eq!(alert.message, "Second person detected");
        assert!(alert.is_critical());

        let bare = AlertPayload {
            level: AlertLevel::Warning,
            ..AlertPayload::default()
        };
        assert_eq!(CheatAlert::from_payload(&bare).unwrap().message, FALLBACK_ALERT_MESSAGE);
    }

    #[test]
    fn test_level_none_is_not_an_alert() {
        assert!(CheatAlert::from_payload(&AlertPayload::default()).is_none());
    }
}
