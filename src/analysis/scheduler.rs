use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::alerts::{AlertPresenter, CheatAlert};
use super::metrics::Metrics;
use crate::api::{InterviewApi, VideoAnalysisRequest};
use crate::session::{EventBus, SessionEvent, SessionHandle};

/// Periodic batch upload of sampled frames to the analysis service
pub struct AnalysisScheduler {
    state: SessionHandle,
    api: Arc<dyn InterviewApi>,
    events: EventBus,
    alerts: Arc<AlertPresenter>,
    batch_size: usize,
    /// Cancelled when the run loop exits; in-flight sends drop their response
    stopped: CancellationToken,
}

impl AnalysisScheduler {
    pub fn new(
        state: SessionHandle,
        api: Arc<dyn InterviewApi>,
        events: EventBus,
        alerts: Arc<AlertPresenter>,
        batch_size: usize,
    ) -> Self {
        Self {
            state,
            api,
            events,
            alerts,
            batch_size: batch_size.max(1),
            stopped: CancellationToken::new(),
        }
    }

    /// Drain the ring and send the batch; `None` when there was nothing to send
    ///
    /// The drain and the clear happen in one critical section, so a frame
    /// sampled concurrently lands either in this batch or in the next one.
    /// The request itself is not awaited.
    pub fn tick(&self) -> Option<JoinHandle<()>> {
        if self.stopped.is_cancelled() {
            return None;
        }

        let request = self.state.update(|s| {
            if s.frames.is_empty() {
                return None;
            }
            Some(VideoAnalysisRequest {
                images: s.frames.drain_latest(self.batch_size),
                current_topic: s.config.scenario.clone(),
                language: s.config.language.clone(),
            })
        })?;

        debug!("Analysis tick: sending {} frames", request.images.len());

        let state = self.state.clone();
        let api = Arc::clone(&self.api);
        let events = self.events.clone();
        let alerts = Arc::clone(&self.alerts);
        let stopped = self.stopped.clone();

        Some(tokio::spawn(async move {
            let result = tokio::select! {
                biased;
                _ = stopped.cancelled() => return,
                result = api.analyze_video(request) => result,
            };
            let response = match result {
                Ok(response) => response,
                Err(e) => {
                    debug!("Video analysis failed: {}", e);
                    return;
                }
            };
            if stopped.is_cancelled() {
                return;
            }

            if let Some(scores) = &response.metrics {
                let metrics = Metrics::from_scores(scores);
                state.update(|s| s.metrics = metrics);
                events.publish(SessionEvent::MetricsUpdated(metrics));
            }

            if let Some(alert) = response.alert.as_ref().and_then(CheatAlert::from_payload) {
                if alerts.raise(alert) {
                    let count = state.update(|s| {
                        s.cheat_alert_count += 1;
                        s.cheat_alert_count
                    });
                    debug!("Integrity alerts this session: {}", count);
                }
            }
        }))
    }

    /// Tick every `interval` until cancelled; the first tick fires after one interval
    pub async fn run(self: Arc<Self>, interval: Duration, cancel: CancellationToken) {
        let period = interval.max(Duration::from_millis(1));
        let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!("Analysis scheduler started: every {}ms, {} frames per batch", period.as_millis(), self.batch_size);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {
                    self.tick();
                }
            }
        }

        self.stopped.cancel();
        info!("Analysis scheduler stopped");
    }
}
