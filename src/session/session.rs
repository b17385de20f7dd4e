use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{info, warn};

use super::bootstrap::Bootstrap;
use super::config::SessionConfig;
use super::events::{EventBus, SessionEvent};
use super::plan::Plan;
use super::state::{SessionHandle, SessionState, TranscriptEntry};
use super::stats::SessionStats;
use super::tasks::TaskRegistry;
use crate::analysis::{AlertPresenter, AnalysisScheduler, CheatAlert};
use crate::api::InterviewApi;
use crate::audio::{AudioBackend, AudioCaptureEncoder, AudioSink};
use crate::config::{AnalysisConfig, VideoConfig};
use crate::conversation::ConversationOrchestrator;
use crate::error::{Result, SessionError};
use crate::speech::SpeechPlaybackController;
use crate::video::{FaceDetector, VideoFrameSampler, VideoSource};

/// Devices and the backend a session runs against
pub struct SessionParts {
    pub api: Arc<dyn InterviewApi>,
    pub microphone: Box<dyn AudioBackend>,
    pub camera: Arc<dyn VideoSource>,
    pub face_detector: Option<Arc<dyn FaceDetector>>,
    pub speaker: Arc<dyn AudioSink>,
}

/// Loop timings of the video and analysis pipeline
#[derive(Debug, Clone, Default)]
pub struct PipelineConfig {
    pub video: VideoConfig,
    pub analysis: AnalysisConfig,
}

/// One live interview: the shared state plus every loop running against it
pub struct InterviewSession {
    config: SessionConfig,
    state: SessionHandle,
    events: EventBus,
    tasks: Arc<TaskRegistry>,
    alerts: Arc<AlertPresenter>,
    orchestrator: ConversationOrchestrator,
    started_at: DateTime<Utc>,
    ended: AtomicBool,
}

impl InterviewSession {
    /// Start the sampler and scheduler loops and speak the opening line
    ///
    /// Fails with `Device` when the camera is unavailable.
    pub fn start(
        config: SessionConfig,
        pipeline: PipelineConfig,
        bootstrap: Bootstrap,
        parts: SessionParts,
    ) -> Result<Self> {
        if !parts.camera.is_available() {
            return Err(SessionError::Device(format!("camera {} is not available", parts.camera.name())));
        }

        info!(
            "Starting interview session {} ({}, {}, difficulty {}, voice {})",
            config.session_id, config.scenario, config.language, config.difficulty, config.voice
        );

        let mut initial = SessionState::new(config.clone(), pipeline.video.ring_capacity);
        initial.resume_text = bootstrap.resume_text;
        initial.plan = bootstrap.plan;
        let state = SessionHandle::new(initial);

        let events = EventBus::default();
        let tasks = Arc::new(TaskRegistry::new());
        let alerts = Arc::new(AlertPresenter::new(events.clone(), pipeline.analysis.alert_display()));

        let sampler = VideoFrameSampler::new(
            state.clone(),
            parts.camera,
            parts.face_detector,
            events.clone(),
            &pipeline.video,
        );
        let tick = pipeline.video.tick_interval();
        tasks.spawn("frame-sampler", move |cancel| sampler.run(tick, cancel));

        let scheduler = Arc::new(AnalysisScheduler::new(
            state.clone(),
            Arc::clone(&parts.api),
            events.clone(),
            Arc::clone(&alerts),
            pipeline.analysis.batch_size,
        ));
        let interval = pipeline.analysis.interval();
        tasks.spawn("analysis-scheduler", move |cancel| scheduler.run(interval, cancel));

        let capture = AudioCaptureEncoder::new(state.clone(), parts.microphone, config.sample_rate);
        let playback = Arc::new(SpeechPlaybackController::new(
            Arc::clone(&parts.api),
            parts.speaker,
            config.voice,
            events.clone(),
        ));
        let orchestrator = ConversationOrchestrator::new(
            state.clone(),
            parts.api,
            capture,
            playback,
            events.clone(),
            Arc::clone(&tasks),
        );

        if bootstrap.opening_line.trim().is_empty() {
            warn!("No opening line, waiting for the user to speak first");
        } else {
            orchestrator.open(&bootstrap.opening_line);
        }

        Ok(Self {
            config,
            state,
            events,
            tasks,
            alerts,
            orchestrator,
            started_at: Utc::now(),
            ended: AtomicBool::new(false),
        })
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn state(&self) -> &SessionHandle {
        &self.state
    }

    pub fn orchestrator(&self) -> &ConversationOrchestrator {
        &self.orchestrator
    }

    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    pub fn transcript(&self) -> Vec<TranscriptEntry> {
        self.state.read(|s| s.transcript.clone())
    }

    pub fn plan(&self) -> Option<Plan> {
        self.state.read(|s| s.plan.clone())
    }

    pub fn current_alert(&self) -> Option<CheatAlert> {
        self.alerts.current()
    }

    pub fn is_ended(&self) -> bool {
        self.ended.load(Ordering::SeqCst)
    }

    pub fn stats(&self) -> SessionStats {
        let duration = Utc::now().signed_duration_since(self.started_at);
        let active_tasks = self.tasks.active();

        self.state.read(|s| SessionStats {
            session_id: s.config.session_id.clone(),
            scenario: s.config.scenario.clone(),
            language: s.config.language.clone(),
            difficulty: s.config.difficulty,
            voice: s.config.voice,
            phase: s.phase,
            is_recording: s.is_recording,
            started_at: self.started_at,
            duration_secs: duration.num_milliseconds() as f64 / 1000.0,
            turns: s.turn,
            transcript_entries: s.transcript.len(),
            frames_buffered: s.frames.len(),
            metrics: s.metrics,
            cheat_alert_count: s.cheat_alert_count,
            plan_items: s.plan.as_ref().map_or(0, |p| p.items().count()),
            plan_completed: s.plan.as_ref().map_or(0, Plan::completed_count),
            final_result: s.final_result.clone(),
            active_tasks,
        })
    }

    /// Tear down every loop, device and timer; later calls only report stats
    pub async fn end(&self) -> SessionStats {
        if self.ended.swap(true, Ordering::SeqCst) {
            warn!("Session {} already ended", self.config.session_id);
            return self.stats();
        }

        info!("Ending interview session {}", self.config.session_id);

        self.tasks.shutdown().await;
        self.orchestrator.shutdown().await;
        self.alerts.clear();

        let stats = self.stats();
        info!(
            "Session ended after {:.1}s: {} turns, {} alerts",
            stats.duration_secs, stats.turns, stats.cheat_alert_count
        );
        stats
    }
}
