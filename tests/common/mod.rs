// Shared fakes for integration tests
//
// Scripted stand-ins for the backend, the microphone, the camera and the
// speaker, so the pipeline can run without devices or a network.

#![allow(dead_code)]

use bytes::Bytes;
use image::RgbImage;
use interview_room::api::{
    ChatRequest, ChatResponse, ContextAnalysis, ContextMaterial, InterviewApi, OpeningResponse,
    PlanStatus, SpeechRequest, VideoAnalysisRequest, VideoAnalysisResponse,
};
use interview_room::audio::{AudioBackend, AudioFrame, AudioSink, DecodedAudio, PlaybackOutcome};
use interview_room::error::{Result, SessionError};
use interview_room::session::Plan;
use interview_room::video::VideoSource;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{mpsc, Semaphore};
use tokio_util::sync::CancellationToken;

/// A request to `/api/chat` as the fake saw it
#[derive(Debug, Clone)]
pub struct SeenChat {
    pub audio_len: usize,
    pub history_len: usize,
    pub had_plan: bool,
    pub difficulty: u8,
}

/// Scripted interview backend
#[derive(Default)]
pub struct FakeApi {
    pub video_requests: Mutex<Vec<VideoAnalysisRequest>>,
    pub video_response: Mutex<Option<VideoAnalysisResponse>>,
    /// When set, every analysis request waits for a permit before answering
    pub video_gate: Mutex<Option<Arc<Semaphore>>>,

    pub chat_requests: Mutex<Vec<SeenChat>>,
    pub chat_responses: Mutex<VecDeque<Result<ChatResponse>>>,
    /// When set, every chat request waits for a permit before answering
    pub chat_gate: Mutex<Option<Arc<Semaphore>>>,

    pub speech_requests: Mutex<Vec<SpeechRequest>>,
    pub speech_payload: Mutex<Bytes>,
    pub speech_fails: Mutex<bool>,
    /// When set, synthesis waits for a permit before answering
    pub speech_gate: Mutex<Option<Arc<Semaphore>>>,

    pub analysis: Mutex<Option<Result<ContextAnalysis>>>,
    pub opening: Mutex<Option<Result<OpeningResponse>>>,
    pub opening_plans: Mutex<Vec<Option<Plan>>>,
    pub plan_status: Mutex<Option<Plan>>,
}

impl FakeApi {
    pub fn new() -> Arc<Self> {
        let api = Self::default();
        *api.speech_payload.lock().unwrap() = Bytes::from(speech_wav(0.5));
        Arc::new(api)
    }

    pub fn push_chat(&self, response: Result<ChatResponse>) {
        self.chat_responses.lock().unwrap().push_back(response);
    }

    pub fn video_count(&self) -> usize {
        self.video_requests.lock().unwrap().len()
    }

    pub fn chat_count(&self) -> usize {
        self.chat_requests.lock().unwrap().len()
    }

    pub fn speech_count(&self) -> usize {
        self.speech_requests.lock().unwrap().len()
    }
}

#[async_trait::async_trait]
impl InterviewApi for FakeApi {
    async fn analyze_video(&self, request: VideoAnalysisRequest) -> Result<VideoAnalysisResponse> {
        self.video_requests.lock().unwrap().push(request);

        let gate = self.video_gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.acquire().await.map_err(|e| SessionError::Network(e.to_string()))?.forget();
        }

        self.video_response
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| SessionError::Network("analysis service unavailable".into()))
    }

    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse> {
        self.chat_requests.lock().unwrap().push(SeenChat {
            audio_len: request.audio.len(),
            history_len: request.history.len(),
            had_plan: request.plan.is_some(),
            difficulty: request.difficulty.level(),
        });

        let gate = self.chat_gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.acquire().await.map_err(|e| SessionError::Network(e.to_string()))?.forget();
        }

        self.chat_responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(SessionError::Network("no scripted chat response".into())))
    }

    async fn synthesize(&self, request: SpeechRequest) -> Result<Bytes> {
        self.speech_requests.lock().unwrap().push(request);

        let gate = self.speech_gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.acquire().await.map_err(|e| SessionError::Network(e.to_string()))?.forget();
        }

        if *self.speech_fails.lock().unwrap() {
            return Err(SessionError::Network("tts returned 500".into()));
        }
        Ok(self.speech_payload.lock().unwrap().clone())
    }

    async fn analyze_context(
        &self,
        _material: &ContextMaterial,
        _scenario: &str,
        _language: &str,
    ) -> Result<ContextAnalysis> {
        self.analysis
            .lock()
            .unwrap()
            .take()
            .unwrap_or_else(|| Err(SessionError::Network("analyze-resume returned 500".into())))
    }

    async fn start_interview(
        &self,
        _material: &ContextMaterial,
        _scenario: &str,
        _language: &str,
        plan: Option<&Plan>,
    ) -> Result<OpeningResponse> {
        self.opening_plans.lock().unwrap().push(plan.cloned());
        self.opening.lock().unwrap().take().unwrap_or_else(|| {
            Ok(OpeningResponse {
                reply: "Welcome. Please introduce yourself.".into(),
                resume_text: None,
            })
        })
    }

    async fn plan_status(&self, _session_key: &str) -> Result<PlanStatus> {
        Ok(PlanStatus {
            plan: self.plan_status.lock().unwrap().clone(),
        })
    }
}

/// Microphone that delivers a fixed script of blocks per recording
///
/// Blocks are queued the moment capture starts; `stop` drops the sender.
pub struct ScriptedBackend {
    blocks: Vec<Vec<f32>>,
    tx: Option<mpsc::Sender<AudioFrame>>,
    pub starts: Arc<AtomicUsize>,
    /// Sink whose playback state is sampled when capture opens
    watch: Option<Arc<RecordingSink>>,
    pub playing_at_start: Arc<Mutex<Vec<bool>>>,
}

impl ScriptedBackend {
    pub fn new(blocks: Vec<Vec<f32>>) -> Self {
        Self {
            blocks,
            tx: None,
            starts: Arc::new(AtomicUsize::new(0)),
            watch: None,
            playing_at_start: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn watching(mut self, sink: Arc<RecordingSink>) -> Self {
        self.watch = Some(sink);
        self
    }
}

#[async_trait::async_trait]
impl AudioBackend for ScriptedBackend {
    async fn start(&mut self) -> Result<mpsc::Receiver<AudioFrame>> {
        if self.tx.is_some() {
            return Err(SessionError::InvalidState("already capturing".into()));
        }
        if let Some(sink) = &self.watch {
            self.playing_at_start.lock().unwrap().push(sink.is_playing());
        }
        self.starts.fetch_add(1, Ordering::SeqCst);

        let (tx, rx) = mpsc::channel(self.blocks.len().max(1));
        for (i, block) in self.blocks.iter().enumerate() {
            let frame = AudioFrame {
                samples: block.clone(),
                sample_rate: 16000,
                timestamp_ms: i as u64 * 256,
            };
            tx.send(frame).await.map_err(|e| SessionError::Device(e.to_string()))?;
        }
        self.tx = Some(tx);
        Ok(rx)
    }

    async fn stop(&mut self) -> Result<()> {
        self.tx = None;
        Ok(())
    }

    fn is_capturing(&self) -> bool {
        self.tx.is_some()
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

/// Microphone that cannot be opened
pub struct BrokenBackend;

#[async_trait::async_trait]
impl AudioBackend for BrokenBackend {
    async fn start(&mut self) -> Result<mpsc::Receiver<AudioFrame>> {
        Err(SessionError::Device("microphone permission denied".into()))
    }

    async fn stop(&mut self) -> Result<()> {
        Ok(())
    }

    fn is_capturing(&self) -> bool {
        false
    }

    fn name(&self) -> &str {
        "broken"
    }
}

/// Speaker that "plays" until cancelled or until `hold` elapses
pub struct RecordingSink {
    hold: Duration,
    pub plays: AtomicUsize,
    pub outcomes: Mutex<Vec<PlaybackOutcome>>,
    active: Mutex<Option<CancellationToken>>,
}

impl RecordingSink {
    pub fn new(hold: Duration) -> Arc<Self> {
        Arc::new(Self {
            hold,
            plays: AtomicUsize::new(0),
            outcomes: Mutex::new(Vec::new()),
            active: Mutex::new(None),
        })
    }

    pub fn play_count(&self) -> usize {
        self.plays.load(Ordering::SeqCst)
    }

    /// A playback is in progress and has not been cancelled
    pub fn is_playing(&self) -> bool {
        self.active
            .lock()
            .unwrap()
            .as_ref()
            .map_or(false, |token| !token.is_cancelled())
    }

    pub fn outcomes(&self) -> Vec<PlaybackOutcome> {
        self.outcomes.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl AudioSink for RecordingSink {
    async fn play(&self, _audio: DecodedAudio, cancel: CancellationToken) -> Result<PlaybackOutcome> {
        self.plays.fetch_add(1, Ordering::SeqCst);
        *self.active.lock().unwrap() = Some(cancel.clone());

        let outcome = tokio::select! {
            _ = cancel.cancelled() => PlaybackOutcome::Interrupted,
            _ = tokio::time::sleep(self.hold) => PlaybackOutcome::Completed,
        };

        *self.active.lock().unwrap() = None;
        self.outcomes.lock().unwrap().push(outcome);
        Ok(outcome)
    }

    fn name(&self) -> &str {
        "recording"
    }
}

/// Camera showing one solid colour
pub struct SolidSource {
    frame: Option<RgbImage>,
}

impl SolidSource {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            frame: Some(RgbImage::from_pixel(width, height, image::Rgb([90, 140, 200]))),
        }
    }

    pub fn unavailable() -> Self {
        Self { frame: None }
    }
}

impl VideoSource for SolidSource {
    fn current_frame(&self) -> Option<RgbImage> {
        self.frame.clone()
    }

    fn is_available(&self) -> bool {
        self.frame.is_some()
    }

    fn name(&self) -> &str {
        "solid"
    }
}

/// A short WAV tone the speech decoder accepts
pub fn speech_wav(seconds: f32) -> Vec<u8> {
    let rate = 16000;
    let samples: Vec<f32> = (0..(rate as f32 * seconds) as usize)
        .map(|i| (i as f32 * 440.0 * std::f32::consts::TAU / rate as f32).sin() * 0.3)
        .collect();
    interview_room::encode_wav(&samples, rate).unwrap()
}

/// Poll `condition` until it holds, failing the test after `within`
pub async fn wait_until(within: Duration, mut condition: impl FnMut() -> bool) {
    let deadline = tokio::time::Instant::now() + within;
    while !condition() {
        assert!(tokio::time::Instant::now() < deadline, "condition not met in {within:?}");
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}
