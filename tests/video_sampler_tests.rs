// Integration tests for frame sampling
//
// These tests drive the sampler tick by tick with explicit instants and
// check what lands in the session's frame ring.

mod common;

use anyhow::Result;
use common::SolidSource;
use image::{Rgb, RgbImage};
use interview_room::config::VideoConfig;
use interview_room::error::Result as SessionResult;
use interview_room::session::{EventBus, SessionConfig, SessionEvent, SessionHandle, SessionState};
use interview_room::video::{
    encode_frame, FaceDetector, FaceLandmarks, ImageDirSource, Landmark, VideoFrameSampler, VideoSource,
};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

fn session(ring_capacity: usize) -> SessionHandle {
    SessionHandle::new(SessionState::new(SessionConfig::default(), ring_capacity))
}

fn numbered_frame(n: u8) -> RgbImage {
    RgbImage::from_pixel(64, 48, Rgb([n.wrapping_mul(20), 255 - n, n]))
}

/// Camera whose picture changes on every read: frame #1, #2, ...
struct CountingSource {
    reads: AtomicUsize,
}

impl VideoSource for CountingSource {
    fn current_frame(&self) -> Option<RgbImage> {
        let n = self.reads.fetch_add(1, Ordering::SeqCst) + 1;
        Some(numbered_frame(n as u8))
    }

    fn is_available(&self) -> bool {
        true
    }

    fn name(&self) -> &str {
        "counting"
    }
}

/// Camera that yields a zero-sized frame first, then a valid one
struct GlitchySource {
    reads: AtomicUsize,
}

impl VideoSource for GlitchySource {
    fn current_frame(&self) -> Option<RgbImage> {
        match self.reads.fetch_add(1, Ordering::SeqCst) {
            0 => Some(RgbImage::new(0, 0)),
            _ => Some(numbered_frame(1)),
        }
    }

    fn is_available(&self) -> bool {
        true
    }

    fn name(&self) -> &str {
        "glitchy"
    }
}

/// Detector that always finds the same face and records the timestamps it saw
struct FixedFace {
    timestamps: Mutex<Vec<u64>>,
    calls: AtomicU64,
}

impl FaceDetector for FixedFace {
    fn detect(&self, _frame: &RgbImage, timestamp_ms: u64) -> SessionResult<Option<FaceLandmarks>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.timestamps.lock().unwrap().push(timestamp_ms);
        Ok(Some(FaceLandmarks {
            points: vec![Landmark { x: 0.25, y: 0.25 }, Landmark { x: 0.75, y: 0.75 }],
            blendshapes: vec![("eyeBlinkLeft".into(), 0.1)],
        }))
    }
}

#[tokio::test]
async fn test_twelve_captures_keep_three_through_twelve() -> Result<()> {
    let config = VideoConfig::default();
    let state = session(config.ring_capacity);
    let source = Arc::new(CountingSource { reads: AtomicUsize::new(0) });
    let mut sampler = VideoFrameSampler::new(state.clone(), source, None, EventBus::default(), &config);

    let start = Instant::now();
    for i in 0..12u64 {
        sampler.tick(start + Duration::from_millis(i * config.sampling_interval_ms));
    }

    assert_eq!(sampler.captured(), 12);
    let ring: Vec<String> = state.read(|s| s.frames.iter().cloned().collect());
    assert_eq!(ring.len(), 10);

    let expected: Vec<String> = (3..=12)
        .map(|n| encode_frame(&numbered_frame(n), config.max_dimension, config.jpeg_quality))
        .collect::<SessionResult<_>>()?;
    assert_eq!(ring, expected);

    Ok(())
}

#[tokio::test]
async fn test_samples_at_most_once_per_interval() {
    let config = VideoConfig::default();
    let state = session(config.ring_capacity);
    let mut sampler = VideoFrameSampler::new(
        state.clone(),
        Arc::new(SolidSource::new(640, 480)),
        None,
        EventBus::default(),
        &config,
    );

    // 2.5 seconds of 16 ms rendering ticks: captures at 0 s, ~1 s and ~2 s.
    let start = Instant::now();
    let mut t = Duration::ZERO;
    while t <= Duration::from_millis(2500) {
        sampler.tick(start + t);
        t += config.tick_interval();
    }

    assert_eq!(sampler.captured(), 3);
    assert_eq!(state.read(|s| s.frames.len()), 3);
}

#[tokio::test]
async fn test_capture_failure_does_not_stop_sampling() {
    let config = VideoConfig::default();
    let state = session(config.ring_capacity);
    let source = Arc::new(GlitchySource { reads: AtomicUsize::new(0) });
    let mut sampler = VideoFrameSampler::new(state.clone(), source, None, EventBus::default(), &config);

    let start = Instant::now();
    sampler.tick(start);
    assert_eq!(state.read(|s| s.frames.len()), 0);

    // The failed capture did not reset the clock, so the next tick retries.
    sampler.tick(start + config.tick_interval());
    assert_eq!(state.read(|s| s.frames.len()), 1);
}

#[tokio::test]
async fn test_face_tracking_runs_every_tick() {
    let config = VideoConfig::default();
    let events = EventBus::default();
    let mut rx = events.subscribe();
    let detector = Arc::new(FixedFace {
        timestamps: Mutex::new(Vec::new()),
        calls: AtomicU64::new(0),
    });

    let mut sampler = VideoFrameSampler::new(
        session(config.ring_capacity),
        Arc::new(SolidSource::new(400, 200)),
        Some(detector.clone() as Arc<dyn FaceDetector>),
        events,
        &config,
    );

    let start = Instant::now();
    for _ in 0..3 {
        // Same instant three times: timestamps must still increase.
        sampler.tick(start);
    }

    assert_eq!(detector.calls.load(Ordering::SeqCst), 3);
    let timestamps = detector.timestamps.lock().unwrap().clone();
    assert!(timestamps.windows(2).all(|w| w[0] < w[1]), "timestamps {timestamps:?}");

    let mut faces = 0;
    while let Ok(event) = rx.try_recv() {
        if let SessionEvent::FaceTracked(face) = event {
            assert_eq!(face.x, 100.0 - 20.0);
            assert_eq!(face.height, 100.0 + 80.0);
            faces += 1;
        }
    }
    assert_eq!(faces, 3);
}

#[tokio::test(start_paused = true)]
async fn test_run_stops_on_cancel() {
    let config = VideoConfig::default();
    let state = session(config.ring_capacity);
    let sampler = VideoFrameSampler::new(
        state.clone(),
        Arc::new(SolidSource::new(64, 64)),
        None,
        EventBus::default(),
        &config,
    );

    let cancel = CancellationToken::new();
    let task = tokio::spawn(sampler.run(config.tick_interval(), cancel.clone()));

    tokio::time::sleep(Duration::from_millis(3500)).await;
    cancel.cancel();
    task.await.unwrap();

    let buffered = state.read(|s| s.frames.len());
    assert!((3..=5).contains(&buffered), "buffered {buffered}");

    tokio::time::sleep(Duration::from_secs(5)).await;
    assert_eq!(state.read(|s| s.frames.len()), buffered, "no captures after cancel");
}

#[test]
fn test_image_dir_source_loads_images() -> Result<()> {
    let dir = tempfile::tempdir()?;
    numbered_frame(1).save(dir.path().join("a.png"))?;
    numbered_frame(2).save(dir.path().join("b.png"))?;
    std::fs::write(dir.path().join("notes.txt"), "not an image")?;

    let source = ImageDirSource::open(dir.path(), Duration::from_secs(1))?;
    assert!(source.is_available());
    let frame = source.current_frame().expect("a frame");
    assert_eq!(frame.dimensions(), (64, 48));
    Ok(())
}

#[test]
fn test_empty_image_dir_is_device_error() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let result = ImageDirSource::open(dir.path(), Duration::from_secs(1));
    assert!(matches!(result, Err(interview_room::SessionError::Device(_))));
    Ok(())
}
