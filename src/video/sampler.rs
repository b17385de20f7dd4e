use base64::Engine as _;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, RgbImage};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::face::{FaceBox, FaceDetector};
use super::source::VideoSource;
use crate::config::VideoConfig;
use crate::error::{Result, SessionError};
use crate::session::{EventBus, SessionEvent, SessionHandle};

/// Downscale so the long edge is at most `max_dimension`, JPEG-encode and
/// return the bare base64 payload
pub fn encode_frame(frame: &RgbImage, max_dimension: u32, quality: u8) -> Result<String> {
    let (width, height) = frame.dimensions();
    if width == 0 || height == 0 {
        return Err(SessionError::Encoding("frame has no pixels".into()));
    }

    let long_edge = width.max(height);
    let scaled = if long_edge > max_dimension {
        let scale = max_dimension as f64 / long_edge as f64;
        let w = ((width as f64 * scale).round() as u32).max(1);
        let h = ((height as f64 * scale).round() as u32).max(1);
        image::imageops::resize(frame, w, h, FilterType::Triangle)
    } else {
        frame.clone()
    };

    let mut jpeg = Vec::new();
    JpegEncoder::new_with_quality(&mut jpeg, quality.clamp(1, 100))
        .encode_image(&DynamicImage::ImageRgb8(scaled))?;

    Ok(base64::engine::general_purpose::STANDARD.encode(&jpeg))
}

/// Per-tick face tracking plus 1 Hz frame sampling into the session ring
pub struct VideoFrameSampler {
    state: SessionHandle,
    source: Arc<dyn VideoSource>,
    detector: Option<Arc<dyn FaceDetector>>,
    events: EventBus,
    sampling_interval: Duration,
    max_dimension: u32,
    jpeg_quality: u8,
    started: Instant,
    last_capture: Option<Instant>,
    last_detect_ms: Option<u64>,
    captured: u64,
}

impl VideoFrameSampler {
    pub fn new(
        state: SessionHandle,
        source: Arc<dyn VideoSource>,
        detector: Option<Arc<dyn FaceDetector>>,
        events: EventBus,
        config: &VideoConfig,
    ) -> Self {
        info!(
            "Frame sampler on {}: every {}ms at {}px, face tracking {}",
            source.name(),
            config.sampling_interval_ms,
            config.max_dimension,
            if detector.is_some() { "on" } else { "off" }
        );

        Self {
            state,
            source,
            detector,
            events,
            sampling_interval: config.sampling_interval(),
            max_dimension: config.max_dimension,
            jpeg_quality: config.jpeg_quality,
            started: Instant::now(),
            last_capture: None,
            last_detect_ms: None,
            captured: 0,
        }
    }

    /// Frames successfully appended to the ring so far
    pub fn captured(&self) -> u64 {
        self.captured
    }

    /// One rendering tick: track the face, then sample if the interval elapsed
    pub fn tick(&mut self, now: Instant) {
        let Some(frame) = self.source.current_frame() else {
            return;
        };

        self.track(&frame, now);

        let due = self
            .last_capture
            .map_or(true, |last| now.saturating_duration_since(last) >= self.sampling_interval);
        if due {
            self.sample(&frame, now);
        }
    }

    fn track(&mut self, frame: &RgbImage, now: Instant) {
        let Some(detector) = &self.detector else {
            return;
        };

        // The detector requires strictly increasing timestamps.
        let mut timestamp_ms = now.saturating_duration_since(self.started).as_millis() as u64;
        if let Some(last) = self.last_detect_ms {
            timestamp_ms = timestamp_ms.max(last + 1);
        }
        self.last_detect_ms = Some(timestamp_ms);

        match detector.detect(frame, timestamp_ms) {
            Ok(Some(landmarks)) => {
                if let Some(face) = FaceBox::from_landmarks(&landmarks.points, frame.width(), frame.height()) {
                    self.events.publish(SessionEvent::FaceTracked(face));
                }
            }
            Ok(None) => {}
            Err(e) => debug!("Face detection failed: {}", e),
        }
    }

    fn sample(&mut self, frame: &RgbImage, now: Instant) {
        match encode_frame(frame, self.max_dimension, self.jpeg_quality) {
            Ok(encoded) => {
                let buffered = self.state.update(|s| {
                    s.frames.push(encoded);
                    s.frames.len()
                });
                self.last_capture = Some(now);
                self.captured += 1;
                debug!("Sampled frame #{} ({} buffered)", self.captured, buffered);
                self.events.publish(SessionEvent::FrameSampled { buffered });
            }
            Err(e) => warn!("Frame capture failed: {}", e),
        }
    }

    /// Drive `tick` on `tick_interval` until cancelled
    pub async fn run(mut self, tick_interval: Duration, cancel: CancellationToken) {
        let mut ticker = tokio::time::interval(tick_interval.max(Duration::from_millis(1)));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                now = ticker.tick() => self.tick(now),
            }
        }

        info!("Frame sampler stopped after {} captures", self.captured);
    }
}
