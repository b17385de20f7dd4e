use image::RgbImage;
use std::path::Path;
use std::time::{Duration, Instant};
use tracing::{info, warn};

use crate::error::{Result, SessionError};

/// Camera seam: the latest frame of the session's video stream
pub trait VideoSource: Send + Sync {
    /// Current frame, or `None` while the stream has no valid dimensions yet
    fn current_frame(&self) -> Option<RgbImage>;

    /// Whether the camera can be used at all
    fn is_available(&self) -> bool;

    fn name(&self) -> &str;
}

/// Cycles still images from a directory, one per `frame_period`
pub struct ImageDirSource {
    frames: Vec<RgbImage>,
    frame_period: Duration,
    started: Instant,
}

impl ImageDirSource {
    pub fn open(dir: impl AsRef<Path>, frame_period: Duration) -> Result<Self> {
        let dir = dir.as_ref();
        let mut paths: Vec<_> = std::fs::read_dir(dir)
            .map_err(|e| SessionError::Device(format!("camera source {}: {e}", dir.display())))?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| {
                p.extension()
                    .and_then(|e| e.to_str())
                    .is_some_and(|e| matches!(e.to_ascii_lowercase().as_str(), "png" | "jpg" | "jpeg"))
            })
            .collect();
        paths.sort();

        let mut frames = Vec::with_capacity(paths.len());
        for path in &paths {
            match image::open(path) {
                Ok(img) => frames.push(img.to_rgb8()),
                Err(e) => warn!("Skipping unreadable frame {}: {}", path.display(), e),
            }
        }

        if frames.is_empty() {
            return Err(SessionError::Device(format!("no usable images in {}", dir.display())));
        }

        info!("Camera source: {} frames from {}", frames.len(), dir.display());
        Ok(Self::from_frames(frames, frame_period))
    }

    pub fn from_frames(frames: Vec<RgbImage>, frame_period: Duration) -> Self {
        Self {
            frames,
            frame_period,
            started: Instant::now(),
        }
    }
}

impl VideoSource for ImageDirSource {
    fn current_frame(&self) -> Option<RgbImage> {
        if self.frames.is_empty() {
            return None;
        }
        let period = self.frame_period.as_millis().max(1);
        let index = (self.started.elapsed().as_millis() / period) as usize % self.frames.len();
        let frame = &self.frames[index];
        (frame.width() > 0 && frame.height() > 0).then(|| frame.clone())
    }

    fn is_available(&self) -> bool {
        !self.frames.is_empty()
    }

    fn name(&self) -> &str {
        "image directory"
    }
}
