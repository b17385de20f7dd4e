use image::RgbImage;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Horizontal padding around the landmark extents, in pixels
pub const FACE_BOX_PAD_X: f32 = 20.0;
/// Vertical padding (forehead and chin fall outside the landmark mesh)
pub const FACE_BOX_PAD_Y: f32 = 40.0;

/// A landmark in normalised image coordinates (0.0..=1.0)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FaceLandmarks {
    pub points: Vec<Landmark>,
    /// Blendshape name and score pairs
    pub blendshapes: Vec<(String, f32)>,
}

/// Black-box face landmark detector
pub trait FaceDetector: Send + Sync {
    /// Detect one face; `timestamp_ms` must increase between calls
    fn detect(&self, frame: &RgbImage, timestamp_ms: u64) -> Result<Option<FaceLandmarks>>;
}

/// Tracking overlay rectangle in frame pixels
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FaceBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl FaceBox {
    /// Padded bounding box of the landmarks; `None` without landmarks
    pub fn from_landmarks(points: &[Landmark], frame_width: u32, frame_height: u32) -> Option<Self> {
        if points.is_empty() {
            return None;
        }

        let (w, h) = (frame_width as f32, frame_height as f32);
        let (mut min_x, mut min_y, mut max_x, mut max_y) = (w, h, 0.0f32, 0.0f32);
        for p in points {
            let (x, y) = (p.x * w, p.y * h);
            min_x = min_x.min(x);
            max_x = max_x.max(x);
            min_y = min_y.min(y);
            max_y = max_y.max(y);
        }

        min_x -= FACE_BOX_PAD_X;
        max_x += FACE_BOX_PAD_X;
        min_y -= FACE_BOX_PAD_Y;
        max_y += FACE_BOX_PAD_Y;

        Some(Self {
            x: min_x,
            y: min_y,
            width: max_x - min_x,
            height: max_y - min_y,
        })
    }
}
