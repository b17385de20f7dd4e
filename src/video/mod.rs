//! Camera side of the session: face tracking and frame sampling.

pub mod face;
pub mod sampler;
pub mod source;

pub use face::{FaceBox, FaceDetector, FaceLandmarks, Landmark};
pub use sampler::{encode_frame, VideoFrameSampler};
pub use source::{ImageDirSource, VideoSource};
