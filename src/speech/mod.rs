//! Synthesized speech output for the AI side of the conversation.

pub mod playback;
pub mod voice;

pub use crate::audio::PlaybackOutcome;
pub use playback::SpeechPlaybackController;
pub use voice::Voice;
