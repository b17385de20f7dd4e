use serde::{Deserialize, Serialize};
use std::fmt;

use crate::config::Config;
use crate::speech::Voice;

/// Interview difficulty, 1 (gentle) to 10 (merciless)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "u8", into = "u8")]
pub struct Difficulty(u8);

impl Difficulty {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 10;

    /// Out-of-range levels are clamped
    pub fn new(level: u8) -> Self {
        Self(level.clamp(Self::MIN, Self::MAX))
    }

    pub fn level(self) -> u8 {
        self.0
    }
}

impl Default for Difficulty {
    fn default() -> Self {
        Self(5)
    }
}

impl From<u8> for Difficulty {
    fn from(level: u8) -> Self {
        Self::new(level)
    }
}

impl From<Difficulty> for u8 {
    fn from(d: Difficulty) -> Self {
        d.0
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Configuration fixed for the lifetime of one interview session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Unique session identifier
    pub session_id: String,

    /// Scenario id from the backend catalog (e.g. "tech_backend")
    pub scenario: String,

    /// Interview language tag (e.g. "zh-CN", "en-US")
    pub language: String,

    pub difficulty: Difficulty,

    /// Voice used for every synthesized AI turn
    pub voice: Voice,

    /// Microphone capture rate
    pub sample_rate: u32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            session_id: format!("interview-{}", uuid::Uuid::new_v4()),
            scenario: "tech_backend".to_string(),
            language: "zh-CN".to_string(),
            difficulty: Difficulty::default(),
            voice: Voice::random(),
            sample_rate: 16000, // speech recognition expects 16kHz mono
        }
    }
}

impl SessionConfig {
    /// Build from the loaded service configuration
    pub fn from_config(cfg: &Config) -> Self {
        Self {
            scenario: cfg.session.scenario.clone(),
            language: cfg.session.language.clone(),
            difficulty: Difficulty::new(cfg.session.difficulty),
            voice: cfg.session.voice.unwrap_or_else(Voice::random),
            sample_rate: cfg.audio.sample_rate,
            ..Self::default()
        }
    }
}
