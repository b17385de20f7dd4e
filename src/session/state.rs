//! The single mutable record shared by every loop of a session.
//!
//! All access goes through `SessionHandle::read`/`update`, which take a
//! synchronous closure. A lock can therefore never be held across an `.await`,
//! and any multi-field change made inside one closure is atomic with respect
//! to every other loop.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};

use super::config::SessionConfig;
use super::plan::Plan;
use crate::analysis::Metrics;
use crate::api::FinalResult;
use crate::conversation::TurnPhase;

/// Role of a turn in the conversation history sent to the chat service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: Role,
    pub content: String,
}

impl ChatTurn {
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Who a visible transcript line belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Speaker {
    You,
    #[serde(rename = "AI")]
    Ai,
}

/// One line of the visible transcript
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptEntry {
    pub speaker: Speaker,
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

impl TranscriptEntry {
    pub fn new(speaker: Speaker, text: impl Into<String>) -> Self {
        Self {
            speaker,
            text: text.into(),
            timestamp: Utc::now(),
        }
    }
}

/// Bounded FIFO of encoded video frames
#[derive(Debug, Clone)]
pub struct FrameRing {
    frames: VecDeque<String>,
    capacity: usize,
}

impl FrameRing {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            frames: VecDeque::with_capacity(capacity + 1),
            capacity,
        }
    }

    /// Append, evicting the oldest frame once over capacity
    pub fn push(&mut self, frame: String) {
        self.frames.push_back(frame);
        while self.frames.len() > self.capacity {
            self.frames.pop_front();
        }
    }

    /// Take the newest `n` frames (oldest first) and clear the ring
    pub fn drain_latest(&mut self, n: usize) -> Vec<String> {
        let skip = self.frames.len().saturating_sub(n);
        self.frames.drain(..).skip(skip).collect()
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn iter(&self) -> impl Iterator<Item = &String> {
        self.frames.iter()
    }
}

pub struct SessionState {
    pub config: SessionConfig,
    pub phase: TurnPhase,
    /// Bumped for every user turn so late playback completions can be told apart
    pub turn: u64,
    pub is_recording: bool,
    pub audio_chunks: Vec<Vec<f32>>,
    pub frames: FrameRing,
    pub history: Vec<ChatTurn>,
    pub transcript: Vec<TranscriptEntry>,
    pub resume_text: String,
    pub plan: Option<Plan>,
    pub session_key: Option<String>,
    pub metrics: Metrics,
    pub cheat_alert_count: u32,
    pub final_result: Option<FinalResult>,
}

impl SessionState {
    pub fn new(config: SessionConfig, frame_capacity: usize) -> Self {
        Self {
            config,
            phase: TurnPhase::AwaitingUserInput,
            turn: 0,
            is_recording: false,
            audio_chunks: Vec::new(),
            frames: FrameRing::new(frame_capacity),
            history: Vec::new(),
            transcript: Vec::new(),
            resume_text: String::new(),
            plan: None,
            session_key: None,
            metrics: Metrics::default(),
            cheat_alert_count: 0,
            final_result: None,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.phase == TurnPhase::Complete
    }
}

/// Cloneable handle to the session's shared state
#[derive(Clone)]
pub struct SessionHandle(Arc<Mutex<SessionState>>);

impl SessionHandle {
    pub fn new(state: SessionState) -> Self {
        Self(Arc::new(Mutex::new(state)))
    }

    pub fn read<R>(&self, f: impl FnOnce(&SessionState) -> R) -> R {
        let guard = self.0.lock().unwrap_or_else(PoisonError::into_inner);
        f(&guard)
    }

    pub fn update<R>(&self, f: impl FnOnce(&mut SessionState) -> R) -> R {
        let mut guard = self.0.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut guard)
    }
}
