use chrono::{DateTime, Utc};
use serde::Serialize;

use super::config::Difficulty;
use crate::analysis::Metrics;
use crate::api::FinalResult;
use crate::conversation::TurnPhase;
use crate::speech::Voice;

/// Point-in-time snapshot of an interview session
#[derive(Debug, Clone, Serialize)]
pub struct SessionStats {
    pub session_id: String,
    pub scenario: String,
    pub language: String,
    pub difficulty: Difficulty,
    pub voice: Voice,

    pub phase: TurnPhase,
    pub is_recording: bool,

    /// When the session started
    pub started_at: DateTime<Utc>,

    /// Total duration in seconds
    pub duration_secs: f64,

    /// User turns started so far
    pub turns: u64,

    /// Visible transcript lines (both speakers)
    pub transcript_entries: usize,

    /// Encoded frames waiting for the next analysis tick
    pub frames_buffered: usize,

    pub metrics: Metrics,
    pub cheat_alert_count: u32,

    pub plan_items: usize,
    pub plan_completed: usize,

    pub final_result: Option<FinalResult>,

    /// Background loops still running
    pub active_tasks: usize,
}
