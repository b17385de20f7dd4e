//! Interview session management
//!
//! This module provides the `InterviewSession` abstraction that manages:
//! - The shared session state every loop reads and writes
//! - Bootstrapping from context material (plan and opening line)
//! - Spawning and tearing down the sampler and analysis loops
//! - Observer events and session statistics

mod bootstrap;
mod config;
mod events;
mod plan;
mod session;
mod state;
mod stats;
mod tasks;

pub use bootstrap::{prepare, Bootstrap};
pub use config::{Difficulty, SessionConfig};
pub use events::{EventBus, SessionEvent};
pub use plan::{ItemChange, ItemStatus, Plan, PlanItem, Section};
pub use session::{InterviewSession, PipelineConfig, SessionParts};
pub use state::{ChatTurn, FrameRing, Role, SessionHandle, SessionState, Speaker, TranscriptEntry};
pub use stats::SessionStats;
pub use tasks::TaskRegistry;
