//! Turn-taking between the user and the AI interviewer.

pub mod orchestrator;
pub mod phase;
pub mod reply;

pub use orchestrator::{ConversationOrchestrator, TurnOutcome, TurnReply};
pub use phase::TurnPhase;
pub use reply::{parse_reply, question_overlay, HEARD_PLACEHOLDER};
