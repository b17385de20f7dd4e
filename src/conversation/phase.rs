use serde::{Deserialize, Serialize};
use std::fmt;

/// Turn-taking state of the conversation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnPhase {
    #[default]
    AwaitingUserInput,
    Recording,
    Sending,
    AwaitingAiResponse,
    Speaking,
    /// Terminal: the backend ended the interview
    Complete,
}

impl TurnPhase {
    /// Whether the user may start recording from this phase
    ///
    /// Speaking counts: recording preempts the AI.
    pub fn accepts_recording(self) -> bool {
        matches!(self, TurnPhase::AwaitingUserInput | TurnPhase::Speaking)
    }

    pub fn is_terminal(self) -> bool {
        self == TurnPhase::Complete
    }
}

impl fmt::Display for TurnPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TurnPhase::AwaitingUserInput => "awaiting user input",
            TurnPhase::Recording => "recording",
            TurnPhase::Sending => "sending",
            TurnPhase::AwaitingAiResponse => "awaiting AI response",
            TurnPhase::Speaking => "speaking",
            TurnPhase::Complete => "complete",
        };
        f.write_str(name)
    }
}
