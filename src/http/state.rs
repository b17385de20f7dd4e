use crate::session::InterviewSession;
use std::sync::Arc;

/// Shared application state for HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// The live interview this process controls
    pub session: Arc<InterviewSession>,
}

impl AppState {
    pub fn new(session: Arc<InterviewSession>) -> Self {
        Self { session }
    }
}
