//! HTTP API server for local control of the live session
//!
//! - GET /health - Health check
//! - GET /session/status - Session statistics
//! - GET /session/transcript - Visible transcript
//! - GET /session/plan - Current interview plan
//! - POST /session/plan/refresh - Re-fetch the plan from the backend
//! - POST /session/record/start - Start answering
//! - POST /session/record/stop - Finish the answer and get the AI's reply
//! - POST /session/end - Tear the session down

mod handlers;
mod routes;
mod state;

pub use routes::create_router;
pub use state::AppState;
