pub mod analysis;
pub mod api;
pub mod audio;
pub mod config;
pub mod conversation;
pub mod error;
pub mod http;
pub mod session;
pub mod speech;
pub mod video;

pub use analysis::{AlertPresenter, AnalysisScheduler, CheatAlert, Metrics};
pub use api::{HttpInterviewApi, InterviewApi};
pub use audio::{
    encode_wav, AudioBackend, AudioBackendConfig, AudioBackendFactory, AudioCaptureEncoder,
    AudioFile, AudioFrame, AudioSink, AudioSource, FileBackend, FileSink, PlaybackOutcome,
    Utterance,
};
pub use config::Config;
pub use conversation::{ConversationOrchestrator, TurnOutcome, TurnPhase};
pub use error::{Result, SessionError};
pub use http::{create_router, AppState};
pub use session::{
    Bootstrap, InterviewSession, PipelineConfig, SessionConfig, SessionEvent, SessionParts,
    SessionStats,
};
pub use speech::{SpeechPlaybackController, Voice};
pub use video::{ImageDirSource, VideoFrameSampler, VideoSource};
