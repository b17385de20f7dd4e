//! Client side of the interview backend's HTTP contracts.

pub mod client;
pub mod messages;

pub use client::{HttpInterviewApi, InterviewApi};
pub use messages::{
    ChatRequest, ChatResponse, ContextAnalysis, ContextFile, ContextMaterial, FinalResult,
    OpeningResponse, PlanStatus, SpeechRequest, VideoAnalysisRequest, VideoAnalysisResponse,
};
