use bytes::Bytes;
use reqwest::multipart::{Form, Part};
use std::time::Duration;
use tracing::{debug, info};

use super::messages::{
    ChatRequest, ChatResponse, ContextAnalysis, ContextMaterial, OpeningResponse, PlanStatus,
    SpeechRequest, VideoAnalysisRequest, VideoAnalysisResponse,
};
use crate::error::{Result, SessionError};
use crate::session::Plan;

/// Contract of the interview backend
///
/// The session only ever talks to the backend through this trait.
#[async_trait::async_trait]
pub trait InterviewApi: Send + Sync {
    /// `POST /api/analyze-video`
    async fn analyze_video(&self, request: VideoAnalysisRequest) -> Result<VideoAnalysisResponse>;

    /// `POST /api/chat`
    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse>;

    /// `POST /api/tts`; an empty payload is a valid answer
    async fn synthesize(&self, request: SpeechRequest) -> Result<Bytes>;

    /// `POST /api/analyze-resume`
    async fn analyze_context(
        &self,
        material: &ContextMaterial,
        scenario: &str,
        language: &str,
    ) -> Result<ContextAnalysis>;

    /// `POST /api/upload-resume`
    async fn start_interview(
        &self,
        material: &ContextMaterial,
        scenario: &str,
        language: &str,
        plan: Option<&Plan>,
    ) -> Result<OpeningResponse>;

    /// `GET /api/plan-status/{session_key}`
    async fn plan_status(&self, session_key: &str) -> Result<PlanStatus>;
}

/// reqwest implementation of [`InterviewApi`]
pub struct HttpInterviewApi {
    client: reqwest::Client,
    base_url: String,
}

impl HttpInterviewApi {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let base_url = base_url.into().trim_end_matches('/').to_string();

        // No request timeout: a hung turn simply stays pending.
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .user_agent(concat!("interview-room/", env!("CARGO_PKG_VERSION")))
            .build()?;

        info!("Interview backend at {}", base_url);

        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn checked(response: reqwest::Response, endpoint: &str) -> Result<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(SessionError::Network(format!("{endpoint} returned {status}: {body}")))
    }

    fn context_form(material: &ContextMaterial, scenario: &str, language: &str) -> Form {
        let mut form = Form::new();
        if let Some(file) = &material.file {
            form = form.part("file", Part::bytes(file.bytes.clone()).file_name(file.name.clone()));
        }
        if let Some(text) = material.manual_text.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
            form = form.text("manual_text", text.to_string());
        }
        form.text("scenario", scenario.to_string())
            .text("language", language.to_string())
    }
}

#[async_trait::async_trait]
impl InterviewApi for HttpInterviewApi {
    async fn analyze_video(&self, request: VideoAnalysisRequest) -> Result<VideoAnalysisResponse> {
        debug!("Sending {} frames for analysis", request.images.len());

        let response = self
            .client
            .post(self.url("/api/analyze-video"))
            .json(&request)
            .send()
            .await?;

        Ok(Self::checked(response, "analyze-video").await?.json().await?)
    }

    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse> {
        info!(
            "Sending turn: {} bytes of audio, {} history turns, plan={}",
            request.audio.len(),
            request.history.len(),
            request.plan.is_some()
        );

        let audio = Part::bytes(request.audio)
            .file_name("recording.wav")
            .mime_str("audio/wav")?;

        let mut form = Form::new()
            .part("file", audio)
            .text("history", serde_json::to_string(&request.history)?)
            .text("resume_text", request.resume_text)
            .text("scenario", request.scenario)
            .text("language", request.language)
            .text("difficulty", request.difficulty.to_string());

        if let Some(plan) = &request.plan {
            form = form.text("interview_plan", serde_json::to_string(plan)?);
        }

        let response = self
            .client
            .post(self.url("/api/chat"))
            .multipart(form)
            .send()
            .await?;

        Ok(Self::checked(response, "chat").await?.json().await?)
    }

    async fn synthesize(&self, request: SpeechRequest) -> Result<Bytes> {
        let response = self
            .client
            .post(self.url("/api/tts"))
            .json(&request)
            .send()
            .await?;

        let audio = Self::checked(response, "tts").await?.bytes().await?;
        debug!("Synthesized {} bytes for {} chars", audio.len(), request.text.chars().count());
        Ok(audio)
    }

    async fn analyze_context(
        &self,
        material: &ContextMaterial,
        scenario: &str,
        language: &str,
    ) -> Result<ContextAnalysis> {
        let response = self
            .client
            .post(self.url("/api/analyze-resume"))
            .multipart(Self::context_form(material, scenario, language))
            .send()
            .await?;

        Ok(Self::checked(response, "analyze-resume").await?.json().await?)
    }

    async fn start_interview(
        &self,
        material: &ContextMaterial,
        scenario: &str,
        language: &str,
        plan: Option<&Plan>,
    ) -> Result<OpeningResponse> {
        let mut form = Self::context_form(material, scenario, language);
        if let Some(plan) = plan {
            form = form.text("interview_plan", serde_json::to_string(plan)?);
        }

        let response = self
            .client
            .post(self.url("/api/upload-resume"))
            .multipart(form)
            .send()
            .await?;

        Ok(Self::checked(response, "upload-resume").await?.json().await?)
    }

    async fn plan_status(&self, session_key: &str) -> Result<PlanStatus> {
        let response = self
            .client
            .get(self.url(&format!("/api/plan-status/{session_key}")))
            .send()
            .await?;

        Ok(Self::checked(response, "plan-status").await?.json().await?)
    }
}
