use serde::{Deserialize, Deserializer, Serialize};

use crate::analysis::{AlertPayload, MetricScores};
use crate::session::{ChatTurn, Difficulty, Plan};
use crate::speech::Voice;

/// Body of `POST /api/analyze-video`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoAnalysisRequest {
    /// Base64 JPEG payloads, oldest first
    pub images: Vec<String>,
    pub current_topic: String,
    pub language: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VideoAnalysisResponse {
    #[serde(default)]
    pub metrics: Option<MetricScores>,
    #[serde(default)]
    pub alert: Option<AlertPayload>,
}

/// Everything sent for one user turn (`POST /api/chat`, multipart)
#[derive(Debug, Clone)]
pub struct ChatRequest {
    /// WAV-encoded utterance
    pub audio: Vec<u8>,
    pub history: Vec<ChatTurn>,
    pub resume_text: String,
    pub scenario: String,
    pub language: String,
    pub difficulty: Difficulty,
    pub plan: Option<Plan>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChatResponse {
    pub reply: String,
    #[serde(default)]
    pub transcript: Option<String>,
    #[serde(default)]
    pub session_key: Option<String>,
    #[serde(default)]
    pub plan_update: Option<Plan>,
    #[serde(default)]
    pub interview_complete: bool,
    #[serde(default)]
    pub final_result: Option<FinalResult>,
}

/// Terminal evaluation of the interview
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FinalResult {
    #[serde(default, deserialize_with = "lenient_score")]
    pub score: Option<f64>,
    #[serde(default)]
    pub comment: Option<String>,
}

/// Body of `POST /api/tts`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeechRequest {
    pub text: String,
    pub voice: Voice,
}

/// Background material the interview is tailored to (resume and/or free text)
#[derive(Debug, Clone, Default)]
pub struct ContextMaterial {
    pub file: Option<ContextFile>,
    pub manual_text: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ContextFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl ContextMaterial {
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            file: None,
            manual_text: Some(text.into()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.file.is_none() && self.manual_text.as_deref().map_or(true, |t| t.trim().is_empty())
    }
}

/// Response of `POST /api/analyze-resume`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContextAnalysis {
    #[serde(default)]
    pub resume_text: Option<String>,
    /// Left untyped: on a parse failure the server sends a placeholder object
    #[serde(default)]
    pub interview_plan: Option<serde_json::Value>,
}

/// Response of `POST /api/upload-resume`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OpeningResponse {
    pub reply: String,
    #[serde(default)]
    pub resume_text: Option<String>,
}

/// Response of `GET /api/plan-status/{session_key}`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PlanStatus {
    #[serde(default)]
    pub plan: Option<Plan>,
}

fn lenient_score<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match raw {
        Some(serde_json::Value::Number(n)) => n.as_f64(),
        Some(serde_json::Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    })
}
