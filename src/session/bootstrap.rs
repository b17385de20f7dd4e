use tracing::{info, warn};

use super::plan::Plan;
use crate::api::{ContextAnalysis, ContextMaterial, InterviewApi};
use crate::error::{Result, SessionError};

/// Everything needed to open a session, prepared from the user's context
#[derive(Debug, Clone, Default)]
pub struct Bootstrap {
    pub plan: Option<Plan>,
    pub resume_text: String,
    pub opening_line: String,
}

/// Analyse the context material into a plan, then request the opening line
///
/// Analysis is best-effort: on failure, or when it yields a plan without
/// sections, the interview starts without a plan. Failure of the opening
/// request is fatal.
pub async fn prepare(
    api: &dyn InterviewApi,
    material: &ContextMaterial,
    scenario: &str,
    language: &str,
) -> Result<Bootstrap> {
    if material.is_empty() {
        return Err(SessionError::InvalidInput(
            "a resume file or some context text is required".into(),
        ));
    }

    let (plan, analysed_text) = match api.analyze_context(material, scenario, language).await {
        Ok(analysis) => {
            let plan = usable_plan(&analysis);
            if plan.is_none() {
                warn!("Context analysis produced no usable plan, continuing without one");
            }
            (plan, analysis.resume_text)
        }
        Err(e) => {
            warn!("Context analysis failed, starting without a plan: {}", e);
            (None, None)
        }
    };

    let opening = api
        .start_interview(material, scenario, language, plan.as_ref())
        .await
        .map_err(|e| match e {
            SessionError::Network(_) => e,
            other => SessionError::Network(other.to_string()),
        })?;

    let resume_text = opening
        .resume_text
        .or(analysed_text)
        .or_else(|| material.manual_text.clone())
        .unwrap_or_default();

    info!(
        "Session prepared: plan={}, {} chars of context",
        plan.as_ref().map_or(0, |p| p.sections.len()),
        resume_text.chars().count()
    );

    Ok(Bootstrap {
        plan,
        resume_text,
        opening_line: opening.reply,
    })
}

/// The analysed plan, unless it failed to parse or has no sections
fn usable_plan(analysis: &ContextAnalysis) -> Option<Plan> {
    let raw = analysis.interview_plan.as_ref()?;
    // Some responses nest the plan one level deeper.
    let raw = raw.get("interview_plan").filter(|v| v.is_object()).unwrap_or(raw);

    match serde_json::from_value::<Plan>(raw.clone()) {
        Ok(plan) if !plan.sections.is_empty() => Some(plan),
        Ok(_) => None,
        Err(e) => {
            warn!("Ignoring malformed interview plan: {}", e);
            None
        }
    }
}
