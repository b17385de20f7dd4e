use serde::{Deserialize, Serialize};

/// Advisory presentation gauges derived from the latest video analysis
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metrics {
    pub confidence: u8,
    pub eye_contact: u8,
    pub attire: u8,
    pub clarity: u8,
}

/// Raw scores as reported by the analysis service
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricScores {
    #[serde(default)]
    pub confidence: Option<f64>,
    #[serde(default)]
    pub eye_contact: Option<f64>,
    #[serde(default)]
    pub attire: Option<f64>,
    #[serde(default)]
    pub clarity: Option<f64>,
}

impl Metrics {
    pub fn from_scores(scores: &MetricScores) -> Self {
        Self {
            confidence: gauge(scores.confidence),
            eye_contact: gauge(scores.eye_contact),
            attire: gauge(scores.attire),
            clarity: gauge(scores.clarity),
        }
    }
}

/// Round to the nearest integer and clamp into 0..=100; missing or NaN reads as 0
pub fn gauge(score: Option<f64>) -> u8 {
    match score {
        Some(v) if !v.is_nan() => v.round().clamp(0.0, 100.0) as u8,
        _ => 0,
    }
}
