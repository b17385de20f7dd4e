//! Periodic video analysis: metric gauges and integrity alerts.

pub mod alerts;
pub mod metrics;
pub mod scheduler;

pub use alerts::{AlertLevel, AlertPayload, AlertPresenter, CheatAlert, FALLBACK_ALERT_MESSAGE};
pub use metrics::{gauge, MetricScores, Metrics};
pub use scheduler::AnalysisScheduler;
