//! Interview plan: sections of checklist items maintained by the backend.
//!
//! The client never merges plans. Each update replaces the previous plan; the
//! id-based diff below exists only so observers can tell what changed.

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Plan {
    #[serde(default)]
    pub sections: Vec<Section>,

    /// Fields the client does not interpret (summary, completion markers, ...)
    /// are kept so the plan can be sent back verbatim.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Section {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub items: Vec<PlanItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanItem {
    #[serde(deserialize_with = "id_from_string_or_number")]
    pub id: String,
    #[serde(default)]
    pub content: String,
    #[serde(default, deserialize_with = "status_or_pending")]
    pub status: ItemStatus,
    #[serde(default)]
    pub is_followup: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evaluation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemStatus {
    #[default]
    Pending,
    Done,
}

/// How an item changed between two plan versions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemChange {
    Added,
    Completed,
    Updated,
    Unchanged,
}

impl Plan {
    pub fn items(&self) -> impl Iterator<Item = &PlanItem> {
        self.sections.iter().flat_map(|s| s.items.iter())
    }

    pub fn item(&self, id: &str) -> Option<&PlanItem> {
        self.items().find(|item| item.id == id)
    }

    pub fn is_empty(&self) -> bool {
        self.items().next().is_none()
    }

    pub fn summary(&self) -> Option<&str> {
        self.extra.get("summary").and_then(|v| v.as_str())
    }

    pub fn completed_count(&self) -> usize {
        self.items().filter(|item| item.status == ItemStatus::Done).count()
    }

    /// Rounded mean of all item scores, 0 when nothing has been scored
    pub fn average_score(&self) -> u32 {
        let scores: Vec<f64> = self.items().filter_map(|item| item.score).collect();
        if scores.is_empty() {
            return 0;
        }
        (scores.iter().sum::<f64>() / scores.len() as f64).round().max(0.0) as u32
    }

    /// Classify every item of `self` against the previous version, by id
    pub fn diff(&self, previous: Option<&Plan>) -> Vec<(String, ItemChange)> {
        let before: HashMap<&str, &PlanItem> = previous
            .map(|p| p.items().map(|item| (item.id.as_str(), item)).collect())
            .unwrap_or_default();

        self.items()
            .map(|item| {
                let change = match before.get(item.id.as_str()) {
                    None => ItemChange::Added,
                    Some(old) if item.status == ItemStatus::Done && old.status != ItemStatus::Done => {
                        ItemChange::Completed
                    }
                    Some(old) if old.content != item.content || old.evaluation != item.evaluation => {
                        ItemChange::Updated
                    }
                    Some(_) => ItemChange::Unchanged,
                };
                (item.id.clone(), change)
            })
            .collect()
    }
}

fn id_from_string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Int(i64),
        Float(f64),
    }

    Ok(match RawId::deserialize(deserializer)? {
        RawId::Text(s) => s,
        RawId::Int(n) => n.to_string(),
        RawId::Float(f) => f.to_string(),
    })
}

fn status_or_pending<'de, D>(deserializer: D) -> Result<ItemStatus, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(match raw.as_deref() {
        Some("done") => ItemStatus::Done,
        _ => ItemStatus::Pending,
    })
}
