use crate::content::Content;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// One record of a timeline file: what to show, with what content, and for how long
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TimelineEntry {
    #[serde(default, deserialize_with = "template_name_lenient")]
    pub template_name: String,
    #[serde(default)]
    pub content: Content,
    #[serde(default)]
    pub start_time: f64,
    #[serde(default)]
    pub end_time: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<f64>,
}

/// Null and non-string names decode to a name no template answers to,
/// so the entry is skipped instead of failing the whole file
fn template_name_lenient<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(name) => name,
        Value::Null => String::new(),
        other => other.to_string(),
    })
}

impl TimelineEntry {
    pub fn new(template_name: impl Into<String>, content: Content, start: f64, end: f64) -> Self {
        Self {
            template_name: template_name.into(),
            content,
            start_time: start,
            end_time: end,
            timestamp: None,
        }
    }

    pub fn duration(&self) -> f64 {
        self.end_time - self.start_time
    }

    /// Value handed to the template constructor; falls back to the start time
    pub fn timestamp(&self) -> f64 {
        self.timestamp.unwrap_or(self.start_time)
    }

    pub fn is_playable(&self) -> bool {
        self.duration() > 0.0
    }
}
