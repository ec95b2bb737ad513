use crate::EventId;
use serde::{Deserialize, Serialize};

/// Characters of event activity copied into an edge label suggestion.
pub const LABEL_SUGGESTION_CHARS: usize = 80;

/// Timeline entry offered as an optional cross-link when drawing an edge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineEvent {
    pub id: EventId,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub activity: String,
    #[serde(default)]
    pub hostname: Option<String>,
    #[serde(default)]
    pub mitre_tactic: Option<String>,
    #[serde(default)]
    pub mitre_technique: Option<String>,
}

impl TimelineEvent {
    pub fn label_suggestion(&self) -> String {
        self.activity.chars().take(LABEL_SUGGESTION_CHARS).collect()
    }
}
