//! Transcript entries and normalization of the backend's wire shapes.
//!
//! The backend may send each turn either as a plain string or as an object
//! with optional `agent` and `text` fields. Everything is normalized here,
//! once, before the presenter sees it.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Agent name used when a turn does not say who spoke.
pub const DEFAULT_AGENT: &str = "Agent";

/// One agent turn, in debate order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TranscriptEntry {
    /// Speaking agent (e.g. "Finance", "Critic").
    pub agent: String,
    /// What the agent said. May be empty.
    pub text: String,
}

impl TranscriptEntry {
    pub fn new(agent: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            agent: agent.into(),
            text: text.into(),
        }
    }
}

/// A transcript item exactly as the backend sent it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawEntry {
    /// Bare text with no speaker.
    Text(String),
    /// `{ "agent": ..., "text": ... }`, either field possibly missing.
    Structured {
        #[serde(default)]
        agent: Option<String>,
        #[serde(default)]
        text: Option<String>,
    },
    /// Anything else (numbers, null, objects with non-string fields).
    Other(Value),
}

impl RawEntry {
    /// Normalize into a [`TranscriptEntry`] with declared defaults:
    /// missing or blank agent becomes [`DEFAULT_AGENT`], missing text
    /// becomes the empty string.
    pub fn normalize(self) -> TranscriptEntry {
        match self {
            Self::Text(text) => TranscriptEntry::new(DEFAULT_AGENT, text),
            Self::Structured { agent, text } => {
                TranscriptEntry::new(agent_or_default(agent), text.unwrap_or_default())
            }
            Self::Other(value) => normalize_value(value),
        }
    }
}

impl From<RawEntry> for TranscriptEntry {
    fn from(raw: RawEntry) -> Self {
        raw.normalize()
    }
}

impl From<&str> for RawEntry {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<TranscriptEntry> for RawEntry {
    fn from(entry: TranscriptEntry) -> Self {
        Self::Structured {
            agent: Some(entry.agent),
            text: Some(entry.text),
        }
    }
}

/// Normalize a whole transcript. `None` is treated as empty; order is kept.
pub fn normalize_transcript(raw: Option<Vec<RawEntry>>) -> Vec<TranscriptEntry> {
    raw.unwrap_or_default()
        .into_iter()
        .map(RawEntry::normalize)
        .collect()
}

fn agent_or_default(agent: Option<String>) -> String {
    match agent {
        Some(name) if !name.trim().is_empty() => name,
        _ => DEFAULT_AGENT.to_string(),
    }
}

fn normalize_value(value: Value) -> TranscriptEntry {
    match value {
        Value::Null => TranscriptEntry::new(DEFAULT_AGENT, ""),
        Value::String(text) => TranscriptEntry::new(DEFAULT_AGENT, text),
        Value::Object(map) => {
            let agent = map.get("agent").and_then(Value::as_str).map(str::to_string);
            let text = match map.get("text") {
                Some(Value::String(s)) => s.clone(),
                Some(Value::Null) | None => String::new(),
                Some(other) => other.to_string(),
            };
            TranscriptEntry::new(agent_or_default(agent), text)
        }
        other => TranscriptEntry::new(DEFAULT_AGENT, other.to_string()),
    }
}
