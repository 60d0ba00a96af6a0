//! Judge verdict: the wire shape, recommendation parsing and the normalized
//! view the presenter renders.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Number, Value};

/// Final recommendation of the judge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Recommendation {
    Accept,
    Reject,
    /// Used whenever the judge gave no recognizable recommendation.
    #[default]
    Modify,
}

impl Recommendation {
    /// Parse a raw recommendation. Case and surrounding whitespace are
    /// ignored; anything unrecognized (or absent) is `Modify`.
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(|s| s.trim().to_ascii_lowercase()).as_deref() {
            Some("accept") => Self::Accept,
            Some("reject") => Self::Reject,
            _ => Self::Modify,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Accept => "accept",
            Self::Reject => "reject",
            Self::Modify => "modify",
        }
    }
}

impl std::fmt::Display for Recommendation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Judge verdict as the backend sends it. Every field is optional and
/// tolerant of unexpected JSON types.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JudgeVerdict {
    #[serde(default, deserialize_with = "lenient_text")]
    pub final_recommendation: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub reason: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub summary_of_arguments: Option<String>,
    /// Agent → score, in the order the backend listed them.
    #[serde(default, deserialize_with = "lenient_scores")]
    pub scores: Map<String, Value>,
}

impl JudgeVerdict {
    /// Verdict carrying only a reason, everything else defaulted.
    pub fn with_reason(reason: impl Into<String>) -> Self {
        Self {
            reason: Some(reason.into()),
            ..Self::default()
        }
    }
}

/// A score exactly as given: numbers stay numbers, everything else is text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ScoreValue {
    Number(Number),
    Text(String),
}

impl From<&Value> for ScoreValue {
    fn from(value: &Value) -> Self {
        match value {
            Value::Number(n) => Self::Number(n.clone()),
            Value::String(s) => Self::Text(s.clone()),
            other => Self::Text(other.to_string()),
        }
    }
}

impl std::fmt::Display for ScoreValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{}", n),
            Self::Text(s) => write!(f, "{}", s),
        }
    }
}

/// One row of the score table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreRow {
    pub agent: String,
    pub score: ScoreValue,
}

/// Normalized verdict with every default applied. This is what gets drawn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerdictView {
    pub recommendation: Recommendation,
    pub reason: String,
    pub summary: String,
    pub scores: Vec<ScoreRow>,
}

/// Apply the declared defaults to a wire verdict.
pub fn normalize_verdict(verdict: &JudgeVerdict) -> VerdictView {
    VerdictView {
        recommendation: Recommendation::parse(verdict.final_recommendation.as_deref()),
        reason: verdict.reason.clone().unwrap_or_default(),
        summary: verdict.summary_of_arguments.clone().unwrap_or_default(),
        scores: verdict
            .scores
            .iter()
            .map(|(agent, score)| ScoreRow {
                agent: agent.clone(),
                score: ScoreValue::from(score),
            })
            .collect(),
    }
}

fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Null => None,
        Value::String(s) => Some(s),
        other => Some(other.to_string()),
    })
}

fn lenient_scores<'de, D>(deserializer: D) -> Result<Map<String, Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Object(map) => map,
        _ => Map::new(),
    })
}
