//! Visual blocks handed to a render surface, plus per-agent decoration.

use serde::{Deserialize, Serialize};

use crate::verdict::VerdictView;

/// Neutral marker shown in a message bubble while the agent is "thinking".
pub const PLACEHOLDER_MARKER: &str = "…";

/// Body of a chat bubble.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "text", rename_all = "snake_case")]
pub enum MessageBody {
    /// Placeholder shown before the real text is revealed.
    Pending,
    /// Real text, visible.
    Resolved(String),
}

/// On-screen projection of one transcript entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageBlock {
    pub agent: String,
    pub body: MessageBody,
}

impl MessageBlock {
    pub fn pending(agent: impl Into<String>) -> Self {
        Self {
            agent: agent.into(),
            body: MessageBody::Pending,
        }
    }

    pub fn resolved(agent: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            agent: agent.into(),
            body: MessageBody::Resolved(text.into()),
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self.body, MessageBody::Pending)
    }

    /// Text the bubble currently shows.
    pub fn display_text(&self) -> &str {
        match &self.body {
            MessageBody::Pending => PLACEHOLDER_MARKER,
            MessageBody::Resolved(text) => text,
        }
    }
}

/// Non-message states of the display area.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "text", rename_all = "snake_case")]
pub enum Notice {
    /// Waiting for the backend.
    Loading(String),
    /// The backend returned zero turns.
    EmptyTranscript,
    /// No verdict available yet.
    AwaitingVerdict,
    /// The request failed; nothing else will be shown for this cycle.
    Failure(String),
}

impl Notice {
    pub fn text(&self) -> &str {
        match self {
            Self::Loading(text) | Self::Failure(text) => text,
            Self::EmptyTranscript => "Nothing to show: the agents returned no messages.",
            Self::AwaitingVerdict => "Awaiting conclusion...",
        }
    }
}

/// Anything a render surface can display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "block", rename_all = "snake_case")]
pub enum Block {
    Message(MessageBlock),
    Verdict(VerdictView),
    Notice(Notice),
}

impl Block {
    pub fn as_message(&self) -> Option<&MessageBlock> {
        match self {
            Self::Message(message) => Some(message),
            _ => None,
        }
    }

    pub fn as_verdict(&self) -> Option<&VerdictView> {
        match self {
            Self::Verdict(view) => Some(view),
            _ => None,
        }
    }

    pub fn as_notice(&self) -> Option<&Notice> {
        match self {
            Self::Notice(notice) => Some(notice),
            _ => None,
        }
    }
}

/// Avatar decoration for an agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AgentStyle {
    pub emoji: &'static str,
    /// CSS class used by the HTML export.
    pub color_class: &'static str,
    /// Terminal colour name, in dotted style syntax (`"magenta.bright"`).
    pub term_color: &'static str,
}

const FALLBACK_STYLE: AgentStyle = AgentStyle {
    emoji: "🧠",
    color_class: "bg-gray-600",
    term_color: "black.bright",
};

impl AgentStyle {
    /// Decoration for a known debate role, or a neutral fallback.
    pub fn for_agent(agent: &str) -> Self {
        let (emoji, color_class, term_color) = match agent {
            "Finance" => ("💰", "bg-amber-600", "yellow"),
            "Technical" => ("⚙️", "bg-sky-600", "cyan"),
            "Policy" => ("🏛️", "bg-violet-600", "magenta"),
            "Market" => ("📈", "bg-emerald-600", "green"),
            "Critic" => ("🔍", "bg-rose-600", "red"),
            "Pricing" => ("💵", "bg-indigo-600", "blue"),
            "Strategy" => ("🎯", "bg-fuchsia-600", "magenta.bright"),
            _ => return FALLBACK_STYLE,
        };
        Self {
            emoji,
            color_class,
            term_color,
        }
    }
}
