//! Presentation cycle state machine: phases, transitions and history.
//!
//! ```text
//! Idle → Clearing → RevealingEntry(0, pending) → RevealingEntry(0, resolved)
//!                 │       → RevealingEntry(1, pending) → ... → AllRevealed
//!                 │                                              │
//!                 └─ empty transcript ──────────────────────────┘
//!                                                                ▼
//!                                          VerdictPending → VerdictShown
//!
//! Any phase → Clearing when a fresh cycle starts.
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Phase of one presentation cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum PresentationPhase {
    /// Nothing being presented.
    Idle,
    /// Surface cleared, no entry shown yet.
    Clearing,
    /// Entry `index` is on screen; `pending` while its placeholder shows.
    RevealingEntry { index: usize, pending: bool },
    /// Every entry has been revealed.
    AllRevealed,
    /// Transcript done, verdict not rendered yet.
    VerdictPending,
    /// Verdict on screen.
    VerdictShown,
}

impl PresentationPhase {
    /// Whether a transcript reveal is in progress.
    pub fn is_revealing(self) -> bool {
        matches!(self, Self::Clearing | Self::RevealingEntry { .. })
    }

    /// Whether `to` is a legal next phase for a cycle of `total` entries.
    pub fn can_transition_to(self, to: Self, total: usize) -> bool {
        use PresentationPhase::*;
        match (self, to) {
            (_, Clearing) => true,
            (Clearing, Idle) => true,
            (Clearing, RevealingEntry { index: 0, pending: true }) => total > 0,
            (Clearing, AllRevealed) => total == 0,
            (
                RevealingEntry { index: i, pending: true },
                RevealingEntry { index: j, pending: false },
            ) => i == j,
            (
                RevealingEntry { index: i, pending: false },
                RevealingEntry { index: j, pending: true },
            ) => j == i + 1 && j < total,
            (RevealingEntry { index, pending: false }, AllRevealed) => index + 1 == total,
            (AllRevealed, VerdictPending) => true,
            (Idle | VerdictShown, VerdictPending) => true,
            (Idle | VerdictPending | VerdictShown, VerdictShown) => true,
            _ => false,
        }
    }
}

impl std::fmt::Display for PresentationPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Clearing => write!(f, "clearing"),
            Self::RevealingEntry { index, pending } => write!(
                f,
                "revealing_entry({}, {})",
                index,
                if *pending { "pending" } else { "resolved" }
            ),
            Self::AllRevealed => write!(f, "all_revealed"),
            Self::VerdictPending => write!(f, "verdict_pending"),
            Self::VerdictShown => write!(f, "verdict_shown"),
        }
    }
}

/// A phase transition record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhaseTransition {
    pub from: PresentationPhase,
    pub to: PresentationPhase,
    pub timestamp: DateTime<Utc>,
    pub reason: String,
}

/// Error for invalid phase transitions.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid transition {from} → {to}: {reason}")]
pub struct TransitionError {
    pub from: PresentationPhase,
    pub to: PresentationPhase,
    pub reason: String,
}

/// State of the current presentation cycle.
///
/// The generation increments every time a cycle restarts; a reveal that
/// captured an older generation has been superseded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PresentationCycle {
    generation: u64,
    phase: PresentationPhase,
    total_entries: usize,
    transitions: Vec<PhaseTransition>,
}

impl Default for PresentationCycle {
    fn default() -> Self {
        Self::new()
    }
}

impl PresentationCycle {
    pub fn new() -> Self {
        Self {
            generation: 0,
            phase: PresentationPhase::Idle,
            total_entries: 0,
            transitions: Vec::new(),
        }
    }

    /// Start a fresh cycle of `total_entries` entries. Returns the new
    /// generation token.
    pub fn restart(&mut self, total_entries: usize, reason: &str) -> u64 {
        let from = self.phase;
        self.generation += 1;
        self.total_entries = total_entries;
        self.transitions.clear();
        self.transitions.push(PhaseTransition {
            from,
            to: PresentationPhase::Clearing,
            timestamp: Utc::now(),
            reason: reason.to_string(),
        });
        self.phase = PresentationPhase::Clearing;
        self.generation
    }

    /// Move to a new phase with a reason.
    pub fn transition(&mut self, to: PresentationPhase, reason: &str) -> Result<(), TransitionError> {
        if !self.phase.can_transition_to(to, self.total_entries) {
            return Err(TransitionError {
                from: self.phase,
                to,
                reason: format!("not a valid transition for {} entries", self.total_entries),
            });
        }

        self.transitions.push(PhaseTransition {
            from: self.phase,
            to,
            timestamp: Utc::now(),
            reason: reason.to_string(),
        });
        self.phase = to;
        Ok(())
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn phase(&self) -> PresentationPhase {
        self.phase
    }

    pub fn total_entries(&self) -> usize {
        self.total_entries
    }

    /// Transitions of the current cycle, oldest first.
    pub fn transitions(&self) -> &[PhaseTransition] {
        &self.transitions
    }

    /// Whether `generation` is still the live cycle.
    pub fn is_current(&self, generation: u64) -> bool {
        self.generation == generation
    }

    /// Compact status line.
    pub fn status_line(&self) -> String {
        format!(
            "[{}] generation {} | {} entries | {} transitions",
            self.phase,
            self.generation,
            self.total_entries,
            self.transitions.len()
        )
    }
}
