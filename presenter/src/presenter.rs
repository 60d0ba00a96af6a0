//! Streaming presenter: reveals a transcript one entry at a time, then
//! renders the judge verdict.
//!
//! Each entry first appears as a pending placeholder, stays there for the
//! (capped) per-item delay, then resolves to its real text. A short gap
//! separates consecutive entries. Starting a new cycle bumps the generation
//! token; a run that wakes up under an older generation exits without
//! touching the surface.

use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::block::{Block, MessageBlock, Notice};
use crate::cycle::{PhaseTransition, PresentationCycle, PresentationPhase};
use crate::surface::{BlockHandle, RenderSurface};
use crate::transcript::{normalize_transcript, RawEntry, TranscriptEntry};
use crate::verdict::{normalize_verdict, JudgeVerdict};

/// Longest a single entry may stay pending, whatever the caller asks for.
pub const DEFAULT_MAX_ITEM_DELAY: Duration = Duration::from_millis(1200);

/// Pause between one entry resolving and the next placeholder appearing.
pub const DEFAULT_INTER_MESSAGE_GAP: Duration = Duration::from_millis(200);

/// Timing of a presenter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresenterConfig {
    /// Can lower the per-item cap; values above [`DEFAULT_MAX_ITEM_DELAY`]
    /// have no effect.
    pub max_item_delay: Duration,
    pub inter_message_gap: Duration,
}

impl Default for PresenterConfig {
    fn default() -> Self {
        Self {
            max_item_delay: DEFAULT_MAX_ITEM_DELAY,
            inter_message_gap: DEFAULT_INTER_MESSAGE_GAP,
        }
    }
}

impl PresenterConfig {
    /// Per-item delay actually applied for a requested one. Never above
    /// [`DEFAULT_MAX_ITEM_DELAY`].
    pub fn effective_delay(&self, requested: Duration) -> Duration {
        requested
            .min(self.max_item_delay)
            .min(DEFAULT_MAX_ITEM_DELAY)
    }
}

/// How a call to [`StreamingPresenter::present`] ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PresentOutcome {
    /// Every entry was revealed.
    Completed { revealed: usize },
    /// A newer cycle started first; `revealed` entries had resolved.
    Superseded { revealed: usize },
}

impl PresentOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed { .. })
    }

    pub fn revealed(&self) -> usize {
        match self {
            Self::Completed { revealed } | Self::Superseded { revealed } => *revealed,
        }
    }
}

/// What [`StreamingPresenter::render_verdict`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VerdictRender {
    /// The verdict is on screen.
    Shown,
    /// No verdict given; the "awaiting conclusion" placeholder is shown.
    Awaiting,
    /// A reveal is running; the verdict will show once it finishes.
    Deferred,
}

struct Stage<S> {
    surface: S,
    cycle: PresentationCycle,
    verdict_slot: Option<BlockHandle>,
    deferred_verdict: Option<Option<JudgeVerdict>>,
}

impl<S: RenderSurface> Stage<S> {
    fn begin_cycle(&mut self, total_entries: usize, reason: &str) -> u64 {
        let generation = self.cycle.restart(total_entries, reason);
        self.surface.clear();
        self.verdict_slot = None;
        self.deferred_verdict = None;
        generation
    }

    fn advance(&mut self, to: PresentationPhase, reason: &str) {
        if let Err(e) = self.cycle.transition(to, reason) {
            warn!(error = %e, "presentation cycle out of step");
        }
    }

    /// Transcript fully revealed: wait for a verdict, or show the one that
    /// arrived during the reveal.
    fn finish_reveal(&mut self) {
        self.advance(PresentationPhase::AllRevealed, "every entry revealed");
        self.advance(PresentationPhase::VerdictPending, "awaiting verdict");
        if let Some(verdict) = self.deferred_verdict.take() {
            self.show_verdict(verdict.as_ref());
        }
    }

    fn place_verdict_block(&mut self, block: Block) {
        if let Some(handle) = self.verdict_slot {
            self.surface.update_block(handle, block);
        } else {
            let handle = self.surface.append_block(block);
            self.verdict_slot = Some(handle);
        }
        self.surface.scroll_to_latest();
    }

    fn show_verdict(&mut self, verdict: Option<&JudgeVerdict>) -> VerdictRender {
        match verdict {
            None => {
                self.place_verdict_block(Block::Notice(Notice::AwaitingVerdict));
                if self.cycle.phase() != PresentationPhase::VerdictPending {
                    self.advance(PresentationPhase::VerdictPending, "no verdict yet");
                }
                VerdictRender::Awaiting
            }
            Some(verdict) => {
                let view = normalize_verdict(verdict);
                info!(recommendation = %view.recommendation, scores = view.scores.len(), "verdict rendered");
                self.place_verdict_block(Block::Verdict(view));
                self.advance(PresentationPhase::VerdictShown, "verdict rendered");
                VerdictRender::Shown
            }
        }
    }
}

/// Reveals transcripts on a [`RenderSurface`].
///
/// All surface mutations happen under one lock and the lock is never held
/// across a suspension point, so two overlapping `present` calls cannot
/// interleave their mutations.
pub struct StreamingPresenter<S> {
    stage: Mutex<Stage<S>>,
    config: PresenterConfig,
}

impl<S: RenderSurface> StreamingPresenter<S> {
    pub fn new(surface: S) -> Self {
        Self::with_config(surface, PresenterConfig::default())
    }

    pub fn with_config(surface: S, config: PresenterConfig) -> Self {
        Self {
            stage: Mutex::new(Stage {
                surface,
                cycle: PresentationCycle::new(),
                verdict_slot: None,
                deferred_verdict: None,
            }),
            config,
        }
    }

    pub fn config(&self) -> PresenterConfig {
        self.config
    }

    fn stage(&self) -> MutexGuard<'_, Stage<S>> {
        // A panic inside a surface call must not wedge later cycles.
        self.stage.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Reveal `transcript` in order, then wait for the verdict.
    ///
    /// Clears the surface first. Each entry is shown pending for
    /// `min(per_item_delay, max_item_delay)`, then resolved, followed by the
    /// inter-message gap. Returns early with [`PresentOutcome::Superseded`]
    /// if another cycle starts meanwhile.
    pub async fn present(
        &self,
        transcript: Vec<TranscriptEntry>,
        per_item_delay: Duration,
    ) -> PresentOutcome {
        let total = transcript.len();
        let delay = self.config.effective_delay(per_item_delay);

        let generation = {
            let mut stage = self.stage();
            let generation = stage.begin_cycle(total, "present");
            if total == 0 {
                stage.surface.append_block(Block::Notice(Notice::EmptyTranscript));
                stage.finish_reveal();
                info!(generation, "transcript empty, nothing to reveal");
                return PresentOutcome::Completed { revealed: 0 };
            }
            generation
        };
        info!(
            generation,
            entries = total,
            delay_ms = delay.as_millis() as u64,
            "presenting transcript"
        );

        for (index, entry) in transcript.into_iter().enumerate() {
            let handle = {
                let mut stage = self.stage();
                if !stage.cycle.is_current(generation) {
                    return superseded(generation, index);
                }
                let handle = stage
                    .surface
                    .append_block(Block::Message(MessageBlock::pending(entry.agent.clone())));
                stage.advance(
                    PresentationPhase::RevealingEntry {
                        index,
                        pending: true,
                    },
                    "placeholder shown",
                );
                stage.surface.scroll_to_latest();
                handle
            };

            tokio::time::sleep(delay).await;

            {
                let mut stage = self.stage();
                if !stage.cycle.is_current(generation) {
                    return superseded(generation, index);
                }
                debug!(generation, index, agent = %entry.agent, "entry resolved");
                stage.surface.update_block(
                    handle,
                    Block::Message(MessageBlock::resolved(entry.agent, entry.text)),
                );
                stage.advance(
                    PresentationPhase::RevealingEntry {
                        index,
                        pending: false,
                    },
                    "text revealed",
                );
                stage.surface.scroll_to_latest();
            }

            tokio::time::sleep(self.config.inter_message_gap).await;

            if index + 1 == total {
                let mut stage = self.stage();
                if !stage.cycle.is_current(generation) {
                    return superseded(generation, total);
                }
                stage.finish_reveal();
            }
        }

        info!(generation, entries = total, "transcript fully presented");
        PresentOutcome::Completed { revealed: total }
    }

    /// Normalize wire entries (plain strings or objects), then [`present`](Self::present).
    pub async fn present_raw(
        &self,
        transcript: Option<Vec<RawEntry>>,
        per_item_delay: Duration,
    ) -> PresentOutcome {
        self.present(normalize_transcript(transcript), per_item_delay)
            .await
    }

    /// Render the judge verdict, replacing whatever verdict was shown before.
    ///
    /// `None` shows the "awaiting conclusion" placeholder. While a reveal is
    /// running the verdict is held back and rendered when the last entry
    /// resolves.
    pub fn render_verdict(&self, verdict: Option<&JudgeVerdict>) -> VerdictRender {
        let mut stage = self.stage();
        if stage.cycle.phase().is_revealing() {
            debug!(
                generation = stage.cycle.generation(),
                "verdict deferred until transcript is revealed"
            );
            stage.deferred_verdict = Some(verdict.cloned());
            return VerdictRender::Deferred;
        }
        stage.show_verdict(verdict)
    }

    /// Clear the surface and show a loading notice. Supersedes any reveal.
    pub fn show_loading(&self, text: &str) {
        self.show_notice(Notice::Loading(text.to_string()), "loading");
    }

    /// Clear the surface and show a failure notice. Supersedes any reveal.
    pub fn show_failure(&self, text: &str) {
        warn!(message = text, "showing failure state");
        self.show_notice(Notice::Failure(text.to_string()), "failure");
    }

    fn show_notice(&self, notice: Notice, reason: &str) {
        let mut stage = self.stage();
        stage.begin_cycle(0, reason);
        stage.surface.append_block(Block::Notice(notice));
        stage.surface.scroll_to_latest();
        stage.advance(PresentationPhase::Idle, reason);
    }

    pub fn phase(&self) -> PresentationPhase {
        self.stage().cycle.phase()
    }

    pub fn generation(&self) -> u64 {
        self.stage().cycle.generation()
    }

    /// Transitions of the current cycle.
    pub fn transitions(&self) -> Vec<PhaseTransition> {
        self.stage().cycle.transitions().to_vec()
    }

    /// Compact status line of the current cycle.
    pub fn status_line(&self) -> String {
        self.stage().cycle.status_line()
    }

    /// Inspect the surface without mutating it.
    pub fn with_surface<R>(&self, f: impl FnOnce(&S) -> R) -> R {
        f(&self.stage().surface)
    }

    pub fn into_surface(self) -> S {
        self.stage
            .into_inner()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .surface
    }
}

fn superseded(generation: u64, revealed: usize) -> PresentOutcome {
    info!(generation, revealed, "presentation superseded by a newer cycle");
    PresentOutcome::Superseded { revealed }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::MemorySurface;

    #[test]
    fn test_delay_is_capped() {
        let config = PresenterConfig::default();
        assert_eq!(
            config.effective_delay(Duration::from_millis(5000)),
            Duration::from_millis(1200)
        );
        assert_eq!(
            config.effective_delay(Duration::from_millis(900)),
            Duration::from_millis(900)
        );
        assert_eq!(config.effective_delay(Duration::ZERO), Duration::ZERO);
    }

    #[test]
    fn test_configured_cap_cannot_exceed_default() {
        let raised = PresenterConfig {
            max_item_delay: Duration::from_millis(5000),
            ..PresenterConfig::default()
        };
        assert_eq!(
            raised.effective_delay(Duration::from_millis(5000)),
            DEFAULT_MAX_ITEM_DELAY
        );

        let lowered = PresenterConfig {
            max_item_delay: Duration::from_millis(300),
            ..PresenterConfig::default()
        };
        assert_eq!(
            lowered.effective_delay(Duration::from_millis(900)),
            Duration::from_millis(300)
        );
    }

    #[test]
    fn test_verdict_without_present() {
        let presenter = StreamingPresenter::new(MemorySurface::new());
        let render = presenter.render_verdict(Some(&JudgeVerdict::with_reason("fine")));
        assert_eq!(render, VerdictRender::Shown);
        assert_eq!(presenter.phase(), PresentationPhase::VerdictShown);
        presenter.with_surface(|s| {
            assert_eq!(s.len(), 1);
            assert!(s.snapshot()[0].as_verdict().is_some());
        });
    }

    #[test]
    fn test_verdict_none_shows_awaiting_and_replaces() {
        let presenter = StreamingPresenter::new(MemorySurface::new());
        presenter.render_verdict(Some(&JudgeVerdict::with_reason("first")));
        let render = presenter.render_verdict(None);
        assert_eq!(render, VerdictRender::Awaiting);
        presenter.with_surface(|s| {
            assert_eq!(
                s.snapshot(),
                vec![Block::Notice(Notice::AwaitingVerdict)]
            );
        });
        assert_eq!(presenter.phase(), PresentationPhase::VerdictPending);
    }

    #[test]
    fn test_failure_notice_supersedes() {
        let presenter = StreamingPresenter::new(MemorySurface::new());
        presenter.show_loading("waiting");
        let before = presenter.generation();
        presenter.show_failure("HTTP 500");
        assert!(presenter.generation() > before);
        assert_eq!(presenter.phase(), PresentationPhase::Idle);
        let surface = presenter.into_surface();
        assert_eq!(
            surface.snapshot(),
            vec![Block::Notice(Notice::Failure("HTTP 500".into()))]
        );
    }

    #[test]
    fn test_outcome_accessors() {
        assert!(PresentOutcome::Completed { revealed: 2 }.is_completed());
        assert!(!PresentOutcome::Superseded { revealed: 1 }.is_completed());
        assert_eq!(PresentOutcome::Superseded { revealed: 1 }.revealed(), 1);
    }
}
