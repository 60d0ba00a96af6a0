//! Debate Presenter Library
//!
//! Sequential streaming-render pipeline for multi-agent debate results:
//! - Transcript and judge-verdict models with total normalization of the
//!   backend's loose wire shapes
//! - A pluggable render surface seam (`RenderSurface`) with an in-memory
//!   implementation
//! - `StreamingPresenter`: reveals entries one at a time (pending placeholder,
//!   then text), guarded by a generation token so a newer cycle always wins
//! - Markup escaping and HTML export of a presented cycle
//!
//! # Usage
//!
//! ```no_run
//! use std::time::Duration;
//! use debate_presenter::{MemorySurface, StreamingPresenter, TranscriptEntry, JudgeVerdict};
//!
//! # async fn run() {
//! let presenter = StreamingPresenter::new(MemorySurface::new());
//! let transcript = vec![TranscriptEntry::new("Finance", "Costs are within budget.")];
//! presenter.present(transcript, Duration::from_millis(900)).await;
//! presenter.render_verdict(Some(&JudgeVerdict::with_reason("Low risk.")));
//! # }
//! ```

pub mod block;
pub mod cycle;
pub mod markup;
pub mod presenter;
pub mod surface;
pub mod transcript;
pub mod verdict;

pub use block::{AgentStyle, Block, MessageBlock, MessageBody, Notice, PLACEHOLDER_MARKER};
pub use cycle::{PhaseTransition, PresentationCycle, PresentationPhase, TransitionError};
pub use markup::{escape_markup, render_block_html, render_document, text_to_markup};
pub use presenter::{
    PresentOutcome, PresenterConfig, StreamingPresenter, VerdictRender, DEFAULT_INTER_MESSAGE_GAP,
    DEFAULT_MAX_ITEM_DELAY,
};
pub use surface::{BlockHandle, MemorySurface, RenderSurface, SurfaceOp};
pub use transcript::{normalize_transcript, RawEntry, TranscriptEntry, DEFAULT_AGENT};
pub use verdict::{
    normalize_verdict, JudgeVerdict, Recommendation, ScoreRow, ScoreValue, VerdictView,
};
