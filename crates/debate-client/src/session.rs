//! Client session: the upload and debate flows, glued to the presenter.

use std::path::PathBuf;
use std::time::Duration;

use debate_presenter::{
    normalize_transcript, JudgeVerdict, PresentOutcome, RenderSurface, StreamingPresenter,
    VerdictRender,
};
use tracing::{info, warn};

use crate::transport::{upload_name, DebateResult, DebateTransport, TransportError};

/// Shown while the backend runs the debate.
pub const LOADING_TEXT: &str = "Starting debate: agents are preparing...";

/// Error from a session flow.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Enter a decision first")]
    EmptyDecision,

    #[error("No files selected")]
    NoFiles,

    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// Result of a successful upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadReport {
    /// Documents the backend accepted in this upload.
    pub added_files: usize,
    /// Every file name uploaded during this session so far.
    pub uploaded: Vec<String>,
}

impl UploadReport {
    pub fn status_line(&self) -> String {
        format!("Uploaded {} files.", self.added_files)
    }
}

/// Result of a presented debate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DebateReport {
    pub outcome: PresentOutcome,
    /// Entries in the transcript after normalization.
    pub entries: usize,
    /// `None` when the reveal was superseded and the verdict skipped.
    pub verdict: Option<VerdictRender>,
}

/// One user's session against the backend.
pub struct ClientSession<T, S> {
    transport: T,
    presenter: StreamingPresenter<S>,
    per_message_delay: Duration,
    uploaded_files: Vec<String>,
    current_verdict: Option<JudgeVerdict>,
}

impl<T: DebateTransport, S: RenderSurface> ClientSession<T, S> {
    pub fn new(transport: T, presenter: StreamingPresenter<S>, per_message_delay: Duration) -> Self {
        Self {
            transport,
            presenter,
            per_message_delay,
            uploaded_files: Vec::new(),
            current_verdict: None,
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn presenter(&self) -> &StreamingPresenter<S> {
        &self.presenter
    }

    pub fn into_presenter(self) -> StreamingPresenter<S> {
        self.presenter
    }

    /// File names uploaded so far, oldest first.
    pub fn uploaded_files(&self) -> &[String] {
        &self.uploaded_files
    }

    /// Verdict of the last debate whose reveal completed.
    pub fn current_verdict(&self) -> Option<&JudgeVerdict> {
        self.current_verdict.as_ref()
    }

    /// Upload documents and remember their names on success.
    pub async fn upload(&mut self, paths: &[PathBuf]) -> Result<UploadReport, SessionError> {
        if paths.is_empty() {
            return Err(SessionError::NoFiles);
        }

        let receipt = match self.transport.upload_documents(paths).await {
            Ok(receipt) => receipt,
            Err(e) => {
                warn!(error = %e, files = paths.len(), "upload failed");
                return Err(e.into());
            }
        };

        self.uploaded_files
            .extend(paths.iter().map(|p| upload_name(p)));
        info!(
            added = receipt.added_files,
            total = self.uploaded_files.len(),
            "documents uploaded"
        );
        Ok(UploadReport {
            added_files: receipt.added_files,
            uploaded: self.uploaded_files.clone(),
        })
    }

    /// Submit `decision`, then reveal the transcript and verdict.
    ///
    /// On transport failure the surface shows a failure notice and nothing
    /// from the failed run is presented.
    pub async fn start_debate(&mut self, decision: &str) -> Result<DebateReport, SessionError> {
        let decision = decision.trim();
        if decision.is_empty() {
            return Err(SessionError::EmptyDecision);
        }

        self.current_verdict = None;
        self.presenter.show_loading(LOADING_TEXT);

        let result = match self.transport.submit_decision(decision).await {
            Ok(result) => result,
            Err(e) => {
                self.presenter.show_failure(&format!("Debate failed: {}", e));
                return Err(e.into());
            }
        };

        Ok(self.present_result(result).await)
    }

    /// Reveal an already fetched result (live or replayed).
    pub async fn present_result(&mut self, result: DebateResult) -> DebateReport {
        let entries = normalize_transcript(result.transcript);
        let count = entries.len();

        let outcome = self.presenter.present(entries, self.per_message_delay).await;
        let verdict = self.settle_verdict(outcome, result.judge);

        info!(entries = count, ?outcome, ?verdict, "debate presented");
        DebateReport {
            outcome,
            entries: count,
            verdict,
        }
    }

    /// Render and keep the verdict of a completed reveal. A superseded
    /// reveal leaves both the surface and `current_verdict` alone.
    fn settle_verdict(
        &mut self,
        outcome: PresentOutcome,
        judge: Option<JudgeVerdict>,
    ) -> Option<VerdictRender> {
        if !outcome.is_completed() {
            return None;
        }
        let render = self.presenter.render_verdict(judge.as_ref());
        self.current_verdict = judge;
        Some(render)
    }
}
