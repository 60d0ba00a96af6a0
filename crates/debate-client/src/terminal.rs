//! Terminal render surface.
//!
//! Each block is printed as it arrives and mirrored into a `MemorySurface`
//! for later export. A pending bubble is left on an open line so resolving
//! it can rewrite that line. On an interactive terminal, clearing erases
//! every row printed since the previous clear; on a pipe or file a blank
//! line separates cycles instead.

use std::io::{self, Write};

use console::{measure_text_width, Style, Term};
use debate_presenter::{
    AgentStyle, Block, BlockHandle, MemorySurface, MessageBlock, Notice, RenderSurface,
    VerdictView,
};
use tracing::warn;

/// Output a [`TerminalSurface`] writes to.
pub trait Screen: Write {
    /// Whether rows already written can be erased.
    fn is_interactive(&self) -> bool;

    /// Width used to count wrapped rows, if known.
    fn columns(&self) -> Option<usize> {
        None
    }

    /// Erase the cursor's row and move to its start.
    fn erase_line(&mut self) -> io::Result<()>;

    /// Erase the `n` rows above the cursor, leaving it on the topmost.
    fn erase_last_lines(&mut self, n: usize) -> io::Result<()>;
}

impl Screen for Term {
    fn is_interactive(&self) -> bool {
        self.is_term()
    }

    fn columns(&self) -> Option<usize> {
        self.size_checked().map(|(_, cols)| cols as usize)
    }

    fn erase_line(&mut self) -> io::Result<()> {
        self.clear_line()
    }

    fn erase_last_lines(&mut self, n: usize) -> io::Result<()> {
        self.clear_last_lines(n)
    }
}

/// Plain byte sink: nothing can be erased.
impl Screen for Vec<u8> {
    fn is_interactive(&self) -> bool {
        false
    }

    fn erase_line(&mut self) -> io::Result<()> {
        Ok(())
    }

    fn erase_last_lines(&mut self, _n: usize) -> io::Result<()> {
        Ok(())
    }
}

/// [`RenderSurface`] that writes to a terminal (or any [`Screen`]).
pub struct TerminalSurface<W: Screen> {
    out: W,
    color: bool,
    mirror: MemorySurface,
    /// Pending bubble whose line is still open.
    open_line: Option<BlockHandle>,
    /// Completed rows printed since the last clear.
    printed_rows: usize,
    /// Display width of the row being written.
    row_width: usize,
}

impl TerminalSurface<Term> {
    /// Surface on stdout. Colour is also dropped when stdout cannot show it.
    pub fn stdout(color: bool) -> Self {
        Self::new(Term::stdout(), color && console::colors_enabled())
    }
}

impl<W: Screen> TerminalSurface<W> {
    pub fn new(out: W, color: bool) -> Self {
        Self {
            out,
            color,
            mirror: MemorySurface::new(),
            open_line: None,
            printed_rows: 0,
            row_width: 0,
        }
    }

    /// Blocks as currently displayed.
    pub fn mirror(&self) -> &MemorySurface {
        &self.mirror
    }

    pub fn into_writer(self) -> W {
        self.out
    }

    fn emit(&mut self, text: &str) {
        if let Err(e) = self.out.write_all(text.as_bytes()) {
            warn!(error = %e, "failed to write to terminal");
            return;
        }
        let mut segments = text.split('\n').peekable();
        while let Some(segment) = segments.next() {
            self.row_width += measure_text_width(segment);
            if segments.peek().is_some() {
                let rows = self.wrapped_rows(self.row_width);
                self.printed_rows += rows;
                self.row_width = 0;
            }
        }
    }

    fn wrapped_rows(&self, width: usize) -> usize {
        match self.out.columns() {
            Some(cols) if cols > 0 && width > cols => width.div_ceil(cols),
            _ => 1,
        }
    }

    fn close_open_line(&mut self) {
        if self.open_line.take().is_some() {
            self.emit("\n");
        }
    }

    /// Erase everything printed since the last clear.
    fn erase_cycle(&mut self) -> io::Result<()> {
        self.out.erase_line()?;
        if self.printed_rows > 0 {
            self.out.erase_last_lines(self.printed_rows)?;
        }
        Ok(())
    }

    fn style(&self, spec: &str) -> Style {
        Style::from_dotted_str(spec).force_styling(self.color)
    }

    fn message_header(&self, message: &MessageBlock) -> String {
        let agent_style = AgentStyle::for_agent(&message.agent);
        format!(
            "{} {}\n",
            agent_style.emoji,
            self.style(agent_style.term_color).bold().apply_to(&message.agent)
        )
    }

    fn message_body(&self, message: &MessageBlock) -> String {
        if message.is_pending() {
            format!("  {}", self.style("dim").apply_to(message.display_text()))
        } else {
            format!("{}\n", indent(message.display_text()))
        }
    }

    fn render(&self, block: &Block) -> String {
        match block {
            Block::Message(message) => {
                format!("{}{}", self.message_header(message), self.message_body(message))
            }
            Block::Verdict(view) => self.render_verdict(view),
            Block::Notice(notice) => self.render_notice(notice),
        }
    }

    fn render_verdict(&self, view: &VerdictView) -> String {
        let bold = self.style("bold");
        let mut text = format!("\n{}\n", bold.apply_to("== Judge verdict =="));
        text.push_str(&format!(
            "Recommendation: {}\n",
            bold.apply_to(view.recommendation.as_str().to_uppercase())
        ));
        if !view.reason.is_empty() {
            text.push_str(&format!("Reason:\n{}\n", indent(&view.reason)));
        }
        if !view.summary.is_empty() {
            text.push_str(&format!("Summary of arguments:\n{}\n", indent(&view.summary)));
        }
        if !view.scores.is_empty() {
            let width = view.scores.iter().map(|r| r.agent.chars().count()).max().unwrap_or(0);
            text.push_str("Scores:\n");
            for row in &view.scores {
                text.push_str(&format!("  {:<width$}  {}\n", row.agent, row.score, width = width));
            }
        }
        text
    }

    fn render_notice(&self, notice: &Notice) -> String {
        let line = match notice {
            Notice::Loading(text) => format!("⏳ {}", text),
            Notice::Failure(text) => self.style("red").apply_to(format!("✖ {}", text)).to_string(),
            other => self.style("dim").apply_to(other.text()).to_string(),
        };
        format!("{}\n", line)
    }
}

impl<W: Screen> RenderSurface for TerminalSurface<W> {
    fn clear(&mut self) {
        if self.out.is_interactive() {
            self.open_line = None;
            if let Err(e) = self.erase_cycle() {
                warn!(error = %e, "failed to erase terminal output");
            }
        } else {
            self.close_open_line();
            if !self.mirror.is_empty() {
                self.emit("\n");
            }
        }
        self.printed_rows = 0;
        self.row_width = 0;
        self.mirror.clear();
    }

    fn append_block(&mut self, block: Block) -> BlockHandle {
        self.close_open_line();
        let text = self.render(&block);
        let pending = block.as_message().is_some_and(MessageBlock::is_pending);
        self.emit(&text);
        let handle = self.mirror.append_block(block);
        if pending {
            self.open_line = Some(handle);
        }
        handle
    }

    fn update_block(&mut self, handle: BlockHandle, block: Block) {
        if self.mirror.block(handle).is_none() {
            return;
        }
        if self.open_line == Some(handle) {
            self.open_line = None;
            let text = match block.as_message() {
                Some(message) => self.message_body(message),
                None => self.render(&block),
            };
            if self.out.is_interactive() && block.as_message().is_some() {
                if let Err(e) = self.out.erase_line() {
                    warn!(error = %e, "failed to erase pending line");
                }
                self.row_width = 0;
            } else {
                self.emit("\n");
            }
            self.emit(&text);
        } else {
            self.close_open_line();
            let text = self.render(&block);
            self.emit(&text);
        }
        self.mirror.update_block(handle, block);
    }

    fn scroll_to_latest(&mut self) {
        if let Err(e) = self.out.flush() {
            warn!(error = %e, "failed to flush terminal");
        }
        self.mirror.scroll_to_latest();
    }
}

fn indent(text: &str) -> String {
    text.lines()
        .map(|line| format!("  {}", line))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use debate_presenter::{
        normalize_verdict, JudgeVerdict, StreamingPresenter, TranscriptEntry, PLACEHOLDER_MARKER,
    };
    use std::time::Duration;

    /// Interactive screen that applies erasures to its own row buffer.
    struct RowScreen {
        rows: Vec<String>,
        columns: Option<usize>,
    }

    impl RowScreen {
        fn new() -> Self {
            Self {
                rows: vec![String::new()],
                columns: None,
            }
        }

        fn with_columns(columns: usize) -> Self {
            Self {
                columns: Some(columns),
                ..Self::new()
            }
        }

        fn contents(&self) -> String {
            self.rows.join("\n")
        }
    }

    impl Write for RowScreen {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            let text = String::from_utf8_lossy(buf);
            for ch in text.chars() {
                if ch == '\n' {
                    self.rows.push(String::new());
                } else if let Some(row) = self.rows.last_mut() {
                    row.push(ch);
                }
            }
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl Screen for RowScreen {
        fn is_interactive(&self) -> bool {
            true
        }

        fn columns(&self) -> Option<usize> {
            self.columns
        }

        fn erase_line(&mut self) -> io::Result<()> {
            if let Some(row) = self.rows.last_mut() {
                row.clear();
            }
            Ok(())
        }

        fn erase_last_lines(&mut self, n: usize) -> io::Result<()> {
            // Wrapped rows are modelled as one row per `columns` characters.
            let physical: Vec<String> = match self.columns {
                Some(cols) => self
                    .rows
                    .iter()
                    .flat_map(|row| {
                        let chars: Vec<char> = row.chars().collect();
                        if chars.is_empty() {
                            vec![String::new()]
                        } else {
                            chars.chunks(cols).map(|c| c.iter().collect()).collect()
                        }
                    })
                    .collect(),
                None => self.rows.clone(),
            };
            self.rows = physical;
            let keep = self.rows.len().saturating_sub(n);
            self.rows.truncate(keep.max(1));
            if let Some(row) = self.rows.last_mut() {
                row.clear();
            }
            Ok(())
        }
    }

    fn output(surface: TerminalSurface<Vec<u8>>) -> String {
        String::from_utf8(surface.into_writer()).unwrap()
    }

    #[test]
    fn test_pending_then_resolved_plain() {
        let mut surface = TerminalSurface::new(Vec::new(), false);
        let handle = surface.append_block(Block::Message(MessageBlock::pending("Finance")));
        surface.update_block(
            handle,
            Block::Message(MessageBlock::resolved("Finance", "Budget holds.\nBarely.")),
        );

        assert_eq!(surface.mirror().pending_count(), 0);
        let text = output(surface);
        assert_eq!(
            text,
            format!("💰 Finance\n  {}\n  Budget holds.\n  Barely.\n", PLACEHOLDER_MARKER)
        );
    }

    #[test]
    fn test_pending_line_rewritten_in_place() {
        let mut surface = TerminalSurface::new(RowScreen::new(), false);
        let handle = surface.append_block(Block::Message(MessageBlock::pending("Critic")));
        surface.update_block(handle, Block::Message(MessageBlock::resolved("Critic", "No.")));
        assert_eq!(surface.into_writer().contents(), "🔍 Critic\n  No.\n");
    }

    #[test]
    fn test_clear_erases_previous_cycle() {
        let mut surface = TerminalSurface::new(RowScreen::new(), false);
        surface.append_block(Block::Message(MessageBlock::resolved("Finance", "OLD-T1")));
        surface.clear();
        surface.append_block(Block::Message(MessageBlock::resolved("Critic", "NEW-T2")));

        assert_eq!(surface.mirror().len(), 1);
        assert_eq!(surface.into_writer().contents(), "🔍 Critic\n  NEW-T2\n");
    }

    #[test]
    fn test_clear_erases_open_pending_line() {
        let mut surface = TerminalSurface::new(RowScreen::new(), false);
        surface.append_block(Block::Notice(Notice::Loading("Starting".into())));
        surface.append_block(Block::Message(MessageBlock::pending("Policy")));
        surface.clear();
        assert_eq!(surface.into_writer().contents(), "");
    }

    #[test]
    fn test_clear_counts_wrapped_rows() {
        let mut surface = TerminalSurface::new(RowScreen::with_columns(10), false);
        surface.append_block(Block::Message(MessageBlock::resolved(
            "Market",
            "a rather long line of text",
        )));
        surface.clear();
        assert_eq!(surface.into_writer().contents(), "");
    }

    #[test]
    fn test_plain_writer_separates_cycles() {
        let mut surface = TerminalSurface::new(Vec::new(), false);
        surface.append_block(Block::Message(MessageBlock::resolved("Finance", "old")));
        surface.clear();
        surface.append_block(Block::Message(MessageBlock::resolved("Finance", "new")));
        assert_eq!(output(surface), "💰 Finance\n  old\n\n💰 Finance\n  new\n");
    }

    #[test]
    fn test_color_styles_agent_name() {
        let mut surface = TerminalSurface::new(Vec::new(), true);
        surface.append_block(Block::Message(MessageBlock::resolved("Critic", "No.")));
        let text = output(surface);
        assert!(text.contains('\u{1b}'));
        assert_eq!(console::strip_ansi_codes(&text), "🔍 Critic\n  No.\n");
    }

    #[test]
    fn test_no_color_means_no_escapes() {
        let mut surface = TerminalSurface::new(Vec::new(), false);
        surface.append_block(Block::Notice(Notice::Failure("x".into())));
        surface.append_block(Block::Message(MessageBlock::pending("Critic")));
        assert!(!output(surface).contains('\u{1b}'));
    }

    #[test]
    fn test_unknown_agent_gets_fallback_avatar() {
        let mut surface = TerminalSurface::new(Vec::new(), false);
        surface.append_block(Block::Message(MessageBlock::resolved("Agent", "hi")));
        assert!(output(surface).starts_with("🧠 Agent\n"));
    }

    #[test]
    fn test_verdict_rendering() {
        let verdict: JudgeVerdict = serde_json::from_str(
            r#"{"final_recommendation": "accept", "reason": "Solid plan",
                "scores": {"Finance": 8, "Critic": "6/10"}}"#,
        )
        .unwrap();
        let mut surface = TerminalSurface::new(Vec::new(), false);
        surface.append_block(Block::Verdict(normalize_verdict(&verdict)));
        let text = output(surface);
        assert!(text.contains("Recommendation: ACCEPT"));
        assert!(text.contains("Reason:\n  Solid plan"));
        assert!(text.contains("  Finance  8\n  Critic   6/10\n"));
        assert!(!text.contains("Summary of arguments"));
    }

    #[test]
    fn test_verdict_update_reprints() {
        let mut surface = TerminalSurface::new(Vec::new(), false);
        let handle = surface.append_block(Block::Notice(Notice::AwaitingVerdict));
        surface.update_block(
            handle,
            Block::Verdict(normalize_verdict(&JudgeVerdict::with_reason("done"))),
        );
        assert!(surface.mirror().snapshot()[0].as_verdict().is_some());
        let text = output(surface);
        assert!(text.starts_with("Awaiting conclusion...\n"));
        assert!(text.contains("Recommendation: MODIFY"));
    }

    #[test]
    fn test_stale_update_ignored() {
        let mut surface = TerminalSurface::new(Vec::new(), false);
        let handle = surface.append_block(Block::Message(MessageBlock::pending("Policy")));
        surface.clear();
        surface.update_block(handle, Block::Message(MessageBlock::resolved("Policy", "late")));
        assert!(surface.mirror().is_empty());
        assert!(!output(surface).contains("late"));
    }

    #[test]
    fn test_failure_notice() {
        let mut surface = TerminalSurface::new(Vec::new(), false);
        surface.append_block(Block::Notice(Notice::Failure("Debate failed".into())));
        assert_eq!(output(surface), "✖ Debate failed\n");
    }

    #[tokio::test(start_paused = true)]
    async fn test_second_presentation_replaces_first_on_screen() {
        let presenter = StreamingPresenter::new(TerminalSurface::new(RowScreen::new(), false));
        presenter
            .present(
                vec![TranscriptEntry::new("Finance", "first run")],
                Duration::from_millis(100),
            )
            .await;
        presenter.render_verdict(Some(&JudgeVerdict::with_reason("old verdict")));

        presenter
            .present(
                vec![TranscriptEntry::new("Critic", "second run")],
                Duration::from_millis(100),
            )
            .await;

        let screen = presenter.into_surface().into_writer().contents();
        assert_eq!(screen, "🔍 Critic\n  second run\n");
    }
}
