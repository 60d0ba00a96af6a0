//! Markup escaping and HTML export of presented blocks.
//!
//! All text that reaches markup goes through [`escape_markup`]; newlines in
//! verdict and message text become `<br>`.

use std::fmt::Write as _;

use crate::block::{AgentStyle, Block, MessageBlock, Notice};
use crate::verdict::VerdictView;

/// Escape the characters that are significant in HTML.
pub fn escape_markup(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}

/// Escape `text` and turn line breaks into `<br>`.
pub fn text_to_markup(text: &str) -> String {
    escape_markup(&text.replace("\r\n", "\n")).replace('\n', "<br>")
}

/// HTML fragment for one block.
pub fn render_block_html(block: &Block) -> String {
    match block {
        Block::Message(message) => render_message(message),
        Block::Verdict(view) => render_verdict(view),
        Block::Notice(notice) => render_notice(notice),
    }
}

/// Standalone HTML document containing `blocks` in order.
pub fn render_document<'a>(title: &str, blocks: impl IntoIterator<Item = &'a Block>) -> String {
    let mut html = String::new();
    let _ = write!(
        html,
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n<title>{}</title>\n</head>\n<body>\n<main id=\"chatWindow\">\n",
        escape_markup(title)
    );
    for block in blocks {
        html.push_str(&render_block_html(block));
        html.push('\n');
    }
    html.push_str("</main>\n</body>\n</html>\n");
    html
}

fn render_message(message: &MessageBlock) -> String {
    let style = AgentStyle::for_agent(&message.agent);
    let bubble_class = if message.is_pending() {
        "agent-bubble pending"
    } else {
        "agent-bubble"
    };
    format!(
        "<div class=\"agent-message\"><div class=\"agent-avatar {}\">{}</div>\
         <div class=\"agent-content\"><div class=\"agent-name\">{}</div>\
         <div class=\"{}\">{}</div></div></div>",
        style.color_class,
        style.emoji,
        escape_markup(&message.agent),
        bubble_class,
        text_to_markup(message.display_text())
    )
}

fn render_verdict(view: &VerdictView) -> String {
    let mut html = String::new();
    let _ = write!(
        html,
        "<section class=\"judge-card recommendation-{rec}\"><h2>Judge verdict</h2>\
         <p class=\"recommendation\">{rec}</p>\
         <div class=\"reason\">{}</div>\
         <div class=\"summary\">{}</div>",
        text_to_markup(&view.reason),
        text_to_markup(&view.summary),
        rec = view.recommendation,
    );
    if !view.scores.is_empty() {
        html.push_str("<table class=\"scores\">");
        for row in &view.scores {
            let _ = write!(
                html,
                "<tr><td>{}</td><td>{}</td></tr>",
                escape_markup(&row.agent),
                escape_markup(&row.score.to_string())
            );
        }
        html.push_str("</table>");
    }
    html.push_str("</section>");
    html
}

fn render_notice(notice: &Notice) -> String {
    let class = match notice {
        Notice::Loading(_) => "loading",
        Notice::EmptyTranscript => "empty",
        Notice::AwaitingVerdict => "awaiting",
        Notice::Failure(_) => "failure",
    };
    format!(
        "<div class=\"notice notice-{}\">{}</div>",
        class,
        text_to_markup(notice.text())
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::verdict::{normalize_verdict, JudgeVerdict};

    #[test]
    fn test_escape_markup() {
        assert_eq!(
            escape_markup(r#"<a href="x">Tom & 'Jerry'</a>"#),
            "&lt;a href=&quot;x&quot;&gt;Tom &amp; &#39;Jerry&#39;&lt;/a&gt;"
        );
    }

    #[test]
    fn test_newlines_become_breaks() {
        assert_eq!(text_to_markup("a\nb\r\nc"), "a<br>b<br>c");
        assert_eq!(text_to_markup("<b>\n"), "&lt;b&gt;<br>");
    }

    #[test]
    fn test_script_in_reason_is_inert() {
        let view = normalize_verdict(&JudgeVerdict::with_reason("<script>alert(1)</script>"));
        let html = render_block_html(&Block::Verdict(view));
        assert!(html.contains("&lt;script&gt;alert(1)&lt;/script&gt;"));
        assert!(!html.contains("<script>"));
    }

    #[test]
    fn test_scores_rendered_in_order() {
        let verdict: JudgeVerdict = serde_json::from_str(
            r#"{"final_recommendation": "reject", "scores": {"Policy": 3, "Finance": "<b>"}}"#,
        )
        .unwrap();
        let html = render_block_html(&Block::Verdict(normalize_verdict(&verdict)));
        let policy = html.find("Policy").unwrap();
        let finance = html.find("Finance").unwrap();
        assert!(policy < finance);
        assert!(html.contains("<td>&lt;b&gt;</td>"));
        assert!(html.contains("recommendation-reject"));
    }

    #[test]
    fn test_no_score_table_when_empty() {
        let html = render_block_html(&Block::Verdict(normalize_verdict(&JudgeVerdict::default())));
        assert!(!html.contains("<table"));
        assert!(html.contains(">modify<"));
    }

    #[test]
    fn test_pending_message_shows_placeholder() {
        let html = render_block_html(&Block::Message(MessageBlock::pending("Finance")));
        assert!(html.contains("agent-bubble pending"));
        assert!(html.contains("💰"));
        assert!(html.contains(crate::block::PLACEHOLDER_MARKER));
    }

    #[test]
    fn test_document_wraps_blocks() {
        let blocks = vec![
            Block::Message(MessageBlock::resolved("Critic", "line 1\nline 2")),
            Block::Notice(Notice::AwaitingVerdict),
        ];
        let doc = render_document("Debate <1>", &blocks);
        assert!(doc.starts_with("<!DOCTYPE html>"));
        assert!(doc.contains("<title>Debate &lt;1&gt;</title>"));
        assert!(doc.contains("line 1<br>line 2"));
        assert!(doc.contains("notice-awaiting"));
    }
}
