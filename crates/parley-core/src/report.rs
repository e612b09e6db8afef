//! Session report rendering for export.
//!
//! Produces a Markdown document: header, full transcript, then the feedback
//! scores and narrative. Pure presentation, field ordering only.

use crate::model::{timestamp, SessionRecord};
use std::fmt::Write;

/// Render a completed session as a Markdown document.
pub fn render_report(record: &SessionRecord) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "# Negotiation Session");
    let _ = writeln!(out);
    let _ = writeln!(out, "- **Scenario**: {}", record.scenario);
    let _ = writeln!(out, "- **Style**: {}", record.style);
    let _ = writeln!(
        out,
        "- **Timestamp**: {}",
        record.timestamp.format(timestamp::FORMAT)
    );
    let _ = writeln!(out);

    let _ = writeln!(out, "## Conversation");
    let _ = writeln!(out);
    if record.conversation.is_empty() {
        let _ = writeln!(out, "_No turns were recorded in this session._");
        let _ = writeln!(out);
    }
    for (i, turn) in record.conversation.iter().enumerate() {
        let _ = writeln!(out, "**Turn {}:**", i + 1);
        let _ = writeln!(out, "- You: {}", turn.user);
        let _ = writeln!(out, "- AI: {}", turn.ai);
        let _ = writeln!(out);
    }

    let feedback = &record.feedback;
    let _ = writeln!(out, "## Feedback");
    let _ = writeln!(out);
    let _ = writeln!(out, "- Clarity Score: {:.2}/10", feedback.score.clarity);
    let _ = writeln!(
        out,
        "- Persuasiveness Score: {:.2}/10",
        feedback.score.persuasiveness
    );
    let _ = writeln!(out, "- Total Score: {:.2}/10", feedback.score.total);
    let _ = writeln!(out);
    let _ = writeln!(out, "### Performance Summary");
    let _ = writeln!(out);
    let _ = writeln!(out, "{}", feedback.summary);
    let _ = writeln!(out);
    let _ = writeln!(out, "{}", feedback.points_to_consider);
    let _ = writeln!(out);
    let _ = writeln!(out, "{}", feedback.performance_analysis);
    let _ = writeln!(out);
    let _ = writeln!(out, "### Areas for Improvement");
    let _ = writeln!(out);
    for improvement in &feedback.improvements {
        let _ = writeln!(out, "- {improvement}");
    }

    out
}
