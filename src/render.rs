//! Markdown rendering of a diff report.

use crate::types::{Report, Severity};

/// Render the report as the summary document consumed by CI comments.
///
/// Every line is `\n`-terminated. Severity sections appear in the fixed
/// breaking/warning/info order and only when they have findings; an empty
/// report renders the `No differences found.` tail instead.
pub fn render_markdown(report: &Report) -> String {
    let mut out = String::new();
    out.push_str("## TrueSpec Summary\n");
    out.push('\n');
    out.push_str(&format!("- Breaking: {}\n", report.summary.breaking));
    out.push_str(&format!("- Warning: {}\n", report.summary.warning));
    out.push_str(&format!("- Info: {}\n", report.summary.info));

    if report.items.is_empty() {
        out.push('\n');
        out.push_str("No differences found.\n");
        return out;
    }

    for severity in Severity::ALL {
        let messages: Vec<&str> = report
            .items
            .iter()
            .filter(|finding| finding.severity == severity)
            .map(|finding| finding.message.as_str())
            .collect();
        if messages.is_empty() {
            continue;
        }
        out.push('\n');
        out.push_str(&format!("### {} ({})\n", severity.label(), messages.len()));
        for message in messages {
            out.push_str(&format!("- {message}\n"));
        }
    }

    out
}
