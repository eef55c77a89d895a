//! Run report printed to stdout: one line per topic as it completes, then a
//! grand total.

use article_harvester::RunSummary;

/// Formats the line printed when a topic completes.
pub(crate) fn render_topic_line(summary: &RunSummary) -> String {
    let mut line = format!(
        "{} ({}): {}/{} articles saved",
        summary.topic.folder, summary.topic.id, summary.success_count, summary.total_items
    );
    if summary.interrupted {
        line.push_str(" (interrupted)");
    }
    line
}

/// Formats the grand total over every recorded topic.
pub(crate) fn render_total(summaries: &[RunSummary]) -> String {
    let succeeded: usize = summaries.iter().map(|s| s.success_count).sum();
    let total: usize = summaries.iter().map(|s| s.total_items).sum();
    format!(
        "Total: {succeeded}/{total} articles saved across {} topic(s)",
        summaries.len()
    )
}
