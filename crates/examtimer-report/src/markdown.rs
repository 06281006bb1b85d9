//! Markdown result rendering.

use std::fmt::Write as _;
use std::path::Path;

use anyhow::{Context, Result};

use examtimer_core::model::format_clock;
use examtimer_core::report::ExamReport;
use examtimer_core::results::ResultTable;

/// Escape characters that would break a Markdown table cell.
fn cell(s: &str) -> String {
    s.replace('|', "\\|")
}

/// Render a result table as Markdown.
pub fn table_to_markdown(table: &ResultTable) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "# {}\n", table.title());

    match &table.summary {
        Some(summary) => {
            let _ = writeln!(out, "**{}**\n", summary.line());
            for subject in &table.subjects {
                let _ = writeln!(out, "- {}", cell(&subject.summary_line()));
            }
            out.push('\n');
        }
        None => {
            let _ = writeln!(out, "_{}_\n", table.unscored_note());
        }
    }

    for subject in &table.subjects {
        let _ = writeln!(out, "## {}\n", subject.name);
        if table.scored {
            out.push_str("| No. | Answer | Correct | O/X | Time |\n");
            out.push_str("|----:|:------:|:-------:|:---:|-----:|\n");
        } else {
            out.push_str("| No. | Answer | Time |\n");
            out.push_str("|----:|:------:|-----:|\n");
        }
        for row in &subject.rows {
            if table.scored {
                let _ = writeln!(
                    out,
                    "| {} | {} | {} | {} | {} |",
                    row.number,
                    cell(&row.answer_cell()),
                    cell(&row.correct_cell()),
                    row.mark_cell(),
                    row.elapsed_cell()
                );
            } else {
                let _ = writeln!(
                    out,
                    "| {} | {} | {} |",
                    row.number,
                    cell(&row.answer_cell()),
                    row.elapsed_cell()
                );
            }
        }
        let _ = writeln!(out, "\nTotal time: {}\n", format_clock(subject.total_secs));
    }

    out
}

/// Render a full report as Markdown, with a session header line.
pub fn generate_markdown(report: &ExamReport) -> String {
    let body = table_to_markdown(&report.result_table());
    let header = format!(
        "<!-- examtimer session {} ({}) -->\n",
        report.record.id,
        report.record.created_at.format("%Y-%m-%d %H:%M:%S UTC")
    );
    header + &body
}

/// Write a Markdown report to a file.
pub fn write_markdown_report(report: &ExamReport, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, generate_markdown(report))
        .with_context(|| format!("failed to write markdown report to {}", path.display()))?;
    Ok(())
}
