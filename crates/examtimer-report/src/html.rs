//! HTML results page.
//!
//! One self-contained file per session with CSS/JS inlined. Question tables
//! come first, followed by a time chart and the raw report JSON.

use anyhow::Result;
use std::path::Path;

use examtimer_core::model::format_clock;
use examtimer_core::report::ExamReport;
use examtimer_core::results::{ResultTable, SubjectResult};

/// Escape a string for safe HTML insertion.
fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}

/// Generate an HTML page from a finished session report.
pub fn generate_html(report: &ExamReport) -> String {
    let table = report.result_table();
    let mut html = String::new();

    html.push_str("<!DOCTYPE html>\n<html lang=\"ko\">\n<head>\n");
    html.push_str("<meta charset=\"utf-8\">\n");
    html.push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n");
    html.push_str(&format!("<title>examtimer: {}</title>\n", table.title()));
    html.push_str("<style>\n");
    html.push_str(CSS);
    html.push_str("</style>\n");
    html.push_str("</head>\n<body>\n");

    // Header
    html.push_str("<header>\n");
    html.push_str(&format!("<h1>{}</h1>\n", table.title()));
    html.push_str(&format!(
        "<p class=\"meta\">Session <code>{}</code> | {} subjects | total time {} | {}</p>\n",
        report.record.id,
        table.subjects.len(),
        format_clock(table.total_secs()),
        report.record.created_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    html.push_str("</header>\n");

    // Summary
    html.push_str("<section class=\"result-summary\">\n");
    match &table.summary {
        Some(summary) => {
            html.push_str(&format!("<h2>{}</h2>\n", html_escape(&summary.line())));
            for subject in &table.subjects {
                html.push_str(&format!("<p>{}</p>\n", html_escape(&subject.summary_line())));
            }
        }
        None => {
            html.push_str(&format!("<p>{}</p>\n", table.unscored_note()));
        }
    }
    if table.subjects.iter().any(|s| s.total_secs > 0) {
        html.push_str(&generate_time_chart(&table));
    }
    html.push_str("</section>\n");

    // Per-question details
    html.push_str("<section class=\"result-details\">\n");
    html.push_str("<h2>Per-question detail</h2>\n");
    for (i, subject) in table.subjects.iter().enumerate() {
        html.push_str(&subject_table(i, subject, table.scored));
    }
    html.push_str("</section>\n");

    // Raw JSON
    html.push_str("<section class=\"raw-data\">\n");
    html.push_str("<details>\n<summary>Raw JSON Data</summary>\n");
    html.push_str("<pre><code>");
    html.push_str(
        &serde_json::to_string_pretty(report)
            .unwrap_or_default()
            .replace('<', "&lt;")
            .replace('>', "&gt;"),
    );
    html.push_str("</code></pre>\n");
    html.push_str("</details>\n</section>\n");

    // JavaScript for sorting
    html.push_str("<script>\n");
    html.push_str(JS);
    html.push_str("</script>\n");

    html.push_str("</body>\n</html>");
    html
}

fn subject_table(index: usize, subject: &SubjectResult, scored: bool) -> String {
    let id = format!("subject-{index}");
    let mut html = format!("<h3>{}</h3>\n", html_escape(&subject.name));
    html.push_str(&format!("<table class=\"result-table\" id=\"{id}\">\n<thead><tr>"));
    let mut headers = vec!["No.", "Answer"];
    if scored {
        headers.extend(["Correct", "O/X"]);
    }
    headers.push("Time");
    for (col, header) in headers.iter().enumerate() {
        html.push_str(&format!(
            "<th onclick=\"sortTable('{id}', {col})\">{header}</th>"
        ));
    }
    html.push_str("</tr></thead>\n<tbody>\n");

    for row in &subject.rows {
        let class = match row.is_correct {
            Some(true) => "pass",
            Some(false) => "fail",
            None => "",
        };
        html.push_str(&format!(
            "<tr class=\"{class}\"><td>{}</td><td>{}</td>",
            row.number,
            html_escape(&row.answer_cell())
        ));
        if scored {
            html.push_str(&format!(
                "<td>{}</td><td>{}</td>",
                html_escape(&row.correct_cell()),
                row.mark_cell()
            ));
        }
        html.push_str(&format!("<td>{}</td></tr>\n", row.elapsed_cell()));
    }

    html.push_str("</tbody></table>\n");
    html
}

/// Write an HTML report to a file.
pub fn write_html_report(report: &ExamReport, path: &Path) -> Result<()> {
    let html = generate_html(report);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, html)?;
    Ok(())
}

/// Horizontal bars of total time per subject.
fn generate_time_chart(table: &ResultTable) -> String {
    let bar_height = 30;
    let max_width = 400;
    let padding = 10;
    let label_width = 200;

    let longest = table
        .subjects
        .iter()
        .map(|s| s.total_secs)
        .max()
        .unwrap_or(0)
        .max(1);

    let total_height = table.subjects.len() * (bar_height + padding) + padding;

    let mut svg = format!(
        "<svg width=\"{}\" height=\"{}\" xmlns=\"http://www.w3.org/2000/svg\">\n",
        label_width + max_width + 80,
        total_height
    );

    for (i, subject) in table.subjects.iter().enumerate() {
        let y = i * (bar_height + padding) + padding;
        let width = (subject.total_secs as f64 / longest as f64 * max_width as f64) as usize;

        let color = match (subject.correct, subject.question_count()) {
            (Some(correct), total) if total > 0 && correct * 5 >= total * 4 => "#22c55e",
            (Some(correct), total) if total > 0 && correct * 2 >= total => "#eab308",
            (Some(_), _) => "#ef4444",
            (None, _) => "#3b82f6",
        };

        svg.push_str(&format!(
            "  <text x=\"{}\" y=\"{}\" font-size=\"14\" fill=\"currentColor\" text-anchor=\"end\" dominant-baseline=\"middle\">{}</text>\n",
            label_width - 10,
            y + bar_height / 2,
            html_escape(&subject.name)
        ));
        svg.push_str(&format!(
            "  <rect x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" fill=\"{}\" rx=\"4\"/>\n",
            label_width, y, width, bar_height, color
        ));
        svg.push_str(&format!(
            "  <text x=\"{}\" y=\"{}\" font-size=\"12\" fill=\"currentColor\" dominant-baseline=\"middle\">{}</text>\n",
            label_width + width + 8,
            y + bar_height / 2,
            format_clock(subject.total_secs)
        ));
    }

    svg.push_str("</svg>\n");
    svg
}

const CSS: &str = r#"
:root { --bg: #fff; --fg: #1a1a1a; --border: #e5e7eb; --pass: #dcfce7; --fail: #fde2e2; }
@media (prefers-color-scheme: dark) {
  :root { --bg: #111827; --fg: #f9fafb; --border: #374151; --pass: #064e3b; --fail: #7f1d1d; }
}
body { font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', 'Apple SD Gothic Neo', sans-serif; margin: 0; padding: 2rem; background: var(--bg); color: var(--fg); }
h1, h2 { margin-top: 2rem; }
.meta { color: #6b7280; }
table { border-collapse: collapse; width: 100%; margin: 1rem 0; }
th, td { border: 1px solid var(--border); padding: 0.5rem 1rem; text-align: left; }
th { background: var(--border); cursor: pointer; }
.pass { background: var(--pass); }
.fail { background: var(--fail); }
pre { overflow-x: auto; padding: 1rem; background: var(--border); border-radius: 8px; }
code { font-family: 'JetBrains Mono', 'Fira Code', monospace; font-size: 0.85rem; }
details { margin: 1rem 0; }
summary { cursor: pointer; font-weight: bold; }
svg { margin: 1rem 0; }
"#;

const JS: &str = r#"
function sortTable(id, col) {
  const table = document.getElementById(id);
  const tbody = table.querySelector('tbody');
  const rows = Array.from(tbody.querySelectorAll('tr'));
  const asc = table.dataset.sortCol == col && table.dataset.sortDir == 'asc' ? false : true;
  rows.sort((a, b) => {
    const va = a.cells[col].textContent;
    const vb = b.cells[col].textContent;
    return asc ? va.localeCompare(vb, undefined, { numeric: true }) : vb.localeCompare(va, undefined, { numeric: true });
  });
  table.dataset.sortCol = col;
  table.dataset.sortDir = asc ? 'asc' : 'desc';
  rows.forEach(r => tbody.appendChild(r));
}
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use examtimer_core::model::{Answer, Choice, Mode, SessionRecord, SubjectRecord};
    use examtimer_core::scoring::AnswerKeyInput;

    fn make_test_report() -> ExamReport {
        let mut subject = SubjectRecord::new("언어 <이해>", 2);
        subject
            .answers
            .insert(1, Answer::Choice(Choice::new(3).unwrap()));
        subject.answers.insert(2, Answer::Unanswered);
        subject.times.insert(1, 45);
        subject.times.insert(2, 30);
        ExamReport::new(SessionRecord::new(Mode::Exam, vec![subject]), None)
    }

    #[test]
    fn unscored_report_omits_score_columns() {
        let html = generate_html(&make_test_report());
        assert!(html.contains("<html"));
        assert!(html.contains("</html>"));
        assert!(html.contains("Exam results"));
        assert!(html.contains("00:45"));
        assert!(!html.contains(">O/X<"));
        assert!(html.contains("without answer comparison"));
    }

    #[test]
    fn scored_report_marks_rows() {
        let mut report = make_test_report();
        let mut input = AnswerKeyInput::default();
        input.push("언어 <이해>", vec!["3".into(), "2".into()]);
        report.rescore(&input).unwrap();

        let html = generate_html(&report);
        assert!(html.contains(">O/X<"));
        assert!(html.contains("<tr class=\"pass\">"));
        assert!(html.contains("<tr class=\"fail\">"));
        assert!(html.contains("Total 1 / 2 (50.0%)"));
    }

    #[test]
    fn subject_names_are_escaped() {
        let html = generate_html(&make_test_report());
        assert!(html.contains("언어 &lt;이해&gt;"));
        assert!(!html.contains("<h3>언어 <이해></h3>"));
    }

    #[test]
    fn html_report_write_to_file() {
        let report = make_test_report();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.html");

        write_html_report(&report, &path).unwrap();
        assert!(path.exists());

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("<html"));
    }
}
