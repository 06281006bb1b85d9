//! Terminal tables and report files shared by `run` and `score`.

use std::path::{Path, PathBuf};

use anyhow::Result;
use comfy_table::{Cell, Table};

use examtimer_core::report::ExamReport;
use examtimer_core::results::ResultTable;
use examtimer_report::html::write_html_report;
use examtimer_report::markdown::write_markdown_report;

/// Print the per-subject tables and summary lines to stdout.
pub fn print_results(table: &ResultTable) {
    println!("\n{}", table.title());

    for subject in &table.subjects {
        let mut t = Table::new();
        let mut header = vec!["No.", "Answer"];
        if table.scored {
            header.extend(["Correct", "O/X"]);
        }
        header.push("Time");
        t.set_header(header);

        for row in &subject.rows {
            let mut cells = vec![Cell::new(row.number), Cell::new(row.answer_cell())];
            if table.scored {
                cells.push(Cell::new(row.correct_cell()));
                cells.push(Cell::new(row.mark_cell()));
            }
            cells.push(Cell::new(row.elapsed_cell()));
            t.add_row(cells);
        }

        println!("\n{}\n{t}", subject.name);
    }

    println!();
    match &table.summary {
        Some(summary) => {
            println!("{}", summary.line());
            for subject in &table.subjects {
                println!("  {}", subject.summary_line());
            }
        }
        None => {
            println!("{}", table.unscored_note());
            for subject in &table.subjects {
                println!("  {}", subject.summary_line());
            }
        }
    }
}

/// Split a `--format` value into known output formats. `all` expands to
/// every file format.
pub fn parse_formats(format: &str) -> Result<Vec<&str>> {
    if format.trim() == "all" {
        return Ok(vec!["json", "html", "markdown"]);
    }
    format
        .split(',')
        .map(str::trim)
        .filter(|f| !f.is_empty())
        .map(|f| match f {
            "json" | "html" => Ok(f),
            "markdown" | "md" => Ok("markdown"),
            other => anyhow::bail!("unknown output format: {other}"),
        })
        .collect()
}

/// Write `report` into `dir` in every requested format.
pub fn write_reports(report: &ExamReport, dir: &Path, formats: &[&str]) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(dir)?;
    let stem = report.file_stem();
    let mut written = Vec::new();

    for fmt in formats {
        let path = match *fmt {
            "json" => {
                let path = dir.join(format!("{stem}.json"));
                report.save_json(&path)?;
                path
            }
            "html" => {
                let path = dir.join(format!("{stem}.html"));
                write_html_report(report, &path)?;
                path
            }
            "markdown" => {
                let path = dir.join(format!("{stem}.md"));
                write_markdown_report(report, &path)?;
                path
            }
            other => anyhow::bail!("unknown output format: {other}"),
        };
        tracing::debug!(path = %path.display(), "report written");
        written.push(path);
    }

    Ok(written)
}
