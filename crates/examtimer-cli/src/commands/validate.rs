//! The `examtimer validate` command.

use std::path::PathBuf;

use anyhow::{Context, Result};

use examtimer_core::parser::{lint_answer_key, parse_answer_key};
use examtimer_core::report::ExamReport;
use examtimer_core::scoring::validate_answer_key;

pub fn execute(answer_key: PathBuf, report: Option<PathBuf>) -> Result<()> {
    let input = parse_answer_key(&answer_key)?;

    for subject in &input.subjects {
        println!("Subject: {} ({} answers)", subject.name, subject.cells.len());
    }

    let warnings = lint_answer_key(&input);
    for w in &warnings {
        let prefix = w
            .subject
            .as_ref()
            .map(|name| format!("  [{name}]"))
            .unwrap_or_else(|| "  ".to_string());
        println!("{prefix} WARNING: {}", w.message);
    }

    if warnings.is_empty() {
        println!("All answer keys valid.");
    } else {
        println!("\n{} warning(s) found.", warnings.len());
    }

    if let Some(report_path) = report {
        let report = ExamReport::load_json(&report_path)?;
        validate_answer_key(&report.record, &input).with_context(|| {
            format!("answer key does not fit report {}", report_path.display())
        })?;
        println!("Answer key matches {}.", report_path.display());
    }

    Ok(())
}
