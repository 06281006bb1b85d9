//! The `examtimer score` command.

use std::path::PathBuf;

use anyhow::{Context, Result};

use examtimer_core::parser::parse_answer_key;
use examtimer_core::report::ExamReport;
use examtimer_report::html::generate_html;
use examtimer_report::markdown::generate_markdown;

use crate::output::print_results;

pub fn execute(
    report_path: PathBuf,
    answer_key: PathBuf,
    format: String,
    save: Option<PathBuf>,
) -> Result<()> {
    let mut report = ExamReport::load_json(&report_path)?;
    let input = parse_answer_key(&answer_key)?;

    let sheet = report
        .rescore(&input)
        .with_context(|| format!("answer key rejected: {}", answer_key.display()))?;
    tracing::info!(
        correct = sheet.total_correct,
        total = sheet.total_questions,
        "report scored"
    );

    match format.as_str() {
        "text" => print_results(&report.result_table()),
        "markdown" | "md" => print!("{}", generate_markdown(&report)),
        "html" => print!("{}", generate_html(&report)),
        "json" => println!("{}", serde_json::to_string_pretty(&report)?),
        other => anyhow::bail!("unknown format: {other} (expected text, markdown, html, json)"),
    }

    if let Some(path) = save {
        report.save_json(&path)?;
        eprintln!("Scored report saved to: {}", path.display());
    }

    Ok(())
}
