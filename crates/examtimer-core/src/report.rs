//! Exported session reports with JSON persistence.
//!
//! A report is a snapshot of a finished session. It can be re-scored offline
//! against a different answer key but never resumed as a live session.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AnswerKeyError;
use crate::model::SessionRecord;
use crate::results::ResultTable;
use crate::scoring::{score, validate_answer_key, AnswerKeyInput, ScoreSheet};

/// A finished session plus its optional score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExamReport {
    /// When the report was exported.
    pub exported_at: DateTime<Utc>,
    /// Recorded answers and times.
    pub record: SessionRecord,
    /// Score sheet, if an answer key was applied.
    #[serde(default)]
    pub score: Option<ScoreSheet>,
}

impl ExamReport {
    pub fn new(record: SessionRecord, score: Option<ScoreSheet>) -> Self {
        Self {
            exported_at: Utc::now(),
            record,
            score,
        }
    }

    /// Validate `input` against the recorded session and replace the score.
    pub fn rescore(&mut self, input: &AnswerKeyInput) -> Result<&ScoreSheet, AnswerKeyError> {
        let key = validate_answer_key(&self.record, input)?;
        Ok(self.score.insert(score(&self.record, &key)))
    }

    pub fn result_table(&self) -> ResultTable {
        ResultTable::build(&self.record, self.score.as_ref())
    }

    /// File name stem, e.g. `examtimer-exam-20260101-093000`.
    pub fn file_stem(&self) -> String {
        format!(
            "examtimer-{}-{}",
            self.record.mode,
            self.record.created_at.format("%Y%m%d-%H%M%S")
        )
    }

    /// Save the report as JSON to a file.
    pub fn save_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("failed to serialize report")?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, json)
            .with_context(|| format!("failed to write report to {}", path.display()))?;
        Ok(())
    }

    /// Load a report from a JSON file.
    pub fn load_json(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read report from {}", path.display()))?;
        let report: ExamReport =
            serde_json::from_str(&content).context("failed to parse report JSON")?;
        Ok(report)
    }
}
