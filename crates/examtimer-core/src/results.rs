//! Read-only result table built from a finished session.
//!
//! Every output format (terminal, Markdown, HTML) renders from this one
//! structure so they always agree on which rows exist and what each cell
//! contains.

use serde::{Deserialize, Serialize};

use crate::model::{format_clock, Answer, Choice, Mode, SessionRecord, UNANSWERED_MARK};
use crate::scoring::ScoreSheet;

/// Per-question detail for one subject row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultRow {
    /// 1-based question number.
    pub number: u32,
    pub answer: Answer,
    /// Key value, present only for scored results.
    pub correct_answer: Option<Choice>,
    /// `None` for unscored results.
    pub is_correct: Option<bool>,
    pub elapsed_secs: u64,
}

impl ResultRow {
    pub fn answer_cell(&self) -> String {
        self.answer.to_string()
    }

    pub fn correct_cell(&self) -> String {
        self.correct_answer
            .map(|c| c.to_string())
            .unwrap_or_else(|| UNANSWERED_MARK.to_string())
    }

    /// `O` or `X`, empty when unscored.
    pub fn mark_cell(&self) -> &'static str {
        match self.is_correct {
            Some(true) => "O",
            Some(false) => "X",
            None => "",
        }
    }

    pub fn elapsed_cell(&self) -> String {
        format_clock(self.elapsed_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubjectResult {
    pub name: String,
    pub rows: Vec<ResultRow>,
    /// Correct count, present only for scored results.
    pub correct: Option<u32>,
    pub total_secs: u64,
}

impl SubjectResult {
    pub fn question_count(&self) -> u32 {
        self.rows.len() as u32
    }

    pub fn answered_count(&self) -> u32 {
        self.rows.iter().filter(|r| r.answer.is_answered()).count() as u32
    }

    /// `"<name> 3 / 20"` when scored, otherwise answered count and total time.
    pub fn summary_line(&self) -> String {
        match self.correct {
            Some(correct) => format!("{} {} / {}", self.name, correct, self.question_count()),
            None => format!(
                "{}: {} of {} answered, {}",
                self.name,
                self.answered_count(),
                self.question_count(),
                format_clock(self.total_secs)
            ),
        }
    }
}

/// Grand totals for scored results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    pub correct: u32,
    pub total: u32,
}

impl Summary {
    pub fn line(&self) -> String {
        let pct = if self.total == 0 {
            0.0
        } else {
            f64::from(self.correct) / f64::from(self.total) * 100.0
        };
        format!("Total {} / {} ({pct:.1}%)", self.correct, self.total)
    }
}

/// Everything needed to render a results page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultTable {
    pub mode: Mode,
    pub scored: bool,
    pub subjects: Vec<SubjectResult>,
    pub summary: Option<Summary>,
}

impl ResultTable {
    /// Build rows for every subject up to its effective question count.
    pub fn build(record: &SessionRecord, sheet: Option<&ScoreSheet>) -> Self {
        let subjects = record
            .subject_ids()
            .filter_map(|id| {
                let subject = record.subject(id)?;
                let count = record.effective_question_count(id);
                let scored = sheet.and_then(|s| s.subject(&subject.name));

                let rows: Vec<ResultRow> = (1..=count)
                    .map(|number| ResultRow {
                        number,
                        answer: subject.answer(number),
                        correct_answer: scored.and_then(|s| s.correct_answer(number)),
                        is_correct: scored.map(|s| s.is_correct(number).unwrap_or(false)),
                        elapsed_secs: subject.elapsed_secs(number),
                    })
                    .collect();
                let total_secs = rows.iter().map(|r| r.elapsed_secs).sum();

                Some(SubjectResult {
                    name: subject.name.clone(),
                    rows,
                    correct: scored.map(|s| s.correct),
                    total_secs,
                })
            })
            .collect();

        Self {
            mode: record.mode,
            scored: sheet.is_some(),
            subjects,
            summary: sheet.map(|s| Summary {
                correct: s.total_correct,
                total: s.total_questions,
            }),
        }
    }

    pub fn title(&self) -> &'static str {
        match self.mode {
            Mode::Exam => "Exam results",
            Mode::Practice => "Practice results",
        }
    }

    /// Explanatory line shown instead of a score when unscored.
    pub fn unscored_note(&self) -> &'static str {
        match self.mode {
            Mode::Exam => "Recorded answers and times, without answer comparison.",
            Mode::Practice => {
                "Practice mode: per-question times and answers, without answer comparison."
            }
        }
    }

    pub fn total_secs(&self) -> u64 {
        self.subjects.iter().map(|s| s.total_secs).sum()
    }
}
