//! Answer-key validation errors.
//!
//! Scoring is all-or-nothing: the first problem found in a submitted key
//! rejects the whole submission, and the error names the cell to fix.

use thiserror::Error;

/// Why a submitted answer key was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AnswerKeyError {
    /// No answers were supplied for a subject the session contains.
    #[error("missing answers for subject '{0}'")]
    MissingSubject(String),

    /// A required cell was absent or blank.
    #[error("{subject}: question {question} has no answer")]
    EmptyCell { subject: String, question: u32 },

    /// A cell was not an integer.
    #[error("{subject}: question {question} answer '{value}' is not a number")]
    NotNumeric {
        subject: String,
        question: u32,
        value: String,
    },

    /// A cell was an integer outside `1..=5`.
    #[error("{subject}: question {question} answer {value} is outside 1-5")]
    OutOfRange {
        subject: String,
        question: u32,
        value: i64,
    },
}

impl AnswerKeyError {
    /// Subject the error refers to.
    pub fn subject(&self) -> &str {
        match self {
            AnswerKeyError::MissingSubject(s) => s,
            AnswerKeyError::EmptyCell { subject, .. }
            | AnswerKeyError::NotNumeric { subject, .. }
            | AnswerKeyError::OutOfRange { subject, .. } => subject,
        }
    }
}
