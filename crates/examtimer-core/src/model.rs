//! Core data model types for examtimer.
//!
//! These are the fundamental types that the whole system uses to represent
//! modes, subjects, answers, and the per-question record of a session.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Display marker for a question without a recorded answer.
pub const UNANSWERED_MARK: &str = "–";

/// Session mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Four timed subjects separated by breaks.
    Exam,
    /// A single untimed pseudo-subject with a per-question stopwatch.
    Practice,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Exam => write!(f, "exam"),
            Mode::Practice => write!(f, "practice"),
        }
    }
}

impl FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "exam" | "test" => Ok(Mode::Exam),
            "practice" | "drill" => Ok(Mode::Practice),
            other => Err(format!("unknown mode: {other}")),
        }
    }
}

/// Index of a subject within the session's ordered subject list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SubjectId(pub usize);

impl SubjectId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// A selected option, always within `1..=5`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Choice(u8);

impl Choice {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 5;

    pub fn new(value: u8) -> Option<Self> {
        (Self::MIN..=Self::MAX).contains(&value).then_some(Self(value))
    }

    pub fn value(self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for Choice {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Choice::new(value).ok_or_else(|| {
            format!(
                "option {value} out of range {}..={}",
                Choice::MIN,
                Choice::MAX
            )
        })
    }
}

impl From<Choice> for u8 {
    fn from(choice: Choice) -> Self {
        choice.0
    }
}

impl fmt::Display for Choice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The recorded answer for one question.
///
/// Serialized as the option number, or `null` when unanswered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "Option<Choice>", into = "Option<Choice>")]
pub enum Answer {
    Choice(Choice),
    #[default]
    Unanswered,
}

impl Answer {
    pub fn choice(self) -> Option<Choice> {
        match self {
            Answer::Choice(c) => Some(c),
            Answer::Unanswered => None,
        }
    }

    pub fn is_answered(self) -> bool {
        matches!(self, Answer::Choice(_))
    }

    /// An unanswered question never matches any key value.
    pub fn matches(self, correct: Choice) -> bool {
        self.choice() == Some(correct)
    }
}

impl From<Option<Choice>> for Answer {
    fn from(value: Option<Choice>) -> Self {
        value.map_or(Answer::Unanswered, Answer::Choice)
    }
}

impl From<Answer> for Option<Choice> {
    fn from(answer: Answer) -> Self {
        answer.choice()
    }
}

impl fmt::Display for Answer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Answer::Choice(c) => write!(f, "{c}"),
            Answer::Unanswered => f.write_str(UNANSWERED_MARK),
        }
    }
}

/// Per-subject tracking: limits plus the answer and time maps.
///
/// Question numbers are 1-based throughout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubjectRecord {
    /// Subject display name.
    pub name: String,
    /// Number of navigable questions.
    pub question_limit: u32,
    /// Highest question number the user has reached (always >= 1).
    pub max_reached: u32,
    /// Recorded answer per question number.
    #[serde(default)]
    pub answers: BTreeMap<u32, Answer>,
    /// Accumulated elapsed seconds per question number.
    #[serde(default)]
    pub times: BTreeMap<u32, u64>,
}

impl SubjectRecord {
    pub fn new(name: impl Into<String>, question_limit: u32) -> Self {
        Self {
            name: name.into(),
            question_limit,
            max_reached: 1,
            answers: BTreeMap::new(),
            times: BTreeMap::new(),
        }
    }

    pub fn answer(&self, number: u32) -> Answer {
        self.answers.get(&number).copied().unwrap_or_default()
    }

    pub fn elapsed_secs(&self, number: u32) -> u64 {
        self.times.get(&number).copied().unwrap_or(0)
    }

    /// Highest question number known to the record, never below 1.
    pub fn highest_reached(&self) -> u32 {
        let recorded = self
            .answers
            .keys()
            .chain(self.times.keys())
            .copied()
            .max()
            .unwrap_or(0);
        self.max_reached.max(recorded).max(1)
    }

    /// Number of questions covered by scoring and result rendering.
    pub fn effective_question_count(&self, mode: Mode) -> u32 {
        match mode {
            Mode::Exam => self.question_limit.max(1),
            Mode::Practice => self.highest_reached(),
        }
    }

    /// Raise `max_reached` to `number` if it is higher.
    pub fn extend_reached(&mut self, number: u32) {
        self.max_reached = self.max_reached.max(number);
    }
}

/// Everything a session recorded, independent of any live timer state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    /// Unique session identifier.
    pub id: Uuid,
    /// When the session started.
    pub created_at: DateTime<Utc>,
    /// Exam or practice.
    pub mode: Mode,
    /// Subjects in presentation order, indexed by `SubjectId`.
    pub subjects: Vec<SubjectRecord>,
}

impl SessionRecord {
    pub fn new(mode: Mode, subjects: Vec<SubjectRecord>) -> Self {
        Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            mode,
            subjects,
        }
    }

    pub fn subject(&self, id: SubjectId) -> Option<&SubjectRecord> {
        self.subjects.get(id.index())
    }

    pub fn subject_mut(&mut self, id: SubjectId) -> Option<&mut SubjectRecord> {
        self.subjects.get_mut(id.index())
    }

    pub fn subject_ids(&self) -> impl Iterator<Item = SubjectId> {
        (0..self.subjects.len()).map(SubjectId)
    }

    pub fn effective_question_count(&self, id: SubjectId) -> u32 {
        self.subject(id)
            .map(|s| s.effective_question_count(self.mode))
            .unwrap_or(0)
    }
}

/// Format seconds as `MM:SS`, minutes zero-padded to two digits.
pub fn format_clock(total_secs: u64) -> String {
    format!("{:02}:{:02}", total_secs / 60, total_secs % 60)
}
