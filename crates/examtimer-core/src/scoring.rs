//! Answer-key validation and scoring.

use serde::{Deserialize, Serialize};

use crate::error::AnswerKeyError;
use crate::model::{Choice, SessionRecord};

/// Raw answer-key cells as the user typed them, before validation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnswerKeyInput {
    pub subjects: Vec<SubjectKeyInput>,
}

/// Raw cells for one subject; cell `i` is question `i + 1`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubjectKeyInput {
    pub name: String,
    pub cells: Vec<String>,
}

impl AnswerKeyInput {
    pub fn push(&mut self, name: impl Into<String>, cells: Vec<String>) {
        self.subjects.push(SubjectKeyInput {
            name: name.into(),
            cells,
        });
    }

    fn cells_for(&self, name: &str) -> Option<&[String]> {
        self.subjects
            .iter()
            .find(|s| s.name.trim() == name.trim())
            .map(|s| s.cells.as_slice())
    }
}

/// Split one typed line of answers into cells.
///
/// Whitespace or commas separate cells (`"3 2 5"`, `"3,2,5"`); a line with no
/// separators is read one character per cell (`"325"`). A separated group made
/// only of digits is also read one digit per cell, so `"325 14"` is five cells.
pub fn split_key_line(line: &str) -> Vec<String> {
    let line = line.trim();
    if !line.contains(is_key_separator) {
        return line.chars().map(String::from).collect();
    }
    line.split(is_key_separator)
        .filter(|s| !s.is_empty())
        .flat_map(|cell| {
            if cell.len() > 1 && cell.bytes().all(|b| b.is_ascii_digit()) {
                cell.chars().map(String::from).collect::<Vec<_>>()
            } else {
                vec![cell.to_string()]
            }
        })
        .collect()
}

fn is_key_separator(c: char) -> bool {
    c.is_whitespace() || c == ','
}

/// A validated answer key: every required cell present and within range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerKey {
    pub subjects: Vec<SubjectKey>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubjectKey {
    pub name: String,
    /// Correct option for question `i + 1`.
    pub answers: Vec<Choice>,
}

/// Check `input` against the questions `record` requires.
///
/// Each subject needs exactly its effective question count of cells (the
/// fixed limit in exam mode, the highest reached question in practice).
/// Extra trailing cells are ignored.
pub fn validate_answer_key(
    record: &SessionRecord,
    input: &AnswerKeyInput,
) -> Result<AnswerKey, AnswerKeyError> {
    let mut subjects = Vec::with_capacity(record.subjects.len());

    for id in record.subject_ids() {
        let Some(subject) = record.subject(id) else {
            continue;
        };
        let cells = input
            .cells_for(&subject.name)
            .ok_or_else(|| AnswerKeyError::MissingSubject(subject.name.clone()))?;
        let expected = record.effective_question_count(id);

        let mut answers = Vec::with_capacity(expected as usize);
        for question in 1..=expected {
            let raw = cells
                .get(question as usize - 1)
                .map(|c| c.trim())
                .unwrap_or("");
            answers.push(parse_cell(&subject.name, question, raw)?);
        }
        if cells.len() > expected as usize {
            tracing::debug!(
                subject = %subject.name,
                extra = cells.len() - expected as usize,
                "ignoring answer cells beyond the scored range"
            );
        }

        subjects.push(SubjectKey {
            name: subject.name.clone(),
            answers,
        });
    }

    Ok(AnswerKey { subjects })
}

fn parse_cell(subject: &str, question: u32, raw: &str) -> Result<Choice, AnswerKeyError> {
    if raw.is_empty() {
        return Err(AnswerKeyError::EmptyCell {
            subject: subject.to_string(),
            question,
        });
    }
    let value: i64 = raw.parse().map_err(|_| AnswerKeyError::NotNumeric {
        subject: subject.to_string(),
        question,
        value: raw.to_string(),
    })?;
    u8::try_from(value)
        .ok()
        .and_then(Choice::new)
        .ok_or_else(|| AnswerKeyError::OutOfRange {
            subject: subject.to_string(),
            question,
            value,
        })
}

/// Correctness for every scored question plus the totals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreSheet {
    pub subjects: Vec<SubjectScore>,
    pub total_correct: u32,
    pub total_questions: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubjectScore {
    pub name: String,
    /// Correct option for question `i + 1`.
    pub key: Vec<Choice>,
    /// Whether question `i + 1` was answered correctly.
    pub marks: Vec<bool>,
    pub correct: u32,
    pub total: u32,
}

impl SubjectScore {
    pub fn correct_answer(&self, question: u32) -> Option<Choice> {
        question
            .checked_sub(1)
            .and_then(|i| self.key.get(i as usize))
            .copied()
    }

    pub fn is_correct(&self, question: u32) -> Option<bool> {
        question
            .checked_sub(1)
            .and_then(|i| self.marks.get(i as usize))
            .copied()
    }
}

impl ScoreSheet {
    /// Share of questions answered correctly, `0.0` when nothing was scored.
    pub fn ratio(&self) -> f64 {
        if self.total_questions == 0 {
            0.0
        } else {
            f64::from(self.total_correct) / f64::from(self.total_questions)
        }
    }

    pub fn subject(&self, name: &str) -> Option<&SubjectScore> {
        self.subjects.iter().find(|s| s.name == name)
    }
}

/// Compare the recorded answers against `key`.
///
/// A question counts as correct only when it has a recorded answer equal to
/// the key value; unanswered questions are always wrong.
pub fn score(record: &SessionRecord, key: &AnswerKey) -> ScoreSheet {
    let mut subjects = Vec::with_capacity(record.subjects.len());
    let mut total_correct = 0;
    let mut total_questions = 0;

    for id in record.subject_ids() {
        let Some(subject) = record.subject(id) else {
            continue;
        };
        let count = record.effective_question_count(id);
        let subject_key: Vec<Choice> = key
            .subjects
            .iter()
            .find(|k| k.name == subject.name)
            .map(|k| k.answers.iter().take(count as usize).copied().collect())
            .unwrap_or_default();

        let marks: Vec<bool> = (1..=count)
            .map(|q| {
                subject_key
                    .get(q as usize - 1)
                    .is_some_and(|c| subject.answer(q).matches(*c))
            })
            .collect();
        let correct = marks.iter().filter(|m| **m).count() as u32;

        total_correct += correct;
        total_questions += count;
        subjects.push(SubjectScore {
            name: subject.name.clone(),
            key: subject_key,
            marks,
            correct,
            total: count,
        });
    }

    ScoreSheet {
        subjects,
        total_correct,
        total_questions,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Answer, Mode, SubjectRecord};

    fn choice(v: u8) -> Choice {
        Choice::new(v).unwrap()
    }

    fn record_with(mode: Mode, limit: u32, answers: &[(u32, Option<u8>)]) -> SessionRecord {
        let mut subject = SubjectRecord::new("언어 이해", limit);
        for (q, a) in answers {
            subject
                .answers
                .insert(*q, Answer::from(a.and_then(Choice::new)));
            subject.extend_reached(*q);
        }
        SessionRecord::new(mode, vec![subject])
    }

    fn input(cells: &[&str]) -> AnswerKeyInput {
        let mut input = AnswerKeyInput::default();
        input.push("언어 이해", cells.iter().map(|s| s.to_string()).collect());
        input
    }

    #[test]
    fn split_key_line_variants() {
        assert_eq!(split_key_line("3 2 5"), vec!["3", "2", "5"]);
        assert_eq!(split_key_line("3,2, 5"), vec!["3", "2", "5"]);
        assert_eq!(split_key_line("325"), vec!["3", "2", "5"]);
        assert!(split_key_line("   ").is_empty());
    }

    #[test]
    fn split_key_line_expands_digit_groups() {
        assert_eq!(
            split_key_line("24135 52413"),
            vec!["2", "4", "1", "3", "5", "5", "2", "4", "1", "3"]
        );
        assert_eq!(split_key_line("12,3"), vec!["1", "2", "3"]);
        // Non-digit groups stay whole.
        assert_eq!(split_key_line("1.5 2"), vec!["1.5", "2"]);
        assert_eq!(split_key_line("20 questions").len(), 3);
    }

    #[test]
    fn worked_example_scores_one_of_two() {
        let record = record_with(Mode::Exam, 2, &[(1, Some(3)), (2, None)]);
        let key = validate_answer_key(&record, &input(&["3", "2"])).unwrap();
        let sheet = score(&record, &key);
        let subject = sheet.subject("언어 이해").unwrap();
        assert_eq!(subject.correct, 1);
        assert_eq!(subject.total, 2);
        assert_eq!(subject.is_correct(1), Some(true));
        assert_eq!(subject.is_correct(2), Some(false));
        assert_eq!(subject.correct_answer(2), Some(choice(2)));
        assert_eq!(sheet.total_correct, 1);
        assert_eq!(sheet.total_questions, 2);
    }

    #[test]
    fn exam_requires_full_limit() {
        let record = record_with(Mode::Exam, 4, &[(1, Some(1))]);
        let err = validate_answer_key(&record, &input(&["1", "2"])).unwrap_err();
        assert_eq!(
            err,
            AnswerKeyError::EmptyCell {
                subject: "언어 이해".into(),
                question: 3
            }
        );
    }

    #[test]
    fn practice_requires_only_reached_questions() {
        let record = record_with(Mode::Practice, 20, &[(1, Some(1)), (2, Some(4))]);
        let key = validate_answer_key(&record, &input(&["1", "3"])).unwrap();
        assert_eq!(key.subjects[0].answers, vec![choice(1), choice(3)]);
        let sheet = score(&record, &key);
        assert_eq!(sheet.total_questions, 2);
        assert_eq!(sheet.total_correct, 1);
    }

    #[test]
    fn rejects_blank_non_numeric_and_out_of_range() {
        let record = record_with(Mode::Exam, 2, &[]);
        assert!(matches!(
            validate_answer_key(&record, &input(&["1", " "])),
            Err(AnswerKeyError::EmptyCell { question: 2, .. })
        ));
        assert!(matches!(
            validate_answer_key(&record, &input(&["x", "1"])),
            Err(AnswerKeyError::NotNumeric { question: 1, .. })
        ));
        assert!(matches!(
            validate_answer_key(&record, &input(&["1", "6"])),
            Err(AnswerKeyError::OutOfRange { value: 6, .. })
        ));
        assert!(matches!(
            validate_answer_key(&record, &input(&["0", "1"])),
            Err(AnswerKeyError::OutOfRange { value: 0, .. })
        ));
    }

    #[test]
    fn rejects_missing_subject() {
        let record = record_with(Mode::Exam, 1, &[]);
        let mut other = AnswerKeyInput::default();
        other.push("자료 해석", vec!["1".into()]);
        let err = validate_answer_key(&record, &other).unwrap_err();
        assert_eq!(err, AnswerKeyError::MissingSubject("언어 이해".into()));
        assert_eq!(err.subject(), "언어 이해");
    }

    #[test]
    fn extra_cells_are_ignored() {
        let record = record_with(Mode::Exam, 1, &[(1, Some(2))]);
        let key = validate_answer_key(&record, &input(&["2", "9", "x"])).unwrap();
        assert_eq!(key.subjects[0].answers.len(), 1);
        assert_eq!(score(&record, &key).total_correct, 1);
    }

    #[test]
    fn n_correct_out_of_m() {
        let answers: Vec<(u32, Option<u8>)> = (1..=10)
            .map(|q| (q, Some(if q <= 7 { 1 } else { 2 })))
            .collect();
        let record = record_with(Mode::Exam, 10, &answers);
        let key = validate_answer_key(&record, &input(&["1"; 10])).unwrap();
        let sheet = score(&record, &key);
        assert_eq!(sheet.total_correct, 7);
        assert_eq!(sheet.total_questions, 10);
        assert!((sheet.ratio() - 0.7).abs() < f64::EPSILON);
    }
}
