//! TOML answer-key parser.
//!
//! Loads answer keys from files and checks them for structural problems that
//! can be spotted without a recorded session.

use std::collections::HashSet;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::model::Choice;
use crate::scoring::{split_key_line, AnswerKeyInput};

/// Intermediate TOML structure for answer-key files.
#[derive(Debug, Deserialize)]
struct TomlAnswerKeyFile {
    #[serde(default)]
    subjects: Vec<TomlSubjectKey>,
}

#[derive(Debug, Deserialize)]
struct TomlSubjectKey {
    name: String,
    /// Cells as integers or strings.
    #[serde(default)]
    answers: Vec<toml::Value>,
    /// Alternative compact form, e.g. `"3 2 5 1"` or `"3251"`.
    #[serde(default)]
    line: Option<String>,
}

/// Parse an answer-key TOML file.
pub fn parse_answer_key(path: &Path) -> Result<AnswerKeyInput> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read answer key: {}", path.display()))?;

    parse_answer_key_str(&content, path)
}

/// Parse a TOML string into raw answer-key cells (useful for testing).
pub fn parse_answer_key_str(content: &str, source_path: &Path) -> Result<AnswerKeyInput> {
    let parsed: TomlAnswerKeyFile = toml::from_str(content)
        .with_context(|| format!("failed to parse TOML: {}", source_path.display()))?;

    let mut input = AnswerKeyInput::default();
    for subject in parsed.subjects {
        let mut cells: Vec<String> = subject.answers.iter().map(cell_text).collect();
        if cells.is_empty() {
            if let Some(line) = &subject.line {
                cells = split_key_line(line);
            }
        }
        input.push(subject.name, cells);
    }
    Ok(input)
}

fn cell_text(value: &toml::Value) -> String {
    match value {
        toml::Value::String(s) => s.clone(),
        toml::Value::Integer(i) => i.to_string(),
        other => other.to_string(),
    }
}

/// A structural problem found in an answer key.
#[derive(Debug, Clone)]
pub struct KeyWarning {
    /// The subject name (if applicable).
    pub subject: Option<String>,
    /// Warning message.
    pub message: String,
}

/// Check an answer key for problems that do not depend on a session.
pub fn lint_answer_key(input: &AnswerKeyInput) -> Vec<KeyWarning> {
    let mut warnings = Vec::new();

    if input.subjects.is_empty() {
        warnings.push(KeyWarning {
            subject: None,
            message: "answer key contains no subjects".into(),
        });
    }

    let mut seen = HashSet::new();
    for subject in &input.subjects {
        if !seen.insert(subject.name.trim()) {
            warnings.push(KeyWarning {
                subject: Some(subject.name.clone()),
                message: format!("duplicate subject: {}", subject.name),
            });
        }
    }

    for subject in &input.subjects {
        if subject.cells.is_empty() {
            warnings.push(KeyWarning {
                subject: Some(subject.name.clone()),
                message: "no answers listed".into(),
            });
        }
        for (i, cell) in subject.cells.iter().enumerate() {
            let valid = cell
                .trim()
                .parse::<u8>()
                .ok()
                .and_then(Choice::new)
                .is_some();
            if !valid {
                warnings.push(KeyWarning {
                    subject: Some(subject.name.clone()),
                    message: format!("question {}: '{}' is not an option 1-5", i + 1, cell),
                });
            }
        }
    }

    warnings
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    const VALID_TOML: &str = r#"
[[subjects]]
name = "언어 이해"
answers = [3, 2, 5, 1]

[[subjects]]
name = "언어 추리"
answers = ["1", "4"]

[[subjects]]
name = "자료 해석"
line = "2 2 3"
"#;

    #[test]
    fn parse_valid_toml() {
        let input = parse_answer_key_str(VALID_TOML, &PathBuf::from("key.toml")).unwrap();
        assert_eq!(input.subjects.len(), 3);
        assert_eq!(input.subjects[0].cells, vec!["3", "2", "5", "1"]);
        assert_eq!(input.subjects[1].cells, vec!["1", "4"]);
        assert_eq!(input.subjects[2].cells, vec!["2", "2", "3"]);
        assert!(lint_answer_key(&input).is_empty());
    }

    #[test]
    fn non_integer_cells_are_kept_for_validation() {
        let toml = r#"
[[subjects]]
name = "A"
answers = [1.5, "", true]
"#;
        let input = parse_answer_key_str(toml, &PathBuf::from("key.toml")).unwrap();
        assert_eq!(input.subjects[0].cells, vec!["1.5", "", "true"]);
        assert_eq!(lint_answer_key(&input).len(), 3);
    }

    #[test]
    fn lint_duplicate_and_empty_subjects() {
        let toml = r#"
[[subjects]]
name = "A"
answers = [1]

[[subjects]]
name = "A"
"#;
        let input = parse_answer_key_str(toml, &PathBuf::from("key.toml")).unwrap();
        let warnings = lint_answer_key(&input);
        assert!(warnings.iter().any(|w| w.message.contains("duplicate")));
        assert!(warnings.iter().any(|w| w.message.contains("no answers")));
    }

    #[test]
    fn lint_empty_key() {
        let input = parse_answer_key_str("", &PathBuf::from("key.toml")).unwrap();
        assert!(lint_answer_key(&input)[0].message.contains("no subjects"));
    }

    #[test]
    fn grouped_line_gives_one_cell_per_digit() {
        let toml = r#"
[[subjects]]
name = "자료 해석"
line = "24135 52413 31524 45231"
"#;
        let input = parse_answer_key_str(toml, &PathBuf::from("key.toml")).unwrap();
        assert_eq!(input.subjects[0].cells.len(), 20);
        assert_eq!(input.subjects[0].cells[5], "5");
        assert!(lint_answer_key(&input).is_empty());
    }

    #[test]
    fn parse_malformed_toml() {
        let result = parse_answer_key_str("[[subjects]\nname=", &PathBuf::from("bad.toml"));
        assert!(result.is_err());
    }

    #[test]
    fn parse_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("key.toml");
        std::fs::write(&path, VALID_TOML).unwrap();
        let input = parse_answer_key(&path).unwrap();
        assert_eq!(input.subjects[0].name, "언어 이해");
    }
}
