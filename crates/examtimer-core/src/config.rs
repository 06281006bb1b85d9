//! Session configuration and loading.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::model::{Mode, SubjectRecord};

/// Top-level examtimer configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExamConfig {
    /// Exam subjects in presentation order.
    #[serde(default = "default_exam_subjects")]
    pub exam_subjects: Vec<String>,
    /// Name of the single practice pseudo-subject.
    #[serde(default = "default_practice_subject")]
    pub practice_subject: String,
    /// Navigable questions per subject.
    #[serde(default = "default_questions")]
    pub questions_per_subject: u32,
    /// Time allowed per exam subject, in seconds.
    #[serde(default = "default_subject_secs")]
    pub subject_duration_secs: u32,
    /// Break between exam subjects, in seconds.
    #[serde(default = "default_break_secs")]
    pub break_duration_secs: u32,
}

fn default_exam_subjects() -> Vec<String> {
    ["언어 이해", "언어 추리", "자료 해석", "창의 수리"]
        .into_iter()
        .map(String::from)
        .collect()
}
fn default_practice_subject() -> String {
    "연습 모드".to_string()
}
fn default_questions() -> u32 {
    20
}
fn default_subject_secs() -> u32 {
    20 * 60
}
fn default_break_secs() -> u32 {
    60
}

impl Default for ExamConfig {
    fn default() -> Self {
        Self {
            exam_subjects: default_exam_subjects(),
            practice_subject: default_practice_subject(),
            questions_per_subject: default_questions(),
            subject_duration_secs: default_subject_secs(),
            break_duration_secs: default_break_secs(),
        }
    }
}

impl ExamConfig {
    /// Fresh subject records for a session in `mode`.
    pub fn subjects_for(&self, mode: Mode) -> Vec<SubjectRecord> {
        let names: Vec<&str> = match mode {
            Mode::Exam => self.exam_subjects.iter().map(String::as_str).collect(),
            Mode::Practice => vec![self.practice_subject.as_str()],
        };
        names
            .into_iter()
            .map(|name| SubjectRecord::new(name, self.questions_per_subject))
            .collect()
    }

    pub fn validate(&self) -> Result<()> {
        anyhow::ensure!(
            !self.exam_subjects.is_empty(),
            "exam_subjects must name at least one subject"
        );
        anyhow::ensure!(
            self.exam_subjects.iter().all(|s| !s.trim().is_empty()),
            "exam subject names must not be blank"
        );
        let mut seen = HashSet::new();
        if let Some(dup) = self
            .exam_subjects
            .iter()
            .find(|name| !seen.insert(name.trim()))
        {
            anyhow::bail!("exam subject '{dup}' is listed more than once");
        }
        anyhow::ensure!(
            !self.practice_subject.trim().is_empty(),
            "practice_subject must not be blank"
        );
        anyhow::ensure!(
            self.questions_per_subject >= 1,
            "questions_per_subject must be at least 1"
        );
        anyhow::ensure!(
            self.subject_duration_secs >= 1,
            "subject_duration_secs must be at least 1"
        );
        anyhow::ensure!(
            self.break_duration_secs >= 1,
            "break_duration_secs must be at least 1"
        );
        Ok(())
    }
}

/// Load configuration from well-known paths.
///
/// Search order:
/// 1. `examtimer.toml` in the current directory
/// 2. `~/.config/examtimer/config.toml`
///
/// Environment variable overrides: `EXAMTIMER_SUBJECT_SECS`,
/// `EXAMTIMER_BREAK_SECS`, `EXAMTIMER_QUESTIONS`.
pub fn load_config() -> Result<ExamConfig> {
    load_config_from(None)
}

/// Load config from an explicit path, or search the default locations.
pub fn load_config_from(path: Option<&Path>) -> Result<ExamConfig> {
    let config_path = if let Some(p) = path {
        if p.exists() {
            Some(p.to_path_buf())
        } else {
            anyhow::bail!("config file not found: {}", p.display());
        }
    } else {
        let local = PathBuf::from("examtimer.toml");
        if local.exists() {
            Some(local)
        } else {
            dirs_path()
                .map(|dir| dir.join("config.toml"))
                .filter(|global| global.exists())
        }
    };

    let mut config = match config_path {
        Some(path) => {
            tracing::debug!("loading config from {}", path.display());
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            parse_config_str(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?
        }
        None => ExamConfig::default(),
    };

    apply_env_overrides(&mut config)?;
    config.validate()?;
    Ok(config)
}

/// Parse a TOML string into an `ExamConfig` (useful for testing).
pub fn parse_config_str(content: &str) -> Result<ExamConfig> {
    Ok(toml::from_str::<ExamConfig>(content)?)
}

fn apply_env_overrides(config: &mut ExamConfig) -> Result<()> {
    if let Some(secs) = env_u32("EXAMTIMER_SUBJECT_SECS")? {
        config.subject_duration_secs = secs;
    }
    if let Some(secs) = env_u32("EXAMTIMER_BREAK_SECS")? {
        config.break_duration_secs = secs;
    }
    if let Some(count) = env_u32("EXAMTIMER_QUESTIONS")? {
        config.questions_per_subject = count;
    }
    Ok(())
}

fn env_u32(name: &str) -> Result<Option<u32>> {
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse::<u32>()
            .map(Some)
            .with_context(|| format!("{name} must be a non-negative integer, got '{raw}'")),
        Err(_) => Ok(None),
    }
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("examtimer"))
}
