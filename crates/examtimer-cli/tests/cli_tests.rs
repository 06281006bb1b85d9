//! CLI integration tests using assert_cmd.

use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

use examtimer_core::model::{Answer, Choice, Mode, SessionRecord, SubjectRecord};
use examtimer_core::report::ExamReport;

fn examtimer() -> Command {
    #[allow(deprecated)]
    let mut cmd = Command::cargo_bin("examtimer").unwrap();
    cmd.env_remove("EXAMTIMER_SUBJECT_SECS")
        .env_remove("EXAMTIMER_BREAK_SECS")
        .env_remove("EXAMTIMER_QUESTIONS");
    cmd
}

const KEY_TOML: &str = r#"
[[subjects]]
name = "언어 이해"
answers = [3, 2]
"#;

/// One exam subject with two questions: question 1 answered 3, question 2 blank.
fn write_report(dir: &Path) -> std::path::PathBuf {
    let mut subject = SubjectRecord::new("언어 이해", 2);
    subject
        .answers
        .insert(1, Answer::Choice(Choice::new(3).unwrap()));
    subject.times.insert(1, 45);
    subject.times.insert(2, 30);
    subject.extend_reached(2);
    let report = ExamReport::new(SessionRecord::new(Mode::Exam, vec![subject]), None);
    let path = dir.join("report.json");
    report.save_json(&path).unwrap();
    path
}

fn write_config(dir: &Path, questions: u32) -> std::path::PathBuf {
    let path = dir.join("examtimer.toml");
    std::fs::write(
        &path,
        format!("questions_per_subject = {questions}\nsubject_duration_secs = 600\n"),
    )
    .unwrap();
    path
}

#[test]
fn help_lists_commands() {
    examtimer()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("run"))
        .stdout(predicate::str::contains("score"))
        .stdout(predicate::str::contains("validate"));
}

#[test]
fn version_flag() {
    examtimer()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("examtimer"));
}

#[test]
fn calc_respects_precedence() {
    examtimer()
        .args(["calc", "1+2*3"])
        .assert()
        .success()
        .stdout(predicate::str::diff("7\n"));
}

#[test]
fn calc_joins_arguments() {
    examtimer()
        .args(["calc", "-2", "*", "(1.5", "+", "1)"])
        .assert()
        .success()
        .stdout(predicate::str::diff("-5\n"));
}

#[test]
fn calc_division_by_zero_fails() {
    examtimer()
        .args(["calc", "1/0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error"));
}

#[test]
fn init_creates_then_skips() {
    let dir = TempDir::new().unwrap();
    examtimer()
        .current_dir(dir.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("Created examtimer.toml"));
    let key = dir.path().join("answer-key.example.toml");
    assert!(key.exists());

    examtimer()
        .args(["validate", "--answer-key"])
        .arg(&key)
        .assert()
        .success()
        .stdout(predicate::str::contains("자료 해석 (20 answers)"))
        .stdout(predicate::str::contains("All answer keys valid"));

    examtimer()
        .current_dir(dir.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("already exists"));
}

#[test]
fn validate_clean_key() {
    let dir = TempDir::new().unwrap();
    let key = dir.path().join("key.toml");
    std::fs::write(&key, KEY_TOML).unwrap();

    examtimer()
        .args(["validate", "--answer-key"])
        .arg(&key)
        .assert()
        .success()
        .stdout(predicate::str::contains("언어 이해 (2 answers)"))
        .stdout(predicate::str::contains("All answer keys valid"));
}

#[test]
fn validate_reports_bad_cells() {
    let dir = TempDir::new().unwrap();
    let key = dir.path().join("key.toml");
    std::fs::write(&key, "[[subjects]]\nname = \"A\"\nanswers = [1, 9]\n").unwrap();

    examtimer()
        .args(["validate", "--answer-key"])
        .arg(&key)
        .assert()
        .success()
        .stdout(predicate::str::contains("question 2"))
        .stdout(predicate::str::contains("1 warning(s) found"));
}

#[test]
fn validate_against_report_requires_full_key() {
    let dir = TempDir::new().unwrap();
    let report = write_report(dir.path());
    let key = dir.path().join("key.toml");
    std::fs::write(&key, "[[subjects]]\nname = \"언어 이해\"\nanswers = [3]\n").unwrap();

    examtimer()
        .args(["validate", "--answer-key"])
        .arg(&key)
        .arg("--report")
        .arg(&report)
        .assert()
        .failure()
        .stderr(predicate::str::contains("question 2 has no answer"));
}

#[test]
fn validate_nonexistent_key() {
    examtimer()
        .args(["validate", "--answer-key", "does-not-exist.toml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to read answer key"));
}

#[test]
fn score_report_as_text() {
    let dir = TempDir::new().unwrap();
    let report = write_report(dir.path());
    let key = dir.path().join("key.toml");
    std::fs::write(&key, KEY_TOML).unwrap();

    examtimer()
        .arg("score")
        .arg("--report")
        .arg(&report)
        .arg("--answer-key")
        .arg(&key)
        .assert()
        .success()
        .stdout(predicate::str::contains("Exam results"))
        .stdout(predicate::str::contains("Total 1 / 2 (50.0%)"))
        .stdout(predicate::str::contains("언어 이해 1 / 2"));
}

#[test]
fn score_saves_scored_report() {
    let dir = TempDir::new().unwrap();
    let report = write_report(dir.path());
    let key = dir.path().join("key.toml");
    std::fs::write(&key, KEY_TOML).unwrap();
    let saved = dir.path().join("scored.json");

    examtimer()
        .arg("score")
        .arg("--report")
        .arg(&report)
        .arg("--answer-key")
        .arg(&key)
        .args(["--format", "markdown", "--save"])
        .arg(&saved)
        .assert()
        .success()
        .stdout(predicate::str::contains("| 1 | 3 | 3 | O | 00:45 |"));

    let loaded = ExamReport::load_json(&saved).unwrap();
    assert_eq!(loaded.score.unwrap().total_correct, 1);
}

#[test]
fn score_rejects_out_of_range_key() {
    let dir = TempDir::new().unwrap();
    let report = write_report(dir.path());
    let key = dir.path().join("key.toml");
    std::fs::write(&key, "[[subjects]]\nname = \"언어 이해\"\nline = \"3 7\"\n").unwrap();

    examtimer()
        .arg("score")
        .arg("--report")
        .arg(&report)
        .arg("--answer-key")
        .arg(&key)
        .assert()
        .failure()
        .stderr(predicate::str::contains("outside 1-5"));
}

#[test]
fn practice_run_shows_times_and_writes_report() {
    let dir = TempDir::new().unwrap();
    let config = write_config(dir.path(), 5);
    let out = dir.path().join("reports");

    examtimer()
        .args(["run", "--mode", "practice", "--format", "json,md", "--config"])
        .arg(&config)
        .arg("--output")
        .arg(&out)
        .write_stdin("3\nn\nexit\ny\nt\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Practice results"))
        .stdout(predicate::str::contains("연습 모드: 1 of 2 answered"));

    let written: Vec<_> = std::fs::read_dir(&out)
        .unwrap()
        .map(|e| e.unwrap().path())
        .collect();
    assert_eq!(written.len(), 2);
    let json = written
        .iter()
        .find(|p| p.extension().is_some_and(|e| e == "json"))
        .unwrap();
    let report = ExamReport::load_json(json).unwrap();
    assert_eq!(report.record.mode, Mode::Practice);
    assert_eq!(report.record.subjects[0].max_reached, 2);
}

#[test]
fn exam_run_scored_from_typed_key() {
    let dir = TempDir::new().unwrap();
    let config = write_config(dir.path(), 2);
    let subjects = ["언어 이해", "언어 추리", "자료 해석", "창의 수리"];

    // Answer question 1 with 2 in every subject, confirm skipping question 2,
    // skip each break, then type a key where question 1 is always 2.
    let mut script = String::new();
    for i in 0..subjects.len() {
        script.push_str("2\nn\nn\ny\n");
        if i + 1 < subjects.len() {
            script.push_str("skip\n");
        }
    }
    script.push_str("k\n");
    for _ in subjects {
        script.push_str("2 1\n");
    }

    examtimer()
        .args(["run", "--mode", "exam", "--config"])
        .arg(&config)
        .write_stdin(script)
        .assert()
        .success()
        .stdout(predicate::str::contains("Exam results"))
        .stdout(predicate::str::contains("Total 4 / 8 (50.0%)"));
}

#[test]
fn run_without_results_exits_cleanly() {
    let dir = TempDir::new().unwrap();
    let config = write_config(dir.path(), 3);

    examtimer()
        .args(["run", "--mode", "practice", "--config"])
        .arg(&config)
        .write_stdin("1\nquit\n")
        .assert()
        .success()
        .stderr(predicate::str::contains("Session ended without results"));
}

#[test]
fn run_rejects_unknown_format() {
    examtimer()
        .args(["run", "--format", "pdf"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown output format"));
}
