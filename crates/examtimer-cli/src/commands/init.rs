//! The `examtimer init` command.

use anyhow::Result;

pub fn execute() -> Result<()> {
    if std::path::Path::new("examtimer.toml").exists() {
        println!("examtimer.toml already exists, skipping.");
    } else {
        std::fs::write("examtimer.toml", SAMPLE_CONFIG)?;
        println!("Created examtimer.toml");
    }

    let key_path = std::path::Path::new("answer-key.example.toml");
    if key_path.exists() {
        println!("answer-key.example.toml already exists, skipping.");
    } else {
        std::fs::write(key_path, EXAMPLE_ANSWER_KEY)?;
        println!("Created answer-key.example.toml");
    }

    println!("\nNext steps:");
    println!("  1. Adjust subjects and durations in examtimer.toml");
    println!("  2. Run: examtimer run --mode exam --output reports");
    println!("  3. Run: examtimer score --report reports/<file>.json --answer-key answer-key.example.toml");

    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# examtimer configuration

exam_subjects = ["언어 이해", "언어 추리", "자료 해석", "창의 수리"]
practice_subject = "연습 모드"
questions_per_subject = 20

# 20 minutes per subject, 1 minute break
subject_duration_secs = 1200
break_duration_secs = 60
"#;

const EXAMPLE_ANSWER_KEY: &str = r#"# One table per subject, in exam order. Options are 1-5.

[[subjects]]
name = "언어 이해"
answers = [3, 2, 5, 1, 4, 2, 2, 3, 1, 5, 4, 4, 1, 2, 3, 5, 1, 2, 4, 3]

[[subjects]]
name = "언어 추리"
line = "1 4 2 2 5 3 1 4 4 2 5 1 3 3 2 4 5 1 2 3"

[[subjects]]
name = "자료 해석"
line = "24135 52413 31524 45231"

[[subjects]]
name = "창의 수리"
answers = ["5", "1", "2", "3", "4", "1", "5", "2", "3", "4", "2", "1", "5", "4", "3", "1", "2", "3", "4", "5"]
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use examtimer_core::config::parse_config_str;
    use examtimer_core::parser::{lint_answer_key, parse_answer_key_str};

    #[test]
    fn sample_config_matches_defaults() {
        let config = parse_config_str(SAMPLE_CONFIG).unwrap();
        assert_eq!(config, examtimer_core::config::ExamConfig::default());
    }

    #[test]
    fn example_key_is_clean() {
        let input =
            parse_answer_key_str(EXAMPLE_ANSWER_KEY, std::path::Path::new("key.toml")).unwrap();
        assert_eq!(input.subjects.len(), 4);
        assert!(input.subjects.iter().all(|s| s.cells.len() == 20));
        assert!(lint_answer_key(&input).is_empty());
    }
}
