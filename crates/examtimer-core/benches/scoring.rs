use criterion::{black_box, criterion_group, criterion_main, Criterion};

use examtimer_core::config::ExamConfig;
use examtimer_core::model::{Answer, Choice, Mode, SessionRecord};
use examtimer_core::results::ResultTable;
use examtimer_core::scoring::{score, split_key_line, validate_answer_key, AnswerKeyInput};

fn make_record(mode: Mode) -> SessionRecord {
    let mut subjects = ExamConfig::default().subjects_for(mode);
    for subject in &mut subjects {
        for q in 1..=subject.question_limit {
            let answer = Choice::new((q % 5 + 1) as u8).map_or(Answer::Unanswered, Answer::Choice);
            subject.answers.insert(q, answer);
            subject.times.insert(q, u64::from(q) * 7);
            subject.extend_reached(q);
        }
    }
    SessionRecord::new(mode, subjects)
}

fn make_input(record: &SessionRecord) -> AnswerKeyInput {
    let mut input = AnswerKeyInput::default();
    for subject in &record.subjects {
        let cells = (1..=subject.question_limit)
            .map(|q| ((q % 3) + 1).to_string())
            .collect();
        input.push(subject.name.clone(), cells);
    }
    input
}

fn bench_validate(c: &mut Criterion) {
    let mut group = c.benchmark_group("validate_answer_key");

    for mode in [Mode::Exam, Mode::Practice] {
        let record = make_record(mode);
        let input = make_input(&record);
        group.bench_function(mode.to_string(), |b| {
            b.iter(|| validate_answer_key(black_box(&record), black_box(&input)))
        });
    }

    group.bench_function("split_key_line", |b| {
        b.iter(|| split_key_line(black_box("3 2 5 1 4 3 2 5 1 4 3 2 5 1 4 3 2 5 1 4")))
    });

    group.finish();
}

fn bench_score(c: &mut Criterion) {
    let mut group = c.benchmark_group("score");
    let record = make_record(Mode::Exam);
    let key = match validate_answer_key(&record, &make_input(&record)) {
        Ok(key) => key,
        Err(e) => panic!("bench key invalid: {e}"),
    };

    group.bench_function("exam_4x20", |b| {
        b.iter(|| score(black_box(&record), black_box(&key)))
    });

    let sheet = score(&record, &key);
    group.bench_function("result_table", |b| {
        b.iter(|| ResultTable::build(black_box(&record), black_box(Some(&sheet))))
    });

    group.finish();
}

criterion_group!(benches, bench_validate, bench_score);
criterion_main!(benches);
