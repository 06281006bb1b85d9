//! The `examtimer run` command: an interactive terminal session.
//!
//! Stdin lines and ticker ticks share one channel, and a single blocking task
//! owns the [`Session`] and feeds it one input at a time.

use std::io::BufRead;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use examtimer_core::config::load_config_from;
use examtimer_core::model::{format_clock, Choice, Mode};
use examtimer_core::parser::parse_answer_key;
use examtimer_core::report::ExamReport;
use examtimer_core::scoring::{split_key_line, AnswerKeyInput};
use examtimer_core::session::{Command, Phase, Session, SessionEvent};
use examtimer_core::timer::TickerId;
use examtimer_core::traits::{Confirmation, Frontend, Resettable};
use examtimer_tools::sketch::{Point, Tool};
use examtimer_tools::ScratchTools;

use crate::output::{parse_formats, print_results, write_reports};

/// Everything the session loop can receive.
#[derive(Debug)]
enum Input {
    Line(String),
    Tick(TickerId),
    Eof,
}

/// One parsed line typed during a question or break.
#[derive(Debug, Clone, PartialEq)]
enum Action {
    Session(Command),
    Status,
    List,
    Help,
    Quit,
    Calc(Option<String>),
    Memo(Option<String>),
    Draw(Vec<Point>),
    SetTool(Tool),
    Unknown(String),
    Nothing,
}

fn parse_action(line: &str, mode: Mode) -> Action {
    let line = line.trim();
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((w, r)) => (w, Some(r.trim()).filter(|r| !r.is_empty())),
        None => (line, None),
    };

    if let Ok(value) = word.parse::<u8>() {
        if rest.is_none() {
            return match Choice::new(value) {
                Some(choice) => Action::Session(Command::Select(choice)),
                None => Action::Unknown(line.to_string()),
            };
        }
    }

    match word.to_ascii_lowercase().as_str() {
        "" => Action::Nothing,
        "n" | "next" => Action::Session(Command::NextQuestion),
        "p" | "prev" => Action::Session(Command::PrevQuestion),
        "g" | "goto" => match rest.and_then(|r| r.parse::<u32>().ok()) {
            Some(n) => Action::Session(Command::JumpTo(n)),
            None => Action::Unknown(line.to_string()),
        },
        "x" | "clear" => Action::Session(Command::ClearSelection),
        "pause" | "resume" => Action::Session(Command::TogglePause),
        "skip" => Action::Session(Command::SkipBreak),
        "exit" if mode == Mode::Practice => Action::Session(Command::ExitPractice),
        "quit" => Action::Quit,
        "s" | "status" => Action::Status,
        "l" | "list" => Action::List,
        "h" | "help" | "?" => Action::Help,
        "calc" | "=" => Action::Calc(rest.map(String::from)),
        "memo" => Action::Memo(rest.map(String::from)),
        "draw" => match rest.map(parse_points) {
            Some(Some(points)) => Action::Draw(points),
            _ => Action::Unknown(line.to_string()),
        },
        "pen" => Action::SetTool(Tool::Pen),
        "eraser" => Action::SetTool(Tool::Eraser),
        _ => Action::Unknown(line.to_string()),
    }
}

/// Parse `x,y x,y ...` into points.
fn parse_points(s: &str) -> Option<Vec<Point>> {
    s.split_whitespace()
        .map(|pair| {
            let (x, y) = pair.split_once(',')?;
            Some(Point::new(x.trim().parse().ok()?, y.trim().parse().ok()?))
        })
        .collect()
}

/// What the user picked once the session finished.
#[derive(Debug, Clone, PartialEq)]
enum ResultsChoice {
    TimesOnly,
    EnterKey,
    KeyFile(PathBuf),
    Unknown,
}

fn parse_results_choice(line: &str) -> ResultsChoice {
    let line = line.trim();
    match line.split_once(char::is_whitespace) {
        Some(("f" | "file", path)) if !path.trim().is_empty() => {
            ResultsChoice::KeyFile(PathBuf::from(path.trim()))
        }
        _ => match line.to_ascii_lowercase().as_str() {
            "t" | "times" => ResultsChoice::TimesOnly,
            "k" | "key" => ResultsChoice::EnterKey,
            _ => ResultsChoice::Unknown,
        },
    }
}

/// Countdown lines are printed on each full minute and for the last ten
/// seconds.
fn announce_countdown(secs: u32) -> bool {
    secs % 60 == 0 || secs <= 10
}

// ---------------------------------------------------------------------------
// Terminal front-end
// ---------------------------------------------------------------------------

struct TerminalFrontend {
    rx: mpsc::UnboundedReceiver<Input>,
    tools: ScratchTools,
    closed: bool,
}

impl TerminalFrontend {
    /// Next line of user input. Ticks that arrive meanwhile are dropped, so a
    /// countdown does not advance while a prompt is open.
    fn read_line(&mut self) -> Option<String> {
        loop {
            match self.rx.blocking_recv() {
                Some(Input::Line(line)) => return Some(line),
                Some(Input::Tick(_)) => continue,
                Some(Input::Eof) | None => {
                    self.closed = true;
                    return None;
                }
            }
        }
    }

    fn next_input(&mut self) -> Option<Input> {
        match self.rx.blocking_recv() {
            Some(Input::Eof) | None => {
                self.closed = true;
                None
            }
            other => other,
        }
    }
}

impl Frontend for TerminalFrontend {
    fn confirm(&mut self, prompt: Confirmation) -> bool {
        println!("{} [y/N]", prompt.message());
        self.read_line().is_some_and(|answer| {
            matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
        })
    }

    fn reset_tools(&mut self) {
        self.tools.reset();
    }

    fn on_event(&mut self, event: &SessionEvent) {
        match event {
            SessionEvent::SubjectStarted {
                subject,
                index,
                count,
            } => println!("\n=== {subject} ({}/{count}) ===", index + 1),
            SessionEvent::QuestionShown(view) => {
                println!(
                    "[{}] Question {}/{}  selected: {}",
                    view.subject, view.number, view.question_limit, view.selected
                );
            }
            SessionEvent::SelectionChanged(answer) => println!("Selected: {answer}"),
            SessionEvent::CountdownTick {
                remaining,
                secs,
                on_break,
            } => {
                if announce_countdown(*secs) {
                    let label = if *on_break { "Break" } else { "Time" };
                    println!("{label} remaining: {remaining}");
                }
            }
            SessionEvent::StopwatchTick { .. } => {}
            SessionEvent::PauseChanged { paused } => {
                self.tools.set_paused(*paused);
                if *paused {
                    println!("Paused. Type 'resume' to continue.");
                } else {
                    println!("Resumed.");
                }
            }
            SessionEvent::BreakStarted {
                next_subject,
                remaining,
            } => println!(
                "\nBreak ({remaining}). Next subject: {next_subject}. Type 'skip' to start now."
            ),
            SessionEvent::SessionFinished { mode } => println!(
                "\n{mode} finished. Type 't' for times only, 'k' to enter the answer key, \
                 or 'f <path>' to load one."
            ),
            SessionEvent::ResultsReady { scored } => {
                tracing::debug!(scored, "results ready");
            }
            SessionEvent::AnswerKeyRejected(e) => println!("Answer key rejected: {e}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Tickers
// ---------------------------------------------------------------------------

/// Keeps exactly one interval task alive for the session's active ticker.
struct TickerTasks {
    runtime: Handle,
    tx: mpsc::UnboundedSender<Input>,
    running: Option<(TickerId, JoinHandle<()>)>,
}

impl TickerTasks {
    fn sync(&mut self, active: Option<TickerId>) {
        if self.running.as_ref().map(|(id, _)| *id) == active {
            return;
        }
        if let Some((_, task)) = self.running.take() {
            task.abort();
        }
        if let Some(id) = active {
            let tx = self.tx.clone();
            let task = self.runtime.spawn(async move {
                let period = Duration::from_secs(1);
                let mut interval =
                    tokio::time::interval_at(tokio::time::Instant::now() + period, period);
                loop {
                    interval.tick().await;
                    if tx.send(Input::Tick(id)).is_err() {
                        break;
                    }
                }
            });
            self.running = Some((id, task));
        }
    }

    fn stop(&mut self) {
        self.sync(None);
    }
}

// ---------------------------------------------------------------------------
// Session loop
// ---------------------------------------------------------------------------

fn print_help(mode: Mode) {
    println!("Commands:");
    println!("  1-5            select an option (again to clear)");
    println!("  x              clear the selection");
    println!("  n / p          next / previous question");
    println!("  g <n>          go to a reached question");
    if mode == Mode::Exam {
        println!("  pause          pause or resume the countdown");
        println!("  skip           start the next subject during a break");
    } else {
        println!("  exit           end the practice session");
    }
    println!("  s / l          status / reached questions");
    println!("  calc <expr>    calculator (cleared on every question change)");
    println!("  memo <text>    add a memo line");
    println!("  draw x,y ...   add a sketch stroke; pen / eraser switch tools");
    println!("  quit           abandon the session");
}

fn handle_action(action: Action, session: &mut Session, fe: &mut TerminalFrontend) -> bool {
    match action {
        Action::Session(command) => session.dispatch(command, fe),
        Action::Status => {
            let status = session.status();
            let paused = if status.paused { " (paused)" } else { "" };
            println!(
                "{} | {} | question {}/{} | {}{paused}",
                status.mode, status.subject, status.number, status.question_limit, status.timer
            );
        }
        Action::List => {
            if let Some(view) = session.question_view() {
                let marks: Vec<String> = view
                    .jump_list
                    .iter()
                    .map(|e| {
                        if e.answered {
                            format!("{}✔", e.number)
                        } else {
                            e.number.to_string()
                        }
                    })
                    .collect();
                println!("{}", marks.join(" "));
            }
        }
        Action::Help => print_help(session.mode()),
        Action::Quit => return false,
        Action::Calc(expr) => {
            let calc = &mut fe.tools.calculator;
            if let Some(expr) = expr {
                calc.clear();
                calc.append(&expr);
                calc.evaluate();
            }
            println!("= {}", calc.display());
        }
        Action::Memo(text) => {
            if let Some(text) = text {
                fe.tools.memo.push_line(&text);
            }
            println!("{}", fe.tools.memo.text());
        }
        Action::Draw(points) => {
            if fe.tools.sketch.draw(&points) {
                println!("{} stroke(s) on the sketch pad", fe.tools.sketch.strokes().len());
            } else {
                println!("Drawing is disabled while paused.");
            }
        }
        Action::SetTool(tool) => {
            fe.tools.sketch.set_tool(tool);
            println!("Tool: {tool:?}");
        }
        Action::Unknown(line) => println!("Unknown command: {line} (type 'help')"),
        Action::Nothing => {}
    }
    true
}

fn read_answer_key(session: &Session, fe: &mut TerminalFrontend) -> Option<AnswerKeyInput> {
    let mut input = AnswerKeyInput::default();
    for id in session.record().subject_ids() {
        let subject = session.record().subject(id)?;
        let count = session.record().effective_question_count(id);
        println!("{} answers for questions 1-{count}:", subject.name);
        let line = fe.read_line()?;
        input.push(subject.name.clone(), split_key_line(&line));
    }
    Some(input)
}

fn handle_results_line(line: &str, session: &mut Session, fe: &mut TerminalFrontend) {
    match parse_results_choice(line) {
        ResultsChoice::TimesOnly => session.dispatch(Command::ShowTimesOnly, fe),
        ResultsChoice::EnterKey => {
            if let Some(input) = read_answer_key(session, fe) {
                session.dispatch(Command::SubmitAnswers(input), fe);
            }
        }
        ResultsChoice::KeyFile(path) => match parse_answer_key(&path) {
            Ok(input) => session.dispatch(Command::SubmitAnswers(input), fe),
            Err(e) => println!("Could not load answer key: {e:#}"),
        },
        ResultsChoice::Unknown => {
            println!("Type 't' for times only, 'k' to enter the answer key, or 'f <path>'.")
        }
    }
}

/// Drive the session until results are shown or input ends. Returns the
/// report when results were reached.
fn drive(
    mut session: Session,
    mut fe: TerminalFrontend,
    mut tickers: TickerTasks,
    mode: Mode,
) -> Option<ExamReport> {
    print_help(mode);
    session.dispatch(Command::Start(mode), &mut fe);
    tickers.sync(session.active_ticker());

    while session.phase() != Phase::Reviewed {
        let Some(input) = fe.next_input() else {
            break;
        };
        match input {
            Input::Tick(id) => session.dispatch(Command::Tick(id), &mut fe),
            Input::Line(line) if session.phase() == Phase::Finished => {
                handle_results_line(&line, &mut session, &mut fe);
            }
            Input::Line(line) => {
                if !handle_action(parse_action(&line, mode), &mut session, &mut fe) {
                    tracing::info!("session abandoned");
                    tickers.stop();
                    return None;
                }
            }
            Input::Eof => break,
        }
        if fe.closed {
            break;
        }
        tickers.sync(session.active_ticker());
    }
    tickers.stop();

    if session.phase() == Phase::Reviewed {
        Some(session.report())
    } else {
        tracing::info!("input closed before results were shown");
        None
    }
}

pub async fn execute(
    mode: Mode,
    config_path: Option<PathBuf>,
    output: Option<PathBuf>,
    format: String,
) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    let formats = parse_formats(&format)?;

    eprintln!(
        "examtimer v{}: {} mode, {} question(s) per subject",
        env!("CARGO_PKG_VERSION"),
        mode,
        config.questions_per_subject
    );
    if mode == Mode::Exam {
        eprintln!(
            "{} subjects, {} each, {} breaks",
            config.exam_subjects.len(),
            format_clock(u64::from(config.subject_duration_secs)),
            format_clock(u64::from(config.break_duration_secs))
        );
    }

    let (tx, rx) = mpsc::unbounded_channel();

    let stdin_tx = tx.clone();
    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            match line {
                Ok(line) => {
                    if stdin_tx.send(Input::Line(line)).is_err() {
                        return;
                    }
                }
                Err(e) => {
                    tracing::warn!("stdin read failed: {e}");
                    break;
                }
            }
        }
        let _ = stdin_tx.send(Input::Eof);
    });

    let session = Session::new(config);
    let fe = TerminalFrontend {
        rx,
        tools: ScratchTools::new(),
        closed: false,
    };
    let tickers = TickerTasks {
        runtime: Handle::current(),
        tx,
        running: None,
    };

    let report = tokio::task::spawn_blocking(move || drive(session, fe, tickers, mode))
        .await
        .context("session task failed")?;

    let Some(report) = report else {
        eprintln!("Session ended without results.");
        return Ok(());
    };

    print_results(&report.result_table());

    if let Some(dir) = output {
        for path in write_reports(&report, &dir, &formats)? {
            eprintln!("Report saved to: {}", path.display());
        }
    }

    Ok(())
}
