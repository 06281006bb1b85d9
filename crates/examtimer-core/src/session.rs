//! The session state machine.
//!
//! A `Session` is the single writer of all exam state. Front-ends translate
//! user input and timer ticks into `Command`s and feed them to
//! [`Session::dispatch`], which mutates the record, arms or cancels tickers,
//! and reports back through [`Frontend`].
//!
//! Every departure from a question goes through one commit step that adds
//! the wall-clock time spent on it and stores the selected option. The
//! question's start timestamp is consumed by that commit, so time can never
//! be counted twice for one visit.

use serde::{Deserialize, Serialize};

use crate::config::ExamConfig;
use crate::error::AnswerKeyError;
use crate::model::{format_clock, Answer, Choice, Mode, SessionRecord, SubjectId, SubjectRecord};
use crate::report::ExamReport;
use crate::results::ResultTable;
use crate::scoring::{score, validate_answer_key, AnswerKeyInput, ScoreSheet};
use crate::timer::{elapsed_secs, Countdown, Stopwatch, TickOutcome, TickerId, TickerKind, TickerSlot};
use crate::traits::{Clock, Confirmation, Frontend, SystemClock};

/// Where the session is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    /// No session started yet.
    Idle,
    /// A question is on screen.
    Question,
    /// Between exam subjects.
    Break,
    /// All subjects done; waiting for the user to pick scored or unscored results.
    Finished,
    /// Results are available.
    Reviewed,
}

/// Everything a front-end can ask the session to do.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Start(Mode),
    /// Select an option; selecting the current option again clears it.
    Select(Choice),
    ClearSelection,
    NextQuestion,
    PrevQuestion,
    /// Jump to a 1-based question number.
    JumpTo(u32),
    TogglePause,
    SkipBreak,
    ExitPractice,
    Tick(TickerId),
    ShowTimesOnly,
    SubmitAnswers(AnswerKeyInput),
}

/// One entry of the question jump list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct JumpEntry {
    pub number: u32,
    pub answered: bool,
}

/// What the presentation layer needs to draw the current question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionView {
    pub subject: String,
    /// 1-based question number.
    pub number: u32,
    pub question_limit: u32,
    /// Option currently selected on screen.
    pub selected: Answer,
    pub can_go_back: bool,
    /// Reachable questions with their answered marker.
    pub jump_list: Vec<JumpEntry>,
}

/// State-change notifications sent to the front-end.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    SubjectStarted {
        subject: String,
        index: usize,
        count: usize,
    },
    QuestionShown(QuestionView),
    SelectionChanged(Answer),
    CountdownTick {
        remaining: String,
        secs: u32,
        on_break: bool,
    },
    StopwatchTick {
        elapsed: String,
    },
    PauseChanged {
        paused: bool,
    },
    BreakStarted {
        next_subject: String,
        remaining: String,
    },
    SessionFinished {
        mode: Mode,
    },
    ResultsReady {
        scored: bool,
    },
    AnswerKeyRejected(AnswerKeyError),
}

/// Compact status for a header line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusView {
    pub mode: Mode,
    pub phase: Phase,
    pub subject: String,
    pub number: u32,
    pub question_limit: u32,
    /// Countdown remaining (exam) or stopwatch total (practice), `MM:SS`.
    pub timer: String,
    pub paused: bool,
    pub answered: bool,
}

/// The live exam or practice session.
pub struct Session<C: Clock = SystemClock> {
    config: ExamConfig,
    clock: C,
    record: SessionRecord,
    phase: Phase,
    subject: SubjectId,
    /// 0-based index of the question on screen.
    question: u32,
    selected: Answer,
    question_started_ms: Option<i64>,
    countdown: Countdown,
    stopwatch: Stopwatch,
    tickers: TickerSlot,
    score: Option<ScoreSheet>,
}

impl Session<SystemClock> {
    pub fn new(config: ExamConfig) -> Self {
        Self::with_clock(config, SystemClock)
    }
}

impl<C: Clock> Session<C> {
    pub fn with_clock(config: ExamConfig, clock: C) -> Self {
        Self {
            config,
            clock,
            record: SessionRecord::new(Mode::Exam, Vec::new()),
            phase: Phase::Idle,
            subject: SubjectId(0),
            question: 0,
            selected: Answer::Unanswered,
            question_started_ms: None,
            countdown: Countdown::new(),
            stopwatch: Stopwatch::default(),
            tickers: TickerSlot::default(),
            score: None,
        }
    }

    /// Apply one command.
    pub fn dispatch<F: Frontend + ?Sized>(&mut self, command: Command, frontend: &mut F) {
        match command {
            Command::Start(mode) => self.start(mode, frontend),
            Command::Select(choice) => self.select(choice, frontend),
            Command::ClearSelection => {
                if self.phase == Phase::Question && self.selected.is_answered() {
                    self.selected = Answer::Unanswered;
                    frontend.on_event(&SessionEvent::SelectionChanged(self.selected));
                }
            }
            Command::NextQuestion => self.next_question(frontend),
            Command::PrevQuestion => self.prev_question(frontend),
            Command::JumpTo(number) => self.jump_to(number, frontend),
            Command::TogglePause => self.toggle_pause(frontend),
            Command::SkipBreak => self.skip_break(frontend),
            Command::ExitPractice => self.exit_practice(frontend),
            Command::Tick(id) => self.tick(id, frontend),
            Command::ShowTimesOnly => self.show_times_only(frontend),
            Command::SubmitAnswers(input) => self.submit_answers(&input, frontend),
        }
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    pub fn config(&self) -> &ExamConfig {
        &self.config
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn mode(&self) -> Mode {
        self.record.mode
    }

    pub fn record(&self) -> &SessionRecord {
        &self.record
    }

    pub fn subject_id(&self) -> SubjectId {
        self.subject
    }

    pub fn current_subject(&self) -> Option<&SubjectRecord> {
        self.record.subject(self.subject)
    }

    /// 1-based number of the question on screen.
    pub fn question_number(&self) -> u32 {
        self.question + 1
    }

    pub fn selected(&self) -> Answer {
        self.selected
    }

    pub fn is_paused(&self) -> bool {
        self.countdown.is_paused()
    }

    pub fn countdown(&self) -> &Countdown {
        &self.countdown
    }

    /// The ticker the driver should be delivering, if any.
    pub fn active_ticker(&self) -> Option<TickerId> {
        self.tickers.active()
    }

    pub fn score(&self) -> Option<&ScoreSheet> {
        self.score.as_ref()
    }

    /// Result table once the user chose scored or unscored review.
    pub fn results(&self) -> Option<ResultTable> {
        (self.phase == Phase::Reviewed)
            .then(|| ResultTable::build(&self.record, self.score.as_ref()))
    }

    /// Snapshot of the finished session for export.
    pub fn report(&self) -> ExamReport {
        ExamReport::new(self.record.clone(), self.score.clone())
    }

    pub fn timer_display(&self) -> String {
        match self.record.mode {
            Mode::Exam => format_clock(u64::from(self.countdown.remaining_secs())),
            Mode::Practice => format_clock(self.stopwatch.total_secs(self.clock.now_ms())),
        }
    }

    pub fn status(&self) -> StatusView {
        let (subject, limit) = self
            .current_subject()
            .map(|s| (s.name.clone(), s.question_limit))
            .unwrap_or_default();
        StatusView {
            mode: self.record.mode,
            phase: self.phase,
            subject,
            number: self.question_number(),
            question_limit: limit,
            timer: self.timer_display(),
            paused: self.is_paused(),
            answered: self.selected.is_answered(),
        }
    }

    pub fn question_view(&self) -> Option<QuestionView> {
        let subject = self.current_subject()?;
        let reachable = subject.max_reached.max(self.question + 1);
        let jump_list = (1..=reachable)
            .map(|number| JumpEntry {
                number,
                answered: if number == self.question + 1 {
                    self.selected.is_answered()
                } else {
                    subject.answer(number).is_answered()
                },
            })
            .collect();
        Some(QuestionView {
            subject: subject.name.clone(),
            number: self.question + 1,
            question_limit: subject.question_limit,
            selected: self.selected,
            can_go_back: self.question > 0,
            jump_list,
        })
    }

    // -----------------------------------------------------------------------
    // Session controller
    // -----------------------------------------------------------------------

    fn start<F: Frontend + ?Sized>(&mut self, mode: Mode, frontend: &mut F) {
        self.tickers.cancel();
        self.stop_countdown(frontend);
        self.stopwatch.stop();
        self.record = SessionRecord::new(mode, self.config.subjects_for(mode));
        self.subject = SubjectId(0);
        self.question = 0;
        self.selected = Answer::Unanswered;
        self.question_started_ms = None;
        self.score = None;
        tracing::info!(
            session = %self.record.id,
            %mode,
            subjects = self.record.subjects.len(),
            "session started"
        );
        self.start_subject(frontend);
    }

    fn start_subject<F: Frontend + ?Sized>(&mut self, frontend: &mut F) {
        self.phase = Phase::Question;
        self.question = 0;
        let count = self.record.subjects.len();
        let Some(subject) = self.record.subject_mut(self.subject) else {
            return;
        };
        subject.extend_reached(1);
        let name = subject.name.clone();
        tracing::debug!(subject = %name, index = self.subject.index(), "subject started");
        frontend.on_event(&SessionEvent::SubjectStarted {
            subject: name,
            index: self.subject.index(),
            count,
        });
        frontend.reset_tools();

        if self.record.mode == Mode::Exam {
            self.countdown.start(self.config.subject_duration_secs);
            self.tickers.arm(TickerKind::Countdown);
            frontend.on_event(&SessionEvent::CountdownTick {
                remaining: format_clock(u64::from(self.countdown.remaining_secs())),
                secs: self.countdown.remaining_secs(),
                on_break: false,
            });
        }
        self.show_question(frontend);
    }

    fn finish<F: Frontend + ?Sized>(&mut self, frontend: &mut F) {
        self.tickers.cancel();
        self.stop_countdown(frontend);
        self.stopwatch.stop();
        self.question_started_ms = None;
        self.phase = Phase::Finished;
        tracing::info!(session = %self.record.id, mode = %self.record.mode, "session finished");
        frontend.on_event(&SessionEvent::SessionFinished {
            mode: self.record.mode,
        });
    }

    // -----------------------------------------------------------------------
    // Question navigator
    // -----------------------------------------------------------------------

    fn show_question<F: Frontend + ?Sized>(&mut self, frontend: &mut F) {
        let number = self.question + 1;
        let (saved, base_secs) = self
            .current_subject()
            .map(|s| (s.answer(number), s.elapsed_secs(number)))
            .unwrap_or_default();
        self.selected = saved;
        let now = self.clock.now_ms();
        self.question_started_ms = Some(now);

        if self.record.mode == Mode::Practice {
            self.stopwatch.start(now, base_secs);
            self.tickers.arm(TickerKind::Stopwatch);
            frontend.on_event(&SessionEvent::StopwatchTick {
                elapsed: format_clock(base_secs),
            });
        }
        if let Some(view) = self.question_view() {
            frontend.on_event(&SessionEvent::QuestionShown(view));
        }
    }

    fn question_limit(&self) -> u32 {
        self.current_subject().map(|s| s.question_limit).unwrap_or(0)
    }

    fn is_last_subject(&self) -> bool {
        self.subject.index() + 1 >= self.record.subjects.len()
    }

    fn select<F: Frontend + ?Sized>(&mut self, choice: Choice, frontend: &mut F) {
        if self.phase != Phase::Question {
            return;
        }
        self.selected = if self.selected == Answer::Choice(choice) {
            Answer::Unanswered
        } else {
            Answer::Choice(choice)
        };
        frontend.on_event(&SessionEvent::SelectionChanged(self.selected));
    }

    fn next_question<F: Frontend + ?Sized>(&mut self, frontend: &mut F) {
        if self.phase != Phase::Question {
            return;
        }
        if self.record.mode == Mode::Exam
            && !self.selected.is_answered()
            && !frontend.confirm(Confirmation::AdvanceUnanswered)
        {
            return;
        }

        if self.question + 1 >= self.question_limit() {
            self.commit();
            match self.record.mode {
                Mode::Exam => self.end_subject(frontend),
                Mode::Practice => {
                    if frontend.confirm(Confirmation::FinishPractice) {
                        self.finish(frontend);
                    } else {
                        self.show_question(frontend);
                    }
                }
            }
        } else {
            self.change_question(self.question + 1, frontend);
        }
    }

    fn prev_question<F: Frontend + ?Sized>(&mut self, frontend: &mut F) {
        if self.phase != Phase::Question || self.question == 0 {
            return;
        }
        self.change_question(self.question - 1, frontend);
    }

    fn jump_to<F: Frontend + ?Sized>(&mut self, number: u32, frontend: &mut F) {
        if self.phase != Phase::Question || number == 0 {
            return;
        }
        let reachable = self
            .current_subject()
            .map(|s| s.max_reached)
            .unwrap_or(1)
            .max(self.question + 1);
        if number > reachable {
            tracing::debug!(number, reachable, "jump target not reached yet");
            return;
        }
        self.change_question(number - 1, frontend);
    }

    /// Move to `target` (0-based). Out-of-range or same-question targets are
    /// ignored.
    fn change_question<F: Frontend + ?Sized>(&mut self, target: u32, frontend: &mut F) {
        if target >= self.question_limit() || target == self.question {
            return;
        }
        self.commit();
        self.question = target;
        if let Some(subject) = self.record.subject_mut(self.subject) {
            subject.extend_reached(target + 1);
        }
        frontend.reset_tools();
        self.show_question(frontend);
    }

    /// Record time and answer for the question on screen.
    fn commit(&mut self) {
        let number = self.question + 1;
        let elapsed = self
            .question_started_ms
            .take()
            .map(|start| elapsed_secs(start, self.clock.now_ms()))
            .unwrap_or(0);
        let selected = self.selected;

        if let Some(subject) = self.record.subject_mut(self.subject) {
            *subject.times.entry(number).or_insert(0) += elapsed;
            subject.answers.insert(number, selected);
            subject.extend_reached(number);
            tracing::debug!(
                subject = %subject.name,
                question = number,
                elapsed,
                total = subject.elapsed_secs(number),
                answer = %selected,
                "question committed"
            );
        }

        if self.record.mode == Mode::Practice {
            self.stopwatch.stop();
            self.tickers.cancel();
        }
    }

    // -----------------------------------------------------------------------
    // Subjects, breaks, timers
    // -----------------------------------------------------------------------

    /// Called after the last question of a subject has been committed.
    fn end_subject<F: Frontend + ?Sized>(&mut self, frontend: &mut F) {
        if self.is_last_subject() {
            self.finish(frontend);
        } else {
            self.start_break(frontend);
        }
    }

    fn start_break<F: Frontend + ?Sized>(&mut self, frontend: &mut F) {
        self.phase = Phase::Break;
        self.stopwatch.stop();
        self.countdown.start(self.config.break_duration_secs);
        self.tickers.arm(TickerKind::Countdown);
        let next_subject = self
            .record
            .subject(SubjectId(self.subject.index() + 1))
            .map(|s| s.name.clone())
            .unwrap_or_default();
        tracing::debug!(next = %next_subject, "break started");
        frontend.on_event(&SessionEvent::BreakStarted {
            next_subject,
            remaining: format_clock(u64::from(self.countdown.remaining_secs())),
        });
    }

    fn skip_break<F: Frontend + ?Sized>(&mut self, frontend: &mut F) {
        if self.phase != Phase::Break {
            return;
        }
        self.tickers.cancel();
        self.stop_countdown(frontend);
        self.advance_subject(frontend);
    }

    /// Stop the countdown, lifting a pause first so the front-end unlocks.
    fn stop_countdown<F: Frontend + ?Sized>(&mut self, frontend: &mut F) {
        if self.countdown.is_paused() {
            frontend.on_event(&SessionEvent::PauseChanged { paused: false });
        }
        self.countdown.stop();
    }

    fn advance_subject<F: Frontend + ?Sized>(&mut self, frontend: &mut F) {
        self.subject = SubjectId(self.subject.index() + 1);
        if self.subject.index() >= self.record.subjects.len() {
            self.finish(frontend);
        } else {
            self.start_subject(frontend);
        }
    }

    fn toggle_pause<F: Frontend + ?Sized>(&mut self, frontend: &mut F) {
        if self.record.mode != Mode::Exam
            || !matches!(self.phase, Phase::Question | Phase::Break)
        {
            return;
        }
        if let Some(paused) = self.countdown.toggle_pause() {
            tracing::debug!(paused, "pause toggled");
            frontend.on_event(&SessionEvent::PauseChanged { paused });
        }
    }

    fn exit_practice<F: Frontend + ?Sized>(&mut self, frontend: &mut F) {
        if self.record.mode != Mode::Practice || self.phase != Phase::Question {
            return;
        }
        if frontend.confirm(Confirmation::ExitPractice) {
            self.commit();
            self.finish(frontend);
        }
    }

    fn tick<F: Frontend + ?Sized>(&mut self, id: TickerId, frontend: &mut F) {
        match self.tickers.kind_of(id) {
            None => {
                tracing::trace!(ticker = id.raw(), "stale tick ignored");
            }
            Some(TickerKind::Stopwatch) => {
                let total = self.stopwatch.total_secs(self.clock.now_ms());
                frontend.on_event(&SessionEvent::StopwatchTick {
                    elapsed: format_clock(total),
                });
            }
            Some(TickerKind::Countdown) => {
                let on_break = self.phase == Phase::Break;
                match self.countdown.tick() {
                    TickOutcome::Ignored => {}
                    TickOutcome::Running(remaining) => {
                        frontend.on_event(&SessionEvent::CountdownTick {
                            remaining: format_clock(u64::from(remaining)),
                            secs: remaining,
                            on_break,
                        });
                    }
                    TickOutcome::Expired => {
                        frontend.on_event(&SessionEvent::CountdownTick {
                            remaining: format_clock(0),
                            secs: 0,
                            on_break,
                        });
                        self.tickers.cancel();
                        self.on_countdown_expired(frontend);
                    }
                }
            }
        }
    }

    /// Subject expiry commits the question on screen and ends the subject; it
    /// does not move on to the next question.
    fn on_countdown_expired<F: Frontend + ?Sized>(&mut self, frontend: &mut F) {
        match self.phase {
            Phase::Break => {
                tracing::debug!("break time expired");
                self.advance_subject(frontend);
            }
            Phase::Question => {
                tracing::debug!(subject = self.subject.index(), "subject time expired");
                self.commit();
                self.end_subject(frontend);
            }
            Phase::Idle | Phase::Finished | Phase::Reviewed => {}
        }
    }

    // -----------------------------------------------------------------------
    // Results
    // -----------------------------------------------------------------------

    fn show_times_only<F: Frontend + ?Sized>(&mut self, frontend: &mut F) {
        if !matches!(self.phase, Phase::Finished | Phase::Reviewed) {
            return;
        }
        self.score = None;
        self.phase = Phase::Reviewed;
        frontend.on_event(&SessionEvent::ResultsReady { scored: false });
    }

    fn submit_answers<F: Frontend + ?Sized>(&mut self, input: &AnswerKeyInput, frontend: &mut F) {
        if !matches!(self.phase, Phase::Finished | Phase::Reviewed) {
            return;
        }
        match validate_answer_key(&self.record, input) {
            Ok(key) => {
                let sheet = score(&self.record, &key);
                tracing::info!(
                    correct = sheet.total_correct,
                    total = sheet.total_questions,
                    "answers scored"
                );
                self.score = Some(sheet);
                self.phase = Phase::Reviewed;
                frontend.on_event(&SessionEvent::ResultsReady { scored: true });
            }
            Err(e) => {
                tracing::warn!("answer key rejected: {e}");
                frontend.on_event(&SessionEvent::AnswerKeyRejected(e));
            }
        }
    }
}
