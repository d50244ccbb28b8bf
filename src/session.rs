use rand::Rng;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::activity::ActivityLog;
use crate::error::Result;
use crate::events::{Clock, EventRecorder, InteractionEvent, Signal};
use crate::export;
use crate::monitor::{MonitorState, Notice, TickOutcome};
use crate::quiz::{grade, AnswerKey, AnswerSheet, Answers, Quiz, QuizResult};
use crate::risk::{self, RiskBadge};
use crate::stats::SessionStats;

const SESSION_ID_LEN: usize = 10;
const SESSION_ID_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

pub fn generate_session_id() -> String {
    let mut rng = rand::thread_rng();
    (0..SESSION_ID_LEN)
        .map(|_| SESSION_ID_ALPHABET[rng.gen_range(0..SESSION_ID_ALPHABET.len())] as char)
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Active,
    Submitted,
}

/// Everything rendered after a submission
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionReport {
    pub quiz: QuizResult,
    pub stats: SessionStats,
    pub risk: u8,
    pub badge: RiskBadge,
    pub auto: bool,
}

/// Moves one way from `Active` to `Submitted`
#[derive(Debug)]
pub struct ProctorSession {
    id: String,
    quiz: Quiz,
    key: AnswerKey,
    recorder: EventRecorder,
    monitor: MonitorState,
    answers: AnswerSheet,
    phase: Phase,
    notices: Vec<Notice>,
    report: Option<SubmissionReport>,
    activity: ActivityLog,
}

impl ProctorSession {
    pub fn new(quiz: Quiz, clock: impl Clock + 'static, activity: ActivityLog) -> Self {
        Self::with_id(generate_session_id(), quiz, clock, activity)
    }

    pub fn with_id(
        id: impl Into<String>,
        quiz: Quiz,
        clock: impl Clock + 'static,
        activity: ActivityLog,
    ) -> Self {
        let key = quiz.key();
        let mut session = Self {
            id: id.into(),
            quiz,
            key,
            recorder: EventRecorder::new(clock),
            monitor: MonitorState::new(),
            answers: AnswerSheet::new(),
            phase: Phase::Active,
            notices: Vec::new(),
            report: None,
            activity,
        };
        session
            .activity
            .push("✨ Proctored Quiz initialized. STRICT MODE.");
        session
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn quiz(&self) -> &Quiz {
        &self.quiz
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_submitted(&self) -> bool {
        self.phase == Phase::Submitted
    }

    /// Recording continues after submission
    pub fn record(&mut self, signal: Signal) {
        let message = self.recorder.record(signal).activity_message();
        if let Some(message) = message {
            self.activity.push(message);
        }
    }

    /// Select a choice for the question at `index`. Ignored once submitted.
    pub fn select(&mut self, index: usize, choice_id: &str) -> bool {
        if self.is_submitted() {
            return false;
        }
        let Some(question) = self.quiz.questions.get(index) else {
            return false;
        };
        if !question.choices.iter().any(|c| c.id == choice_id) {
            return false;
        }
        self.answers.select(&question.id, choice_id);
        true
    }

    pub fn clear(&mut self, index: usize) -> bool {
        if self.is_submitted() {
            return false;
        }
        match self.quiz.questions.get(index) {
            Some(question) => {
                self.answers.clear(&question.id);
                true
            }
            None => false,
        }
    }

    pub fn selection(&self, index: usize) -> Option<&str> {
        self.quiz
            .questions
            .get(index)
            .and_then(|q| self.answers.selection(&q.id))
    }

    pub fn answers(&self) -> &AnswerSheet {
        &self.answers
    }

    /// One monitor period: re-score, replace notices, force submission when due
    pub fn on_tick(&mut self) -> TickOutcome {
        let stats = self.recorder.stats();
        let outcome = self.monitor.tick(&stats);

        self.notices = outcome.notices.clone();
        for line in &outcome.log {
            self.activity.push(line.clone());
        }
        if outcome.force_submit {
            self.submit(true);
        }

        outcome
    }

    /// Grade and render results. An automatic submission after results are
    /// already shown is a no-op; a manual one always re-renders.
    pub fn submit(&mut self, is_auto: bool) -> Option<&SubmissionReport> {
        if self.is_submitted() && is_auto {
            return None;
        }

        let quiz = grade(&self.answers, &self.key);
        let stats = self.recorder.stats();
        let risk = risk::score(&stats);

        self.report = Some(SubmissionReport {
            quiz,
            stats,
            risk,
            badge: RiskBadge::for_score(risk),
            auto: is_auto,
        });
        self.phase = Phase::Submitted;
        self.activity.push(format!(
            "{} submission performed.",
            if is_auto { "🔔 Auto" } else { "🔒 Manual" }
        ));

        self.report.as_ref()
    }

    pub fn report(&self) -> Option<&SubmissionReport> {
        self.report.as_ref()
    }

    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }

    pub fn monitor(&self) -> &MonitorState {
        &self.monitor
    }

    pub fn events(&self) -> &[InteractionEvent] {
        self.recorder.events()
    }

    pub fn recorder(&self) -> &EventRecorder {
        &self.recorder
    }

    pub fn stats(&self) -> SessionStats {
        self.recorder.stats()
    }

    pub fn risk(&self) -> u8 {
        risk::score(&self.stats())
    }

    pub fn activity(&self) -> &ActivityLog {
        &self.activity
    }

    /// Write the event log as `proctoring_data.csv` into `dir`
    pub fn export_to<P: AsRef<Path>>(&mut self, dir: P) -> Result<PathBuf> {
        let path = export::save(self.recorder.events(), dir)?;
        self.activity
            .push(format!("📊 CSV export written to {}", path.display()));
        Ok(path)
    }
}
