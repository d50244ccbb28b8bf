use serde::{Deserialize, Serialize};

use crate::risk;
use crate::stats::SessionStats;

pub const MONITOR_INTERVAL_MS: u64 = 1000;
pub const WARN_THRESHOLD: u8 = 50;
pub const AUTO_SUBMIT_THRESHOLD: u8 = 75;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeKind {
    Warning,
    Terminated,
}

/// A notice rendered in the warning area until the next tick clears it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub kind: NoticeKind,
    pub risk: u8,
}

impl Notice {
    pub fn title(&self) -> &'static str {
        match self.kind {
            NoticeKind::Warning => "Warning:",
            NoticeKind::Terminated => "Terminated:",
        }
    }

    pub fn body(&self) -> String {
        match self.kind {
            NoticeKind::Warning => format!(
                "Risk score is {}/100. Avoid mouse jitter or suspicious key activity.",
                self.risk
            ),
            NoticeKind::Terminated => format!(
                "Risk score reached {}/100. Quiz auto-submitted.",
                self.risk
            ),
        }
    }
}

/// One-shot flags, all false at session start
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitorState {
    pub warned_low: bool,
    /// Never set by the current thresholds
    pub warned_high: bool,
    /// Terminal: once set, no further forced submission
    pub auto_submitted: bool,
}

/// What a single tick decided
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickOutcome {
    pub risk: u8,
    /// Replaces whatever was shown before this tick
    pub notices: Vec<Notice>,
    pub log: Vec<String>,
    pub force_submit: bool,
}

impl MonitorState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Re-score `stats` and apply the threshold transitions
    pub fn tick(&mut self, stats: &SessionStats) -> TickOutcome {
        self.evaluate(risk::score(stats))
    }

    pub fn evaluate(&mut self, risk: u8) -> TickOutcome {
        let mut outcome = TickOutcome {
            risk,
            ..TickOutcome::default()
        };

        if (WARN_THRESHOLD..AUTO_SUBMIT_THRESHOLD).contains(&risk) && !self.auto_submitted {
            if !self.warned_low {
                self.warned_low = true;
                outcome
                    .log
                    .push(format!("⚠️ Warning issued (>={})", WARN_THRESHOLD));
            }
            outcome.notices.push(Notice {
                kind: NoticeKind::Warning,
                risk,
            });
        }

        if risk >= AUTO_SUBMIT_THRESHOLD && !self.auto_submitted {
            self.auto_submitted = true;
            outcome.log.push(format!(
                "⏳ Risk >= {} (Tab switched or high activity) - auto-submitting.",
                AUTO_SUBMIT_THRESHOLD
            ));
            outcome.notices.push(Notice {
                kind: NoticeKind::Terminated,
                risk,
            });
            outcome.force_submit = true;
        }

        outcome
    }
}
