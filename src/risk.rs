use serde::{Deserialize, Serialize};

use crate::stats::SessionStats;

pub const MOUSE_WEIGHT: f64 = 0.025;
pub const KEY_WEIGHT: f64 = 0.10;
/// One window switch scores 70, under the 75 auto-submit threshold.
pub const BLUR_WEIGHT: f64 = 70.0;

pub const MOUSE_CAP: f64 = 30.0;
pub const KEY_CAP: f64 = 30.0;
pub const BLUR_CAP: f64 = 100.0;

pub const MAX_RISK: u8 = 100;

/// Display band lower bounds. These are not the monitor's action thresholds.
pub const ELEVATED_BADGE_AT: u8 = 50;
pub const HIGH_BADGE_AT: u8 = 80;

/// Per-signal contributions before summing
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskBreakdown {
    pub mouse: f64,
    pub keys: f64,
    pub blur: f64,
}

impl RiskBreakdown {
    pub fn from_stats(stats: &SessionStats) -> Self {
        Self {
            mouse: (stats.mouse_moves as f64 * MOUSE_WEIGHT).min(MOUSE_CAP),
            keys: (stats.key_downs as f64 * KEY_WEIGHT).min(KEY_CAP),
            blur: (stats.blurs as f64 * BLUR_WEIGHT).min(BLUR_CAP),
        }
    }

    pub fn raw(&self) -> f64 {
        self.mouse + self.keys + self.blur
    }

    pub fn score(&self) -> u8 {
        self.raw().round().min(MAX_RISK as f64) as u8
    }
}

/// Risk score in `0..=100`
pub fn score(stats: &SessionStats) -> u8 {
    RiskBreakdown::from_stats(stats).score()
}

/// Qualitative badge shown next to the score after submission
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskBadge {
    Low,
    Elevated,
    High,
}

impl RiskBadge {
    pub fn for_score(risk: u8) -> Self {
        if risk >= HIGH_BADGE_AT {
            RiskBadge::High
        } else if risk >= ELEVATED_BADGE_AT {
            RiskBadge::Elevated
        } else {
            RiskBadge::Low
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            RiskBadge::Low => "Low risk",
            RiskBadge::Elevated => "Elevated risk",
            RiskBadge::High => "High Risk / Auto-Fail",
        }
    }
}
