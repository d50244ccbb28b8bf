use serde::{Deserialize, Serialize};

use crate::events::InteractionEvent;
use crate::monitor::{MonitorState, MONITOR_INTERVAL_MS};
use crate::risk::{self, RiskBadge};
use crate::stats::{compute_stats, SessionStats};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplayReport {
    pub stats: SessionStats,
    pub risk: u8,
    pub badge: RiskBadge,
    pub ticks: usize,
    /// Tick time of the first in-band warning
    pub first_warning_ms: Option<u64>,
    /// Tick time of the forced submission
    pub auto_submit_ms: Option<u64>,
    pub forced_submissions: usize,
}

/// First tick boundary at or after `ms` (never before the first tick).
/// Saturates at the last boundary representable in a `u64`.
fn tick_at_or_after(ms: u64) -> u64 {
    ms.div_ceil(MONITOR_INTERVAL_MS)
        .max(1)
        .checked_mul(MONITOR_INTERVAL_MS)
        .unwrap_or(u64::MAX - u64::MAX % MONITOR_INTERVAL_MS)
}

/// Feed `events` (in log order) back through the monitor at every period
/// boundary, as the live session would have, up to and including the first
/// boundary at or after the last event.
pub fn replay(events: &[InteractionEvent]) -> ReplayReport {
    let end_ms = events.last().map_or(0, InteractionEvent::timestamp);
    let last_tick = tick_at_or_after(end_ms);

    let mut monitor = MonitorState::new();
    let mut seen = 0;
    let mut report = ReplayReport {
        stats: SessionStats::default(),
        risk: 0,
        badge: RiskBadge::Low,
        ticks: 0,
        first_warning_ms: None,
        auto_submit_ms: None,
        forced_submissions: 0,
    };

    let mut now = MONITOR_INTERVAL_MS;
    loop {
        // events stamped exactly on a boundary were recorded before that tick ran
        while seen < events.len() && events[seen].timestamp() <= now {
            seen += 1;
        }
        let outcome = monitor.tick(&compute_stats(&events[..seen], now));
        report.ticks += 1;

        if report.first_warning_ms.is_none()
            && !outcome.force_submit
            && !outcome.notices.is_empty()
        {
            report.first_warning_ms = Some(now);
        }
        if outcome.force_submit {
            report.forced_submissions += 1;
            report.auto_submit_ms.get_or_insert(now);
        }

        let Some(following) = now.checked_add(MONITOR_INTERVAL_MS) else {
            break;
        };
        if following > last_tick {
            break;
        }
        // ticks before the next event's boundary see the same counts, so the
        // monitor (already latched) repeats this outcome; count them in bulk
        let next = events
            .get(seen)
            .map_or(last_tick, |e| tick_at_or_after(e.timestamp()))
            .clamp(following, last_tick);
        report.ticks += ((next - following) / MONITOR_INTERVAL_MS) as usize;
        now = next;
    }

    report.stats = compute_stats(events, end_ms);
    report.risk = risk::score(&report.stats);
    report.badge = RiskBadge::for_score(report.risk);
    report
}

impl ReplayReport {
    pub fn render(&self) -> String {
        let mut lines = vec![
            format!(
                "events: {} (mouse {} / clicks {} / keys {}↓ {}↑ / blur {} / focus {})",
                self.stats.total_events,
                self.stats.mouse_moves,
                self.stats.clicks,
                self.stats.key_downs,
                self.stats.key_ups,
                self.stats.blurs,
                self.stats.focuses
            ),
            format!(
                "duration: {}",
                crate::stats::format_duration(self.stats.duration_ms)
            ),
            format!("risk: {}/100 ({})", self.risk, self.badge.label()),
            format!("monitor ticks: {}", self.ticks),
        ];
        lines.push(match self.first_warning_ms {
            Some(ms) => format!("first warning at {} ms", ms),
            None => "no warning issued".to_string(),
        });
        lines.push(match self.auto_submit_ms {
            Some(ms) => format!("auto-submitted at {} ms", ms),
            None => "not auto-submitted".to_string(),
        });
        lines.join("\n")
    }
}
