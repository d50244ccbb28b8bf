use serde::{Deserialize, Serialize};

use crate::events::{EventKind, InteractionEvent};

/// Per-variant counts over a session. Recomputed on demand, never cached.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionStats {
    pub total_events: usize,
    pub mouse_moves: usize,
    pub clicks: usize,
    pub key_downs: usize,
    pub key_ups: usize,
    pub blurs: usize,
    pub focuses: usize,
    pub duration_ms: u64,
}

impl SessionStats {
    pub fn count(&self, kind: EventKind) -> usize {
        match kind {
            EventKind::MouseMove => self.mouse_moves,
            EventKind::Click => self.clicks,
            EventKind::KeyDown => self.key_downs,
            EventKind::KeyUp => self.key_ups,
            EventKind::Blur => self.blurs,
            EventKind::Focus => self.focuses,
        }
    }
}

/// Summarize an event log. `elapsed_ms` is "now" relative to session start.
pub fn compute_stats(events: &[InteractionEvent], elapsed_ms: u64) -> SessionStats {
    let count = |kind: EventKind| events.iter().filter(|e| e.kind() == kind).count();

    SessionStats {
        total_events: events.len(),
        mouse_moves: count(EventKind::MouseMove),
        clicks: count(EventKind::Click),
        key_downs: count(EventKind::KeyDown),
        key_ups: count(EventKind::KeyUp),
        blurs: count(EventKind::Blur),
        focuses: count(EventKind::Focus),
        duration_ms: elapsed_ms,
    }
}

/// `mm:ss` rendering of a session duration
pub fn format_duration(duration_ms: u64) -> String {
    let secs = duration_ms / 1000;
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{EventRecorder, ManualClock, Signal};

    #[test]
    fn test_empty_log() {
        let stats = compute_stats(&[], 0);
        assert_eq!(stats, SessionStats::default());
    }

    #[test]
    fn test_counts_per_kind() {
        let clock = ManualClock::new();
        let mut recorder = EventRecorder::new(clock.clone());
        recorder.record(Signal::PointerMove { x: 0, y: 0 });
        recorder.record(Signal::PointerMove { x: 1, y: 0 });
        recorder.record(Signal::PointerDown {
            x: 1,
            y: 0,
            button: 0,
        });
        recorder.record(Signal::KeyDown {
            key: "a".into(),
            code: "KeyA".into(),
        });
        recorder.record(Signal::KeyUp { key: "a".into() });
        recorder.record(Signal::FocusLost);
        recorder.record(Signal::FocusGained);
        clock.set(2_500);

        let stats = recorder.stats();
        assert_eq!(stats.total_events, 7);
        assert_eq!(stats.mouse_moves, 2);
        assert_eq!(stats.clicks, 1);
        assert_eq!(stats.key_downs, 1);
        assert_eq!(stats.key_ups, 1);
        assert_eq!(stats.blurs, 1);
        assert_eq!(stats.focuses, 1);
        assert_eq!(stats.duration_ms, 2_500);
    }

    #[test]
    fn test_total_is_sum_of_kinds() {
        let mut recorder = EventRecorder::new(ManualClock::new());
        for i in 0..50 {
            let signal = match i % 6 {
                0 => Signal::PointerMove { x: i, y: i },
                1 => Signal::PointerDown {
                    x: i,
                    y: i,
                    button: 2,
                },
                2 => Signal::KeyDown {
                    key: "x".into(),
                    code: "KeyX".into(),
                },
                3 => Signal::KeyUp { key: "x".into() },
                4 => Signal::FocusLost,
                _ => Signal::FocusGained,
            };
            recorder.record(signal);
        }

        let stats = recorder.stats();
        let sum: usize = EventKind::ALL.iter().map(|k| stats.count(*k)).sum();
        assert_eq!(stats.total_events, sum);
        assert_eq!(stats.total_events, 50);
    }

    #[test]
    fn test_stats_are_recomputed() {
        let clock = ManualClock::new();
        let mut recorder = EventRecorder::new(clock.clone());
        assert_eq!(recorder.stats().blurs, 0);
        recorder.record(Signal::FocusLost);
        clock.advance(1_000);
        let stats = recorder.stats();
        assert_eq!(stats.blurs, 1);
        assert_eq!(stats.duration_ms, 1_000);
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(0), "00:00");
        assert_eq!(format_duration(59_999), "00:59");
        assert_eq!(format_duration(61_000), "01:01");
        assert_eq!(format_duration(3_600_000), "60:00");
    }
}
