use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use crate::stats::{compute_stats, SessionStats};

/// Source of "milliseconds since session start"
pub trait Clock: Send + fmt::Debug {
    fn elapsed_ms(&self) -> u64;
}

/// Production clock backed by a monotonic [`Instant`]
#[derive(Debug, Clone, Copy)]
pub struct SessionClock {
    started: Instant,
}

impl SessionClock {
    pub fn start() -> Self {
        Self {
            started: Instant::now(),
        }
    }
}

impl Default for SessionClock {
    fn default() -> Self {
        Self::start()
    }
}

impl Clock for SessionClock {
    fn elapsed_ms(&self) -> u64 {
        self.started.elapsed().as_millis() as u64
    }
}

/// Hand-driven clock for tests and offline replay. Clones share the same time.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now_ms: Arc<AtomicU64>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn at(ms: u64) -> Self {
        let clock = Self::new();
        clock.set(ms);
        clock
    }

    pub fn set(&self, ms: u64) {
        self.now_ms.store(ms, Ordering::SeqCst);
    }

    pub fn advance(&self, ms: u64) {
        self.now_ms.fetch_add(ms, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn elapsed_ms(&self) -> u64 {
        self.now_ms.load(Ordering::SeqCst)
    }
}

/// Host-independent inbound signal, produced by a host adapter
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Signal {
    PointerMove { x: i32, y: i32 },
    PointerDown { x: i32, y: i32, button: u8 },
    KeyDown { key: String, code: String },
    KeyUp { key: String },
    FocusLost,
    FocusGained,
}

/// Event variant tag, rendered the way it appears in exports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum_macros::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum EventKind {
    MouseMove,
    Click,
    KeyDown,
    KeyUp,
    Blur,
    Focus,
}

impl EventKind {
    pub const ALL: [EventKind; 6] = [
        EventKind::MouseMove,
        EventKind::Click,
        EventKind::KeyDown,
        EventKind::KeyUp,
        EventKind::Blur,
        EventKind::Focus,
    ];

    /// Inverse of the `Display` tag
    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.to_string() == tag)
    }
}

/// A recorded interaction. `timestamp` is milliseconds since session start.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum InteractionEvent {
    MouseMove {
        x: i32,
        y: i32,
        timestamp: u64,
    },
    Click {
        x: i32,
        y: i32,
        button: u8,
        timestamp: u64,
    },
    KeyDown {
        key: String,
        code: String,
        /// Gap since the previous key release, 0 before the first one
        time_since_last_key: u64,
        timestamp: u64,
    },
    KeyUp {
        key: String,
        timestamp: u64,
    },
    Blur {
        timestamp: u64,
    },
    Focus {
        timestamp: u64,
    },
}

impl InteractionEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            InteractionEvent::MouseMove { .. } => EventKind::MouseMove,
            InteractionEvent::Click { .. } => EventKind::Click,
            InteractionEvent::KeyDown { .. } => EventKind::KeyDown,
            InteractionEvent::KeyUp { .. } => EventKind::KeyUp,
            InteractionEvent::Blur { .. } => EventKind::Blur,
            InteractionEvent::Focus { .. } => EventKind::Focus,
        }
    }

    pub fn timestamp(&self) -> u64 {
        match self {
            InteractionEvent::MouseMove { timestamp, .. }
            | InteractionEvent::Click { timestamp, .. }
            | InteractionEvent::KeyDown { timestamp, .. }
            | InteractionEvent::KeyUp { timestamp, .. }
            | InteractionEvent::Blur { timestamp }
            | InteractionEvent::Focus { timestamp } => *timestamp,
        }
    }

    /// Free-text description used in the export's details column
    pub fn details(&self) -> String {
        match self {
            InteractionEvent::MouseMove { x, y, .. } | InteractionEvent::Click { x, y, .. } => {
                format!("x: {} | y: {}", x, y)
            }
            InteractionEvent::KeyDown { key, .. } | InteractionEvent::KeyUp { key, .. } => {
                format!("Key: {}", key)
            }
            InteractionEvent::Blur { .. } => "Tab/Window Switched OUT".to_string(),
            InteractionEvent::Focus { .. } => "Tab/Window Switched IN".to_string(),
        }
    }

    /// Human-readable activity line. Mouse moves and key releases are too noisy to log.
    pub fn activity_message(&self) -> Option<String> {
        match self {
            InteractionEvent::Click { x, y, .. } => Some(format!("Click at ({}, {})", x, y)),
            InteractionEvent::KeyDown { .. } => Some("Key event recorded".to_string()),
            InteractionEvent::Blur { .. } => {
                Some("⚠️ Window lost focus (blur event) - RISK SPIKE".to_string())
            }
            InteractionEvent::Focus { .. } => {
                Some("✅ Window gained focus (focus event)".to_string())
            }
            InteractionEvent::MouseMove { .. } | InteractionEvent::KeyUp { .. } => None,
        }
    }
}

/// Append-only interaction log for one session
#[derive(Debug)]
pub struct EventRecorder {
    clock: Box<dyn Clock>,
    events: Vec<InteractionEvent>,
    last_key_up_ms: Option<u64>,
}

impl EventRecorder {
    pub fn new(clock: impl Clock + 'static) -> Self {
        Self {
            clock: Box::new(clock),
            events: Vec::new(),
            last_key_up_ms: None,
        }
    }

    /// Milliseconds since the session started
    pub fn elapsed_ms(&self) -> u64 {
        self.clock.elapsed_ms()
    }

    /// Stamp and append a signal. Field values are stored verbatim.
    pub fn record(&mut self, signal: Signal) -> &InteractionEvent {
        let last = self.events.last().map_or(0, InteractionEvent::timestamp);
        let timestamp = self.clock.elapsed_ms().max(last);

        let event = match signal {
            Signal::PointerMove { x, y } => InteractionEvent::MouseMove { x, y, timestamp },
            Signal::PointerDown { x, y, button } => InteractionEvent::Click {
                x,
                y,
                button,
                timestamp,
            },
            Signal::KeyDown { key, code } => {
                // measured from the last key *release*, not the last press
                let time_since_last_key = self
                    .last_key_up_ms
                    .map_or(0, |up| timestamp.saturating_sub(up));
                InteractionEvent::KeyDown {
                    key,
                    code,
                    time_since_last_key,
                    timestamp,
                }
            }
            Signal::KeyUp { key } => {
                self.last_key_up_ms = Some(timestamp);
                InteractionEvent::KeyUp { key, timestamp }
            }
            Signal::FocusLost => InteractionEvent::Blur { timestamp },
            Signal::FocusGained => InteractionEvent::Focus { timestamp },
        };

        self.events.push(event);
        &self.events[self.events.len() - 1]
    }

    pub fn events(&self) -> &[InteractionEvent] {
        &self.events
    }

    pub fn events_by_kind(&self, kind: EventKind) -> impl Iterator<Item = &InteractionEvent> {
        self.events.iter().filter(move |e| e.kind() == kind)
    }

    /// Fresh snapshot over the whole log
    pub fn stats(&self) -> SessionStats {
        compute_stats(&self.events, self.elapsed_ms())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key_down(key: &str) -> Signal {
        Signal::KeyDown {
            key: key.to_string(),
            code: format!("Key{}", key.to_uppercase()),
        }
    }

    fn key_up(key: &str) -> Signal {
        Signal::KeyUp {
            key: key.to_string(),
        }
    }

    #[test]
    fn test_event_kind_tags() {
        assert_eq!(EventKind::MouseMove.to_string(), "mousemove");
        assert_eq!(EventKind::KeyDown.to_string(), "keydown");
        assert_eq!(EventKind::Blur.to_string(), "blur");
        for kind in EventKind::ALL {
            assert_eq!(EventKind::from_tag(&kind.to_string()), Some(kind));
        }
        assert_eq!(EventKind::from_tag("scroll"), None);
    }

    #[test]
    fn test_record_stamps_elapsed_time() {
        let clock = ManualClock::at(120);
        let mut recorder = EventRecorder::new(clock.clone());

        recorder.record(Signal::PointerMove { x: 3, y: 4 });
        clock.advance(30);
        recorder.record(Signal::FocusLost);

        let events = recorder.events();
        assert_eq!(events.len(), 2);
        assert_eq!(
            events[0],
            InteractionEvent::MouseMove {
                x: 3,
                y: 4,
                timestamp: 120
            }
        );
        assert_eq!(events[1], InteractionEvent::Blur { timestamp: 150 });
    }

    #[test]
    fn test_timestamps_never_decrease() {
        let clock = ManualClock::at(500);
        let mut recorder = EventRecorder::new(clock.clone());

        recorder.record(Signal::FocusLost);
        clock.set(100);
        recorder.record(Signal::FocusGained);

        assert_eq!(recorder.events()[1].timestamp(), 500);
    }

    #[test]
    fn test_first_key_down_has_zero_gap() {
        let clock = ManualClock::at(1_000);
        let mut recorder = EventRecorder::new(clock);

        let event = recorder.record(key_down("a")).clone();
        match event {
            InteractionEvent::KeyDown {
                time_since_last_key,
                ..
            } => assert_eq!(time_since_last_key, 0),
            other => panic!("expected KeyDown, got {:?}", other),
        }
    }

    #[test]
    fn test_key_gap_measured_from_previous_release() {
        let clock = ManualClock::at(0);
        let mut recorder = EventRecorder::new(clock.clone());

        clock.set(100);
        recorder.record(key_down("a"));
        clock.set(180);
        recorder.record(key_up("a"));
        clock.set(200);
        // second press before the release of the first does not reset the gap base
        recorder.record(key_down("b"));
        clock.set(450);
        recorder.record(key_down("c"));

        let gaps: Vec<u64> = recorder
            .events_by_kind(EventKind::KeyDown)
            .map(|e| match e {
                InteractionEvent::KeyDown {
                    time_since_last_key,
                    ..
                } => *time_since_last_key,
                _ => unreachable!(),
            })
            .collect();

        assert_eq!(gaps, vec![0, 20, 270]);
    }

    #[test]
    fn test_key_up_at_time_zero_still_counts() {
        let clock = ManualClock::at(0);
        let mut recorder = EventRecorder::new(clock.clone());

        recorder.record(key_up("a"));
        clock.set(40);
        let event = recorder.record(key_down("a")).clone();

        assert!(matches!(
            event,
            InteractionEvent::KeyDown {
                time_since_last_key: 40,
                ..
            }
        ));
    }

    #[test]
    fn test_values_stored_verbatim() {
        let mut recorder = EventRecorder::new(ManualClock::new());
        recorder.record(Signal::PointerDown {
            x: -5,
            y: 99_999,
            button: 7,
        });
        recorder.record(Signal::KeyDown {
            key: "\"".to_string(),
            code: String::new(),
        });

        assert_eq!(
            recorder.events()[0],
            InteractionEvent::Click {
                x: -5,
                y: 99_999,
                button: 7,
                timestamp: 0
            }
        );
        assert_eq!(recorder.events()[1].details(), "Key: \"");
    }

    #[test]
    fn test_events_by_kind_preserves_order() {
        let clock = ManualClock::new();
        let mut recorder = EventRecorder::new(clock.clone());
        for i in 0..4 {
            clock.set(i * 10);
            recorder.record(Signal::PointerMove {
                x: i as i32,
                y: 0,
            });
            recorder.record(Signal::FocusLost);
        }

        let xs: Vec<i32> = recorder
            .events_by_kind(EventKind::MouseMove)
            .map(|e| match e {
                InteractionEvent::MouseMove { x, .. } => *x,
                _ => unreachable!(),
            })
            .collect();
        assert_eq!(xs, vec![0, 1, 2, 3]);
        assert_eq!(recorder.events_by_kind(EventKind::Blur).count(), 4);
        assert_eq!(recorder.events_by_kind(EventKind::Focus).count(), 0);
    }

    #[test]
    fn test_activity_messages() {
        let click = InteractionEvent::Click {
            x: 10,
            y: 20,
            button: 0,
            timestamp: 0,
        };
        assert_eq!(click.activity_message().unwrap(), "Click at (10, 20)");
        assert!(InteractionEvent::MouseMove {
            x: 0,
            y: 0,
            timestamp: 0
        }
        .activity_message()
        .is_none());
        assert!(InteractionEvent::KeyUp {
            key: "a".into(),
            timestamp: 0
        }
        .activity_message()
        .is_none());
        assert!(InteractionEvent::Blur { timestamp: 0 }
            .activity_message()
            .unwrap()
            .contains("RISK SPIKE"));
    }

    #[test]
    fn test_event_serializes_with_type_tag() {
        let event = InteractionEvent::Focus { timestamp: 42 };
        let json = serde_json::to_string(&event).unwrap();
        assert_eq!(json, r#"{"type":"focus","timestamp":42}"#);
    }
}
