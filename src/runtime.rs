use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::time::{Duration, Instant};

use crossterm::event::{
    self, Event as CtEvent, KeyCode, KeyEvent, KeyEventKind, MouseButton, MouseEvent,
    MouseEventKind,
};

use crate::events::Signal;
use crate::monitor::MONITOR_INTERVAL_MS;

/// Unified event type consumed by the app runner
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ProctorEvent {
    Key(KeyEvent),
    Mouse(MouseEvent),
    FocusLost,
    FocusGained,
    Resize,
    Tick,
}

impl ProctorEvent {
    /// The host-independent signal this terminal event stands for, if any
    pub fn signal(&self) -> Option<Signal> {
        match self {
            ProctorEvent::Key(key) => Some(match key.kind {
                KeyEventKind::Press | KeyEventKind::Repeat => Signal::KeyDown {
                    key: dom_key(&key.code),
                    code: dom_code(&key.code),
                },
                KeyEventKind::Release => Signal::KeyUp {
                    key: dom_key(&key.code),
                },
            }),
            ProctorEvent::Mouse(mouse) => {
                let (x, y) = (mouse.column as i32, mouse.row as i32);
                match mouse.kind {
                    MouseEventKind::Moved | MouseEventKind::Drag(_) => {
                        Some(Signal::PointerMove { x, y })
                    }
                    MouseEventKind::Down(button) => Some(Signal::PointerDown {
                        x,
                        y,
                        button: dom_button(button),
                    }),
                    _ => None,
                }
            }
            ProctorEvent::FocusLost => Some(Signal::FocusLost),
            ProctorEvent::FocusGained => Some(Signal::FocusGained),
            ProctorEvent::Resize | ProctorEvent::Tick => None,
        }
    }
}

/// Browser-style button numbering: primary 0, auxiliary 1, secondary 2
pub fn dom_button(button: MouseButton) -> u8 {
    match button {
        MouseButton::Left => 0,
        MouseButton::Middle => 1,
        MouseButton::Right => 2,
    }
}

/// Browser-style key identifier (`"a"`, `"Enter"`, `"ArrowUp"`)
pub fn dom_key(code: &KeyCode) -> String {
    match code {
        KeyCode::Char(c) => c.to_string(),
        KeyCode::Enter => "Enter".into(),
        KeyCode::Tab | KeyCode::BackTab => "Tab".into(),
        KeyCode::Backspace => "Backspace".into(),
        KeyCode::Esc => "Escape".into(),
        KeyCode::Left => "ArrowLeft".into(),
        KeyCode::Right => "ArrowRight".into(),
        KeyCode::Up => "ArrowUp".into(),
        KeyCode::Down => "ArrowDown".into(),
        KeyCode::Home => "Home".into(),
        KeyCode::End => "End".into(),
        KeyCode::PageUp => "PageUp".into(),
        KeyCode::PageDown => "PageDown".into(),
        KeyCode::Delete => "Delete".into(),
        KeyCode::Insert => "Insert".into(),
        KeyCode::F(n) => format!("F{}", n),
        KeyCode::CapsLock => "CapsLock".into(),
        KeyCode::ScrollLock => "ScrollLock".into(),
        KeyCode::NumLock => "NumLock".into(),
        KeyCode::PrintScreen => "PrintScreen".into(),
        KeyCode::Pause => "Pause".into(),
        KeyCode::Menu => "ContextMenu".into(),
        _ => "Unidentified".into(),
    }
}

/// Browser-style physical key code (`"KeyA"`, `"Digit1"`, `"Space"`)
pub fn dom_code(code: &KeyCode) -> String {
    match code {
        KeyCode::Char(c) if c.is_ascii_alphabetic() => {
            format!("Key{}", c.to_ascii_uppercase())
        }
        KeyCode::Char(c) if c.is_ascii_digit() => format!("Digit{}", c),
        KeyCode::Char(c) => match *c {
            ' ' => "Space",
            '-' | '_' => "Minus",
            '=' | '+' => "Equal",
            ',' | '<' => "Comma",
            '.' | '>' => "Period",
            '/' | '?' => "Slash",
            ';' | ':' => "Semicolon",
            '\'' | '"' => "Quote",
            '[' | '{' => "BracketLeft",
            ']' | '}' => "BracketRight",
            '\\' | '|' => "Backslash",
            '`' | '~' => "Backquote",
            _ => "Unidentified",
        }
        .to_string(),
        other => dom_key(other),
    }
}

/// Source of terminal events (keyboard, mouse, focus, resize)
pub trait ProctorEventSource: Send + 'static {
    /// Block for up to `timeout` waiting for an event.
    /// Returns Ok(event) if an event arrives before the timeout, or Err(Timeout) if it expires.
    fn recv_timeout(&self, timeout: Duration) -> Result<ProctorEvent, RecvTimeoutError>;
}

/// Production event source using crossterm
pub struct CrosstermEventSource {
    rx: Receiver<ProctorEvent>,
}

impl CrosstermEventSource {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();

        std::thread::spawn(move || loop {
            let evt = match event::read() {
                Ok(CtEvent::Key(key)) => Some(ProctorEvent::Key(key)),
                Ok(CtEvent::Mouse(mouse)) => Some(ProctorEvent::Mouse(mouse)),
                Ok(CtEvent::FocusLost) => Some(ProctorEvent::FocusLost),
                Ok(CtEvent::FocusGained) => Some(ProctorEvent::FocusGained),
                Ok(CtEvent::Resize(_, _)) => Some(ProctorEvent::Resize),
                Ok(_) => None,
                Err(_) => break,
            };

            if let Some(evt) = evt {
                if tx.send(evt).is_err() {
                    break;
                }
            }
        });

        Self { rx }
    }
}

impl Default for CrosstermEventSource {
    fn default() -> Self {
        Self::new()
    }
}

impl ProctorEventSource for CrosstermEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<ProctorEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// Configurable ticker interface
pub trait Ticker: Send + Sync + 'static {
    fn interval(&self) -> Duration;
}

/// Fixed interval ticker
#[derive(Clone, Copy, Debug)]
pub struct FixedTicker {
    interval: Duration,
}

impl FixedTicker {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }

    /// The risk monitor's period
    pub fn monitor() -> Self {
        Self::new(Duration::from_millis(MONITOR_INTERVAL_MS))
    }
}

impl Ticker for FixedTicker {
    fn interval(&self) -> Duration {
        self.interval
    }
}

/// Test event source for unit tests
pub struct TestEventSource {
    rx: Receiver<ProctorEvent>,
}

impl TestEventSource {
    pub fn new(rx: Receiver<ProctorEvent>) -> Self {
        Self { rx }
    }
}

impl ProctorEventSource for TestEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<ProctorEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// Runner that advances the application one event/tick at a time.
///
/// While ticking, a `Tick` is delivered once per interval even if input keeps
/// arriving. Ticking starts on construction and can be stopped and restarted.
pub struct Runner<E: ProctorEventSource, T: Ticker> {
    event_source: E,
    ticker: T,
    next_tick: Option<Instant>,
}

impl<E: ProctorEventSource, T: Ticker> Runner<E, T> {
    pub fn new(event_source: E, ticker: T) -> Self {
        let next_tick = Some(Instant::now() + ticker.interval());
        Self {
            event_source,
            ticker,
            next_tick,
        }
    }

    pub fn is_ticking(&self) -> bool {
        self.next_tick.is_some()
    }

    /// Resume ticking; the first tick is one full interval away
    pub fn start(&mut self) {
        if self.next_tick.is_none() {
            self.next_tick = Some(Instant::now() + self.ticker.interval());
        }
    }

    /// Stop delivering ticks. Idempotent.
    pub fn stop(&mut self) {
        self.next_tick = None;
    }

    /// Next event, or `Tick` when one is due. `None` once the source has
    /// disconnected and ticking is stopped, since nothing can arrive anymore.
    pub fn step(&mut self) -> Option<ProctorEvent> {
        let interval = self.ticker.interval();

        let Some(due) = self.next_tick else {
            loop {
                match self.event_source.recv_timeout(interval) {
                    Ok(ev) => return Some(ev),
                    Err(RecvTimeoutError::Timeout) => continue,
                    Err(RecvTimeoutError::Disconnected) => return None,
                }
            }
        };

        let now = Instant::now();
        if now >= due {
            self.advance_schedule(due, now, interval);
            return Some(ProctorEvent::Tick);
        }

        match self.event_source.recv_timeout(due - now) {
            Ok(ev) => Some(ev),
            Err(RecvTimeoutError::Timeout) => {
                self.advance_schedule(due, Instant::now(), interval);
                Some(ProctorEvent::Tick)
            }
            Err(RecvTimeoutError::Disconnected) => {
                std::thread::sleep(due.saturating_duration_since(Instant::now()));
                self.advance_schedule(due, Instant::now(), interval);
                Some(ProctorEvent::Tick)
            }
        }
    }

    fn advance_schedule(&mut self, due: Instant, now: Instant, interval: Duration) {
        let next = due + interval;
        // after a long stall, restart the period instead of bursting ticks
        self.next_tick = Some(if next <= now { now + interval } else { next });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{KeyEventState, KeyModifiers};
    use std::sync::mpsc;

    fn key(code: KeyCode, kind: KeyEventKind) -> ProctorEvent {
        ProctorEvent::Key(KeyEvent {
            code,
            modifiers: KeyModifiers::NONE,
            kind,
            state: KeyEventState::NONE,
        })
    }

    fn mouse(kind: MouseEventKind, column: u16, row: u16) -> ProctorEvent {
        ProctorEvent::Mouse(MouseEvent {
            kind,
            column,
            row,
            modifiers: KeyModifiers::NONE,
        })
    }

    #[test]
    fn step_returns_tick_on_timeout() {
        let (_tx, rx) = mpsc::channel();
        let es = TestEventSource::new(rx);
        let ticker = FixedTicker::new(Duration::from_millis(1));
        let mut runner = Runner::new(es, ticker);

        // With no events available, step should yield Tick
        assert_eq!(runner.step(), Some(ProctorEvent::Tick));
    }

    #[test]
    fn step_passes_through_events() {
        let (tx, rx) = mpsc::channel();
        tx.send(ProctorEvent::Resize).unwrap();
        let es = TestEventSource::new(rx);
        let ticker = FixedTicker::new(Duration::from_millis(50));
        let mut runner = Runner::new(es, ticker);

        assert_eq!(runner.step(), Some(ProctorEvent::Resize));
    }

    #[test]
    fn step_ticks_under_continuous_input() {
        let (tx, rx) = mpsc::channel();
        for _ in 0..10_000 {
            tx.send(ProctorEvent::Resize).unwrap();
        }
        let es = TestEventSource::new(rx);
        let ticker = FixedTicker::new(Duration::from_millis(2));
        let mut runner = Runner::new(es, ticker);

        std::thread::sleep(Duration::from_millis(5));
        let ticked = (0..10_000).any(|_| runner.step() == Some(ProctorEvent::Tick));
        assert!(ticked, "a due tick must not starve behind queued input");
    }

    #[test]
    fn step_keeps_ticking_after_disconnect() {
        let (tx, rx) = mpsc::channel::<ProctorEvent>();
        drop(tx);
        let es = TestEventSource::new(rx);
        let mut runner = Runner::new(es, FixedTicker::new(Duration::from_millis(1)));

        assert_eq!(runner.step(), Some(ProctorEvent::Tick));
        assert_eq!(runner.step(), Some(ProctorEvent::Tick));
    }

    #[test]
    fn stopped_runner_yields_only_events() {
        let (tx, rx) = mpsc::channel();
        let es = TestEventSource::new(rx);
        let mut runner = Runner::new(es, FixedTicker::new(Duration::from_millis(1)));
        runner.stop();
        runner.stop();
        assert!(!runner.is_ticking());

        tx.send(ProctorEvent::FocusLost).unwrap();
        assert_eq!(runner.step(), Some(ProctorEvent::FocusLost));

        drop(tx);
        assert_eq!(runner.step(), None);

        runner.start();
        assert!(runner.is_ticking());
        assert_eq!(runner.step(), Some(ProctorEvent::Tick));
    }

    #[test]
    fn monitor_ticker_period() {
        assert_eq!(
            FixedTicker::monitor().interval(),
            Duration::from_millis(1000)
        );
    }

    #[test]
    fn key_press_and_release_signals() {
        assert_eq!(
            key(KeyCode::Char('a'), KeyEventKind::Press).signal(),
            Some(Signal::KeyDown {
                key: "a".into(),
                code: "KeyA".into()
            })
        );
        assert_eq!(
            key(KeyCode::Char('7'), KeyEventKind::Repeat).signal(),
            Some(Signal::KeyDown {
                key: "7".into(),
                code: "Digit7".into()
            })
        );
        assert_eq!(
            key(KeyCode::Up, KeyEventKind::Release).signal(),
            Some(Signal::KeyUp {
                key: "ArrowUp".into()
            })
        );
    }

    #[test]
    fn mouse_signals() {
        assert_eq!(
            mouse(MouseEventKind::Moved, 4, 9).signal(),
            Some(Signal::PointerMove { x: 4, y: 9 })
        );
        assert_eq!(
            mouse(MouseEventKind::Drag(MouseButton::Left), 1, 1).signal(),
            Some(Signal::PointerMove { x: 1, y: 1 })
        );
        assert_eq!(
            mouse(MouseEventKind::Down(MouseButton::Right), 2, 3).signal(),
            Some(Signal::PointerDown {
                x: 2,
                y: 3,
                button: 2
            })
        );
        assert_eq!(
            mouse(MouseEventKind::Up(MouseButton::Left), 2, 3).signal(),
            None
        );
        assert_eq!(mouse(MouseEventKind::ScrollDown, 0, 0).signal(), None);
    }

    #[test]
    fn focus_and_housekeeping_signals() {
        assert_eq!(ProctorEvent::FocusLost.signal(), Some(Signal::FocusLost));
        assert_eq!(ProctorEvent::FocusGained.signal(), Some(Signal::FocusGained));
        assert_eq!(ProctorEvent::Tick.signal(), None);
        assert_eq!(ProctorEvent::Resize.signal(), None);
    }

    #[test]
    fn dom_names() {
        assert_eq!(dom_key(&KeyCode::Esc), "Escape");
        assert_eq!(dom_key(&KeyCode::F(5)), "F5");
        assert_eq!(dom_key(&KeyCode::Char(' ')), " ");
        assert_eq!(dom_code(&KeyCode::Char(' ')), "Space");
        assert_eq!(dom_code(&KeyCode::Char('Q')), "KeyQ");
        assert_eq!(dom_code(&KeyCode::Char('?')), "Slash");
        assert_eq!(dom_code(&KeyCode::Char('é')), "Unidentified");
        assert_eq!(dom_code(&KeyCode::Enter), "Enter");
    }
}
