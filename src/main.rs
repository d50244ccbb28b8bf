mod ui;

use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    event::{
        DisableFocusChange, DisableMouseCapture, EnableFocusChange, EnableMouseCapture, KeyCode,
        KeyEvent, KeyEventKind, KeyModifiers, KeyboardEnhancementFlags,
        PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
    },
    execute,
    terminal::{
        disable_raw_mode, enable_raw_mode, supports_keyboard_enhancement, EnterAlternateScreen,
        LeaveAlternateScreen,
    },
    tty::IsTty,
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use std::{
    error::Error,
    io::{self, stdin},
    path::{Path, PathBuf},
};
use vigil::{
    activity::ActivityLog,
    app_dirs::AppDirs,
    config::{Config, ConfigStore, FileConfigStore},
    events::SessionClock,
    export,
    quiz::Quiz,
    replay::replay,
    runtime::{
        CrosstermEventSource, FixedTicker, ProctorEvent, ProctorEventSource, Runner, Ticker,
    },
    session::ProctorSession,
};

/// proctored quiz tui with behaviour monitoring
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = concat!(
        "A proctored multiple-choice quiz in the terminal. Mouse, keyboard and focus ",
        "activity is recorded, scored for risk every second, and can force an automatic ",
        "submission. The recorded events export to CSV."
    )
)]
pub struct Cli {
    /// JSON quiz to use instead of the built-in one
    #[clap(short = 'q', long)]
    quiz: Option<PathBuf>,

    /// directory the CSV export is written to
    #[clap(short = 'o', long)]
    export_dir: Option<PathBuf>,

    /// append the activity log to this file
    #[clap(long, value_name = "FILE", conflicts_with = "log")]
    activity_log: Option<PathBuf>,

    /// append the activity log to the default state directory
    #[clap(long)]
    log: bool,

    /// hide the activity panel
    #[clap(long)]
    hide_activity: bool,

    /// session identifier (random when omitted)
    #[clap(long)]
    session_id: Option<String>,

    /// replay an exported CSV through the monitor and print a report instead of starting a quiz
    #[clap(long, value_name = "FILE")]
    replay: Option<PathBuf>,

    /// print the replay report as JSON
    #[clap(long, requires = "replay")]
    json: bool,

    /// remember the effective settings as defaults
    #[clap(long)]
    save_config: bool,
}

/// Settings after merging the saved config with command line flags
#[derive(Debug, Clone, PartialEq)]
pub struct RuntimeSettings {
    pub quiz_file: Option<PathBuf>,
    pub export_dir: PathBuf,
    pub activity_log: Option<PathBuf>,
    pub show_activity: bool,
}

impl RuntimeSettings {
    fn resolve(cli: &Cli, cfg: &Config) -> Self {
        let activity_log = cli
            .activity_log
            .clone()
            .or_else(|| {
                if cli.log {
                    AppDirs::activity_log_path()
                } else {
                    None
                }
            })
            .or_else(|| cfg.activity_log.clone());

        Self {
            quiz_file: cli.quiz.clone().or_else(|| cfg.quiz_file.clone()),
            export_dir: cli.export_dir.clone().unwrap_or_else(|| cfg.export_dir()),
            activity_log,
            show_activity: cfg.show_activity && !cli.hide_activity,
        }
    }
}

impl Default for RuntimeSettings {
    fn default() -> Self {
        Self {
            quiz_file: None,
            export_dir: PathBuf::from("."),
            activity_log: None,
            show_activity: true,
        }
    }
}

impl From<&RuntimeSettings> for Config {
    fn from(rs: &RuntimeSettings) -> Self {
        Self {
            export_dir: Some(rs.export_dir.clone()),
            quiz_file: rs.quiz_file.clone(),
            activity_log: rs.activity_log.clone(),
            show_activity: rs.show_activity,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AppState {
    Quiz,
    Results,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Flow {
    Continue,
    Quit,
}

#[derive(Debug)]
pub struct App {
    pub session: ProctorSession,
    pub state: AppState,
    /// Index of the highlighted question
    pub cursor: usize,
    pub settings: RuntimeSettings,
    /// One-line feedback shown in the legend area
    pub status: Option<String>,
}

impl App {
    pub fn new(session: ProctorSession, settings: RuntimeSettings) -> Self {
        Self {
            session,
            state: AppState::Quiz,
            cursor: 0,
            settings,
            status: None,
        }
    }

    fn sync_state(&mut self) {
        if self.session.is_submitted() {
            self.state = AppState::Results;
        }
    }

    pub fn on_tick(&mut self) {
        self.session.on_tick();
        self.sync_state();
    }

    pub fn export(&mut self) {
        self.status = Some(match self.session.export_to(&self.settings.export_dir) {
            Ok(path) => format!("exported to {}", path.display()),
            Err(e) => format!("export failed: {}", e),
        });
    }

    fn question_count(&self) -> usize {
        self.session.quiz().len()
    }

    /// Step the highlighted question's choice left or right
    fn cycle_choice(&mut self, forward: bool) {
        let Some(question) = self.session.quiz().questions.get(self.cursor) else {
            return;
        };
        let ids: Vec<String> = question.choices.iter().map(|c| c.id.clone()).collect();
        if ids.is_empty() {
            return;
        }
        let current = self
            .session
            .selection(self.cursor)
            .and_then(|sel| ids.iter().position(|id| id == sel));
        let next = match (current, forward) {
            (None, true) => 0,
            (None, false) => ids.len() - 1,
            (Some(i), true) => (i + 1) % ids.len(),
            (Some(i), false) => (i + ids.len() - 1) % ids.len(),
        };
        self.session.select(self.cursor, &ids[next]);
    }

    fn on_key(&mut self, key: &KeyEvent) -> Flow {
        if key.kind == KeyEventKind::Release {
            return Flow::Continue;
        }
        if key.code == KeyCode::Esc
            || (key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c'))
        {
            return Flow::Quit;
        }
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('e') {
            self.export();
            return Flow::Continue;
        }

        match self.state {
            AppState::Quiz => match key.code {
                KeyCode::Up => self.cursor = self.cursor.saturating_sub(1),
                KeyCode::Down | KeyCode::Tab => {
                    if self.cursor + 1 < self.question_count() {
                        self.cursor += 1;
                    }
                }
                KeyCode::BackTab => self.cursor = self.cursor.saturating_sub(1),
                KeyCode::Left => self.cycle_choice(false),
                KeyCode::Right => self.cycle_choice(true),
                KeyCode::Backspace | KeyCode::Delete => {
                    self.session.clear(self.cursor);
                }
                KeyCode::Enter => {
                    self.session.submit(false);
                    self.sync_state();
                }
                KeyCode::Char(c) => {
                    self.session.select(self.cursor, &c.to_string());
                }
                _ => {}
            },
            AppState::Results => {
                if let KeyCode::Char('e') = key.code {
                    self.export();
                }
            }
        }
        Flow::Continue
    }

    /// Record the event's signal, then act on it
    fn handle(&mut self, event: &ProctorEvent) -> Flow {
        if let Some(signal) = event.signal() {
            self.session.record(signal);
        }
        match event {
            ProctorEvent::Tick => {
                self.on_tick();
                Flow::Continue
            }
            ProctorEvent::Key(key) => self.on_key(key),
            _ => Flow::Continue,
        }
    }
}

fn load_quiz(settings: &RuntimeSettings) -> Result<Quiz, vigil::VigilError> {
    match &settings.quiz_file {
        Some(path) => Quiz::load(path),
        None => Ok(Quiz::builtin()),
    }
}

fn run_replay(path: &Path, json: bool) -> Result<(), Box<dyn Error>> {
    let events = export::load(path)?;
    let report = replay(&events);
    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{}", report.render());
    }
    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    if let Some(path) = &cli.replay {
        return run_replay(path, cli.json);
    }

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    let store = FileConfigStore::new();
    let settings = RuntimeSettings::resolve(&cli, &store.load());
    if cli.save_config {
        store.save(&Config::from(&settings))?;
    }

    let quiz = load_quiz(&settings)?;
    let activity = match &settings.activity_log {
        Some(path) => ActivityLog::with_sink(path)?,
        None => ActivityLog::new(),
    };
    let session = match &cli.session_id {
        Some(id) => ProctorSession::with_id(id.clone(), quiz, SessionClock::start(), activity),
        None => ProctorSession::new(quiz, SessionClock::start(), activity),
    };
    let mut app = App::new(session, settings);

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(
        stdout,
        EnterAlternateScreen,
        EnableMouseCapture,
        EnableFocusChange
    )?;
    // key releases are only reported by terminals with the kitty protocol
    let enhanced_keys = supports_keyboard_enhancement().unwrap_or(false);
    if enhanced_keys {
        execute!(
            stdout,
            PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES)
        )?;
    }
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut runner = Runner::new(CrosstermEventSource::new(), FixedTicker::monitor());
    let result = start_tui(&mut terminal, &mut app, &mut runner);

    if enhanced_keys {
        execute!(terminal.backend_mut(), PopKeyboardEnhancementFlags)?;
    }
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        DisableFocusChange,
        DisableMouseCapture,
        LeaveAlternateScreen
    )?;
    terminal.show_cursor()?;

    result
}

fn start_tui<B: Backend, E: ProctorEventSource, T: Ticker>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    runner: &mut Runner<E, T>,
) -> Result<(), Box<dyn Error>> {
    terminal.draw(|f| f.render_widget(&*app, f.area()))?;

    while let Some(event) = runner.step() {
        if app.handle(&event) == Flow::Quit {
            runner.stop();
            break;
        }
        terminal.draw(|f| f.render_widget(&*app, f.area()))?;
    }

    Ok(())
}
