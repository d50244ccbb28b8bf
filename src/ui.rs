pub mod panels;

use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Widget, Wrap},
};
use unicode_width::UnicodeWidthStr;
use vigil::stats::format_duration;

use crate::{App, AppState};
use panels::{render_activity, render_notices, results_lines, NOTICE_HEIGHT};

const HORIZONTAL_MARGIN: u16 = 2;
const ACTIVITY_HEIGHT: u16 = 7;

const QUIZ_LEGEND: &str = concat!(
    "(↑/↓) question / (←/→ or letter) choose / (⌫) clear / ",
    "(enter) submit / (ctrl+e) export / (esc)ape"
);
const QUIZ_LEGEND_SHORT: &str = "↑↓ ←→ a-d ⌫ enter ^e esc";
const RESULTS_LEGEND: &str = "(e)xport csv / (esc)ape";

impl Widget for &App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let session = &self.session;
        let notices = session.notices();

        let notice_height = NOTICE_HEIGHT * notices.len() as u16;
        let activity_height = if self.settings.show_activity {
            ACTIVITY_HEIGHT
        } else {
            0
        };
        let status_height = u16::from(self.status.is_some());

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .horizontal_margin(HORIZONTAL_MARGIN)
            .constraints([
                Constraint::Length(2),               // header
                Constraint::Length(notice_height),   // notices
                Constraint::Min(3),                  // quiz or results
                Constraint::Length(activity_height), // activity
                Constraint::Length(status_height),   // status
                Constraint::Length(1),               // legend
            ])
            .split(area);

        render_header(self, chunks[0], buf);
        render_notices(notices, chunks[1], buf);

        match self.state {
            AppState::Quiz => render_quiz(self, chunks[2], buf),
            AppState::Results => {
                if let Some(report) = session.report() {
                    Paragraph::new(results_lines(report))
                        .wrap(Wrap { trim: false })
                        .render(chunks[2], buf);
                }
            }
        }

        if self.settings.show_activity {
            render_activity(session.activity(), chunks[3], buf);
        }

        if let Some(status) = &self.status {
            Paragraph::new(Span::styled(
                status.as_str(),
                Style::default().fg(Color::Cyan),
            ))
            .render(chunks[4], buf);
        }

        let legend = match self.state {
            AppState::Quiz if QUIZ_LEGEND.width() > chunks[5].width as usize => {
                QUIZ_LEGEND_SHORT
            }
            AppState::Quiz => QUIZ_LEGEND,
            AppState::Results => RESULTS_LEGEND,
        };
        Paragraph::new(Span::styled(
            legend,
            Style::default().add_modifier(Modifier::ITALIC),
        ))
        .render(chunks[5], buf);
    }
}

fn render_header(app: &App, area: Rect, buf: &mut Buffer) {
    let session = &app.session;
    let bold = Style::default().add_modifier(Modifier::BOLD);

    let line = Line::from(vec![
        Span::styled(session.quiz().title.as_str(), bold),
        Span::raw("  "),
        Span::styled(
            format!("session {}", session.id()),
            Style::default().add_modifier(Modifier::DIM),
        ),
        Span::raw("  "),
        Span::raw(format_duration(session.recorder().elapsed_ms())),
        Span::raw("  "),
        Span::styled("STRICT MODE", bold.fg(Color::Red)),
    ]);

    Paragraph::new(line)
        .alignment(Alignment::Center)
        .render(area, buf);
}

/// Rendered question lines, plus the line range of the highlighted question
fn quiz_lines(app: &App) -> (Vec<Line<'static>>, usize, usize) {
    let session = &app.session;
    let mut lines = Vec::new();
    let (mut cursor_start, mut cursor_end) = (0, 0);

    for (idx, question) in session.quiz().questions.iter().enumerate() {
        let highlighted = idx == app.cursor;
        if highlighted {
            cursor_start = lines.len();
        }

        let prompt_style = if highlighted {
            Style::default()
                .add_modifier(Modifier::BOLD)
                .fg(Color::Yellow)
        } else {
            Style::default().add_modifier(Modifier::BOLD)
        };
        lines.push(Line::from(vec![
            Span::raw(if highlighted { "> " } else { "  " }),
            Span::styled(format!("{}. {}", idx + 1, question.prompt), prompt_style),
        ]));

        let selected = session.selection(idx);
        for choice in &question.choices {
            let chosen = selected == Some(choice.id.as_str());
            let style = if chosen {
                Style::default().fg(Color::Green)
            } else {
                Style::default()
            };
            lines.push(Line::from(Span::styled(
                format!(
                    "     {} {}) {}",
                    if chosen { "(•)" } else { "( )" },
                    choice.id,
                    choice.label
                ),
                style,
            )));
        }

        if highlighted {
            cursor_end = lines.len();
        }
        lines.push(Line::default());
    }

    (lines, cursor_start, cursor_end)
}

fn render_quiz(app: &App, area: Rect, buf: &mut Buffer) {
    let (lines, start, end) = quiz_lines(app);
    let height = area.height as usize;
    // keep the highlighted question in view
    let scroll = end.saturating_sub(height).min(start);

    Paragraph::new(lines)
        .scroll((scroll as u16, 0))
        .render(area, buf);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RuntimeSettings;
    use vigil::{
        activity::ActivityLog,
        events::{ManualClock, Signal},
        quiz::Quiz,
        session::ProctorSession,
    };

    fn create_test_app() -> (App, ManualClock) {
        let clock = ManualClock::new();
        let session = ProctorSession::with_id(
            "k3x9q0ab7z",
            Quiz::builtin(),
            clock.clone(),
            ActivityLog::new(),
        );
        (App::new(session, RuntimeSettings::default()), clock)
    }

    fn render_to_string(app: &App, width: u16, height: u16) -> String {
        let area = Rect::new(0, 0, width, height);
        let mut buffer = Buffer::empty(area);
        app.render(area, &mut buffer);

        buffer
            .content()
            .iter()
            .map(|c| c.symbol())
            .collect::<String>()
    }

    #[test]
    fn test_quiz_view_shows_header_and_questions() {
        let (mut app, clock) = create_test_app();
        clock.set(65_000);
        app.session.select(0, "b");

        let rendered = render_to_string(&app, 120, 40);
        assert!(rendered.contains("session k3x9q0ab7z"));
        assert!(rendered.contains("01:05"));
        assert!(rendered.contains("STRICT MODE"));
        assert!(rendered.contains("1. What is the capital of Australia?"));
        assert!(rendered.contains("b) Canberra"));
        assert!(rendered.contains("( ) a) Sydney"));
        assert!(rendered.contains("Activity"));
    }

    #[test]
    fn test_cursor_question_scrolled_into_view() {
        let (mut app, _) = create_test_app();
        app.settings.show_activity = false;
        app.cursor = 4;

        let rendered = render_to_string(&app, 100, 12);
        assert!(rendered.contains("5. How many sides does a hexagon have?"));
        assert!(rendered.contains("d) 7"));
        assert!(!rendered.contains("1. What is the capital"));
    }

    #[test]
    fn test_warning_notice_rendered() {
        let (mut app, _) = create_test_app();
        app.session.record(Signal::FocusLost);
        app.on_tick();

        let rendered = render_to_string(&app, 120, 40);
        assert!(rendered.contains("Warning:"));
        assert!(rendered.contains("Risk score is 70/100."));
    }

    #[test]
    fn test_results_view_after_auto_submit() {
        let (mut app, _) = create_test_app();
        app.session.select(0, "b");
        app.session.record(Signal::FocusLost);
        app.session.record(Signal::FocusLost);
        app.on_tick();
        assert_eq!(app.state, AppState::Results);

        let rendered = render_to_string(&app, 120, 40);
        assert!(rendered.contains("Terminated:"));
        assert!(rendered.contains("Quiz Score: 1/5"));
        assert!(rendered.contains("Unanswered: 2, 3, 4, 5"));
        assert!(rendered.contains("Behavior Risk Score: 100/100 [High Risk / Auto-Fail]"));
        assert!(rendered.contains("automatic"));
        assert!(rendered.contains(RESULTS_LEGEND));
    }

    #[test]
    fn test_status_line_and_hidden_activity() {
        let (mut app, _) = create_test_app();
        app.settings.show_activity = false;
        app.status = Some("exported to ./proctoring_data.csv".to_string());

        let rendered = render_to_string(&app, 120, 30);
        assert!(rendered.contains("exported to ./proctoring_data.csv"));
        assert!(!rendered.contains("Activity"));
    }

    #[test]
    fn test_narrow_area_uses_short_legend() {
        let (app, _) = create_test_app();
        let rendered = render_to_string(&app, 40, 20);
        assert!(rendered.contains("enter ^e esc"));
        assert!(!rendered.contains("(ctrl+e) export"));
    }

    #[test]
    fn test_tiny_area_does_not_panic() {
        let (app, _) = create_test_app();
        render_to_string(&app, 10, 4);
    }
}
