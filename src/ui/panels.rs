use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget, Wrap},
};
use vigil::{
    activity::ActivityLog,
    monitor::{Notice, NoticeKind},
    risk::RiskBadge,
    session::SubmissionReport,
    stats::format_duration,
};

/// Rows taken by one bordered notice
pub const NOTICE_HEIGHT: u16 = 3;

pub fn badge_color(badge: RiskBadge) -> Color {
    match badge {
        RiskBadge::Low => Color::Green,
        RiskBadge::Elevated => Color::Yellow,
        RiskBadge::High => Color::Red,
    }
}

pub fn render_notices(notices: &[Notice], area: Rect, buf: &mut Buffer) {
    if notices.is_empty() || area.height == 0 {
        return;
    }

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints(vec![Constraint::Length(NOTICE_HEIGHT); notices.len()])
        .split(area);

    for (notice, row) in notices.iter().zip(rows.iter()) {
        let color = match notice.kind {
            NoticeKind::Warning => Color::Yellow,
            NoticeKind::Terminated => Color::Red,
        };
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(color))
            .title(Span::styled(
                notice.title(),
                Style::default().fg(color).add_modifier(Modifier::BOLD),
            ));
        Paragraph::new(notice.body())
            .block(block)
            .wrap(Wrap { trim: true })
            .render(*row, buf);
    }
}

/// Most recent activity lines that fit in the bordered panel
pub fn render_activity(log: &ActivityLog, area: Rect, buf: &mut Buffer) {
    if area.height == 0 {
        return;
    }
    let visible = area.height.saturating_sub(2) as usize;
    let lines: Vec<Line> = log
        .tail(visible)
        .iter()
        .map(|line| Line::from(line.render()))
        .collect();

    Paragraph::new(lines)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().add_modifier(Modifier::DIM))
                .title("Activity"),
        )
        .render(area, buf);
}

pub fn results_lines(report: &SubmissionReport) -> Vec<Line<'static>> {
    let bold = Style::default().add_modifier(Modifier::BOLD);
    let risk_style = bold.fg(badge_color(report.badge));
    let stats = &report.stats;

    vec![
        Line::from(Span::styled("Results", bold.add_modifier(Modifier::UNDERLINED))),
        Line::default(),
        Line::from(Span::styled(report.quiz.summary(), bold)),
        Line::from(report.quiz.status()),
        Line::default(),
        Line::from(Span::styled(
            format!(
                "🚨 Behavior Risk Score: {}/100 [{}]",
                report.risk,
                report.badge.label()
            ),
            risk_style,
        )),
        Line::from(if report.auto {
            "Submission: automatic (risk threshold reached)"
        } else {
            "Submission: manual"
        }),
        Line::default(),
        Line::from(format!(
            "Duration: {}   Events: {}",
            format_duration(stats.duration_ms),
            stats.total_events
        )),
        Line::from(Span::styled(
            format!(
                "mouse moves {} / clicks {} / key down {} / key up {} / blur {} / focus {}",
                stats.mouse_moves,
                stats.clicks,
                stats.key_downs,
                stats.key_ups,
                stats.blurs,
                stats.focuses
            ),
            Style::default().add_modifier(Modifier::DIM),
        )),
    ]
}
