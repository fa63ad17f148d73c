use chrono::{DateTime, Local, Utc};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use husmah_core::utils::{format_date, format_remaining};

use crate::app::App;
use crate::ui::styles;

fn local_time(at: DateTime<Utc>) -> String {
    at.with_timezone(&Local).format("%b %d, %Y %H:%M:%S").to_string()
}

fn row(label: &str, value: String) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("  {:<15}", label), styles::muted_style()),
        Span::raw(value),
    ])
}

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);

    render_profile(frame, app, chunks[0]);
    render_session(frame, app, chunks[1]);
}

fn render_profile(frame: &mut Frame, app: &App, area: Rect) {
    let mut lines = vec![Line::from("")];

    if let Some(ref user) = app.user {
        lines.push(row("Name:", user.display_name().to_string()));
        lines.push(row("Email:", user.email.clone()));
        let position_style = if app.can_manage_access {
            styles::highlight_style()
        } else {
            styles::list_item_style()
        };
        lines.push(Line::from(vec![
            Span::styled(format!("  {:<15}", "Position:"), styles::muted_style()),
            Span::styled(user.position.display_name().to_string(), position_style),
        ]));
        let last_login = app
            .session
            .store()
            .last_login_at()
            .map(|at| format_date(&at))
            .unwrap_or_else(|| "-".to_string());
        lines.push(row("Last login:", last_login));
    }

    lines.push(Line::from(""));
    lines.push(Line::from(vec![
        Span::styled("  [p]", styles::help_key_style()),
        Span::styled(" Change password   ", styles::help_desc_style()),
        Span::styled("[L]", styles::help_key_style()),
        Span::styled(" Log out", styles::help_desc_style()),
    ]));

    let paragraph = Paragraph::new(lines).block(
        Block::default()
            .title(" Account ")
            .title_style(styles::muted_style())
            .borders(Borders::ALL)
            .border_style(styles::border_style(true)),
    );
    frame.render_widget(paragraph, area);
}

fn render_session(frame: &mut Frame, app: &App, area: Rect) {
    let remaining = app.session.remaining();
    let started = app.session.store().started_at();

    let mut lines = vec![Line::from("")];
    lines.push(row(
        "Started:",
        started.map(local_time).unwrap_or_else(|| "-".to_string()),
    ));
    lines.push(row(
        "Expires:",
        app.session_expires_at()
            .map(local_time)
            .unwrap_or_else(|| "-".to_string()),
    ));
    lines.push(Line::from(vec![
        Span::styled(format!("  {:<15}", "Remaining:"), styles::muted_style()),
        Span::styled(
            format_remaining(remaining),
            styles::countdown_style(remaining.num_seconds()),
        ),
    ]));

    let (monitor_text, monitor_style) = if app.session.is_monitoring() {
        ("active", styles::success_style())
    } else {
        ("stopped", styles::error_style())
    };
    lines.push(Line::from(vec![
        Span::styled(format!("  {:<15}", "Monitoring:"), styles::muted_style()),
        Span::styled(monitor_text, monitor_style),
    ]));

    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "  Idle sessions are offered an extension before they end.",
        styles::muted_style(),
    )));

    let paragraph = Paragraph::new(lines).block(
        Block::default()
            .title(" Session ")
            .title_style(styles::muted_style())
            .borders(Borders::ALL)
            .border_style(styles::border_style(false)),
    );
    frame.render_widget(paragraph, area);
}
