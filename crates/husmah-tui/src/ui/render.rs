use chrono::Duration;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use husmah_core::auth::RenewalRequest;
use husmah_core::utils::format_remaining;

use crate::app::{App, AppState, Tab};
use crate::forms::LoginFocus;

use super::styles;
use super::views::{access, account, forms, projects};

const LOGO: [&str; 3] = [
    "   ╦ ╦╦ ╦╔═╗╔╦╗╔═╗╦ ╦",
    "   ╠═╣║ ║╚═╗║║║╠═╣╠═╣",
    "   ╩ ╩╚═╝╚═╝╩ ╩╩ ╩╩ ╩  admin",
];

pub fn render(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Title bar
            Constraint::Length(3), // Tabs
            Constraint::Min(10),   // Main content
            Constraint::Length(2), // Status bar
        ])
        .split(frame.area());

    render_title_bar(frame, app, chunks[0]);
    render_tabs(frame, app, chunks[1]);
    if app.is_authenticated() {
        render_main_content(frame, app, chunks[2]);
    }
    render_status_bar(frame, app, chunks[3]);

    // Render overlays
    match app.state {
        AppState::ShowingHelp => render_help_overlay(frame),
        AppState::LoggingIn => render_login_overlay(frame, app),
        AppState::ConfirmingQuit => render_confirm_overlay(
            frame,
            "Are you sure you want to quit?",
            None,
        ),
        AppState::ConfirmingLogout => render_confirm_overlay(
            frame,
            "Are you sure you want to log out?",
            None,
        ),
        AppState::ConfirmingDeleteProject => {
            let name = app.selected_project().map(|p| p.name.as_str()).unwrap_or("");
            render_confirm_overlay(
                frame,
                "Delete this project?",
                Some(&format!("\"{}\" will be removed permanently.", name)),
            );
        }
        AppState::EditingProject => forms::render_editor(frame, app),
        AppState::ConfirmingSave => {
            forms::render_editor(frame, app);
            let message = if app.editor.as_ref().is_some_and(|e| e.is_new()) {
                "Create this project?"
            } else {
                "Save changes to this project?"
            };
            render_confirm_overlay(frame, message, Some("Picked images are uploaded first."));
        }
        AppState::RegisteringUser => forms::render_register(frame, app),
        AppState::ConfirmingRegister => {
            forms::render_register(frame, app);
            let detail = format!(
                "{} <{}> as {}",
                app.register.name.as_str().trim(),
                app.register.email.as_str().trim(),
                app.register.position.display_name()
            );
            render_confirm_overlay(frame, "Grant dashboard access?", Some(&detail));
        }
        AppState::ConfirmingRemoveUser => {
            let email = app.selected_user().map(|u| u.email.as_str()).unwrap_or("");
            render_confirm_overlay(
                frame,
                "Remove this user's access?",
                Some(email),
            );
        }
        AppState::ConfirmingChangeRole => {
            let detail = app
                .selected_user()
                .map(|u| format!("{} will become {}", u.email, u.position.toggle().display_name()))
                .unwrap_or_default();
            render_confirm_overlay(frame, "Change this user's role?", Some(&detail));
        }
        AppState::ChangingPassword => forms::render_password(frame, app),
        AppState::Normal | AppState::Searching | AppState::Quitting => {}
    }
}

fn render_title_bar(frame: &mut Frame, app: &App, area: Rect) {
    let title = "  HUSMAH ENGINEERING · Admin Dashboard";
    let right = match app.user {
        Some(ref user) => format!(
            "{} ({})  [?] Help",
            user.display_name(),
            user.position.display_name()
        ),
        None => "[?] Help".to_string(),
    };

    let title_line = Line::from(vec![
        Span::styled(title, styles::title_style()),
        Span::raw(" ".repeat(
            (area.width as usize)
                .saturating_sub(title.chars().count() + right.chars().count() + 2),
        )),
        Span::styled(right, styles::muted_style()),
    ]);

    let block = Block::default()
        .borders(Borders::BOTTOM)
        .border_style(styles::muted_style());

    let paragraph = Paragraph::new(title_line).block(block);
    frame.render_widget(paragraph, area);
}

fn render_tabs(frame: &mut Frame, app: &App, area: Rect) {
    let tabs = [(1, Tab::Projects), (2, Tab::Access), (3, Tab::Account)];

    let mut spans = vec![Span::raw(" ")];
    for (i, (number, tab)) in tabs.iter().enumerate() {
        if i > 0 {
            spans.push(Span::styled(" | ", styles::muted_style()));
        }
        let label = format!("[{}] {}", number, tab.title());
        let style = if app.current_tab == *tab {
            styles::tab_style(true)
        } else {
            styles::muted_style()
        };
        spans.push(Span::styled(label, style));
    }

    if app.state == AppState::Searching || !app.search_query.is_empty() {
        spans.push(Span::raw("    "));
        spans.push(Span::styled(
            format!("/{}", app.search_query),
            styles::search_style(),
        ));
        if app.state == AppState::Searching {
            spans.push(Span::styled("▌", styles::search_style()));
        }
    }

    let block = Block::default()
        .borders(Borders::BOTTOM)
        .border_style(styles::muted_style());

    let paragraph = Paragraph::new(Line::from(spans)).block(block);
    frame.render_widget(paragraph, area);
}

fn render_main_content(frame: &mut Frame, app: &App, area: Rect) {
    match app.current_tab {
        Tab::Projects => projects::render(frame, app, area),
        Tab::Access => access::render(frame, app, area),
        Tab::Account => account::render(frame, app, area),
    }
}

fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let shortcuts = "[u]pdate | [L]ogout | [q]uit";

    let left_text = match (&app.status_message, &app.user) {
        (Some(msg), _) => format!(" {} ", msg),
        (None, Some(user)) => format!(" Signed in as {} ", user.email),
        (None, None) => " Not signed in ".to_string(),
    };

    let (session_text, session_style) = if app.user.is_some() {
        let remaining = app.session.remaining();
        (
            format!(" Session {} ", format_remaining(remaining)),
            styles::countdown_style(remaining.num_seconds()),
        )
    } else {
        (String::new(), styles::muted_style())
    };
    let right_text = format!(" {} ", shortcuts);

    let width = area.width as usize;
    let padding_len = width
        .saturating_sub(left_text.chars().count())
        .saturating_sub(session_text.chars().count())
        .saturating_sub(right_text.chars().count());

    let status_line = Line::from(vec![
        Span::styled(left_text, styles::muted_style()),
        Span::raw(" ".repeat(padding_len)),
        Span::styled(session_text, session_style),
        Span::styled(right_text, styles::muted_style()),
    ]);
    let paragraph = Paragraph::new(status_line).style(styles::status_bar_style());
    frame.render_widget(paragraph, area);
}

fn logo_lines() -> Vec<Line<'static>> {
    LOGO.iter()
        .map(|line| Line::from(Span::styled(*line, styles::title_style())))
        .collect()
}

fn help_line(key: &'static str, desc: &'static str) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("  {:<10}", key), styles::help_key_style()),
        Span::styled(desc, styles::help_desc_style()),
    ])
}

fn render_help_overlay(frame: &mut Frame) {
    let area = centered_rect_fixed(54, 31, frame.area());
    frame.render_widget(Clear, area);

    let version = env!("CARGO_PKG_VERSION");

    let mut help_text = logo_lines();
    help_text.extend([
        Line::from(Span::styled(
            format!("              version {}", version),
            styles::muted_style(),
        )),
        Line::from(""),
        Line::from(Span::styled(" Navigation", styles::highlight_style())),
        help_line("1-3", "Switch tabs"),
        help_line("←/→", "Prev/next tab"),
        help_line("↑/↓", "Navigate list"),
        help_line("Enter", "Show / hide details"),
        help_line("/", "Search projects"),
        Line::from(""),
        Line::from(Span::styled(" Projects", styles::highlight_style())),
        help_line("n", "New project"),
        help_line("e", "Edit selected project"),
        help_line("d", "Delete selected project"),
        Line::from(""),
        Line::from(Span::styled(" Access (superadmin)", styles::highlight_style())),
        help_line("n", "Grant access to a new user"),
        help_line("x", "Remove selected user"),
        help_line("r", "Switch selected user between admin and superadmin"),
        Line::from(""),
        Line::from(Span::styled(" Account", styles::highlight_style())),
        help_line("p", "Change password"),
        help_line("L", "Log out"),
        help_line("u", "Update data from the server"),
        help_line("q", "Quit"),
        Line::from(""),
        Line::from(vec![
            Span::styled("        Press ", styles::muted_style()),
            Span::styled("?", styles::help_key_style()),
            Span::styled(" or ", styles::muted_style()),
            Span::styled("Esc", styles::help_key_style()),
            Span::styled(" to close", styles::muted_style()),
        ]),
    ]);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(true))
        .style(Style::default());

    frame.render_widget(Paragraph::new(help_text).block(block), area);
}

fn render_login_overlay(frame: &mut Frame, app: &App) {
    let form = &app.login;
    let height = if form.error.is_some() { 16 } else { 14 };
    let area = centered_rect_fixed(52, height, frame.area());
    frame.render_widget(Clear, area);

    let mut lines = logo_lines();
    lines.push(Line::from(""));

    let email_focused = form.focus == LoginFocus::Email;
    let cursor = if email_focused { "▌" } else { "" };
    lines.push(Line::from(vec![
        Span::raw("   "),
        Span::styled("Email:    [", styles::muted_style()),
        Span::styled(
            format!("{:<28}{}", last_chars(form.email.as_str(), 28), cursor),
            styles::field_style(email_focused),
        ),
        Span::styled("]", styles::muted_style()),
    ]));

    let password_focused = form.focus == LoginFocus::Password;
    let cursor = if password_focused { "▌" } else { "" };
    lines.push(Line::from(vec![
        Span::raw("   "),
        Span::styled("Password: [", styles::muted_style()),
        Span::styled(
            format!("{:<28}{}", last_chars(&form.password.masked(), 28), cursor),
            styles::field_style(password_focused),
        ),
        Span::styled("]", styles::muted_style()),
    ]));

    let remember_focused = form.focus == LoginFocus::Remember;
    let check = if form.remember { "x" } else { " " };
    lines.push(Line::from(vec![
        Span::raw("   "),
        Span::styled(format!("[{}] Remember me", check), styles::field_style(remember_focused)),
    ]));

    let button_focused = form.focus == LoginFocus::Button;
    lines.push(Line::from(""));
    let label = if button_focused { " ▶ Login ◀ " } else { "   Login   " };
    lines.push(Line::from(vec![
        Span::raw("               ["),
        Span::styled(label, styles::field_style(button_focused)),
        Span::raw("]"),
    ]));

    if let Some(ref error) = form.error {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            format!(" {}", error),
            styles::error_style(),
        )));
    }

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(true))
        .style(Style::default());

    let paragraph = Paragraph::new(lines).block(block).wrap(Wrap { trim: false });
    frame.render_widget(paragraph, area);
}

/// Yes/no dialog shared by every confirmation state
fn render_confirm_overlay(frame: &mut Frame, question: &str, detail: Option<&str>) {
    let height = if detail.is_some() { 9 } else { 7 };
    let area = centered_rect_fixed(56, height, frame.area());
    frame.render_widget(Clear, area);

    let mut lines = vec![
        Line::from(""),
        Line::from(Span::styled(format!("   {}", question), styles::highlight_style())),
    ];
    if let Some(detail) = detail {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(format!("   {}", detail), styles::list_item_style())));
    }
    lines.push(Line::from(""));
    lines.push(Line::from(vec![
        Span::styled("   Press ", styles::muted_style()),
        Span::styled("[Y]", styles::help_key_style()),
        Span::styled(" to confirm, ", styles::muted_style()),
        Span::styled("[N]", styles::help_key_style()),
        Span::styled(" to cancel", styles::muted_style()),
    ]));

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(true))
        .style(Style::default());

    let paragraph = Paragraph::new(lines).block(block).wrap(Wrap { trim: false });
    frame.render_widget(paragraph, area);
}

/// Session renewal dialog, drawn by the blocking renewal prompt. `left` is
/// the time until `request.expires_at`.
pub fn render_renewal_overlay(frame: &mut Frame, request: &RenewalRequest, left: Duration) {
    let area = centered_rect_fixed(60, 12, frame.area());
    frame.render_widget(Clear, area);

    let mut lines = logo_lines();
    lines.extend([
        Line::from(""),
        Line::from(Span::styled(
            format!(" {}", request.message()),
            styles::highlight_style(),
        )),
        Line::from(""),
        Line::from(vec![
            Span::styled(" Expires in ", styles::muted_style()),
            Span::styled(format_remaining(left), styles::countdown_style(left.num_seconds())),
        ]),
        Line::from(""),
        Line::from(vec![
            Span::styled(" Press ", styles::muted_style()),
            Span::styled("[Y]", styles::help_key_style()),
            Span::styled(" to extend, ", styles::muted_style()),
            Span::styled("[N]", styles::help_key_style()),
            Span::styled(" to let it expire", styles::muted_style()),
        ]),
    ]);

    let block = Block::default()
        .title(" Session expiring ")
        .title_style(styles::highlight_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(true))
        .style(Style::default());

    let paragraph = Paragraph::new(lines).block(block).wrap(Wrap { trim: false });
    frame.render_widget(paragraph, area);
}

/// Create a centered rectangle with fixed dimensions
pub fn centered_rect_fixed(width: u16, height: u16, r: Rect) -> Rect {
    let x = r.x + (r.width.saturating_sub(width)) / 2;
    let y = r.y + (r.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width.min(r.width), height.min(r.height))
}

/// The last `max` characters of `s`, so the cursor end of a long input stays visible
pub fn last_chars(s: &str, max: usize) -> String {
    let count = s.chars().count();
    s.chars().skip(count.saturating_sub(max)).collect()
}
