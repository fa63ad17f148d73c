use ratatui::{
    layout::{Constraint, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState, Wrap},
    Frame,
};

use husmah_core::utils::{format_date, or_placeholder, truncate_string};

use crate::app::App;
use crate::ui::styles;

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    if !app.can_manage_access {
        render_access_denied(frame, area);
        return;
    }

    let header_cells = [
        Cell::from("Name"),
        Cell::from("Email"),
        Cell::from("Position"),
        Cell::from("Last login"),
    ];
    let header = Row::new(header_cells)
        .style(styles::title_style())
        .height(1);

    let rows: Vec<Row> = app
        .users
        .iter()
        .enumerate()
        .map(|(i, user)| {
            let style = if i == app.user_selection {
                styles::selected_style()
            } else {
                styles::list_item_style()
            };

            let position_style = if user.is_superadmin() {
                styles::highlight_style()
            } else {
                style
            };

            Row::new(vec![
                Cell::from(truncate_string(or_placeholder(&user.name, "-"), 30)),
                Cell::from(user.email.clone()),
                Cell::from(Span::styled(user.position.display_name().to_string(), position_style)),
                Cell::from(
                    user.last_login_at
                        .as_deref()
                        .map(format_date)
                        .unwrap_or_else(|| "Never".to_string()),
                ),
            ])
            .style(style)
        })
        .collect();

    let widths = [
        Constraint::Percentage(25), // Name
        Constraint::Fill(1),        // Email
        Constraint::Length(12),     // Position
        Constraint::Length(20),     // Last login
    ];

    let title = format!(
        " Dashboard access ({}) - [n] grant access [r] change role [x] remove ",
        app.users.len()
    );

    if app.users.is_empty() {
        let paragraph = Paragraph::new(vec![
            Line::from(""),
            Line::from(Span::styled(
                "  No other users have access. Press [n] to grant access.",
                styles::muted_style(),
            )),
        ])
        .block(
            Block::default()
                .title(title)
                .title_style(styles::muted_style())
                .borders(Borders::ALL)
                .border_style(styles::border_style(true)),
        );
        frame.render_widget(paragraph, area);
        return;
    }

    let table = Table::new(rows, widths)
        .header(header)
        .block(
            Block::default()
                .title(title)
                .title_style(styles::muted_style())
                .borders(Borders::ALL)
                .border_style(styles::border_style(true)),
        )
        .row_highlight_style(styles::selected_style());

    let mut state = TableState::default();
    state.select(Some(app.user_selection));

    frame.render_stateful_widget(table, area, &mut state);
}

fn render_access_denied(frame: &mut Frame, area: Rect) {
    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            "  Access denied",
            styles::error_style(),
        )),
        Line::from(""),
        Line::from(Span::styled(
            "  Only superadmin users can manage dashboard access.",
            styles::muted_style(),
        )),
    ];

    let paragraph = Paragraph::new(lines)
        .block(
            Block::default()
                .title(" Access ")
                .title_style(styles::muted_style())
                .borders(Borders::ALL)
                .border_style(styles::border_style(false)),
        )
        .wrap(Wrap { trim: false });

    frame.render_widget(paragraph, area);
}
