use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState, Wrap},
    Frame,
};

use husmah_core::models::{Attribute, Project};
use husmah_core::utils::{format_date, or_placeholder, truncate_string};

use crate::app::App;
use crate::ui::styles;

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    if app.show_project_detail {
        let chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
            .split(area);

        render_project_list(frame, app, chunks[0]);
        render_project_detail(frame, app, chunks[1]);
    } else {
        render_project_list(frame, app, area);
    }
}

fn render_project_list(frame: &mut Frame, app: &App, area: Rect) {
    let header_cells = [
        Cell::from("Name"),
        Cell::from("Status"),
        Cell::from("Images"),
        Cell::from("Updated"),
    ];
    let header = Row::new(header_cells)
        .style(styles::title_style())
        .height(1);

    let projects = app.filtered_projects();

    let rows: Vec<Row> = projects
        .iter()
        .enumerate()
        .map(|(i, project)| {
            let style = if i == app.project_selection {
                styles::selected_style()
            } else {
                styles::list_item_style()
            };

            let updated = project
                .updated_at
                .as_deref()
                .or(project.created_at.as_deref())
                .map(format_date)
                .unwrap_or_else(|| "-".to_string());

            Row::new(vec![
                Cell::from(truncate_string(or_placeholder(&project.name, "(unnamed)"), 40)),
                Cell::from(or_placeholder(&project.status, "-").to_string()),
                Cell::from(project.image_count().to_string()),
                Cell::from(updated),
            ])
            .style(style)
        })
        .collect();

    let widths = [
        Constraint::Fill(1),    // Name
        Constraint::Length(16), // Status
        Constraint::Length(7),  // Images
        Constraint::Length(20), // Updated: "Mar 04, 2025 14:30"
    ];

    let title = if app.search_query.is_empty() {
        format!(" Projects ({}) - [n]ew [e]dit [d]elete ", app.projects.len())
    } else {
        format!(
            " Projects ({} of {}) - [n]ew [e]dit [d]elete ",
            projects.len(),
            app.projects.len()
        )
    };

    let table = Table::new(rows, widths)
        .header(header)
        .block(
            Block::default()
                .title(title)
                .title_style(styles::muted_style())
                .borders(Borders::ALL)
                .border_style(styles::border_style(!app.show_project_detail)),
        )
        .row_highlight_style(styles::selected_style());

    if projects.is_empty() {
        let message = if app.projects.is_empty() {
            "  No projects yet. Press [n] to create one."
        } else {
            "  No projects match the search."
        };
        let block = Block::default()
            .title(" Projects ")
            .title_style(styles::muted_style())
            .borders(Borders::ALL)
            .border_style(styles::border_style(true));
        let paragraph = Paragraph::new(vec![
            Line::from(""),
            Line::from(Span::styled(message, styles::muted_style())),
        ])
        .block(block);
        frame.render_widget(paragraph, area);
        return;
    }

    let mut state = TableState::default();
    state.select(Some(app.project_selection));

    frame.render_stateful_widget(table, area, &mut state);
}

fn detail_row(label: &str, value: String) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("{:<11}", label), styles::muted_style()),
        Span::raw(value),
    ])
}

fn project_lines(project: &Project) -> Vec<Line<'static>> {
    let mut lines = vec![
        Line::from(Span::styled(
            or_placeholder(&project.name, "(unnamed)").to_string(),
            styles::title_style(),
        )),
        Line::from(""),
        detail_row("Status:", or_placeholder(&project.status, "-").to_string()),
    ];

    let draft = project.to_draft();
    for attribute in Attribute::ALL {
        if attribute.is_set(&draft) {
            let label = format!("{}:", attribute.label());
            lines.push(detail_row(&label, attribute.value_text(&draft)));
        }
    }

    lines.push(detail_row("Images:", project.image_count().to_string()));
    if !project.main_image.is_empty() {
        lines.push(detail_row("Main:", truncate_string(&project.main_image, 60)));
    }
    if let Some(ref created) = project.created_at {
        lines.push(detail_row("Created:", format_date(created)));
    }
    if let Some(ref updated) = project.updated_at {
        lines.push(detail_row("Updated:", format_date(updated)));
    }
    if let Some(ref by) = project.created_by {
        lines.push(detail_row("By:", by.clone()));
    }

    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled("Description", styles::highlight_style())));
    lines.push(Line::from(or_placeholder(&project.description, "No description").to_string()));

    if !project.customer_feedback.is_empty() {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled("Customer feedback", styles::highlight_style())));
        lines.push(Line::from(project.customer_feedback.clone()));
    }

    lines
}

fn render_project_detail(frame: &mut Frame, app: &App, area: Rect) {
    let content = match app.selected_project() {
        Some(project) => project_lines(project),
        None => vec![Line::from(Span::styled("No project selected", styles::muted_style()))],
    };

    let paragraph = Paragraph::new(content)
        .block(
            Block::default()
                .title(" Details - [Enter] close ")
                .title_style(styles::muted_style())
                .borders(Borders::ALL)
                .border_style(styles::border_style(true)),
        )
        .wrap(Wrap { trim: true });

    frame.render_widget(paragraph, area);
}
