//! Modal dialogs for the project editor, user registration and password change.

use ratatui::{
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use husmah_core::utils::truncate_string;

use crate::app::App;
use crate::forms::{
    EditorField, EmailStatus, PasswordFocus, ProjectEditor, RegisterFocus, TextInput,
};
use crate::ui::render::{centered_rect_fixed, last_chars};
use crate::ui::styles;

/// Visible width of a text field inside a dialog
const FIELD_WIDTH: usize = 40;

fn input_line(label: &str, value: &str, focused: bool) -> Line<'static> {
    let cursor = if focused { "▌" } else { "" };
    Line::from(vec![
        Span::styled(format!("  {:<16}[", label), styles::muted_style()),
        Span::styled(
            format!("{:<width$}{}", last_chars(value, FIELD_WIDTH), cursor, width = FIELD_WIDTH),
            styles::field_style(focused),
        ),
        Span::styled("]", styles::muted_style()),
    ])
}

fn text_line(label: &str, input: &TextInput, focused: bool) -> Line<'static> {
    input_line(label, input.as_str(), focused)
}

fn secret_line(label: &str, input: &TextInput, focused: bool) -> Line<'static> {
    input_line(label, &input.masked(), focused)
}

fn button_line(label: &str, focused: bool) -> Line<'static> {
    let text = if focused {
        format!(" ▶ {} ◀ ", label)
    } else {
        format!("   {}   ", label)
    };
    Line::from(vec![
        Span::raw("                    ["),
        Span::styled(text, styles::field_style(focused)),
        Span::raw("]"),
    ])
}

fn error_lines(error: &Option<String>) -> Vec<Line<'static>> {
    match error {
        Some(message) => vec![
            Line::from(""),
            Line::from(Span::styled(format!("  {}", message), styles::error_style())),
        ],
        None => Vec::new(),
    }
}

fn hint_line(hints: &'static str) -> Line<'static> {
    Line::from(Span::styled(format!("  {}", hints), styles::muted_style()))
}

fn dialog(title: String) -> Block<'static> {
    Block::default()
        .title(title)
        .title_style(styles::highlight_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(true))
}

// ============================================================================
// Project editor
// ============================================================================

fn editor_lines(editor: &ProjectEditor) -> Vec<Line<'static>> {
    let focused = editor.focused_field();
    let mut lines = vec![Line::from("")];

    lines.push(text_line("Name", &editor.name, focused == EditorField::Name));
    lines.push(text_line("Description", &editor.description, focused == EditorField::Description));
    lines.push(text_line("Status", &editor.status, focused == EditorField::Status));
    lines.push(text_line("Feedback", &editor.feedback, focused == EditorField::Feedback));
    lines.push(Line::from(""));

    for entry in &editor.attributes {
        let field = EditorField::Attribute(entry.attribute);
        let is_focused = focused == field;
        if entry.enabled {
            lines.push(text_line(field.label(), &entry.input, is_focused));
        } else {
            lines.push(Line::from(vec![
                Span::styled(format!("  {:<16}", field.label()), styles::muted_style()),
                Span::styled("(off)", styles::field_style(is_focused)),
            ]));
        }
    }
    lines.push(Line::from(""));

    let images_focused = focused == EditorField::ExistingImages;
    let main = if editor.main_image.is_empty() {
        "none".to_string()
    } else {
        truncate_string(&editor.main_image, 50)
    };
    lines.push(Line::from(vec![
        Span::styled(format!("  {:<16}", "Main image"), styles::muted_style()),
        Span::raw(main),
    ]));
    lines.push(Line::from(Span::styled(
        format!("  {} ({})", EditorField::ExistingImages.label(), editor.existing_images.len()),
        styles::field_style(images_focused),
    )));
    if editor.existing_images.is_empty() {
        lines.push(Line::from(Span::styled("    none", styles::muted_style())));
    }
    for (i, url) in editor.existing_images.iter().enumerate() {
        let selected = images_focused && i == editor.image_selection;
        let style = if selected {
            styles::selected_style()
        } else {
            styles::list_item_style()
        };
        let marker = if selected { "  ▸ " } else { "    " };
        lines.push(Line::from(Span::styled(
            format!("{}{}", marker, truncate_string(url, 56)),
            style,
        )));
    }
    lines.push(Line::from(""));

    lines.push(text_line(
        EditorField::MainImage.label(),
        &editor.main_image_path,
        focused == EditorField::MainImage,
    ));
    lines.push(text_line(
        EditorField::NewImages.label(),
        &editor.new_image_paths,
        focused == EditorField::NewImages,
    ));
    lines.push(Line::from(Span::styled(
        "  File paths; separate several with ';'",
        styles::muted_style(),
    )));

    lines.extend(error_lines(&editor.error));
    lines.push(Line::from(""));

    let hints = match focused {
        EditorField::Attribute(_) => "Tab next · Ctrl+T toggle · Ctrl+S save · Esc cancel",
        EditorField::ExistingImages => {
            "Tab next · ←/→ select · x remove · Ctrl+S save · Esc cancel"
        }
        _ => "Tab next · Shift+Tab back · Ctrl+S save · Esc cancel",
    };
    lines.push(hint_line(hints));
    lines
}

pub fn render_editor(frame: &mut Frame, app: &App) {
    let Some(ref editor) = app.editor else {
        return;
    };

    let lines = editor_lines(editor);
    let height = (lines.len() as u16).saturating_add(2);
    let area = centered_rect_fixed(66, height, frame.area());
    frame.render_widget(Clear, area);

    let title = if editor.is_new() {
        " New project ".to_string()
    } else {
        format!(" Edit project: {} ", truncate_string(editor.name.as_str(), 40))
    };

    let paragraph = Paragraph::new(lines)
        .block(dialog(title))
        .wrap(Wrap { trim: false });
    frame.render_widget(paragraph, area);
}

// ============================================================================
// Registration
// ============================================================================

pub fn render_register(frame: &mut Frame, app: &App) {
    let form = &app.register;
    let mut lines = vec![Line::from("")];

    lines.push(text_line("Name", &form.name, form.focus == RegisterFocus::Name));
    lines.push(text_line("Email", &form.email, form.focus == RegisterFocus::Email));
    if let Some(message) = form.email_status.message() {
        let style = match form.email_status {
            EmailStatus::Taken => styles::error_style(),
            EmailStatus::Available => styles::success_style(),
            EmailStatus::Checking | EmailStatus::Unknown => styles::muted_style(),
        };
        lines.push(Line::from(Span::styled(format!("  {}", message), style)));
    }
    lines.push(secret_line("Password", &form.password, form.focus == RegisterFocus::Password));
    lines.push(secret_line("Confirm", &form.confirm, form.focus == RegisterFocus::Confirm));

    let position_focused = form.focus == RegisterFocus::Position;
    lines.push(Line::from(vec![
        Span::styled(format!("  {:<16}", "Position"), styles::muted_style()),
        Span::styled(
            format!("◀ {} ▶", form.position.display_name()),
            styles::field_style(position_focused),
        ),
    ]));
    lines.push(Line::from(""));
    lines.push(button_line("Grant access", form.focus == RegisterFocus::Button));

    lines.extend(error_lines(&form.error));
    lines.push(Line::from(""));
    lines.push(hint_line("Tab next · ←/→ change position · Enter submit · Esc cancel"));

    let height = (lines.len() as u16).saturating_add(2);
    let area = centered_rect_fixed(66, height, frame.area());
    frame.render_widget(Clear, area);

    let paragraph = Paragraph::new(lines)
        .block(dialog(" Grant dashboard access ".to_string()))
        .wrap(Wrap { trim: false });
    frame.render_widget(paragraph, area);
}

// ============================================================================
// Password change
// ============================================================================

pub fn render_password(frame: &mut Frame, app: &App) {
    let form = &app.password;
    let mut lines = vec![Line::from("")];

    lines.push(secret_line("Current", &form.current, form.focus == PasswordFocus::Current));
    lines.push(secret_line("New password", &form.new, form.focus == PasswordFocus::New));
    lines.push(secret_line("Confirm", &form.confirm, form.focus == PasswordFocus::Confirm));
    lines.push(Line::from(Span::styled(
        "  At least 8 characters with uppercase, lowercase and a number",
        styles::muted_style(),
    )));
    lines.push(Line::from(""));
    lines.push(button_line("Change password", form.focus == PasswordFocus::Button));

    lines.extend(error_lines(&form.error));
    lines.push(Line::from(""));
    lines.push(hint_line("Tab next · Enter submit · Esc cancel"));

    let height = (lines.len() as u16).saturating_add(2);
    let area = centered_rect_fixed(66, height, frame.area());
    frame.render_widget(Clear, area);

    let paragraph = Paragraph::new(lines)
        .block(dialog(" Change password ".to_string()))
        .wrap(Wrap { trim: false });
    frame.render_widget(paragraph, area);
}
