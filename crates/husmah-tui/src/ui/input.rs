//! Keyboard input handling for the TUI.
//!
//! This module handles all keyboard events and translates them into
//! application state changes.

use std::time::Instant;

use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use husmah_core::validation::validate_project_name;

use crate::app::{App, AppState, Tab, PAGE_SCROLL_SIZE};
use crate::forms::{EditorField, LoginFocus, PasswordFocus, RegisterFocus, TextInput};

/// Yes/no answer for confirmation overlays
enum Confirm {
    Yes,
    No,
}

fn confirm_answer(code: KeyCode) -> Option<Confirm> {
    match code {
        KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => Some(Confirm::Yes),
        KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => Some(Confirm::No),
        _ => None,
    }
}

/// Apply a typing key to a text field. Returns true when the text changed.
fn edit_text(input: &mut TextInput, code: KeyCode) -> bool {
    match code {
        KeyCode::Backspace => input.pop(),
        KeyCode::Char(c) => input.push(c),
        _ => false,
    }
}

fn is_ctrl(key: &KeyEvent, c: char) -> bool {
    key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char(c)
}

/// Handle keyboard input. Returns true if the app should quit.
pub async fn handle_input(app: &mut App, key: KeyEvent) -> Result<bool> {
    match app.state {
        AppState::LoggingIn => return handle_login_input(app, key).await,
        AppState::EditingProject => {
            handle_editor_input(app, key);
            return Ok(false);
        }
        AppState::RegisteringUser => {
            handle_register_input(app, key);
            return Ok(false);
        }
        AppState::ChangingPassword => {
            handle_password_input(app, key).await;
            return Ok(false);
        }
        AppState::Searching => {
            handle_search_input(app, key);
            return Ok(false);
        }
        AppState::ShowingHelp => {
            if matches!(key.code, KeyCode::Esc | KeyCode::Char('?') | KeyCode::Char('q')) {
                app.state = AppState::Normal;
            }
            return Ok(false);
        }
        AppState::ConfirmingQuit => {
            match confirm_answer(key.code) {
                Some(Confirm::Yes) => {
                    app.state = AppState::Quitting;
                    return Ok(true);
                }
                Some(Confirm::No) => app.state = AppState::Normal,
                None => {}
            }
            return Ok(false);
        }
        AppState::ConfirmingLogout => {
            match confirm_answer(key.code) {
                Some(Confirm::Yes) => app.logout(),
                Some(Confirm::No) => app.state = AppState::Normal,
                None => {}
            }
            return Ok(false);
        }
        AppState::ConfirmingSave => {
            match confirm_answer(key.code) {
                Some(Confirm::Yes) => app.save_project().await,
                Some(Confirm::No) => app.state = AppState::EditingProject,
                None => {}
            }
            return Ok(false);
        }
        AppState::ConfirmingDeleteProject => {
            match confirm_answer(key.code) {
                Some(Confirm::Yes) => app.delete_selected_project().await,
                Some(Confirm::No) => app.state = AppState::Normal,
                None => {}
            }
            return Ok(false);
        }
        AppState::ConfirmingRegister => {
            match confirm_answer(key.code) {
                Some(Confirm::Yes) => app.register_user().await,
                Some(Confirm::No) => app.state = AppState::RegisteringUser,
                None => {}
            }
            return Ok(false);
        }
        AppState::ConfirmingRemoveUser => {
            match confirm_answer(key.code) {
                Some(Confirm::Yes) => app.remove_selected_user().await,
                Some(Confirm::No) => app.state = AppState::Normal,
                None => {}
            }
            return Ok(false);
        }
        AppState::ConfirmingChangeRole => {
            match confirm_answer(key.code) {
                Some(Confirm::Yes) => app.change_selected_user_role().await,
                Some(Confirm::No) => app.state = AppState::Normal,
                None => {}
            }
            return Ok(false);
        }
        AppState::Quitting => return Ok(true),
        AppState::Normal => {}
    }

    // Global keys
    match key.code {
        KeyCode::Char('q') => {
            app.state = AppState::ConfirmingQuit;
            return Ok(false);
        }
        KeyCode::Char('?') => {
            app.state = AppState::ShowingHelp;
            return Ok(false);
        }
        KeyCode::Char('1') => app.current_tab = Tab::Projects,
        KeyCode::Char('2') => app.open_access_tab().await,
        KeyCode::Char('3') => app.current_tab = Tab::Account,
        KeyCode::Left => {
            let tab = app.current_tab.prev();
            switch_tab(app, tab).await;
        }
        KeyCode::Right => {
            let tab = app.current_tab.next();
            switch_tab(app, tab).await;
        }
        KeyCode::Char('u') => {
            app.status_message = Some("Refreshing...".to_string());
            app.refresh_all().await;
            if app.status_message.as_deref() == Some("Refreshing...") {
                app.status_message = Some("Data updated".to_string());
            }
        }
        KeyCode::Char('L') => app.state = AppState::ConfirmingLogout,
        _ => match app.current_tab {
            Tab::Projects => handle_projects_input(app, key),
            Tab::Access => handle_access_input(app, key),
            Tab::Account => {
                if key.code == KeyCode::Char('p') {
                    app.start_change_password();
                }
            }
        },
    }

    Ok(false)
}

/// Tab switching goes through the access check when landing on Access.
async fn switch_tab(app: &mut App, tab: Tab) {
    if tab == Tab::Access {
        app.open_access_tab().await;
        if app.current_tab != Tab::Access {
            // Denied: skip over it
            app.current_tab = if app.current_tab == Tab::Projects {
                Tab::Account
            } else {
                Tab::Projects
            };
        }
    } else {
        app.current_tab = tab;
    }
}

fn handle_projects_input(app: &mut App, key: KeyEvent) {
    let len = app.filtered_projects().len();

    match key.code {
        KeyCode::Up | KeyCode::Char('k') => {
            app.project_selection = app.project_selection.saturating_sub(1);
        }
        KeyCode::Down | KeyCode::Char('j') => {
            if app.project_selection + 1 < len {
                app.project_selection += 1;
            }
        }
        KeyCode::PageUp => {
            app.project_selection = app.project_selection.saturating_sub(PAGE_SCROLL_SIZE);
        }
        KeyCode::PageDown => {
            app.project_selection =
                (app.project_selection + PAGE_SCROLL_SIZE).min(len.saturating_sub(1));
        }
        KeyCode::Home => app.project_selection = 0,
        KeyCode::End => app.project_selection = len.saturating_sub(1),
        KeyCode::Enter => app.show_project_detail = !app.show_project_detail,
        KeyCode::Char('/') => {
            app.state = AppState::Searching;
            app.search_query.clear();
            app.project_selection = 0;
        }
        KeyCode::Esc => {
            app.search_query.clear();
            app.show_project_detail = false;
            app.clamp_project_selection();
        }
        KeyCode::Char('n') => app.start_new_project(),
        KeyCode::Char('e') => app.start_edit_project(),
        KeyCode::Char('d') | KeyCode::Delete => {
            if app.selected_project().is_some() {
                app.state = AppState::ConfirmingDeleteProject;
            }
        }
        _ => {}
    }
}

fn handle_access_input(app: &mut App, key: KeyEvent) {
    if !app.can_manage_access {
        return;
    }
    let len = app.users.len();

    match key.code {
        KeyCode::Up | KeyCode::Char('k') => {
            app.user_selection = app.user_selection.saturating_sub(1);
        }
        KeyCode::Down | KeyCode::Char('j') => {
            if app.user_selection + 1 < len {
                app.user_selection += 1;
            }
        }
        KeyCode::Home => app.user_selection = 0,
        KeyCode::End => app.user_selection = len.saturating_sub(1),
        KeyCode::Char('n') => app.start_register(),
        KeyCode::Char('x') | KeyCode::Char('d') | KeyCode::Delete => {
            if app.selected_user().is_some() {
                app.state = AppState::ConfirmingRemoveUser;
            }
        }
        KeyCode::Char('r') => {
            if app.selected_user().is_some() {
                app.state = AppState::ConfirmingChangeRole;
            }
        }
        _ => {}
    }
}

fn handle_search_input(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => {
            app.state = AppState::Normal;
            app.search_query.clear();
        }
        KeyCode::Enter => {
            app.state = AppState::Normal;
            // Keep search query active
        }
        KeyCode::Backspace => {
            app.search_query.pop();
            app.project_selection = 0;
        }
        KeyCode::Char(c) if !c.is_control() => {
            app.search_query.push(c);
            // Reset selection when search changes
            app.project_selection = 0;
        }
        _ => {}
    }
}

async fn handle_login_input(app: &mut App, key: KeyEvent) -> Result<bool> {
    match key.code {
        KeyCode::Esc => {
            // Quit if on login screen
            app.state = AppState::Quitting;
            return Ok(true);
        }
        KeyCode::Down | KeyCode::Tab => app.login.next_focus(),
        KeyCode::Up | KeyCode::BackTab => app.login.prev_focus(),
        KeyCode::Enter => match app.login.focus {
            LoginFocus::Email => app.login.next_focus(),
            LoginFocus::Remember => app.login.remember = !app.login.remember,
            LoginFocus::Password | LoginFocus::Button => app.attempt_login().await,
        },
        KeyCode::Char(' ') if app.login.focus == LoginFocus::Remember => {
            app.login.remember = !app.login.remember;
        }
        code => {
            if let Some(input) = app.login.focused_input() {
                if edit_text(input, code) {
                    app.login.error = None;
                }
            }
        }
    }
    Ok(false)
}

fn handle_editor_input(app: &mut App, key: KeyEvent) {
    let Some(editor) = app.editor.as_mut() else {
        app.state = AppState::Normal;
        return;
    };

    if is_ctrl(&key, 's') {
        match validate_project_name(editor.name.as_str()) {
            Ok(()) => {
                editor.error = None;
                app.state = AppState::ConfirmingSave;
            }
            Err(e) => editor.error = Some(e.to_string()),
        }
        return;
    }
    if is_ctrl(&key, 't') {
        editor.toggle_attribute();
        return;
    }

    match key.code {
        KeyCode::Esc => {
            app.editor = None;
            app.state = AppState::Normal;
        }
        KeyCode::Tab | KeyCode::Down => editor.next_focus(),
        KeyCode::BackTab | KeyCode::Up => editor.prev_focus(),
        KeyCode::Enter => editor.next_focus(),
        code if editor.focused_field() == EditorField::ExistingImages => match code {
            KeyCode::Left => editor.select_prev_image(),
            KeyCode::Right => editor.select_next_image(),
            KeyCode::Char('x') | KeyCode::Delete => {
                editor.remove_selected_image();
            }
            _ => {}
        },
        code => {
            if let Some(input) = editor.focused_input() {
                edit_text(input, code);
            }
        }
    }
}

fn handle_register_input(app: &mut App, key: KeyEvent) {
    let form = &mut app.register;

    match key.code {
        KeyCode::Esc => {
            app.state = AppState::Normal;
            return;
        }
        KeyCode::Tab | KeyCode::Down => form.next_focus(),
        KeyCode::BackTab | KeyCode::Up => form.prev_focus(),
        KeyCode::Left | KeyCode::Right | KeyCode::Char(' ')
            if form.focus == RegisterFocus::Position =>
        {
            form.position = form.position.toggle();
        }
        KeyCode::Enter => match form.focus {
            RegisterFocus::Button => app.request_register(),
            _ => form.next_focus(),
        },
        code => {
            let editing_email = form.focus == RegisterFocus::Email;
            let changed = form
                .focused_input()
                .is_some_and(|input| edit_text(input, code));
            if changed {
                form.error = None;
                if editing_email {
                    form.email_edited(Instant::now());
                }
            }
        }
    }
}

async fn handle_password_input(app: &mut App, key: KeyEvent) {
    let form = &mut app.password;

    match key.code {
        KeyCode::Esc => app.state = AppState::Normal,
        KeyCode::Tab | KeyCode::Down => form.next_focus(),
        KeyCode::BackTab | KeyCode::Up => form.prev_focus(),
        KeyCode::Enter => match form.focus {
            PasswordFocus::Button | PasswordFocus::Confirm => app.change_password().await,
            _ => form.next_focus(),
        },
        code => {
            if form.focused_input().is_some_and(|input| edit_text(input, code)) {
                form.error = None;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edit_text() {
        let mut input = TextInput::new(5);
        assert!(edit_text(&mut input, KeyCode::Char('a')));
        assert!(edit_text(&mut input, KeyCode::Char('b')));
        assert!(!edit_text(&mut input, KeyCode::Tab));
        assert!(edit_text(&mut input, KeyCode::Backspace));
        assert_eq!(input.as_str(), "a");
        assert!(!edit_text(&mut input, KeyCode::Char('\u{7}')));
    }

    #[test]
    fn test_confirm_answer() {
        assert!(matches!(confirm_answer(KeyCode::Char('Y')), Some(Confirm::Yes)));
        assert!(matches!(confirm_answer(KeyCode::Esc), Some(Confirm::No)));
        assert!(confirm_answer(KeyCode::Char('q')).is_none());
    }

    #[test]
    fn test_is_ctrl() {
        let save = KeyEvent::new(KeyCode::Char('s'), KeyModifiers::CONTROL);
        let plain = KeyEvent::new(KeyCode::Char('s'), KeyModifiers::NONE);
        assert!(is_ctrl(&save, 's'));
        assert!(!is_ctrl(&plain, 's'));
    }
}
