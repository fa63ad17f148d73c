//! Application state management for the Husmah admin dashboard.
//!
//! This module contains the core `App` struct that owns the session manager,
//! the backend client, the loaded projects and users, and all form state.

use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use husmah_core::api::{ApiClient, ApiError};
use husmah_core::auth::{
    CredentialStore, FileStore, SessionEvent, SessionManager, SessionStore, SystemClock,
};
use husmah_core::config::Config;
use husmah_core::models::{
    ChangePasswordRequest, Position, Project, RegisterRequest, User, UserUpdate,
};
use husmah_core::upload::ImageUploader;
use husmah_core::utils::contains_ignore_case;
use husmah_core::validation::validate_login;

use crate::forms::{LoginFocus, LoginForm, PasswordForm, ProjectEditor, RegisterForm};

// ============================================================================
// Constants
// ============================================================================

/// Number of items to scroll on page up/down.
pub const PAGE_SCROLL_SIZE: usize = 10;

/// Environment variable that prefills the login email.
const EMAIL_ENV: &str = "HUSMAH_EMAIL";

/// Environment variable that prefills the login password.
const PASSWORD_ENV: &str = "HUSMAH_PASSWORD";

const SESSION_EXPIRED_MESSAGE: &str = "Your session has expired. Please log in again.";

const ACCESS_DENIED_MESSAGE: &str = "Access denied. Only superadmin users can manage access.";

// ============================================================================
// UI State Types
// ============================================================================

/// Main navigation tabs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    Projects,
    Access,
    Account,
}

impl Tab {
    pub fn title(&self) -> &'static str {
        match self {
            Tab::Projects => "Projects",
            Tab::Access => "Access",
            Tab::Account => "Account",
        }
    }

    pub fn next(&self) -> Self {
        match self {
            Tab::Projects => Tab::Access,
            Tab::Access => Tab::Account,
            Tab::Account => Tab::Projects,
        }
    }

    pub fn prev(&self) -> Self {
        match self {
            Tab::Projects => Tab::Account,
            Tab::Access => Tab::Projects,
            Tab::Account => Tab::Access,
        }
    }
}

/// Overall application state. Everything except `Normal`, `Searching` and
/// `Quitting` is an overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    Normal,
    Searching,
    ShowingHelp,
    LoggingIn,
    EditingProject,
    ConfirmingSave,
    ConfirmingDeleteProject,
    RegisteringUser,
    ConfirmingRegister,
    ConfirmingRemoveUser,
    ConfirmingChangeRole,
    ChangingPassword,
    ConfirmingLogout,
    ConfirmingQuit,
    Quitting,
}

/// Messages delivered to the main loop from outside the input path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    SessionExpired,
}

// ============================================================================
// Main Application Struct
// ============================================================================

pub struct App {
    // Core services
    pub config: Config,
    pub api: ApiClient,
    pub uploader: ImageUploader,
    pub session: SessionManager,

    // Signed-in identity (cached copy of the session store's)
    pub user: Option<User>,
    pub can_manage_access: bool,

    // UI State
    pub state: AppState,
    pub current_tab: Tab,
    pub search_query: String,
    pub status_message: Option<String>,
    pub show_project_detail: bool,

    // Forms
    pub login: LoginForm,
    pub register: RegisterForm,
    pub password: PasswordForm,
    pub editor: Option<ProjectEditor>,

    // Data
    pub projects: Vec<Project>,
    pub project_selection: usize,
    pub users: Vec<User>,
    pub user_selection: usize,

    // Session notifications from the expiry callback
    events_rx: mpsc::UnboundedReceiver<AppEvent>,
}

impl App {
    /// Create a new application instance
    pub fn new() -> Result<Self> {
        let config = match Config::load() {
            Ok(c) => c,
            Err(e) => {
                warn!(error = %e, "Failed to load config, using defaults");
                Config::default()
            }
        };

        let session_path = config
            .session_path()
            .unwrap_or_else(|_| PathBuf::from("./session.json"));
        debug!(?session_path, "Session file configured");

        let api = ApiClient::new(&config.api_base_url())?;
        let uploader = ImageUploader::new(&config.cloud_name())?;

        let (tx, rx) = mpsc::unbounded_channel();
        let store = SessionStore::new(FileStore::open(session_path), Arc::new(SystemClock));
        let session = SessionManager::new(store, move || {
            if tx.send(AppEvent::SessionExpired).is_err() {
                debug!("Session expired after the app shut down");
            }
        });

        let mut login = LoginForm::default();
        let email = std::env::var(EMAIL_ENV)
            .ok()
            .or_else(|| config.last_email.clone())
            .unwrap_or_default();
        let password = std::env::var(PASSWORD_ENV).ok().or_else(|| {
            if config.remember_me && !email.is_empty() {
                CredentialStore::get_password(&email).ok()
            } else {
                None
            }
        });
        login.email.value = email;
        login.password.value = password.unwrap_or_default();
        login.remember = config.remember_me;

        Ok(Self {
            config,
            api,
            uploader,
            session,
            user: None,
            can_manage_access: false,
            state: AppState::Normal,
            current_tab: Tab::Projects,
            search_query: String::new(),
            status_message: None,
            show_project_detail: false,
            login,
            register: RegisterForm::default(),
            password: PasswordForm::default(),
            editor: None,
            projects: Vec::new(),
            project_selection: 0,
            users: Vec::new(),
            user_selection: 0,
            events_rx: rx,
        })
    }

    // =========================================================================
    // Session lifecycle
    // =========================================================================

    pub fn is_authenticated(&self) -> bool {
        self.user.is_some() && self.session.is_valid()
    }

    /// Resume a session saved by an earlier run, or show the login form.
    pub async fn resume_session(&mut self) {
        match self.session.restore() {
            Some(user) => self.enter_dashboard(user).await,
            None => self.start_login(),
        }
    }

    /// Show the login overlay
    pub fn start_login(&mut self) {
        self.state = AppState::LoggingIn;
        self.login.focus = if self.login.email.as_str().is_empty() {
            LoginFocus::Email
        } else {
            LoginFocus::Password
        };
    }

    /// Attempt login with the credentials from the login form
    pub async fn attempt_login(&mut self) {
        if let Err(e) = self.login.validate() {
            self.login.error = Some(e.to_string());
            return;
        }
        self.login.error = None;

        let email = self.login.email.as_str().trim().to_string();
        let password = self.login.password.value.clone();

        match self.api.login(&email, &password).await {
            Ok(user) => {
                self.remember_login(&email, &password);
                self.session.login(&user);
                self.login.password.clear();
                self.enter_dashboard(user).await;
            }
            Err(e) => {
                error!(error = %e, "Login failed");
                self.login.error = Some(login_error_message(&e));
            }
        }
    }

    /// Persist or forget the "remember me" details after a successful login.
    fn remember_login(&mut self, email: &str, password: &str) {
        self.config.last_email = Some(email.to_string());
        self.config.remember_me = self.login.remember;
        if self.login.remember {
            if let Err(e) = CredentialStore::store(email, password) {
                warn!(error = %e, "Failed to store credentials");
            }
        } else if CredentialStore::has_credentials(email) {
            if let Err(e) = CredentialStore::delete(email) {
                warn!(error = %e, "Failed to forget credentials");
            }
        }
        if let Err(e) = self.config.save() {
            warn!(error = %e, "Failed to save config");
        }
    }

    /// Log in from the command line before the TUI starts (`--login`).
    pub async fn login_interactive(&mut self) -> Result<()> {
        let email = match self.config.last_email.clone() {
            Some(last) => {
                print!("Email [{}]: ", last);
                io::stdout().flush()?;
                let input = Self::read_line()?;
                if input.is_empty() { last } else { input }
            }
            None => {
                print!("Email: ");
                io::stdout().flush()?;
                Self::read_line()?
            }
        };

        let password = if CredentialStore::has_credentials(&email) {
            print!("Use stored password? [Y/n]: ");
            io::stdout().flush()?;
            if Self::read_line()?.to_lowercase() != "n" {
                CredentialStore::get_password(&email)?
            } else {
                rpassword::prompt_password("Password: ")?
            }
        } else {
            rpassword::prompt_password("Password: ")?
        };
        validate_login(&email, &password)?;

        println!("\nAuthenticating...");

        let user = self
            .api
            .login(&email, &password)
            .await
            .map_err(|e| anyhow::anyhow!(login_error_message(&e)))?;

        self.login.remember = true;
        self.remember_login(&email, &password);
        self.session.login(&user);

        println!("Signed in as {} ({})\n", user.display_name(), user.position.display_name());
        Ok(())
    }

    /// Drop the saved session and any stored password (`--logout`).
    pub fn forget_login(&mut self) {
        self.session.logout();
        if let Some(email) = self.config.last_email.clone() {
            if CredentialStore::has_credentials(&email) {
                if let Err(e) = CredentialStore::delete(&email) {
                    warn!(error = %e, "Failed to forget credentials");
                }
            }
        }
        self.config.remember_me = false;
        if let Err(e) = self.config.save() {
            warn!(error = %e, "Failed to save config");
        }
    }

    fn read_line() -> Result<String> {
        let mut input = String::new();
        io::stdin().read_line(&mut input)?;
        Ok(input.trim().to_string())
    }

    async fn enter_dashboard(&mut self, user: User) {
        info!(email = %user.email, position = %user.position, "Entering dashboard");
        self.can_manage_access = user.is_superadmin();
        self.user = Some(user);
        self.session.start_monitoring();
        self.state = AppState::Normal;
        self.current_tab = Tab::Projects;
        self.refresh_all().await;
    }

    /// Sign out on request
    pub fn logout(&mut self) {
        self.session.stop_monitoring();
        self.session.logout();
        self.leave_dashboard();
        self.login.error = None;
        self.start_login();
    }

    fn leave_dashboard(&mut self) {
        self.user = None;
        self.can_manage_access = false;
        self.projects.clear();
        self.users.clear();
        self.project_selection = 0;
        self.user_selection = 0;
        self.editor = None;
        self.register = RegisterForm::default();
        self.password = PasswordForm::default();
        self.search_query.clear();
        self.show_project_detail = false;
        self.status_message = None;
    }

    fn on_session_expired(&mut self) {
        if self.user.is_none() {
            return;
        }
        warn!("Session expired");
        self.session.stop_monitoring();
        self.leave_dashboard();
        self.login.error = Some(SESSION_EXPIRED_MESSAGE.to_string());
        self.start_login();
    }

    /// React to what `SessionManager::poll` reported.
    pub fn on_session_event(&mut self, event: SessionEvent) {
        match event {
            SessionEvent::Renewed => {
                self.status_message = Some("Session extended for 30 minutes".to_string());
            }
            SessionEvent::RenewalDeclined => {
                if let Some(expires_at) = self.session_expires_at() {
                    self.status_message = Some(format!(
                        "Session will expire at {}",
                        expires_at.with_timezone(&chrono::Local).format("%H:%M")
                    ));
                }
            }
            // Delivered through the expiry callback
            SessionEvent::Expired => {}
        }
    }

    /// Drain notifications queued by the expiry callback.
    pub fn check_background_tasks(&mut self) {
        while let Ok(event) = self.events_rx.try_recv() {
            match event {
                AppEvent::SessionExpired => self.on_session_expired(),
            }
        }
    }

    /// Periodic work driven by the main loop.
    pub async fn tick(&mut self) {
        if let Some(email) = self.register.take_due_email_check(Instant::now()) {
            debug!(email = %email, "Checking email availability");
            let taken = match self.api.email_exists(&email).await {
                Ok(taken) => Some(taken),
                Err(e) => {
                    debug!(error = %e, "Email availability check failed");
                    None
                }
            };
            self.register.email_checked(&email, taken);
        }
    }

    pub fn session_expires_at(&self) -> Option<DateTime<Utc>> {
        self.session.store().started_at().map(|started| {
            started + chrono::Duration::milliseconds(husmah_core::auth::session::SESSION_TIMEOUT_MS)
        })
    }

    // =========================================================================
    // Data refresh
    // =========================================================================

    /// Reload projects and, for superadmins, the user list. The projects and
    /// the position re-check are fetched in parallel.
    pub async fn refresh_all(&mut self) {
        let Some(email) = self.user.as_ref().map(|u| u.email.clone()) else {
            return;
        };

        let (projects, fresh_user) =
            tokio::join!(self.api.list_projects(), self.api.get_user(&email));

        match projects {
            Ok(projects) => self.set_projects(projects),
            Err(e) => {
                error!(error = %e, "Project fetch failed");
                self.status_message = Some(format!("Failed to load projects: {}", e));
            }
        }

        self.apply_position_check(fresh_user.map_err(|e| e.to_string()));
        if self.can_manage_access {
            self.refresh_users().await;
        }
    }

    pub async fn refresh_projects(&mut self) {
        match self.api.list_projects().await {
            Ok(projects) => {
                self.set_projects(projects);
                self.status_message = Some("Projects updated".to_string());
            }
            Err(e) => {
                error!(error = %e, "Project fetch failed");
                self.status_message = Some(format!("Failed to load projects: {}", e));
            }
        }
    }

    fn set_projects(&mut self, projects: Vec<Project>) {
        debug!(count = projects.len(), "Projects loaded");
        self.projects = projects;
        self.clamp_project_selection();
    }

    pub fn clamp_project_selection(&mut self) {
        let visible = self.filtered_projects().len();
        if self.project_selection >= visible {
            self.project_selection = visible.saturating_sub(1);
        }
    }

    pub async fn refresh_users(&mut self) {
        match self.api.list_users().await {
            Ok(users) => self.set_users(users),
            Err(e) => {
                error!(error = %e, "User fetch failed");
                self.status_message = Some(format!("Failed to load users: {}", e));
            }
        }
    }

    /// Store the user list without the signed-in account.
    fn set_users(&mut self, users: Vec<User>) {
        let own_email = self.user.as_ref().map(|u| u.email.to_lowercase());
        self.users = users
            .into_iter()
            .filter(|u| Some(u.email.to_lowercase()) != own_email)
            .collect();
        if self.user_selection >= self.users.len() {
            self.user_selection = self.users.len().saturating_sub(1);
        }
    }

    /// Use the backend's current view of our position when it answered,
    /// otherwise keep the cached one.
    fn apply_position_check(&mut self, fresh: std::result::Result<Option<User>, String>) {
        let cached = self.user.as_ref().map(|u| u.position.clone());
        let position = match fresh {
            Ok(Some(user)) => Some(user.position),
            Ok(None) => cached,
            Err(e) => {
                debug!(error = %e, "Position check failed, using cached position");
                cached
            }
        };
        self.can_manage_access = position.as_ref().is_some_and(Position::is_superadmin);
    }

    /// Switch to the access tab after re-checking the position.
    pub async fn open_access_tab(&mut self) {
        let Some(email) = self.user.as_ref().map(|u| u.email.clone()) else {
            return;
        };
        let fresh = self.api.get_user(&email).await.map_err(|e| e.to_string());
        self.apply_position_check(fresh);

        if self.can_manage_access {
            self.current_tab = Tab::Access;
            self.refresh_users().await;
        } else {
            self.status_message = Some(ACCESS_DENIED_MESSAGE.to_string());
        }
    }

    // =========================================================================
    // Projects
    // =========================================================================

    /// Projects matching the search query, in backend order
    pub fn filtered_projects(&self) -> Vec<&Project> {
        self.projects
            .iter()
            .filter(|p| {
                contains_ignore_case(&p.name, &self.search_query)
                    || contains_ignore_case(&p.status, &self.search_query)
            })
            .collect()
    }

    pub fn selected_project(&self) -> Option<&Project> {
        self.filtered_projects().get(self.project_selection).copied()
    }

    pub fn start_new_project(&mut self) {
        self.editor = Some(ProjectEditor::new());
        self.state = AppState::EditingProject;
    }

    pub fn start_edit_project(&mut self) {
        if let Some(project) = self.selected_project() {
            self.editor = Some(ProjectEditor::for_project(project));
            self.state = AppState::EditingProject;
        }
    }

    /// Upload any picked images, then create or update the project.
    pub async fn save_project(&mut self) {
        let Some(editor) = self.editor.as_mut() else {
            self.state = AppState::Normal;
            return;
        };

        let mut submission = match editor.submission() {
            Ok(submission) => submission,
            Err(message) => {
                editor.error = Some(message);
                self.state = AppState::EditingProject;
                return;
            }
        };
        self.status_message = Some("Saving project...".to_string());

        let upload = self
            .uploader
            .upload_images(
                &mut submission.draft,
                submission.main_image.as_ref(),
                &submission.additional_images,
            )
            .await;
        if let Err(e) = upload {
            error!(error = %e, "Image upload failed");
            editor.error = Some(e.to_string());
            self.state = AppState::EditingProject;
            return;
        }

        let result = match editor.project_id.as_deref() {
            Some(id) => self.api.update_project(id, &submission.draft).await,
            None => self.api.create_project(&submission.draft).await,
        };

        match result {
            Ok(()) => {
                let verb = if editor.is_new() { "created" } else { "updated" };
                info!(name = %submission.draft.name, verb, "Project saved");
                self.editor = None;
                self.state = AppState::Normal;
                self.refresh_projects().await;
                self.status_message = Some(format!("Project {} successfully", verb));
            }
            Err(e) => {
                error!(error = %e, "Project save failed");
                editor.error = Some(format!("Failed to save project: {}", e));
                self.state = AppState::EditingProject;
            }
        }
    }

    pub async fn delete_selected_project(&mut self) {
        self.state = AppState::Normal;
        let Some((id, name)) = self
            .selected_project()
            .and_then(|p| p.key().map(|id| (id.to_string(), p.name.clone())))
        else {
            self.status_message = Some("Project has no id; cannot delete".to_string());
            return;
        };

        match self.api.delete_project(&id).await {
            Ok(()) => {
                info!(id = %id, "Project deleted");
                self.projects.retain(|p| p.key() != Some(id.as_str()));
                self.clamp_project_selection();
                self.show_project_detail = false;
                self.status_message = Some(format!("Deleted \"{}\"", name));
            }
            Err(e) => {
                error!(error = %e, "Project delete failed");
                self.status_message = Some(format!("Failed to delete project: {}", e));
            }
        }
    }

    // =========================================================================
    // Access management
    // =========================================================================

    pub fn selected_user(&self) -> Option<&User> {
        self.users.get(self.user_selection)
    }

    pub fn start_register(&mut self) {
        self.register = RegisterForm::default();
        self.state = AppState::RegisteringUser;
    }

    /// Validate the registration form and ask for confirmation.
    pub fn request_register(&mut self) {
        match self.register.validate() {
            Ok(()) => {
                self.register.error = None;
                self.state = AppState::ConfirmingRegister;
            }
            Err(message) => self.register.error = Some(message),
        }
    }

    pub async fn register_user(&mut self) {
        let request = RegisterRequest {
            email: self.register.email.as_str().trim().to_string(),
            password: self.register.password.value.clone(),
            name: self.register.name.as_str().trim().to_string(),
            position: self.register.position.clone(),
        };

        match self.api.register_user(&request).await {
            Ok(()) => {
                info!(email = %request.email, "User registered");
                self.register = RegisterForm::default();
                self.state = AppState::Normal;
                self.status_message = Some(format!("Access granted to {}", request.email));
                self.refresh_users().await;
            }
            Err(e) => {
                error!(error = %e, "Registration failed");
                self.register.error = Some(e.to_string());
                self.state = AppState::RegisteringUser;
            }
        }
    }

    pub async fn remove_selected_user(&mut self) {
        self.state = AppState::Normal;
        let Some(email) = self.selected_user().map(|u| u.email.clone()) else {
            return;
        };

        match self.api.delete_user(&email).await {
            Ok(()) => {
                info!(email = %email, "User removed");
                self.status_message = Some(format!("Removed access for {}", email));
                self.refresh_users().await;
            }
            Err(e) => {
                error!(error = %e, "User removal failed");
                self.status_message = Some("Failed to remove user. Please try again.".to_string());
            }
        }
    }

    /// Switch the selected user between admin and superadmin. Your own role
    /// is left alone so a superadmin cannot lock themselves out.
    pub async fn change_selected_user_role(&mut self) {
        self.state = AppState::Normal;
        let Some(user) = self.selected_user().cloned() else {
            return;
        };
        if self.user.as_ref().is_some_and(|me| me.email == user.email) {
            self.status_message = Some("You cannot change your own role.".to_string());
            return;
        }

        let update = role_change(&user);
        match self.api.update_user(&user.email, &update).await {
            Ok(()) => {
                let position = user.position.toggle();
                info!(email = %user.email, position = position.as_str(), "User role changed");
                self.status_message = Some(format!(
                    "{} is now {}",
                    user.display_name(),
                    position.display_name()
                ));
                self.refresh_users().await;
            }
            Err(e) => {
                error!(error = %e, "Role change failed");
                self.status_message = Some("Failed to change role. Please try again.".to_string());
            }
        }
    }

    // =========================================================================
    // Account
    // =========================================================================

    pub fn start_change_password(&mut self) {
        self.password = PasswordForm::default();
        self.state = AppState::ChangingPassword;
    }

    pub async fn change_password(&mut self) {
        let email = self.user.as_ref().map(|u| u.email.clone()).unwrap_or_default();
        if let Err(e) = self.password.validate(&email) {
            self.password.error = Some(e.to_string());
            return;
        }

        let request = ChangePasswordRequest {
            email: email.clone(),
            old_password: self.password.current.value.clone(),
            new_password: self.password.new.value.clone(),
        };

        match self.api.change_password(&request).await {
            Ok(()) => {
                info!(email = %email, "Password changed");
                if self.config.remember_me && CredentialStore::has_credentials(&email) {
                    if let Err(e) = CredentialStore::store(&email, &request.new_password) {
                        warn!(error = %e, "Failed to update stored credentials");
                    }
                }
                self.password = PasswordForm::default();
                self.state = AppState::Normal;
                self.status_message = Some("Password changed successfully".to_string());
            }
            Err(e) => {
                error!(error = %e, "Password change failed");
                self.password.error = Some(e.to_string());
            }
        }
    }
}

/// Turn a login failure into one line for the login form.
fn login_error_message(err: &anyhow::Error) -> String {
    match err.downcast_ref::<ApiError>() {
        Some(ApiError::Rejected(message)) => message.clone(),
        Some(ApiError::NetworkError(e)) if e.is_timeout() => {
            "Connection timed out. Please try again.".to_string()
        }
        Some(ApiError::NetworkError(_)) => {
            "Unable to connect to server. Check your internet connection.".to_string()
        }
        Some(ApiError::RateLimited) => "Too many attempts. Please wait and try again.".to_string(),
        _ => format!("Login failed: {}", err),
    }
}

/// The partial update that flips `user` to the other assignable position
fn role_change(user: &User) -> UserUpdate {
    UserUpdate {
        position: Some(user.position.toggle()),
        ..Default::default()
    }
}

// ============================================================================
// Tests
// ============================================================================
