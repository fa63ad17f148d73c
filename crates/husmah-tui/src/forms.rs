//! Form state for the login, registration, change-password and project
//! editor dialogs.
//!
//! Everything here is plain data plus the rules for moving focus and turning
//! input into requests, so it can be tested without a terminal.

use std::path::Path;
use std::time::{Duration, Instant};

use husmah_core::models::{Attribute, Position, Project, ProjectDraft};
use husmah_core::upload::{ImageFile, UploadError};
use husmah_core::validation::{self, ValidationError};

// ============================================================================
// Constants
// ============================================================================

/// Maximum length for email input.
const MAX_EMAIL_LENGTH: usize = 254;

/// Maximum length for password input.
/// 128 chars accommodates password managers and passphrases.
const MAX_PASSWORD_LENGTH: usize = 128;

/// Maximum length for single-line text fields.
const MAX_TEXT_LENGTH: usize = 200;

/// Maximum length for free-text fields (description, feedback).
const MAX_LONG_TEXT_LENGTH: usize = 2000;

/// Maximum length for image path lists.
const MAX_PATHS_LENGTH: usize = 4096;

/// Quiet period after the last keystroke before the email is checked.
pub const EMAIL_CHECK_DEBOUNCE: Duration = Duration::from_millis(800);

/// Separator between paths in the "add images" field.
const PATH_SEPARATOR: char = ';';

// ============================================================================
// Text input
// ============================================================================

/// A single-line text buffer with a length cap.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TextInput {
    pub value: String,
    max_len: usize,
}

impl TextInput {
    pub fn new(max_len: usize) -> Self {
        Self {
            value: String::new(),
            max_len,
        }
    }

    pub fn with_value(max_len: usize, value: &str) -> Self {
        let mut input = Self::new(max_len);
        input.value = value.chars().take(max_len).collect();
        input
    }

    /// Append a character. Control characters and input past the cap are
    /// ignored; returns whether the value changed.
    pub fn push(&mut self, c: char) -> bool {
        if c.is_control() || self.value.chars().count() >= self.max_len {
            return false;
        }
        self.value.push(c);
        true
    }

    pub fn pop(&mut self) -> bool {
        self.value.pop().is_some()
    }

    pub fn clear(&mut self) {
        self.value.clear();
    }

    pub fn masked(&self) -> String {
        "*".repeat(self.value.chars().count())
    }

    pub fn as_str(&self) -> &str {
        &self.value
    }
}

// ============================================================================
// Login
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginFocus {
    Email,
    Password,
    Remember,
    Button,
}

#[derive(Debug, Clone)]
pub struct LoginForm {
    pub email: TextInput,
    pub password: TextInput,
    pub remember: bool,
    pub focus: LoginFocus,
    pub error: Option<String>,
}

impl Default for LoginForm {
    fn default() -> Self {
        Self {
            email: TextInput::new(MAX_EMAIL_LENGTH),
            password: TextInput::new(MAX_PASSWORD_LENGTH),
            remember: false,
            focus: LoginFocus::Email,
            error: None,
        }
    }
}

impl LoginForm {
    pub fn next_focus(&mut self) {
        self.focus = match self.focus {
            LoginFocus::Email => LoginFocus::Password,
            LoginFocus::Password => LoginFocus::Remember,
            LoginFocus::Remember => LoginFocus::Button,
            LoginFocus::Button => LoginFocus::Email,
        };
    }

    pub fn prev_focus(&mut self) {
        self.focus = match self.focus {
            LoginFocus::Email => LoginFocus::Button,
            LoginFocus::Password => LoginFocus::Email,
            LoginFocus::Remember => LoginFocus::Password,
            LoginFocus::Button => LoginFocus::Remember,
        };
    }

    pub fn focused_input(&mut self) -> Option<&mut TextInput> {
        match self.focus {
            LoginFocus::Email => Some(&mut self.email),
            LoginFocus::Password => Some(&mut self.password),
            _ => None,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        validation::validate_login(self.email.as_str().trim(), self.password.as_str())
    }
}

// ============================================================================
// Registration
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegisterFocus {
    Name,
    Email,
    Password,
    Confirm,
    Position,
    Button,
}

/// Result of the debounced "is this email taken" lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmailStatus {
    Unknown,
    Checking,
    Available,
    Taken,
}

impl EmailStatus {
    pub fn message(&self) -> Option<&'static str> {
        match self {
            EmailStatus::Unknown => None,
            EmailStatus::Checking => Some("Checking email..."),
            EmailStatus::Available => Some("Email is available"),
            EmailStatus::Taken => Some(
                "This email is already registered. Please use a different email address.",
            ),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RegisterForm {
    pub name: TextInput,
    pub email: TextInput,
    pub password: TextInput,
    pub confirm: TextInput,
    pub position: Position,
    pub focus: RegisterFocus,
    pub error: Option<String>,
    pub email_status: EmailStatus,
    email_edited_at: Option<Instant>,
}

impl Default for RegisterForm {
    fn default() -> Self {
        Self {
            name: TextInput::new(MAX_TEXT_LENGTH),
            email: TextInput::new(MAX_EMAIL_LENGTH),
            password: TextInput::new(MAX_PASSWORD_LENGTH),
            confirm: TextInput::new(MAX_PASSWORD_LENGTH),
            position: Position::Admin,
            focus: RegisterFocus::Name,
            error: None,
            email_status: EmailStatus::Unknown,
            email_edited_at: None,
        }
    }
}

impl RegisterForm {
    pub fn next_focus(&mut self) {
        self.focus = match self.focus {
            RegisterFocus::Name => RegisterFocus::Email,
            RegisterFocus::Email => RegisterFocus::Password,
            RegisterFocus::Password => RegisterFocus::Confirm,
            RegisterFocus::Confirm => RegisterFocus::Position,
            RegisterFocus::Position => RegisterFocus::Button,
            RegisterFocus::Button => RegisterFocus::Name,
        };
    }

    pub fn prev_focus(&mut self) {
        self.focus = match self.focus {
            RegisterFocus::Name => RegisterFocus::Button,
            RegisterFocus::Email => RegisterFocus::Name,
            RegisterFocus::Password => RegisterFocus::Email,
            RegisterFocus::Confirm => RegisterFocus::Password,
            RegisterFocus::Position => RegisterFocus::Confirm,
            RegisterFocus::Button => RegisterFocus::Position,
        };
    }

    pub fn focused_input(&mut self) -> Option<&mut TextInput> {
        match self.focus {
            RegisterFocus::Name => Some(&mut self.name),
            RegisterFocus::Email => Some(&mut self.email),
            RegisterFocus::Password => Some(&mut self.password),
            RegisterFocus::Confirm => Some(&mut self.confirm),
            _ => None,
        }
    }

    /// Record an edit to the email field; restarts the debounce window.
    pub fn email_edited(&mut self, now: Instant) {
        self.email_status = EmailStatus::Unknown;
        self.email_edited_at = Some(now);
    }

    /// The email to look up, once the debounce window has passed. Malformed
    /// emails are never looked up. Taking it consumes the pending edit.
    pub fn take_due_email_check(&mut self, now: Instant) -> Option<String> {
        let edited_at = self.email_edited_at?;
        if now.duration_since(edited_at) < EMAIL_CHECK_DEBOUNCE {
            return None;
        }
        self.email_edited_at = None;

        let email = self.email.as_str().trim();
        if !validation::is_email(email) {
            return None;
        }
        self.email_status = EmailStatus::Checking;
        Some(email.to_string())
    }

    /// Apply a lookup result, ignoring it if the email changed meanwhile.
    pub fn email_checked(&mut self, email: &str, taken: Option<bool>) {
        if self.email.as_str().trim() != email {
            return;
        }
        self.email_status = match taken {
            Some(true) => EmailStatus::Taken,
            Some(false) => EmailStatus::Available,
            None => EmailStatus::Unknown,
        };
    }

    pub fn validate(&self) -> Result<(), String> {
        validation::validate_registration(
            self.name.as_str(),
            self.email.as_str(),
            self.password.as_str(),
            self.confirm.as_str(),
        )
        .map_err(|e| e.to_string())?;
        if self.email_status == EmailStatus::Taken {
            return Err(EmailStatus::Taken.message().unwrap_or_default().to_string());
        }
        Ok(())
    }
}

// ============================================================================
// Change password
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PasswordFocus {
    Current,
    New,
    Confirm,
    Button,
}

#[derive(Debug, Clone)]
pub struct PasswordForm {
    pub current: TextInput,
    pub new: TextInput,
    pub confirm: TextInput,
    pub focus: PasswordFocus,
    pub error: Option<String>,
}

impl Default for PasswordForm {
    fn default() -> Self {
        Self {
            current: TextInput::new(MAX_PASSWORD_LENGTH),
            new: TextInput::new(MAX_PASSWORD_LENGTH),
            confirm: TextInput::new(MAX_PASSWORD_LENGTH),
            focus: PasswordFocus::Current,
            error: None,
        }
    }
}

impl PasswordForm {
    pub fn next_focus(&mut self) {
        self.focus = match self.focus {
            PasswordFocus::Current => PasswordFocus::New,
            PasswordFocus::New => PasswordFocus::Confirm,
            PasswordFocus::Confirm => PasswordFocus::Button,
            PasswordFocus::Button => PasswordFocus::Current,
        };
    }

    pub fn prev_focus(&mut self) {
        self.focus = match self.focus {
            PasswordFocus::Current => PasswordFocus::Button,
            PasswordFocus::New => PasswordFocus::Current,
            PasswordFocus::Confirm => PasswordFocus::New,
            PasswordFocus::Button => PasswordFocus::Confirm,
        };
    }

    pub fn focused_input(&mut self) -> Option<&mut TextInput> {
        match self.focus {
            PasswordFocus::Current => Some(&mut self.current),
            PasswordFocus::New => Some(&mut self.new),
            PasswordFocus::Confirm => Some(&mut self.confirm),
            PasswordFocus::Button => None,
        }
    }

    pub fn validate(&self, session_email: &str) -> Result<(), ValidationError> {
        validation::validate_password_change(
            session_email,
            self.current.as_str(),
            self.new.as_str(),
            self.confirm.as_str(),
        )
    }
}

// ============================================================================
// Project editor
// ============================================================================

/// Fields of the project editor, in focus order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorField {
    Name,
    Description,
    Status,
    Feedback,
    Attribute(Attribute),
    ExistingImages,
    MainImage,
    NewImages,
}

impl EditorField {
    pub const ORDER: [EditorField; 11] = [
        EditorField::Name,
        EditorField::Description,
        EditorField::Status,
        EditorField::Feedback,
        EditorField::Attribute(Attribute::Area),
        EditorField::Attribute(Attribute::Flow),
        EditorField::Attribute(Attribute::Bedrooms),
        EditorField::Attribute(Attribute::Bathrooms),
        EditorField::ExistingImages,
        EditorField::MainImage,
        EditorField::NewImages,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            EditorField::Name => "Name",
            EditorField::Description => "Description",
            EditorField::Status => "Status",
            EditorField::Feedback => "Feedback",
            EditorField::Attribute(attribute) => attribute.label(),
            EditorField::ExistingImages => "Images",
            EditorField::MainImage => "New main image",
            EditorField::NewImages => "Add images",
        }
    }
}

/// One optional attribute: its text and whether it is switched on.
#[derive(Debug, Clone)]
pub struct AttributeInput {
    pub attribute: Attribute,
    pub input: TextInput,
    pub enabled: bool,
}

/// What the editor hands to the uploader and the API on save.
#[derive(Debug)]
pub struct EditorSubmission {
    pub draft: ProjectDraft,
    pub main_image: Option<ImageFile>,
    pub additional_images: Vec<ImageFile>,
}

#[derive(Debug, Clone)]
pub struct ProjectEditor {
    /// `None` when creating a new project
    pub project_id: Option<String>,
    pub name: TextInput,
    pub description: TextInput,
    pub status: TextInput,
    pub feedback: TextInput,
    pub attributes: Vec<AttributeInput>,
    pub main_image: String,
    pub existing_images: Vec<String>,
    pub image_selection: usize,
    pub main_image_path: TextInput,
    pub new_image_paths: TextInput,
    pub focus: usize,
    pub error: Option<String>,
}

impl ProjectEditor {
    pub fn new() -> Self {
        Self::from_draft(None, &ProjectDraft::default())
    }

    pub fn for_project(project: &Project) -> Self {
        Self::from_draft(project.key().map(str::to_string), &project.to_draft())
    }

    fn from_draft(project_id: Option<String>, draft: &ProjectDraft) -> Self {
        let attributes = Attribute::ALL
            .iter()
            .map(|&attribute| {
                let enabled = attribute.is_set(draft);
                let text = if enabled {
                    attribute.value_text(draft)
                } else {
                    String::new()
                };
                AttributeInput {
                    attribute,
                    input: TextInput::with_value(MAX_TEXT_LENGTH, &text),
                    enabled,
                }
            })
            .collect();

        Self {
            project_id,
            name: TextInput::with_value(MAX_TEXT_LENGTH, &draft.name),
            description: TextInput::with_value(MAX_LONG_TEXT_LENGTH, &draft.description),
            status: TextInput::with_value(MAX_TEXT_LENGTH, &draft.status),
            feedback: TextInput::with_value(MAX_LONG_TEXT_LENGTH, &draft.customer_feedback),
            attributes,
            main_image: draft.main_image.clone(),
            existing_images: draft.all_images.clone(),
            image_selection: 0,
            main_image_path: TextInput::new(MAX_PATHS_LENGTH),
            new_image_paths: TextInput::new(MAX_PATHS_LENGTH),
            focus: 0,
            error: None,
        }
    }

    pub fn is_new(&self) -> bool {
        self.project_id.is_none()
    }

    pub fn focused_field(&self) -> EditorField {
        EditorField::ORDER[self.focus % EditorField::ORDER.len()]
    }

    pub fn next_focus(&mut self) {
        self.focus = (self.focus + 1) % EditorField::ORDER.len();
    }

    pub fn prev_focus(&mut self) {
        self.focus = (self.focus + EditorField::ORDER.len() - 1) % EditorField::ORDER.len();
    }

    pub fn attribute(&self, attribute: Attribute) -> Option<&AttributeInput> {
        self.attributes.iter().find(|a| a.attribute == attribute)
    }

    fn attribute_mut(&mut self, attribute: Attribute) -> Option<&mut AttributeInput> {
        self.attributes.iter_mut().find(|a| a.attribute == attribute)
    }

    /// The text buffer behind the focused field, if it has one. Disabled
    /// attributes do not take input.
    pub fn focused_input(&mut self) -> Option<&mut TextInput> {
        match self.focused_field() {
            EditorField::Name => Some(&mut self.name),
            EditorField::Description => Some(&mut self.description),
            EditorField::Status => Some(&mut self.status),
            EditorField::Feedback => Some(&mut self.feedback),
            EditorField::Attribute(attribute) => self
                .attribute_mut(attribute)
                .filter(|a| a.enabled)
                .map(|a| &mut a.input),
            EditorField::ExistingImages => None,
            EditorField::MainImage => Some(&mut self.main_image_path),
            EditorField::NewImages => Some(&mut self.new_image_paths),
        }
    }

    /// Switch the focused attribute on or off. Returns false when the focus
    /// is not on an attribute.
    pub fn toggle_attribute(&mut self) -> bool {
        let EditorField::Attribute(attribute) = self.focused_field() else {
            return false;
        };
        match self.attribute_mut(attribute) {
            Some(entry) => {
                entry.enabled = !entry.enabled;
                true
            }
            None => false,
        }
    }

    pub fn select_next_image(&mut self) {
        if !self.existing_images.is_empty() {
            self.image_selection = (self.image_selection + 1) % self.existing_images.len();
        }
    }

    pub fn select_prev_image(&mut self) {
        if !self.existing_images.is_empty() {
            let len = self.existing_images.len();
            self.image_selection = (self.image_selection + len - 1) % len;
        }
    }

    /// Drop the selected image from `allImages`.
    pub fn remove_selected_image(&mut self) -> Option<String> {
        if self.image_selection >= self.existing_images.len() {
            return None;
        }
        let removed = self.existing_images.remove(self.image_selection);
        if self.image_selection >= self.existing_images.len() {
            self.image_selection = self.existing_images.len().saturating_sub(1);
        }
        Some(removed)
    }

    /// Paths listed in the "add images" field, in the order typed.
    pub fn new_image_paths(&self) -> Vec<&str> {
        self.new_image_paths
            .as_str()
            .split(PATH_SEPARATOR)
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .collect()
    }

    /// Validate the form and load any picked image files.
    pub fn submission(&self) -> Result<EditorSubmission, String> {
        validation::validate_project_name(self.name.as_str()).map_err(|e| e.to_string())?;

        let mut draft = ProjectDraft {
            name: self.name.as_str().trim().to_string(),
            description: self.description.as_str().trim().to_string(),
            status: self.status.as_str().trim().to_string(),
            main_image: self.main_image.clone(),
            all_images: self.existing_images.clone(),
            customer_feedback: self.feedback.as_str().trim().to_string(),
            ..Default::default()
        };
        for entry in &self.attributes {
            if entry.enabled {
                entry
                    .attribute
                    .apply(&mut draft, entry.input.as_str())
                    .map_err(|e| e.to_string())?;
            } else {
                entry.attribute.clear(&mut draft);
            }
        }

        let main_path = self.main_image_path.as_str().trim();
        let main_image = if main_path.is_empty() {
            None
        } else {
            Some(
                ImageFile::from_path(Path::new(main_path))
                    .map_err(|e| UploadError::MainImage(Box::new(e)).to_string())?,
            )
        };

        let additional_images = self
            .new_image_paths()
            .into_iter()
            .map(|p| ImageFile::from_path(Path::new(p)))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| UploadError::AdditionalImages(Box::new(e)).to_string())?;

        Ok(EditorSubmission {
            draft,
            main_image,
            additional_images,
        })
    }
}

impl Default for ProjectEditor {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_text_input_limits() {
        let mut input = TextInput::new(3);
        assert!(input.push('a'));
        assert!(!input.push('\n'));
        assert!(input.push('b'));
        assert!(input.push('c'));
        assert!(!input.push('d'));
        assert_eq!(input.as_str(), "abc");
        assert_eq!(input.masked(), "***");
        assert!(input.pop());
        assert_eq!(input.as_str(), "ab");
    }

    #[test]
    fn test_login_focus_cycles() {
        let mut form = LoginForm::default();
        form.next_focus();
        assert_eq!(form.focus, LoginFocus::Password);
        form.next_focus();
        form.next_focus();
        assert_eq!(form.focus, LoginFocus::Button);
        form.next_focus();
        assert_eq!(form.focus, LoginFocus::Email);
        form.prev_focus();
        assert_eq!(form.focus, LoginFocus::Button);
        assert!(form.focused_input().is_none());
    }

    #[test]
    fn test_email_check_is_debounced() {
        let mut form = RegisterForm::default();
        for c in "new@husmah.com".chars() {
            form.email.push(c);
        }
        let t0 = Instant::now();
        form.email_edited(t0);

        assert_eq!(form.take_due_email_check(t0 + Duration::from_millis(500)), None);
        assert_eq!(
            form.take_due_email_check(t0 + EMAIL_CHECK_DEBOUNCE),
            Some("new@husmah.com".to_string())
        );
        assert_eq!(form.email_status, EmailStatus::Checking);
        // Consumed
        assert_eq!(form.take_due_email_check(t0 + Duration::from_secs(5)), None);

        form.email_checked("new@husmah.com", Some(true));
        assert_eq!(form.email_status, EmailStatus::Taken);
    }

    #[test]
    fn test_malformed_email_is_not_checked() {
        let mut form = RegisterForm::default();
        for c in "not-an-email".chars() {
            form.email.push(c);
        }
        let t0 = Instant::now();
        form.email_edited(t0);
        assert_eq!(form.take_due_email_check(t0 + Duration::from_secs(1)), None);
        assert_eq!(form.email_status, EmailStatus::Unknown);
    }

    #[test]
    fn test_stale_email_check_result_is_ignored() {
        let mut form = RegisterForm::default();
        for c in "b@x.io".chars() {
            form.email.push(c);
        }
        form.email_checked("a@x.io", Some(true));
        assert_eq!(form.email_status, EmailStatus::Unknown);
    }

    #[test]
    fn test_register_blocked_when_email_taken() {
        let mut form = RegisterForm::default();
        form.name = TextInput::with_value(50, "New Person");
        form.email = TextInput::with_value(50, "new@husmah.com");
        form.password = TextInput::with_value(50, "Passw0rd");
        form.confirm = TextInput::with_value(50, "Passw0rd");
        assert!(form.validate().is_ok());

        form.email_status = EmailStatus::Taken;
        assert_eq!(
            form.validate().unwrap_err(),
            "This email is already registered. Please use a different email address."
        );
    }

    #[test]
    fn test_editor_loads_project() {
        let project = Project {
            mongo_id: Some("p1".to_string()),
            name: "Riverside".to_string(),
            main_image: "https://cdn/main.jpg".to_string(),
            all_images: vec!["https://cdn/a.jpg".to_string(), "https://cdn/b.jpg".to_string()],
            area: 120.5,
            bedrooms: 3,
            ..Default::default()
        };
        let editor = ProjectEditor::for_project(&project);
        assert_eq!(editor.project_id.as_deref(), Some("p1"));
        assert!(!editor.is_new());

        let area = editor.attribute(Attribute::Area).unwrap();
        assert!(area.enabled);
        assert_eq!(area.input.as_str(), "120.5");
        assert!(!editor.attribute(Attribute::Flow).unwrap().enabled);
    }

    #[test]
    fn test_disabled_attributes_are_sent_as_zero() {
        let project = Project {
            id: Some("p2".to_string()),
            name: "Mill".to_string(),
            area: 80.0,
            bathrooms: 2,
            ..Default::default()
        };
        let mut editor = ProjectEditor::for_project(&project);
        editor.focus = EditorField::ORDER
            .iter()
            .position(|f| *f == EditorField::Attribute(Attribute::Area))
            .unwrap();
        assert!(editor.toggle_attribute());
        assert!(editor.focused_input().is_none());

        let submission = editor.submission().unwrap();
        assert_eq!(submission.draft.area, 0.0);
        assert_eq!(submission.draft.bathrooms, 2);
    }

    #[test]
    fn test_invalid_attribute_is_reported() {
        let mut editor = ProjectEditor::new();
        editor.name = TextInput::with_value(50, "New");
        editor.attributes[2].enabled = true;
        editor.attributes[2].input = TextInput::with_value(10, "three");
        assert_eq!(
            editor.submission().unwrap_err(),
            "Bedrooms must be a non-negative number"
        );
    }

    #[test]
    fn test_name_is_required() {
        let editor = ProjectEditor::new();
        assert_eq!(editor.submission().unwrap_err(), "Project name is required");
    }

    #[test]
    fn test_removing_existing_images() {
        let project = Project {
            name: "Gallery".to_string(),
            all_images: vec!["a".to_string(), "b".to_string(), "c".to_string()],
            ..Default::default()
        };
        let mut editor = ProjectEditor::for_project(&project);
        editor.select_next_image();
        editor.select_next_image();
        assert_eq!(editor.remove_selected_image().as_deref(), Some("c"));
        assert_eq!(editor.image_selection, 1);
        editor.select_prev_image();
        assert_eq!(editor.remove_selected_image().as_deref(), Some("a"));

        let submission = editor.submission().unwrap();
        assert_eq!(submission.draft.all_images, vec!["b".to_string()]);
    }

    #[test]
    fn test_submission_loads_picked_images() {
        let dir = tempfile::tempdir().unwrap();
        let front = dir.path().join("front.png");
        let side = dir.path().join("side.jpg");
        std::fs::File::create(&front).unwrap().write_all(b"png").unwrap();
        std::fs::File::create(&side).unwrap().write_all(b"jpg").unwrap();

        let mut editor = ProjectEditor::new();
        editor.name = TextInput::with_value(50, "New");
        editor.main_image_path = TextInput::with_value(4096, &front.display().to_string());
        editor.new_image_paths =
            TextInput::with_value(4096, &format!(" {} ; ", side.display()));

        let submission = editor.submission().unwrap();
        assert_eq!(submission.main_image.unwrap().file_name, "front.png");
        assert_eq!(submission.additional_images.len(), 1);
        assert_eq!(submission.additional_images[0].file_name, "side.jpg");
    }

    #[test]
    fn test_missing_image_file_is_prefixed() {
        let mut editor = ProjectEditor::new();
        editor.name = TextInput::with_value(50, "New");
        editor.new_image_paths = TextInput::with_value(4096, "/definitely/not/here.png");
        let err = editor.submission().unwrap_err();
        assert!(err.starts_with("Additional images upload failed: Failed to read"));
    }
}
