//! Form validation rules shared by the login, registration, change-password
//! and project forms.
//!
//! Each validator returns the first problem it finds so the front-end can
//! show a single error line under the form.

use thiserror::Error;

/// Minimum password length accepted by the login form.
const MIN_LOGIN_PASSWORD_LENGTH: usize = 6;

/// Minimum length for new passwords (registration and password change).
const MIN_NEW_PASSWORD_LENGTH: usize = 8;

/// Minimum length for a staff member's display name.
const MIN_NAME_LENGTH: usize = 2;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{0} is required")]
    Required(String),

    #[error("Please enter a valid email address")]
    InvalidEmail,

    #[error("{field} must be at least {min} characters")]
    TooShort { field: String, min: usize },

    #[error("Password must contain uppercase, lowercase, and number")]
    WeakPassword,

    #[error("Passwords do not match")]
    PasswordMismatch,

    #[error("New password must be different from current password")]
    PasswordUnchanged,

    #[error("User email not found. Please log in again.")]
    MissingSessionEmail,

    #[error("{0} must be a non-negative number")]
    InvalidNumber(String),
}

/// Loose email check used by the login form: `something@something.something`
/// anywhere in the input, no whitespace inside the parts.
pub fn looks_like_email(input: &str) -> bool {
    input.split_whitespace().any(is_email)
}

/// Strict email check: the whole input is `local@domain.tld` with exactly one
/// `@` and no whitespace.
pub fn is_email(input: &str) -> bool {
    if input.is_empty() || input.chars().any(char::is_whitespace) {
        return false;
    }
    let mut parts = input.split('@');
    let (Some(local), Some(domain), None) = (parts.next(), parts.next(), parts.next()) else {
        return false;
    };
    if local.is_empty() {
        return false;
    }
    match domain.rfind('.') {
        Some(dot) => dot > 0 && dot < domain.len() - 1,
        None => false,
    }
}

/// Upper, lower and digit all present
fn is_strong_password(password: &str) -> bool {
    password.chars().any(|c| c.is_ascii_lowercase())
        && password.chars().any(|c| c.is_ascii_uppercase())
        && password.chars().any(|c| c.is_ascii_digit())
}

fn check_new_password(password: &str, field: &str) -> Result<(), ValidationError> {
    if password.is_empty() {
        return Err(ValidationError::Required(field.to_string()));
    }
    if password.chars().count() < MIN_NEW_PASSWORD_LENGTH {
        return Err(ValidationError::TooShort {
            field: field.to_string(),
            min: MIN_NEW_PASSWORD_LENGTH,
        });
    }
    if !is_strong_password(password) {
        return Err(ValidationError::WeakPassword);
    }
    Ok(())
}

pub fn validate_login(email: &str, password: &str) -> Result<(), ValidationError> {
    if email.is_empty() {
        return Err(ValidationError::Required("Email".to_string()));
    }
    if !looks_like_email(email) {
        return Err(ValidationError::InvalidEmail);
    }
    if password.is_empty() {
        return Err(ValidationError::Required("Password".to_string()));
    }
    if password.chars().count() < MIN_LOGIN_PASSWORD_LENGTH {
        return Err(ValidationError::TooShort {
            field: "Password".to_string(),
            min: MIN_LOGIN_PASSWORD_LENGTH,
        });
    }
    Ok(())
}

pub fn validate_registration(
    name: &str,
    email: &str,
    password: &str,
    confirm: &str,
) -> Result<(), ValidationError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ValidationError::Required("Name".to_string()));
    }
    if name.chars().count() < MIN_NAME_LENGTH {
        return Err(ValidationError::TooShort {
            field: "Name".to_string(),
            min: MIN_NAME_LENGTH,
        });
    }
    let email = email.trim();
    if email.is_empty() {
        return Err(ValidationError::Required("Email".to_string()));
    }
    if !is_email(email) {
        return Err(ValidationError::InvalidEmail);
    }
    check_new_password(password, "Password")?;
    if confirm.is_empty() {
        return Err(ValidationError::Required("Password confirmation".to_string()));
    }
    if password != confirm {
        return Err(ValidationError::PasswordMismatch);
    }
    Ok(())
}

pub fn validate_password_change(
    session_email: &str,
    current: &str,
    new: &str,
    confirm: &str,
) -> Result<(), ValidationError> {
    if session_email.is_empty() {
        return Err(ValidationError::MissingSessionEmail);
    }
    if current.is_empty() {
        return Err(ValidationError::Required("Current password".to_string()));
    }
    if current == new {
        return Err(ValidationError::PasswordUnchanged);
    }
    check_new_password(new, "New password")?;
    if confirm.is_empty() {
        return Err(ValidationError::Required("Password confirmation".to_string()));
    }
    if new != confirm {
        return Err(ValidationError::PasswordMismatch);
    }
    Ok(())
}

pub fn validate_project_name(name: &str) -> Result<(), ValidationError> {
    if name.trim().is_empty() {
        return Err(ValidationError::Required("Project name".to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_email() {
        assert!(is_email("a@x.com"));
        assert!(is_email("first.last@sub.example.org"));
        assert!(!is_email("a@x"));
        assert!(!is_email("@x.com"));
        assert!(!is_email("a@@x.com"));
        assert!(!is_email("a b@x.com"));
        assert!(!is_email("a@x."));
        assert!(!is_email("a@.com"));
        assert!(!is_email(""));
    }

    #[test]
    fn test_looks_like_email_is_looser() {
        assert!(looks_like_email("a@x.com"));
        assert!(looks_like_email("  a@x.com "));
        assert!(!looks_like_email("ax.com"));
    }

    #[test]
    fn test_validate_login() {
        assert!(validate_login("a@x.com", "secret1").is_ok());
        assert_eq!(
            validate_login("", "secret1"),
            Err(ValidationError::Required("Email".to_string()))
        );
        assert_eq!(validate_login("nope", "secret1"), Err(ValidationError::InvalidEmail));
        assert_eq!(
            validate_login("a@x.com", "12345").unwrap_err().to_string(),
            "Password must be at least 6 characters"
        );
    }

    #[test]
    fn test_validate_registration() {
        assert!(validate_registration("Ann", "ann@x.com", "Passw0rd", "Passw0rd").is_ok());
        assert_eq!(
            validate_registration("A", "ann@x.com", "Passw0rd", "Passw0rd")
                .unwrap_err()
                .to_string(),
            "Name must be at least 2 characters"
        );
        assert_eq!(
            validate_registration("Ann", "ann@x.com", "password1", "password1"),
            Err(ValidationError::WeakPassword)
        );
        assert_eq!(
            validate_registration("Ann", "ann@x.com", "Passw0rd", "Passw0rD"),
            Err(ValidationError::PasswordMismatch)
        );
        assert_eq!(
            validate_registration("Ann", "ann@x", "Passw0rd", "Passw0rd"),
            Err(ValidationError::InvalidEmail)
        );
    }

    #[test]
    fn test_validate_password_change() {
        assert!(validate_password_change("a@x.com", "Old12345", "New12345", "New12345").is_ok());
        assert_eq!(
            validate_password_change("", "Old12345", "New12345", "New12345"),
            Err(ValidationError::MissingSessionEmail)
        );
        assert_eq!(
            validate_password_change("a@x.com", "Same1234", "Same1234", "Same1234"),
            Err(ValidationError::PasswordUnchanged)
        );
        assert_eq!(
            validate_password_change("a@x.com", "Old12345", "short", "short")
                .unwrap_err()
                .to_string(),
            "New password must be at least 8 characters"
        );
    }

    #[test]
    fn test_validate_project_name() {
        assert!(validate_project_name("Harbor Bridge").is_ok());
        assert!(validate_project_name("   ").is_err());
    }
}
