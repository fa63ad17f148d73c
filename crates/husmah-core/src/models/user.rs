use serde::{Deserialize, Serialize};

/// Dashboard role. Only `SuperAdmin` may manage staff access.
///
/// Positions the client does not know about are kept verbatim so they
/// round-trip, but they never grant superadmin rights.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Position {
    #[default]
    Admin,
    SuperAdmin,
    Other(String),
}

impl Position {
    pub fn as_str(&self) -> &str {
        match self {
            Position::Admin => "admin",
            Position::SuperAdmin => "superadmin",
            Position::Other(s) => s.as_str(),
        }
    }

    /// Display name for lists and the title bar
    pub fn display_name(&self) -> &str {
        match self {
            Position::Admin => "Admin",
            Position::SuperAdmin => "Super Admin",
            Position::Other(s) => s.as_str(),
        }
    }

    pub fn is_superadmin(&self) -> bool {
        matches!(self, Position::SuperAdmin)
    }

    /// Next assignable position (used by the registration form toggle)
    pub fn toggle(&self) -> Self {
        match self {
            Position::SuperAdmin => Position::Admin,
            _ => Position::SuperAdmin,
        }
    }
}

impl From<String> for Position {
    fn from(s: String) -> Self {
        match s.trim().to_lowercase().as_str() {
            "admin" => Position::Admin,
            "superadmin" => Position::SuperAdmin,
            _ => Position::Other(s),
        }
    }
}

impl From<Position> for String {
    fn from(p: Position) -> Self {
        p.as_str().to_string()
    }
}

impl Serialize for Position {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Position {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = Option::<String>::deserialize(deserializer)?;
        Ok(s.map(Position::from).unwrap_or_default())
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// A staff account as the client sees it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    #[serde(default)]
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub position: Position,
    #[serde(rename = "lastLoginAt", default, skip_serializing_if = "Option::is_none")]
    pub last_login_at: Option<String>,
}

impl User {
    pub fn new(name: &str, email: &str, position: Position) -> Self {
        Self {
            name: name.to_string(),
            email: email.to_string(),
            position,
            last_login_at: None,
        }
    }

    /// Name if the backend sent one, otherwise the email
    pub fn display_name(&self) -> &str {
        if self.name.trim().is_empty() {
            &self.email
        } else {
            &self.name
        }
    }

    pub fn is_superadmin(&self) -> bool {
        self.position.is_superadmin()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    #[serde(default)]
    pub success: bool,
    pub user: Option<User>,
    pub message: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub name: String,
    pub position: Position,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChangePasswordRequest {
    pub email: String,
    #[serde(rename = "oldPassword")]
    pub old_password: String,
    #[serde(rename = "newPassword")]
    pub new_password: String,
}

/// Partial update for `PUT /api/Auth/user/{email}`
#[derive(Debug, Clone, Default, Serialize)]
pub struct UserUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,
}
