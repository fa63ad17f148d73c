//! Data models for backend entities.
//!
//! - `User`, `Position`: staff accounts with dashboard access
//! - `Project`, `ProjectDraft`: project records and the create/update payload
//! - Request/response bodies for the auth endpoints

pub mod project;
pub mod user;

pub use project::{Attribute, Project, ProjectDraft};
pub use user::{
    ChangePasswordRequest, LoginRequest, LoginResponse, Position, RegisterRequest, User,
    UserUpdate,
};
