//! Core library for the Husmah admin dashboard.
//!
//! Everything the front-end needs that is not drawing or key handling:
//!
//! - `auth`: session lifecycle (store, expiry timer, activity monitor) and
//!   keychain-backed "remember me" credentials
//! - `api`: REST client for the backend (login, users, projects)
//! - `upload`: image validation and upload to the image host
//! - `models`: `User`, `Project` and request payloads
//! - `validation`: form rules for login, registration and password changes
//! - `config`: persisted application configuration

pub mod api;
pub mod auth;
pub mod config;
pub mod models;
pub mod upload;
pub mod utils;
pub mod validation;
