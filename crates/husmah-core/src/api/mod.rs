//! REST API client module for the dashboard backend.
//!
//! This module provides the `ApiClient` for logging in, managing staff
//! accounts and managing project records. The backend has no token scheme;
//! every call is a plain JSON request against the configured base URL.

pub mod client;
pub mod error;

pub use client::ApiClient;
pub use error::ApiError;
