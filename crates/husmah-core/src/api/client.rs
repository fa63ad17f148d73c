//! API client for the dashboard backend.
//!
//! This module provides the `ApiClient` struct for logging staff in and for
//! the user and project endpoints used by the dashboard views.

use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode, Url};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, warn};

use crate::models::{
    ChangePasswordRequest, LoginRequest, LoginResponse, Project, ProjectDraft, RegisterRequest,
    User, UserUpdate,
};

use super::ApiError;

// ============================================================================
// Constants
// ============================================================================

/// HTTP request timeout in seconds.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Maximum number of retries for rate-limited (429) requests.
const MAX_RATE_LIMIT_RETRIES: u32 = 3;

/// Initial backoff delay in milliseconds for rate limiting.
const INITIAL_BACKOFF_MS: u64 = 1000;

/// Shown when a login is refused without a message from the backend.
pub const LOGIN_FAILED_MESSAGE: &str = "Login failed. Please check your credentials.";

/// Shown when registration fails without a message from the backend.
pub const REGISTER_FAILED_MESSAGE: &str = "Failed to create user access. Please try again.";

/// API client for the dashboard backend.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: Url,
}

impl ApiClient {
    /// Create a new API client for `base_url` (for example `http://localhost:5001`)
    pub fn new(base_url: &str) -> Result<Self> {
        let base_url = Url::parse(base_url)
            .with_context(|| format!("Invalid API base URL: {}", base_url))?;
        if base_url.cannot_be_a_base() {
            anyhow::bail!("Invalid API base URL: {}", base_url);
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_str()
    }

    /// Build an endpoint URL from path segments. Segments are percent-encoded,
    /// so emails and ids can be passed as-is.
    fn url(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| anyhow::anyhow!("Invalid API base URL: {}", self.base_url))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    // ===== Authentication =====

    /// Log in with email and password.
    ///
    /// The backend answers `{success, user, message}`. Anything other than a
    /// successful response carrying a user is an `ApiError::Rejected` with the
    /// backend's message or a generic one.
    pub async fn login(&self, email: &str, password: &str) -> Result<User> {
        let url = self.url(&["api", "user", "login"])?;
        let body = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        };

        let response = self
            .send_with_retry(&url, || self.client.post(url.clone()).json(&body))
            .await?;
        let status = response.status();
        let text = response
            .text()
            .await
            .context("Failed to read login response")?;

        match serde_json::from_str::<LoginResponse>(&text) {
            Ok(LoginResponse {
                success: true,
                user: Some(user),
                ..
            }) if status.is_success() => {
                debug!(email = %user.email, position = %user.position, "Login accepted");
                Ok(user)
            }
            Ok(parsed) => {
                let message = parsed
                    .message
                    .filter(|m| !m.trim().is_empty())
                    .unwrap_or_else(|| LOGIN_FAILED_MESSAGE.to_string());
                warn!(status = %status, "Login rejected");
                Err(ApiError::Rejected(message).into())
            }
            Err(_) if status.is_success() => {
                Err(ApiError::InvalidResponse("Malformed login response".to_string()).into())
            }
            Err(_) => {
                warn!(status = %status, "Login rejected without a readable body");
                Err(ApiError::Rejected(LOGIN_FAILED_MESSAGE.to_string()).into())
            }
        }
    }

    /// Change a user's password.
    pub async fn change_password(&self, request: &ChangePasswordRequest) -> Result<()> {
        let url = self.url(&["api", "Auth", "user-change-password"])?;
        let response = self
            .send_with_retry(&url, || self.client.post(url.clone()).json(request))
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let message = match status {
            StatusCode::BAD_REQUEST => "Invalid current password or request data".to_string(),
            StatusCode::NOT_FOUND => "User not found".to_string(),
            other => format!("Server error: {}", other.as_u16()),
        };
        warn!(status = %status, "Password change rejected");
        Err(ApiError::Rejected(message).into())
    }

    // ===== Users =====

    pub async fn list_users(&self) -> Result<Vec<User>> {
        let url = self.url(&["api", "Auth", "users"])?;
        self.get(&url).await
    }

    /// Fetch one user by email. A 404 means no such account.
    pub async fn get_user(&self, email: &str) -> Result<Option<User>> {
        let url = self.url(&["api", "Auth", "user", email])?;
        let response = self
            .send_with_retry(&url, || self.client.get(url.clone()))
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let response = Self::check_response(response).await?;
        let user = response
            .json()
            .await
            .with_context(|| format!("Failed to parse JSON response from {}", url))?;
        Ok(Some(user))
    }

    /// Whether an account already exists for `email`.
    pub async fn email_exists(&self, email: &str) -> Result<bool> {
        Ok(self.get_user(email).await?.is_some())
    }

    pub async fn update_user(&self, email: &str, update: &UserUpdate) -> Result<()> {
        let url = self.url(&["api", "Auth", "user", email])?;
        self.send_unit(&url, Method::PUT, Some(update)).await
    }

    pub async fn delete_user(&self, email: &str) -> Result<()> {
        let url = self.url(&["api", "Auth", "user", email])?;
        self.send_unit::<()>(&url, Method::DELETE, None).await
    }

    /// Create a new staff account. Failures carry the backend message when it
    /// sent one.
    pub async fn register_user(&self, request: &RegisterRequest) -> Result<()> {
        let url = self.url(&["api", "user", "register"])?;
        let response = self
            .send_with_retry(&url, || self.client.post(url.clone()).json(request))
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<serde_json::Value>(&body)
            .ok()
            .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(str::to_string))
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| REGISTER_FAILED_MESSAGE.to_string());
        warn!(status = %status, "Registration rejected");
        Err(ApiError::Rejected(message).into())
    }

    // ===== Projects =====

    pub async fn list_projects(&self) -> Result<Vec<Project>> {
        let url = self.url(&["api", "Project"])?;
        self.get(&url).await
    }

    pub async fn get_project(&self, id: &str) -> Result<Project> {
        let url = self.url(&["api", "Project", id])?;
        self.get(&url).await
    }

    pub async fn create_project(&self, draft: &ProjectDraft) -> Result<()> {
        let url = self.url(&["api", "Project"])?;
        self.send_unit(&url, Method::POST, Some(draft)).await
    }

    pub async fn update_project(&self, id: &str, draft: &ProjectDraft) -> Result<()> {
        let url = self.url(&["api", "Project", id])?;
        self.send_unit(&url, Method::PUT, Some(draft)).await
    }

    pub async fn delete_project(&self, id: &str) -> Result<()> {
        let url = self.url(&["api", "Project", id])?;
        self.send_unit::<()>(&url, Method::DELETE, None).await
    }

    // ===== Plumbing =====

    async fn check_response(response: Response) -> Result<Response> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body).into())
        }
    }

    /// Send a request, retrying with exponential backoff while the backend
    /// answers 429. Any other response is returned unchecked.
    async fn send_with_retry<F>(&self, url: &Url, build: F) -> Result<Response>
    where
        F: Fn() -> RequestBuilder,
    {
        let mut retries = 0;
        let mut backoff_ms = INITIAL_BACKOFF_MS;

        loop {
            let response = build()
                .send()
                .await
                .map_err(ApiError::from)
                .with_context(|| format!("Failed to send request to {}", url))?;

            if response.status() != StatusCode::TOO_MANY_REQUESTS {
                return Ok(response);
            }

            retries += 1;
            if retries > MAX_RATE_LIMIT_RETRIES {
                return Err(ApiError::RateLimited.into());
            }
            warn!(
                url = %url,
                retry = retries,
                backoff_ms = backoff_ms,
                "Rate limited, backing off"
            );
            tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
            backoff_ms *= 2; // Exponential backoff
        }
    }

    async fn get<T: DeserializeOwned>(&self, url: &Url) -> Result<T> {
        let response = self
            .send_with_retry(url, || self.client.get(url.clone()))
            .await?;
        let response = Self::check_response(response).await?;
        response
            .json()
            .await
            .with_context(|| format!("Failed to parse JSON response from {}", url))
    }

    /// Send a request whose response body is not needed. Empty or non-JSON
    /// bodies on success are fine.
    async fn send_unit<B: Serialize>(
        &self,
        url: &Url,
        method: Method,
        body: Option<&B>,
    ) -> Result<()> {
        let response = self
            .send_with_retry(url, || {
                let request = self.client.request(method.clone(), url.clone());
                match body {
                    Some(body) => request.json(body),
                    None => request,
                }
            })
            .await?;
        Self::check_response(response).await?;
        debug!(method = %method, url = %url, "Request succeeded");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_encodes_path_segments() {
        let client = ApiClient::new("http://localhost:5001").unwrap();
        let url = client.url(&["api", "Auth", "user", "a b@x.io"]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:5001/api/Auth/user/a%20b@x.io");
    }

    #[test]
    fn test_url_keeps_base_path_prefix() {
        let client = ApiClient::new("http://example.com/backend/").unwrap();
        let url = client.url(&["api", "Project"]).unwrap();
        assert_eq!(url.as_str(), "http://example.com/backend/api/Project");
    }

    #[test]
    fn test_rejects_invalid_base_url() {
        assert!(ApiClient::new("not a url").is_err());
        assert!(ApiClient::new("mailto:admin@example.com").is_err());
    }
}
