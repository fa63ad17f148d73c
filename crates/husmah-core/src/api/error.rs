use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    /// The backend understood the request and said no, with a reason
    #[error("{0}")]
    Rejected(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Access denied: {0}")]
    AccessDenied(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Rate limited - please wait before retrying")]
    RateLimited,

    #[error("Server error: {0}")]
    ServerError(String),

    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

impl ApiError {
    /// Truncate a response body to avoid logging excessive data
    fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            body.to_string()
        } else {
            let cut: String = body.chars().take(MAX_ERROR_BODY_LENGTH).collect();
            format!("{}... (truncated, {} total bytes)", cut, body.len())
        }
    }

    pub fn from_status(status: reqwest::StatusCode, body: &str) -> Self {
        let truncated = Self::truncate_body(body);
        match status.as_u16() {
            400 => ApiError::BadRequest(truncated),
            401 => ApiError::Unauthorized,
            403 => ApiError::AccessDenied(truncated),
            404 => ApiError::NotFound(truncated),
            429 => ApiError::RateLimited,
            500..=599 => ApiError::ServerError(truncated),
            _ => ApiError::InvalidResponse(format!("Status {}: {}", status, truncated)),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::NotFound(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    #[test]
    fn test_from_status_mapping() {
        assert!(matches!(
            ApiError::from_status(StatusCode::BAD_REQUEST, "bad"),
            ApiError::BadRequest(ref b) if b == "bad"
        ));
        assert!(matches!(
            ApiError::from_status(StatusCode::UNAUTHORIZED, ""),
            ApiError::Unauthorized
        ));
        assert!(ApiError::from_status(StatusCode::NOT_FOUND, "").is_not_found());
        assert!(matches!(
            ApiError::from_status(StatusCode::BAD_GATEWAY, "down"),
            ApiError::ServerError(_)
        ));
        assert!(matches!(
            ApiError::from_status(StatusCode::IM_A_TEAPOT, "tea"),
            ApiError::InvalidResponse(ref m) if m.starts_with("Status 418")
        ));
    }

    #[test]
    fn test_long_bodies_are_truncated() {
        let body = "x".repeat(2_000);
        let err = ApiError::from_status(StatusCode::INTERNAL_SERVER_ERROR, &body);
        let message = err.to_string();
        assert!(message.contains("truncated, 2000 total bytes"));
        assert!(message.len() < 600);
    }
}
