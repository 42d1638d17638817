use serde::Deserialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Credentials rejected: {0}")]
    Unauthorized(String),

    #[error("Access denied: {0}")]
    AccessDenied(String),

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

/// Error bodies from the portal backend carry a human-readable `message`.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

impl ApiError {
    /// Truncate a response body to avoid logging excessive data
    fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            body.to_string()
        } else {
            format!(
                "{}... (truncated, {} total bytes)",
                &body[..MAX_ERROR_BODY_LENGTH],
                body.len()
            )
        }
    }

    /// Pull the backend's `message` field out of an error body, falling
    /// back to the (truncated) raw body when there is none.
    fn extract_message(body: &str) -> String {
        if let Ok(parsed) = serde_json::from_str::<ErrorBody>(body) {
            if let Some(message) = parsed.message {
                if !message.is_empty() {
                    return message;
                }
            }
        }
        let truncated = Self::truncate_body(body);
        if truncated.is_empty() {
            "request rejected".to_string()
        } else {
            truncated
        }
    }

    pub fn from_status(status: reqwest::StatusCode, body: &str) -> Self {
        let detail = Self::extract_message(body);
        match status.as_u16() {
            401 => ApiError::Unauthorized(detail),
            403 => ApiError::AccessDenied(detail),
            404 => ApiError::NotFound(detail),
            429 => ApiError::RateLimited,
            500..=599 => ApiError::ServerError(detail),
            _ => ApiError::InvalidResponse(format!("Status {}: {}", status, detail)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    #[test]
    fn test_from_status_maps_codes_to_variants() {
        assert!(matches!(
            ApiError::from_status(StatusCode::UNAUTHORIZED, "{}"),
            ApiError::Unauthorized(_)
        ));
        assert!(matches!(
            ApiError::from_status(StatusCode::FORBIDDEN, "{}"),
            ApiError::AccessDenied(_)
        ));
        assert!(matches!(
            ApiError::from_status(StatusCode::NOT_FOUND, "{}"),
            ApiError::NotFound(_)
        ));
        assert!(matches!(
            ApiError::from_status(StatusCode::TOO_MANY_REQUESTS, "{}"),
            ApiError::RateLimited
        ));
        assert!(matches!(
            ApiError::from_status(StatusCode::BAD_GATEWAY, "{}"),
            ApiError::ServerError(_)
        ));
        assert!(matches!(
            ApiError::from_status(StatusCode::IM_A_TEAPOT, "{}"),
            ApiError::InvalidResponse(_)
        ));
    }

    #[test]
    fn test_backend_message_is_surfaced() {
        let err = ApiError::from_status(
            StatusCode::UNAUTHORIZED,
            r#"{"message":"Email atau password salah"}"#,
        );
        match err {
            ApiError::Unauthorized(detail) => assert_eq!(detail, "Email atau password salah"),
            other => panic!("expected Unauthorized, got {:?}", other),
        }
    }

    #[test]
    fn test_non_json_body_falls_back_to_raw_text() {
        let err = ApiError::from_status(StatusCode::INTERNAL_SERVER_ERROR, "<html>boom</html>");
        match err {
            ApiError::ServerError(detail) => assert_eq!(detail, "<html>boom</html>"),
            other => panic!("expected ServerError, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_body_gets_placeholder() {
        let err = ApiError::from_status(StatusCode::UNAUTHORIZED, "");
        match err {
            ApiError::Unauthorized(detail) => assert_eq!(detail, "request rejected"),
            other => panic!("expected Unauthorized, got {:?}", other),
        }
    }

    #[test]
    fn test_oversized_body_is_truncated() {
        let body = "x".repeat(2 * MAX_ERROR_BODY_LENGTH);
        let err = ApiError::from_status(StatusCode::INTERNAL_SERVER_ERROR, &body);
        match err {
            ApiError::ServerError(detail) => {
                assert!(detail.len() < body.len());
                assert!(detail.contains("truncated"));
            }
            other => panic!("expected ServerError, got {:?}", other),
        }
    }
}
