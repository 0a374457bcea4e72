use http::StatusCode;

use crate::access::AccessError;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Authentication failed. Your session may have expired; run `scorebook login`.")]
    Unauthorized,
    #[error("The server refused this request for your account.")]
    Forbidden,
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Server returned {status}: {message}")]
    Status { status: StatusCode, message: String },
    #[error("Could not reach the score service: {0}")]
    Network(#[from] reqwest::Error),
    #[error("Unexpected response from {path}: {message}")]
    Decode { path: String, message: String },
    #[error(transparent)]
    Access(#[from] AccessError),
    #[error("Invalid API configuration: {0}")]
    InvalidConfig(String),
}

impl ApiError {
    /// Whether retrying the same request might succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            ApiError::Network(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            ApiError::Status { status, .. } => {
                status.is_server_error() || *status == StatusCode::TOO_MANY_REQUESTS
            }
            _ => false,
        }
    }

    /// Map a non-success status and its body to an error.
    pub fn from_status(status: StatusCode, path: &str, body: &str) -> Self {
        match status {
            StatusCode::UNAUTHORIZED => ApiError::Unauthorized,
            StatusCode::FORBIDDEN => ApiError::Forbidden,
            StatusCode::NOT_FOUND => ApiError::NotFound(path.to_string()),
            _ => ApiError::Status {
                status,
                message: error_message(body),
            },
        }
    }
}

/// Pull a readable message out of an error body. Servers send either
/// `{"detail": ...}`, `{"error": ...}`, `{"message": ...}` or plain text.
fn error_message(body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        for key in ["detail", "error", "message"] {
            match value.get(key) {
                Some(serde_json::Value::String(s)) => return s.clone(),
                Some(other) if !other.is_null() => return other.to_string(),
                _ => {}
            }
        }
    }
    let trimmed = body.trim();
    if trimmed.is_empty() {
        "(empty response)".to_string()
    } else {
        trimmed.chars().take(200).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_status_maps_auth_errors() {
        assert!(matches!(
            ApiError::from_status(StatusCode::UNAUTHORIZED, "/auth/me", ""),
            ApiError::Unauthorized
        ));
        assert!(matches!(
            ApiError::from_status(StatusCode::FORBIDDEN, "/shooters", ""),
            ApiError::Forbidden
        ));
        match ApiError::from_status(StatusCode::NOT_FOUND, "/matches/9", "") {
            ApiError::NotFound(path) => assert_eq!(path, "/matches/9"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_error_message_from_json_body() {
        let err = ApiError::from_status(
            StatusCode::UNPROCESSABLE_ENTITY,
            "/scores",
            r#"{"detail": "caliber is required"}"#,
        );
        assert_eq!(
            err.to_string(),
            "Server returned 422 Unprocessable Entity: caliber is required"
        );
    }

    #[test]
    fn test_error_message_plain_text_and_empty() {
        assert_eq!(error_message("  bad gateway \n"), "bad gateway");
        assert_eq!(error_message(""), "(empty response)");
        assert_eq!(error_message(r#"{"error": {"code": 7}}"#), r#"{"code":7}"#);
    }

    #[test]
    fn test_is_transient() {
        let server = ApiError::from_status(StatusCode::BAD_GATEWAY, "/x", "");
        let busy = ApiError::from_status(StatusCode::TOO_MANY_REQUESTS, "/x", "");
        let client = ApiError::from_status(StatusCode::BAD_REQUEST, "/x", "");
        assert!(server.is_transient());
        assert!(busy.is_transient());
        assert!(!client.is_transient());
        assert!(!ApiError::Unauthorized.is_transient());
    }
}
