//! Error types for the API client

use thiserror::Error;

/// Result type alias for API operations
pub type ApiResult<T> = Result<T, ApiError>;

/// API client errors
///
/// The four token-lifecycle variants are terminal for the in-flight call.
/// Only `RefreshUnavailable` and `RefreshFailed` additionally clear the
/// stored session before surfacing (see [`triggers_logout`](Self::triggers_logout)).
#[derive(Error, Debug)]
pub enum ApiError {
    /// No usable access token after the wait ceiling; no network call was made
    #[error("authentication required - no token available")]
    AuthenticationRequired,

    /// The backend returned 401 and the current token has no refresh token
    #[error("no refresh token available")]
    RefreshUnavailable,

    /// The refresh endpoint itself failed; the session has been cleared
    #[error("token refresh failed: {0}")]
    RefreshFailed(#[source] Box<ApiError>),

    /// Network-level failure of the underlying transport
    #[error("HTTP request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Credential store failure
    #[error("credential store error: {0}")]
    Store(#[from] nutrilog_core::StoreError),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// API returned a non-2xx, non-401 response
    #[error("API error ({status}): {message}")]
    ApiResponse {
        /// HTTP status code
        status: u16,
        /// Error message from API
        message: String,
    },
}

impl ApiError {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an API response error
    pub fn api_response(status: u16, message: impl Into<String>) -> Self {
        Self::ApiResponse {
            status,
            message: message.into(),
        }
    }

    /// Whether this failure cleared the stored session on its way out
    #[must_use]
    pub fn triggers_logout(&self) -> bool {
        matches!(self, Self::RefreshUnavailable | Self::RefreshFailed(_))
    }

    /// Whether this failure means the caller must re-authenticate
    #[must_use]
    pub fn is_auth_failure(&self) -> bool {
        matches!(
            self,
            Self::AuthenticationRequired | Self::RefreshUnavailable | Self::RefreshFailed(_)
        )
    }

    /// Check if this is a client error (4xx)
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::ApiResponse { status, .. } if (400..500).contains(status))
    }

    /// Check if this is a server error (5xx)
    #[must_use]
    pub fn is_server_error(&self) -> bool {
        matches!(self, Self::ApiResponse { status, .. } if *status >= 500)
    }
}

/// Best-effort error message from a response body
///
/// Error bodies are expected to be `{"message": "..."}` but nothing is
/// guaranteed; anything unparseable falls back to a generic message, which
/// is the one place a failure is deliberately swallowed.
#[must_use]
pub fn extract_error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(String::from))
        .unwrap_or_else(|| "API call failed".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn logout_trigger_set_is_exactly_the_refresh_failures() {
        assert!(ApiError::RefreshUnavailable.triggers_logout());
        assert!(
            ApiError::RefreshFailed(Box::new(ApiError::api_response(500, "boom")))
                .triggers_logout()
        );
        assert!(!ApiError::AuthenticationRequired.triggers_logout());
        assert!(!ApiError::api_response(404, "missing").triggers_logout());
    }

    #[test]
    fn auth_failures_include_the_wait_ceiling_case() {
        assert!(ApiError::AuthenticationRequired.is_auth_failure());
        assert!(ApiError::RefreshUnavailable.is_auth_failure());
        assert!(!ApiError::api_response(500, "boom").is_auth_failure());
    }

    #[test]
    fn error_message_extraction_falls_back_on_garbage() {
        assert_eq!(
            extract_error_message(r#"{"message":"quota exceeded"}"#),
            "quota exceeded"
        );
        assert_eq!(extract_error_message("<html>504</html>"), "API call failed");
        assert_eq!(extract_error_message(""), "API call failed");
        assert_eq!(extract_error_message(r#"{"error":"nope"}"#), "API call failed");
    }

    #[test]
    fn status_classification() {
        assert!(ApiError::api_response(404, "missing").is_client_error());
        assert!(ApiError::api_response(503, "down").is_server_error());
        assert!(!ApiError::AuthenticationRequired.is_client_error());
    }
}
