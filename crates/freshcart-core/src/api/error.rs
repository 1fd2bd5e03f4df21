//! Typed failure set for remote API calls.
//!
//! The `Display` text of each variant is user-facing; callers surface these
//! messages directly rather than re-mapping them.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Invalid server URL configuration")]
    BadEndpoint,

    #[error("No internet connection available")]
    NetworkUnavailable,

    #[error("Request timed out - please try again")]
    Timeout,

    #[error("Network request failed: {0}")]
    RequestFailed(#[source] reqwest::Error),

    #[error("Unauthorized - session is no longer valid")]
    Unauthorized,

    #[error("Failed to process server response: {0}")]
    DecodingFailed(#[source] serde_json::Error),

    #[error("Invalid server response: {0}")]
    InvalidResponse(String),

    #[error("Request rejected ({0}): {1}")]
    ClientError(u16, String),

    #[error("Server error ({0}): {1}")]
    ServerError(u16, String),
}

/// Maximum length for error response bodies carried in error messages.
const MAX_ERROR_BODY_LENGTH: usize = 500;

impl ApiError {
    /// Transient transport failures are the only errors worth retrying;
    /// HTTP-level errors never are.
    pub fn is_transient(&self) -> bool {
        matches!(self, ApiError::NetworkUnavailable | ApiError::Timeout)
    }

    /// Classify an HTTP error status. 2xx statuses never reach this point.
    pub fn from_status(status: reqwest::StatusCode, body: &str) -> Self {
        let message = truncate_body(&parse_error_message(body));
        match status.as_u16() {
            401 => ApiError::Unauthorized,
            400..=499 => ApiError::ClientError(status.as_u16(), message),
            500..=599 => ApiError::ServerError(status.as_u16(), message),
            _ => ApiError::InvalidResponse(format!("Unexpected status code: {}", status)),
        }
    }

    /// Classify a transport-level reqwest failure. Timeouts and connection
    /// failures are retryable; everything else surfaces as-is.
    pub(crate) fn from_transport(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ApiError::Timeout
        } else if err.is_connect() {
            ApiError::NetworkUnavailable
        } else {
            ApiError::RequestFailed(err)
        }
    }
}

/// Prefer a JSON `message` field in an error body, falling back to the raw
/// text.
fn parse_error_message(body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        if let Some(message) = value.get("message").and_then(|m| m.as_str()) {
            return message.to_string();
        }
    }
    body.to_string()
}

fn truncate_body(body: &str) -> String {
    if body.len() <= MAX_ERROR_BODY_LENGTH {
        body.to_string()
    } else {
        let mut cut = MAX_ERROR_BODY_LENGTH;
        while !body.is_char_boundary(cut) {
            cut -= 1;
        }
        format!(
            "{}... (truncated, {} total bytes)",
            &body[..cut],
            body.len()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_classification() {
        assert!(matches!(
            ApiError::from_status(reqwest::StatusCode::UNAUTHORIZED, ""),
            ApiError::Unauthorized
        ));
        assert!(matches!(
            ApiError::from_status(reqwest::StatusCode::NOT_FOUND, "missing"),
            ApiError::ClientError(404, _)
        ));
        assert!(matches!(
            ApiError::from_status(reqwest::StatusCode::BAD_GATEWAY, "boom"),
            ApiError::ServerError(502, _)
        ));
        assert!(matches!(
            ApiError::from_status(reqwest::StatusCode::from_u16(399).unwrap(), ""),
            ApiError::InvalidResponse(_)
        ));
    }

    #[test]
    fn error_message_prefers_json_message_field() {
        let err = ApiError::from_status(
            reqwest::StatusCode::BAD_REQUEST,
            r#"{"message": "Quantity must be positive", "status": 400}"#,
        );
        match err {
            ApiError::ClientError(400, message) => {
                assert_eq!(message, "Quantity must be positive");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn error_message_falls_back_to_raw_body() {
        let err = ApiError::from_status(reqwest::StatusCode::INTERNAL_SERVER_ERROR, "plain text");
        match err {
            ApiError::ServerError(500, message) => assert_eq!(message, "plain text"),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn long_bodies_are_truncated() {
        let body = "x".repeat(2000);
        let err = ApiError::from_status(reqwest::StatusCode::INTERNAL_SERVER_ERROR, &body);
        match err {
            ApiError::ServerError(500, message) => {
                assert!(message.len() < 600);
                assert!(message.contains("truncated"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn only_transport_failures_are_transient() {
        assert!(ApiError::NetworkUnavailable.is_transient());
        assert!(ApiError::Timeout.is_transient());
        assert!(!ApiError::Unauthorized.is_transient());
        assert!(!ApiError::ClientError(404, String::new()).is_transient());
        assert!(!ApiError::ServerError(500, String::new()).is_transient());
        assert!(!ApiError::BadEndpoint.is_transient());
    }
}
