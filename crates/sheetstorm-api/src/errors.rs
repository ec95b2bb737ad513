use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[error("{message} ({code})")]
pub struct ApiError {
    pub code: String,
    pub message: String,
    /// HTTP status when the error came back from the server.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            status: None,
        }
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::new("invalid_argument", message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new("not_found", message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new("unauthorized", message)
    }

    pub fn server(message: impl Into<String>) -> Self {
        Self::new("server", message)
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::new("transport", message)
    }

    pub fn decode(message: impl Into<String>) -> Self {
        Self::new("decode", message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new("internal", message)
    }

    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        let code = match status {
            400 => "invalid_argument",
            401 | 403 => "unauthorized",
            404 => "not_found",
            500..=599 => "server",
            _ => "http",
        };
        Self::new(code, message).with_status(status)
    }

    /// Transport failures and 5xx answers are worth another attempt.
    pub fn is_retryable(&self) -> bool {
        self.code == "transport" || self.code == "server"
    }
}

/// Error body the backend sends with 4xx/5xx answers.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub msg: Option<String>,
}

impl ErrorBody {
    pub fn best_message(&self) -> Option<&str> {
        self.message
            .as_deref()
            .or(self.error.as_deref())
            .or(self.msg.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_maps_to_code() {
        assert_eq!(ApiError::from_status(400, "bad").code, "invalid_argument");
        assert_eq!(ApiError::from_status(403, "no").code, "unauthorized");
        assert_eq!(ApiError::from_status(404, "gone").code, "not_found");
        let err = ApiError::from_status(503, "down");
        assert_eq!(err.code, "server");
        assert_eq!(err.status, Some(503));
        assert!(err.is_retryable());
        assert!(!ApiError::from_status(409, "conflict").is_retryable());
    }

    #[test]
    fn error_body_prefers_message() {
        let body: ErrorBody =
            serde_json::from_str(r#"{"error":"not_found","message":"Node not found"}"#).unwrap();
        assert_eq!(body.best_message(), Some("Node not found"));
        assert_eq!(ErrorBody::default().best_message(), None);
    }
}
