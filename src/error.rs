// Request-path errors for the proxy handlers

use axum::{
    extract::rejection::{BytesRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::api::response::json_response;

/// Errors raised while handling a single proxied request.
///
/// Upstream non-2xx replies are not represented here: they are relayed to the
/// caller as-is.
#[derive(Debug, thiserror::Error)]
pub enum ProxyError {
    #[error("Method not allowed")]
    MethodNotAllowed,

    /// Request body was not JSON or lacked a required field.
    #[error("{0}")]
    InvalidBody(String),

    /// A caller-supplied header could not be forwarded.
    #[error("{0}")]
    InvalidHeader(String),

    /// No secret configured for the requested API type.
    #[error("{0}")]
    MissingKey(String),

    /// Request refused before it could be read, e.g. body over the size limit.
    #[error("{message}")]
    Rejected { status: StatusCode, message: String },

    #[error("Not found")]
    NotFound,

    /// Failed to reach the upstream or read its reply.
    #[error("{0}")]
    Network(#[from] reqwest::Error),
}

impl ProxyError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            Self::InvalidBody(_) | Self::InvalidHeader(_) => StatusCode::BAD_REQUEST,
            Self::Rejected { status, .. } => *status,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::MissingKey(_) | Self::Network(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<serde_json::Error> for ProxyError {
    fn from(err: serde_json::Error) -> Self {
        Self::InvalidBody(err.to_string())
    }
}

impl From<BytesRejection> for ProxyError {
    fn from(rejection: BytesRejection) -> Self {
        Self::Rejected {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

impl From<QueryRejection> for ProxyError {
    fn from(rejection: QueryRejection) -> Self {
        Self::Rejected {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let body = json!({ "error": self.to_string() }).to_string();
        json_response(self.status(), body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(ProxyError::MethodNotAllowed.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(
            ProxyError::InvalidBody("bad".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ProxyError::MissingKey("none".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_json_error_message_passes_through() {
        let err: ProxyError = serde_json::from_str::<serde_json::Value>("{not json")
            .unwrap_err()
            .into();
        assert!(matches!(err, ProxyError::InvalidBody(_)));
        assert!(err.to_string().contains("key must be a string"));
    }

    #[test]
    fn test_rejected_keeps_status() {
        let err = ProxyError::Rejected {
            status: StatusCode::PAYLOAD_TOO_LARGE,
            message: "Failed to buffer the request body: length limit exceeded".into(),
        };
        assert_eq!(err.status(), StatusCode::PAYLOAD_TOO_LARGE);
        assert!(err.to_string().contains("length limit exceeded"));
        assert_eq!(ProxyError::NotFound.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_error_display() {
        assert_eq!(ProxyError::MethodNotAllowed.to_string(), "Method not allowed");
        let err = ProxyError::MissingKey("API key not configured in environment variables".into());
        assert_eq!(err.to_string(), "API key not configured in environment variables");
    }
}
