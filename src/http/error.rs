use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use tracing::error;

use crate::error::{NotifyError, ValidationError};
use crate::storage::StorageError;

/// Body of every 403.
pub const INVALID_KEY_MESSAGE: &str = "clave inválida";

/// Error returned by a handler, rendered as `{"error": "..."}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// 400: malformed or invalid input.
    BadRequest(String),
    /// 403: missing or wrong admin key.
    Forbidden,
    /// 500: storage failure.
    Internal(String),
    /// 502: the messaging provider failed.
    BadGateway(String),
    /// 503: a required setting is missing.
    Unavailable(String),
}

impl ApiError {
    #[allow(missing_docs)]
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BadGateway(_) => StatusCode::BAD_GATEWAY,
            Self::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    fn message(&self) -> &str {
        match self {
            Self::Forbidden => INVALID_KEY_MESSAGE,
            Self::BadRequest(m) | Self::Internal(m) | Self::BadGateway(m) | Self::Unavailable(m) => m.as_str(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(json!({ "error": self.message() }))).into_response()
    }
}

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        error!(error = %err, "storage failure while serving request");
        Self::Internal(err.to_string())
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        match err {
            ValidationError::MissingField { .. } => Self::BadRequest("Falta el número".to_string()),
            ValidationError::InvalidRecipient { .. } => Self::BadRequest("Número inválido".to_string()),
            other @ ValidationError::InvalidToggle { .. } => Self::BadRequest(other.to_string()),
        }
    }
}

impl From<NotifyError> for ApiError {
    fn from(err: NotifyError) -> Self {
        Self::BadGateway(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_errors_map_to_user_messages() {
        let err = ApiError::from(ValidationError::MissingField {
            field: "numero".to_string(),
        });
        assert_eq!(err, ApiError::BadRequest("Falta el número".to_string()));

        let err = ApiError::from(ValidationError::InvalidToggle {
            field: "on".to_string(),
            value: "maybe".to_string(),
        });
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert!(err.message().contains("maybe"));
    }

    #[test]
    fn forbidden_has_fixed_message() {
        let response = ApiError::Forbidden.into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }
}
