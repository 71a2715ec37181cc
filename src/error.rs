//! Error types for slotwatch.
//!
//! All errors in slotwatch are strongly typed using thiserror.
//! A failed page fetch, a rejected message and a bad registration
//! are different conditions and callers match on them as such.

use thiserror::Error;
use tracing_subscriber::util::TryInitError;

use crate::storage::StorageError;

/// Validation errors that occur during input validation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Required field '{field}' is missing")]
    MissingField {
        field: String,
    },

    #[error("Invalid recipient '{value}': expected an optional '+' followed by 3 to 15 digits")]
    InvalidRecipient {
        value: String,
    },

    #[error("Invalid value '{value}' for toggle '{field}'")]
    InvalidToggle {
        field: String,
        value: String,
    },
}

/// Errors fetching the monitored page.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("Page request failed: {message}")]
    Transport {
        message: String,
    },

    #[error("Page responded with HTTP {status}")]
    Status {
        status: u16,
    },

    #[error("Page body could not be read: {message}")]
    Body {
        message: String,
    },
}

/// Errors delivering a message to a recipient.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NotifyError {
    #[error("Message request failed: {message}")]
    Transport {
        message: String,
    },

    #[error("Message rejected (HTTP {status}): {message}")]
    Rejected {
        status: u16,
        message: String,
    },

    #[error("Messaging is not configured: {reason}")]
    NotConfigured {
        reason: String,
    },
}

/// Errors loading or validating configuration.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {reason}")]
    InvalidValue {
        key: String,
        reason: String,
    },
}

impl ConfigError {
    pub(crate) fn invalid(key: &str, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            key: key.to_string(),
            reason: reason.into(),
        }
    }
}

/// Top-level error type for slotwatch.
#[derive(Debug, Error)]
pub enum SlotwatchError {
    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    #[error("Notify error: {0}")]
    Notify(#[from] NotifyError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("Logging setup failed: {0}")]
    Logging(#[from] TryInitError),

    #[error("Server I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Operation timed out after {duration_ms}ms")]
    Timeout {
        duration_ms: u64,
    },

    #[error("Channel disconnected: {path}")]
    Disconnected {
        path: String,
    },
}

/// Result type alias for slotwatch operations.
pub type SlotwatchResult<T> = Result<T, SlotwatchError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_missing_field() {
        let err = ValidationError::MissingField {
            field: "numero".to_string(),
        };
        let msg = format!("{err}");
        assert!(msg.contains("numero"));
        assert!(msg.contains("missing"));
    }

    #[test]
    fn test_fetch_error_status() {
        let err = FetchError::Status { status: 503 };
        assert!(format!("{err}").contains("503"));
    }

    #[test]
    fn test_notify_error_rejected() {
        let err = NotifyError::Rejected {
            status: 400,
            message: "The 'To' number is not a valid phone number.".to_string(),
        };
        let msg = format!("{err}");
        assert!(msg.contains("400"));
        assert!(msg.contains("not a valid phone number"));
    }

    #[test]
    fn test_slotwatch_error_wraps_categories() {
        let err: SlotwatchError = ConfigError::invalid("PORT", "70000 is out of range").into();
        assert!(matches!(err, SlotwatchError::Config(_)));
        assert!(format!("{err}").contains("PORT"));

        let err: SlotwatchError = NotifyError::NotConfigured {
            reason: "no credentials".to_string(),
        }
        .into();
        assert!(format!("{err}").starts_with("Notify error"));

        let err: SlotwatchError =
            std::io::Error::new(std::io::ErrorKind::AddrInUse, "address in use").into();
        assert!(matches!(err, SlotwatchError::Io(_)));
    }
}
