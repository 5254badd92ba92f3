//! Core error types for SANCTION.

use std::fmt;

/// Core result type
pub type CoreResult<T> = Result<T, CoreError>;

/// Core error type
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// Invalid encoding
    InvalidEncoding { reason: String },

    /// Invalid identifier (object, action, check or hook name)
    InvalidIdentifier { kind: String, value: String },

    /// Validation error
    Validation { field: String, reason: String },

    /// Not found
    NotFound { kind: String, id: String },

    /// Permission denied
    PermissionDenied {
        /// Configured denial reason
        reason: String,
    },

    /// Internal error (for unexpected errors)
    Internal {
        /// Error message
        message: String,
    },
}

impl fmt::Display for CoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidEncoding { reason } => write!(f, "Invalid encoding: {}", reason),
            Self::InvalidIdentifier { kind, value } => {
                write!(f, "Invalid {} identifier: {:?}", kind, value)
            }
            Self::Validation { field, reason } => {
                write!(f, "Validation failed for {}: {}", field, reason)
            }
            Self::NotFound { kind, id } => write!(f, "{} not found: {}", kind, id),
            Self::PermissionDenied { reason } => write!(f, "Permission denied: {}", reason),
            Self::Internal { message } => write!(f, "Internal error: {}", message),
        }
    }
}

impl std::error::Error for CoreError {}

impl From<serde_json::Error> for CoreError {
    fn from(err: serde_json::Error) -> Self {
        Self::InvalidEncoding {
            reason: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = CoreError::NotFound {
            kind: "Rule".to_string(),
            id: "article_update".to_string(),
        };
        assert_eq!(format!("{}", err), "Rule not found: article_update");

        let err = CoreError::PermissionDenied {
            reason: "unauthorized".to_string(),
        };
        assert_eq!(format!("{}", err), "Permission denied: unauthorized");
    }

    #[test]
    fn test_invalid_identifier_error() {
        let err = CoreError::InvalidIdentifier {
            kind: "object".to_string(),
            value: "bad name".to_string(),
        };
        let s = format!("{}", err);
        assert!(s.contains("object"));
        assert!(s.contains("bad name"));
    }

    #[test]
    fn test_from_json_error() {
        let err = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let core: CoreError = err.into();
        assert!(matches!(core, CoreError::InvalidEncoding { .. }));
    }

    #[test]
    fn test_error_equality() {
        let err1 = CoreError::Internal {
            message: "x".to_string(),
        };
        let err2 = CoreError::Internal {
            message: "x".to_string(),
        };
        assert_eq!(err1, err2);
    }
}
