//! Error types for the finance tracker service

use axum::http::StatusCode;
use thiserror::Error;

/// Result type alias for tracker operations
pub type Result<T> = std::result::Result<T, TrackerError>;

#[derive(Error, Debug)]
pub enum TrackerError {

    // =============================
    // Request Errors
    // =============================

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    // =============================
    // Service Errors
    // =============================

    #[error("Store error: {0}")]
    StoreError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    // =============================
    // External Library Conversions
    // =============================

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl TrackerError {
    /// HTTP status this error is reported with
    pub fn status_code(&self) -> StatusCode {
        match self {
            TrackerError::Unauthorized => StatusCode::UNAUTHORIZED,
            TrackerError::Forbidden(_) => StatusCode::FORBIDDEN,
            TrackerError::NotFound(_) => StatusCode::NOT_FOUND,
            TrackerError::InvalidInput(_) | TrackerError::SerializationError(_) => {
                StatusCode::BAD_REQUEST
            }
            TrackerError::StoreError(_)
            | TrackerError::ConfigError(_)
            | TrackerError::IoError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to hand back to a client
    pub fn public_message(&self) -> String {
        match self {
            TrackerError::Unauthorized => "Unauthorized".to_string(),
            TrackerError::Forbidden(_) => "Forbidden".to_string(),
            TrackerError::NotFound(what) => format!("{} not found", what),
            TrackerError::InvalidInput(msg) => msg.clone(),
            TrackerError::SerializationError(e) => format!("Invalid JSON body: {}", e),
            _ => "Internal server error".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(TrackerError::Unauthorized.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            TrackerError::Forbidden("staff only".into()).status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            TrackerError::NotFound("Goal".into()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            TrackerError::StoreError("poisoned".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_internal_details_are_hidden() {
        let err = TrackerError::StoreError("lock poisoned at shard 3".into());
        assert_eq!(err.public_message(), "Internal server error");
        assert_eq!(TrackerError::NotFound("Goal".into()).public_message(), "Goal not found");
    }
}
