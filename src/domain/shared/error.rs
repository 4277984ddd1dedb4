//! Domain errors

use thiserror::Error;

/// Domain result type
pub type Result<T> = std::result::Result<T, DomainError>;

#[derive(Error, Debug, Clone)]
pub enum DomainError {
    #[error("Invalid state transition: {0}")]
    InvalidStateTransition(String),

    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    #[error("Upstream service error: {0}")]
    Upstream(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = DomainError::InvalidStateTransition("Active to Started".to_string());
        assert_eq!(err.to_string(), "Invalid state transition: Active to Started");

        let err = DomainError::Upstream("503".to_string());
        assert_eq!(err.to_string(), "Upstream service error: 503");
    }
}
