//! Unified error type for the domain layer.

use thiserror::Error;

/// Unified error type for domain operations
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Validation failed (e.g., a value outside its allowed range)
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Parse error (for value objects and enum domains)
    #[error("Parse error: {0}")]
    Parse(String),

    /// Business rule violation
    #[error("Constraint violation: {0}")]
    Constraint(String),

    /// State transition not allowed
    #[error("Invalid state transition: {0}")]
    InvalidStateTransition(String),
}

impl DomainError {
    /// Creates a validation error for values outside their allowed domain.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Creates a parse error for string-to-type conversion failures.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }

    /// Create a constraint violation error
    pub fn constraint(msg: impl Into<String>) -> Self {
        Self::Constraint(msg.into())
    }

    /// Create an invalid state transition error
    pub fn invalid_state_transition(msg: impl Into<String>) -> Self {
        Self::InvalidStateTransition(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error() {
        let err = DomainError::validation("x must be within 0..=100");
        assert!(matches!(err, DomainError::Validation(_)));
        assert_eq!(err.to_string(), "Validation failed: x must be within 0..=100");
    }

    #[test]
    fn test_parse_error() {
        let err = DomainError::parse("unknown accessory: 'crown'");
        assert!(matches!(err, DomainError::Parse(_)));
        assert!(err.to_string().contains("crown"));
    }
}
