//! Error types for the authorization layer
//!
//! Two families live here. [`AuthzError`] covers configuration faults that
//! must stop the process before it serves traffic. [`LookupFault`] is the
//! tagged failure of the external user store; the decision engine downgrades
//! every variant to a denial and never propagates it.

use thiserror::Error;

/// Authorization configuration errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthzError {
    /// A binding referenced a role name outside the hierarchy
    #[error("Unknown role: {0}")]
    UnknownRole(String),

    /// An operation declared more than one required role
    #[error("Operation '{0}' is already bound to a role")]
    DuplicateBinding(String),

    /// A binding override named an operation nobody registered
    #[error("Unknown operation: {0}")]
    UnknownOperation(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Store client could not be configured
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type for authorization operations
pub type Result<T> = std::result::Result<T, AuthzError>;

/// Failure modes of the external user-role lookup
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LookupFault {
    /// No user record for the identifier
    #[error("user not found")]
    NotFound,

    /// Network or upstream failure
    #[error("transport error: {0}")]
    Transport(String),

    /// Store answered with something that is not a single user record
    #[error("malformed response: {0}")]
    Malformed(String),

    /// Lookup exceeded the client's timeout
    #[error("lookup timed out")]
    Timeout,
}

impl LookupFault {
    /// Short label used as a structured log field and metric dimension
    pub fn kind(&self) -> &'static str {
        match self {
            LookupFault::NotFound => "not_found",
            LookupFault::Transport(_) => "transport",
            LookupFault::Malformed(_) => "malformed",
            LookupFault::Timeout => "timeout",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = AuthzError::UnknownRole("Owner".to_string());
        assert_eq!(err.to_string(), "Unknown role: Owner");

        let err = AuthzError::DuplicateBinding("admin-update".to_string());
        assert!(err.to_string().contains("admin-update"));
    }

    #[test]
    fn test_fault_kind() {
        assert_eq!(LookupFault::NotFound.kind(), "not_found");
        assert_eq!(LookupFault::Transport("reset".into()).kind(), "transport");
        assert_eq!(LookupFault::Malformed("[]".into()).kind(), "malformed");
        assert_eq!(LookupFault::Timeout.kind(), "timeout");
    }
}
