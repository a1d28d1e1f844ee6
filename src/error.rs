//! Error types for capdeck
//!
//! Uses thiserror for ergonomic error definitions. Capability errors follow
//! three kinds of failure: the capability is missing on this system, the
//! platform refused or failed the operation, or a precondition (such as a
//! notification permission) was not met before calling the platform.

use crate::capability::Capability;
use thiserror::Error;

/// Top-level error type for the capdeck application
#[derive(Error, Debug)]
pub enum CapdeckError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{0}")]
    Capability(#[from] CapabilityError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors returned by a single capability invocation.
///
/// All of these are terminal for the call that produced them; nothing is
/// retried.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CapabilityError {
    #[error("{0} is not supported on this system")]
    Unsupported(Capability),

    #[error("{capability} failed: {message}")]
    Platform {
        capability: Capability,
        message: String,
    },

    #[error("{0} requires permission first")]
    PermissionRequired(Capability),

    #[error("{0}")]
    Position(#[from] PositionError),
}

impl CapabilityError {
    /// Shorthand for a platform failure on `capability`
    pub fn platform(capability: Capability, message: impl Into<String>) -> Self {
        CapabilityError::Platform {
            capability,
            message: message.into(),
        }
    }

    /// The message shown to the user after the capability prefix is stripped.
    ///
    /// Alerts and inline errors embed this text verbatim.
    pub fn user_message(&self) -> String {
        match self {
            CapabilityError::Platform { message, .. } => message.clone(),
            CapabilityError::Position(e) => e.message().to_string(),
            other => other.to_string(),
        }
    }
}

/// Failure of a one-shot position request
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PositionError {
    #[error("{0}")]
    PermissionDenied(String),

    #[error("{0}")]
    PositionUnavailable(String),

    #[error("{0}")]
    Timeout(String),
}

impl PositionError {
    /// Platform-supplied message, without classification
    pub fn message(&self) -> &str {
        match self {
            PositionError::PermissionDenied(m)
            | PositionError::PositionUnavailable(m)
            | PositionError::Timeout(m) => m,
        }
    }
}

/// Result type alias using CapdeckError
pub type Result<T> = std::result::Result<T, CapdeckError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_message_strips_prefix() {
        let err = CapabilityError::platform(Capability::Clipboard, "access denied");
        assert_eq!(err.user_message(), "access denied");
        assert_eq!(err.to_string(), "clipboard failed: access denied");
    }

    #[test]
    fn test_position_message_is_verbatim() {
        let err: CapabilityError =
            PositionError::PermissionDenied("User denied Geolocation".to_string()).into();
        assert_eq!(err.user_message(), "User denied Geolocation");
    }
}
