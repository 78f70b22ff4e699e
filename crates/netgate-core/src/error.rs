// ── Core error types ──
//
// Domain errors raised by the stores, the matcher and the controller.
// The HTTP layer maps each variant onto a status code and surfaces the
// display string as the `detail` message; nothing here knows about HTTP.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    // ── Input errors ─────────────────────────────────────────────────
    #[error("Validation failed: {message}")]
    Validation { message: String },

    #[error("{entity_type} not found: {identifier}")]
    NotFound {
        entity_type: &'static str,
        identifier: String,
    },

    #[error("Conflict: {message}")]
    Conflict { message: String },

    // ── Access errors ────────────────────────────────────────────────
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    #[error("Permission denied: {message}")]
    PermissionDenied { message: String },

    // ── Operation errors ─────────────────────────────────────────────
    #[error("Operation not supported: {operation}")]
    Unsupported { operation: String },

    #[error("Controller is not running")]
    Unavailable,

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub(crate) fn not_found(entity_type: &'static str, identifier: impl ToString) -> Self {
        Self::NotFound {
            entity_type,
            identifier: identifier.to_string(),
        }
    }

    pub(crate) fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
        }
    }

    /// Returns `true` for errors caused by the caller's input rather than
    /// by the gateway itself.
    pub fn is_client_error(&self) -> bool {
        !matches!(self, Self::Unavailable | Self::Internal(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_display_names_entity() {
        let err = CoreError::not_found("Rule", "abc");
        assert_eq!(err.to_string(), "Rule not found: abc");
    }

    #[test]
    fn internal_is_not_client_error() {
        assert!(!CoreError::Internal("boom".into()).is_client_error());
        assert!(CoreError::validation("bad").is_client_error());
    }
}
