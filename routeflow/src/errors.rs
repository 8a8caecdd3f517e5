//! Error types for the routeflow completion subsystem.
//!
//! Handler failures are terminal for the handler invocation only: they are
//! caught at the invoker boundary and never re-enter the dispatch path.

use crate::exchange::ExchangeState;
use crate::scope::ScopeId;
use thiserror::Error;
use uuid::Uuid;

/// The main error type for routeflow operations.
#[derive(Debug, Error)]
pub enum RouteflowError {
    /// A completion registration conflict was rejected in strict mode.
    #[error("{0}")]
    RegistrationConflict(#[from] RegistrationConflictError),

    /// A selected handler's sub-pipeline failed.
    #[error("{0}")]
    HandlerExecution(#[from] HandlerExecutionError),

    /// Configuration validation failed.
    #[error("{0}")]
    ConfigValidation(#[from] ConfigValidationError),

    /// A terminal transition was applied to an already-terminal exchange.
    #[error("exchange {exchange_id} is already in terminal state '{state}'")]
    AlreadyTerminal {
        /// The exchange id.
        exchange_id: Uuid,
        /// The terminal state the exchange already carries.
        state: ExchangeState,
    },

    /// A generic internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Error raised in strict mode when two entries in the same scope could both
/// respond to the same trigger.
///
/// The default (lenient) policy resolves the ambiguity positionally instead:
/// last-defined wins in a route-local scope, first-defined wins globally.
#[derive(Debug, Clone, Error)]
#[error(
    "completion entry {incoming_seq} in scope '{scope}' overlaps entry {existing_seq} for the same trigger"
)]
pub struct RegistrationConflictError {
    /// The scope holding both entries.
    pub scope: ScopeId,
    /// Sequence number of the previously registered entry.
    pub existing_seq: u64,
    /// Sequence number of the rejected entry.
    pub incoming_seq: u64,
}

impl RegistrationConflictError {
    /// Creates a new registration conflict error.
    #[must_use]
    pub fn new(scope: ScopeId, existing_seq: u64, incoming_seq: u64) -> Self {
        Self {
            scope,
            existing_seq,
            incoming_seq,
        }
    }
}

/// Error raised when a selected handler's sub-pipeline fails.
///
/// Caught at the [`HandlerInvoker`](crate::completion::HandlerInvoker)
/// boundary and surfaced to the event sink and log; never propagated back
/// into the dispatcher or the original exchange's termination path.
#[derive(Debug, Clone, Error)]
#[error("completion handler '{handler}' (scope '{scope}') failed for exchange {exchange_id}: {reason}")]
pub struct HandlerExecutionError {
    /// The failing handler's name.
    pub handler: String,
    /// The scope owning the selected entry.
    pub scope: ScopeId,
    /// The triggering exchange id.
    pub exchange_id: Uuid,
    /// The failure reason.
    pub reason: String,
}

impl HandlerExecutionError {
    /// Creates a new handler execution error.
    #[must_use]
    pub fn new(
        handler: impl Into<String>,
        scope: ScopeId,
        exchange_id: Uuid,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            handler: handler.into(),
            scope,
            exchange_id,
            reason: reason.into(),
        }
    }
}

/// Error raised when completion configuration fails validation.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct ConfigValidationError {
    /// The error message.
    pub message: String,
    /// The scopes involved in the error.
    pub scopes: Vec<String>,
}

impl ConfigValidationError {
    /// Creates a new configuration validation error.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            scopes: Vec::new(),
        }
    }

    /// Sets the scopes involved.
    #[must_use]
    pub fn with_scopes(mut self, scopes: Vec<String>) -> Self {
        self.scopes = scopes;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registration_conflict_display() {
        let err = RegistrationConflictError::new(ScopeId::new("route-a"), 0, 1);
        assert!(err.to_string().contains("route-a"));
        assert!(err.to_string().contains("overlaps entry 0"));
    }

    #[test]
    fn test_handler_execution_error_display() {
        let err = HandlerExecutionError::new(
            "notify-ops",
            ScopeId::new("global"),
            Uuid::new_v4(),
            "connection refused",
        );
        assert!(err.to_string().contains("notify-ops"));
        assert!(err.to_string().contains("connection refused"));
    }

    #[test]
    fn test_config_validation_error_scopes() {
        let err = ConfigValidationError::new("duplicate scope")
            .with_scopes(vec!["route-a".to_string()]);
        assert_eq!(err.scopes, vec!["route-a".to_string()]);
    }

    #[test]
    fn test_error_conversion() {
        let conflict = RegistrationConflictError::new(ScopeId::new("s"), 0, 1);
        let top: RouteflowError = conflict.into();
        assert!(matches!(top, RouteflowError::RegistrationConflict(_)));
    }
}
