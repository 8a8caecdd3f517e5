//! The unit of in-flight work: a message plus its processing state.

mod state;

pub use state::ExchangeState;

use crate::errors::RouteflowError;
use crate::utils::{generate_uuid, iso_timestamp};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// A single in-flight message and its processing state through a pipeline.
///
/// Created when a message enters the pipeline, mutated by pipeline stages,
/// and handed to the completion dispatcher once it reaches a terminal state.
/// The terminal state is set exactly once; a second transition is an error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Exchange {
    /// The unique exchange id.
    pub id: Uuid,

    /// The message payload.
    pub payload: serde_json::Value,

    /// Message headers.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub headers: HashMap<String, serde_json::Value>,

    /// The processing state.
    pub state: ExchangeState,

    /// The error carried by a failed exchange.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// When the exchange entered the pipeline (ISO 8601).
    pub created_at: String,

    /// Set on handler-derived copies: the dispatcher ignores termination
    /// events for such exchanges.
    #[serde(skip)]
    suppress_completions: bool,

    /// Set once the dispatcher has processed this exchange's termination.
    #[serde(skip)]
    notified: bool,
}

impl Exchange {
    /// Creates a new in-progress exchange carrying the given payload.
    #[must_use]
    pub fn new(payload: serde_json::Value) -> Self {
        Self {
            id: generate_uuid(),
            payload,
            headers: HashMap::new(),
            state: ExchangeState::InProgress,
            error: None,
            created_at: iso_timestamp(),
            suppress_completions: false,
            notified: false,
        }
    }

    /// Adds a header to the exchange.
    #[must_use]
    pub fn with_header(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.headers.insert(key.into(), value);
        self
    }

    /// Marks the exchange as completed.
    ///
    /// # Errors
    ///
    /// Returns [`RouteflowError::AlreadyTerminal`] if the exchange already
    /// reached a terminal state.
    pub fn complete(&mut self) -> Result<(), RouteflowError> {
        self.transition(ExchangeState::Completed, None)
    }

    /// Marks the exchange as failed with the given reason.
    ///
    /// # Errors
    ///
    /// Returns [`RouteflowError::AlreadyTerminal`] if the exchange already
    /// reached a terminal state.
    pub fn fail(&mut self, reason: impl Into<String>) -> Result<(), RouteflowError> {
        self.transition(ExchangeState::Failed, Some(reason.into()))
    }

    fn transition(
        &mut self,
        state: ExchangeState,
        error: Option<String>,
    ) -> Result<(), RouteflowError> {
        if self.state.is_terminal() {
            return Err(RouteflowError::AlreadyTerminal {
                exchange_id: self.id,
                state: self.state,
            });
        }
        self.state = state;
        self.error = error;
        Ok(())
    }

    /// Derives the copy handed to a completion handler.
    ///
    /// The copy shares the original's id, payload, and terminal state, but
    /// suppresses completion notifications: mutations inside the handler
    /// never alter the original exchange, and the copy's own termination
    /// cannot re-enter the dispatcher.
    #[must_use]
    pub fn fork_for_handler(&self) -> Self {
        Self {
            suppress_completions: true,
            notified: false,
            ..self.clone()
        }
    }

    /// Returns true if completion notifications are suppressed for this
    /// exchange (it is a handler-derived copy).
    #[must_use]
    pub fn suppresses_completions(&self) -> bool {
        self.suppress_completions
    }

    /// Marks the exchange's termination as notified.
    ///
    /// Returns false if it was already marked, in which case the caller must
    /// not dispatch again.
    pub fn mark_notified(&mut self) -> bool {
        if self.notified {
            return false;
        }
        self.notified = true;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exchange_starts_in_progress() {
        let exchange = Exchange::new(serde_json::json!("hello"));
        assert_eq!(exchange.state, ExchangeState::InProgress);
        assert!(exchange.error.is_none());
        assert!(!exchange.suppresses_completions());
    }

    #[test]
    fn test_complete_transition() {
        let mut exchange = Exchange::new(serde_json::json!("hello"));
        exchange.complete().unwrap();
        assert_eq!(exchange.state, ExchangeState::Completed);
        assert!(exchange.error.is_none());
    }

    #[test]
    fn test_fail_transition_carries_error() {
        let mut exchange = Exchange::new(serde_json::json!("hello"));
        exchange.fail("boom").unwrap();
        assert_eq!(exchange.state, ExchangeState::Failed);
        assert_eq!(exchange.error, Some("boom".to_string()));
    }

    #[test]
    fn test_terminal_state_set_exactly_once() {
        let mut exchange = Exchange::new(serde_json::json!("hello"));
        exchange.complete().unwrap();

        let err = exchange.fail("too late").unwrap_err();
        assert!(matches!(err, RouteflowError::AlreadyTerminal { .. }));
        assert_eq!(exchange.state, ExchangeState::Completed);
    }

    #[test]
    fn test_fork_for_handler_suppresses_completions() {
        let mut exchange = Exchange::new(serde_json::json!("payload"));
        exchange.fail("boom").unwrap();

        let fork = exchange.fork_for_handler();
        assert_eq!(fork.id, exchange.id);
        assert_eq!(fork.payload, exchange.payload);
        assert_eq!(fork.state, ExchangeState::Failed);
        assert!(fork.suppresses_completions());
        assert!(!exchange.suppresses_completions());
    }

    #[test]
    fn test_fork_mutations_do_not_alter_original() {
        let mut exchange = Exchange::new(serde_json::json!("original"));
        exchange.complete().unwrap();

        let mut fork = exchange.fork_for_handler();
        fork.payload = serde_json::json!("mutated");

        assert_eq!(exchange.payload, serde_json::json!("original"));
    }

    #[test]
    fn test_mark_notified_once() {
        let mut exchange = Exchange::new(serde_json::json!("x"));
        assert!(exchange.mark_notified());
        assert!(!exchange.mark_notified());
    }

    #[test]
    fn test_exchange_serialization() {
        let exchange = Exchange::new(serde_json::json!("hello"))
            .with_header("origin", serde_json::json!("direct:in"));
        let json = serde_json::to_string(&exchange).unwrap();
        let deserialized: Exchange = serde_json::from_str(&json).unwrap();

        assert_eq!(exchange.id, deserialized.id);
        assert_eq!(exchange.payload, deserialized.payload);
        assert_eq!(
            deserialized.headers.get("origin"),
            Some(&serde_json::json!("direct:in"))
        );
    }
}
