//! Typed events emitted by the completion dispatch path.

use crate::completion::CompletionEntry;
use crate::scope::ScopeId;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// An event describing one step of completion dispatch.
///
/// Events are consumed by event sinks for logging, monitoring, or test
/// assertions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchEvent {
    /// The event type (e.g., "completion.selected").
    #[serde(rename = "type")]
    pub event_type: String,

    /// When the event occurred (ISO 8601).
    pub timestamp: String,

    /// The event payload data.
    #[serde(default)]
    pub data: HashMap<String, serde_json::Value>,
}

impl DispatchEvent {
    /// Creates a new event.
    #[must_use]
    pub fn new(event_type: impl Into<String>) -> Self {
        Self {
            event_type: event_type.into(),
            timestamp: crate::utils::iso_timestamp(),
            data: HashMap::new(),
        }
    }

    /// Adds a data field to the event.
    #[must_use]
    pub fn add_data(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.data.insert(key.into(), value);
        self
    }

    /// Returns the event data as a JSON object, or `None` if empty.
    #[must_use]
    pub fn data_json(&self) -> Option<serde_json::Value> {
        if self.data.is_empty() {
            None
        } else {
            Some(serde_json::Value::Object(
                self.data.clone().into_iter().collect(),
            ))
        }
    }

    /// Creates an "exchange.completed" event.
    #[must_use]
    pub fn exchange_completed(exchange_id: Uuid) -> Self {
        Self::new("exchange.completed")
            .add_data("exchange_id", serde_json::json!(exchange_id.to_string()))
    }

    /// Creates an "exchange.failed" event.
    #[must_use]
    pub fn exchange_failed(exchange_id: Uuid, error: &str) -> Self {
        Self::new("exchange.failed")
            .add_data("exchange_id", serde_json::json!(exchange_id.to_string()))
            .add_data("error", serde_json::json!(error))
    }

    /// Creates a "completion.selected" event for a winning entry.
    #[must_use]
    pub fn selected(entry: &CompletionEntry) -> Self {
        Self::new("completion.selected")
            .add_data("scope", serde_json::json!(entry.scope.to_string()))
            .add_data("seq", serde_json::json!(entry.seq))
            .add_data("handler", serde_json::json!(entry.handler_name()))
    }

    /// Creates a "completion.suppressed" event: a scope claimed the
    /// notification but its effective entry's filter did not match.
    #[must_use]
    pub fn suppressed(scope: &ScopeId, seq: u64) -> Self {
        Self::new("completion.suppressed")
            .add_data("scope", serde_json::json!(scope.to_string()))
            .add_data("seq", serde_json::json!(seq))
    }

    /// Creates a "completion.no_handler" event.
    #[must_use]
    pub fn no_handler(exchange_id: Uuid) -> Self {
        Self::new("completion.no_handler")
            .add_data("exchange_id", serde_json::json!(exchange_id.to_string()))
    }

    /// Creates a "completion.handler_invoked" event.
    #[must_use]
    pub fn handler_invoked(entry: &CompletionEntry, exchange_id: Uuid) -> Self {
        Self::new("completion.handler_invoked")
            .add_data("handler", serde_json::json!(entry.handler_name()))
            .add_data("scope", serde_json::json!(entry.scope.to_string()))
            .add_data("exchange_id", serde_json::json!(exchange_id.to_string()))
    }

    /// Creates a "completion.handler_failed" event.
    #[must_use]
    pub fn handler_failed(entry: &CompletionEntry, exchange_id: Uuid, reason: &str) -> Self {
        Self::new("completion.handler_failed")
            .add_data("handler", serde_json::json!(entry.handler_name()))
            .add_data("scope", serde_json::json!(entry.scope.to_string()))
            .add_data("exchange_id", serde_json::json!(exchange_id.to_string()))
            .add_data("reason", serde_json::json!(reason))
    }
}
