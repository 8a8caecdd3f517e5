//! Exchange processing state.

use crate::completion::TriggerKind;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The processing state of an exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExchangeState {
    /// The exchange is still traversing the pipeline.
    InProgress,
    /// The exchange completed without error.
    Completed,
    /// The exchange terminated with an unhandled failure.
    Failed,
}

impl Default for ExchangeState {
    fn default() -> Self {
        Self::InProgress
    }
}

impl fmt::Display for ExchangeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InProgress => write!(f, "in_progress"),
            Self::Completed => write!(f, "completed"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

impl ExchangeState {
    /// Returns true if the state is terminal.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    /// Returns true if the state indicates failure.
    #[must_use]
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed)
    }

    /// Classifies a terminal state as a completion trigger, or `None` while
    /// the exchange is still in progress.
    #[must_use]
    pub fn trigger_kind(&self) -> Option<TriggerKind> {
        match self {
            Self::InProgress => None,
            Self::Completed => Some(TriggerKind::Completed),
            Self::Failed => Some(TriggerKind::Failed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_display() {
        assert_eq!(ExchangeState::InProgress.to_string(), "in_progress");
        assert_eq!(ExchangeState::Completed.to_string(), "completed");
        assert_eq!(ExchangeState::Failed.to_string(), "failed");
    }

    #[test]
    fn test_state_is_terminal() {
        assert!(!ExchangeState::InProgress.is_terminal());
        assert!(ExchangeState::Completed.is_terminal());
        assert!(ExchangeState::Failed.is_terminal());
    }

    #[test]
    fn test_trigger_classification() {
        assert_eq!(ExchangeState::InProgress.trigger_kind(), None);
        assert_eq!(
            ExchangeState::Completed.trigger_kind(),
            Some(TriggerKind::Completed)
        );
        assert_eq!(
            ExchangeState::Failed.trigger_kind(),
            Some(TriggerKind::Failed)
        );
    }

    #[test]
    fn test_state_serialize() {
        let json = serde_json::to_string(&ExchangeState::Completed).unwrap();
        assert_eq!(json, r#""completed""#);

        let deserialized: ExchangeState = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized, ExchangeState::Completed);
    }
}
