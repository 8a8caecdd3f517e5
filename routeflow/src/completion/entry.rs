//! Trigger classification and registered completion entries.

use crate::handler::CompletionHandler;
use crate::scope::ScopeId;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Classification of a terminal exchange state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerKind {
    /// The exchange completed without error.
    Completed,
    /// The exchange terminated with an unhandled failure.
    Failed,
}

impl fmt::Display for TriggerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Completed => write!(f, "completed"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// Which terminal states a completion entry responds to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerFilter {
    /// Respond only to successful completion.
    OnCompleteOnly,
    /// Respond only to failure.
    OnFailureOnly,
    /// Respond to both terminal states.
    Both,
}

impl fmt::Display for TriggerFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OnCompleteOnly => write!(f, "on_complete_only"),
            Self::OnFailureOnly => write!(f, "on_failure_only"),
            Self::Both => write!(f, "both"),
        }
    }
}

impl TriggerFilter {
    /// Returns true if the filter responds to the given trigger.
    #[must_use]
    pub fn matches(&self, kind: TriggerKind) -> bool {
        match self {
            Self::OnCompleteOnly => kind == TriggerKind::Completed,
            Self::OnFailureOnly => kind == TriggerKind::Failed,
            Self::Both => true,
        }
    }

    /// Returns true if two filters could both respond to some trigger.
    #[must_use]
    pub fn overlaps(&self, other: TriggerFilter) -> bool {
        [TriggerKind::Completed, TriggerKind::Failed]
            .into_iter()
            .any(|kind| self.matches(kind) && other.matches(kind))
    }
}

/// A completion handler registered against a scope.
///
/// Multiple entries may exist per scope; the sequence number records
/// declaration order, which drives the scope's conflict-resolution policy.
#[derive(Clone)]
pub struct CompletionEntry {
    /// The owning scope.
    pub scope: ScopeId,
    /// Which terminal states the entry responds to.
    pub filter: TriggerFilter,
    /// The handler sub-pipeline.
    pub handler: Arc<dyn CompletionHandler>,
    /// Declaration-order sequence number within the owning scope.
    pub seq: u64,
}

impl CompletionEntry {
    /// Creates a new completion entry.
    #[must_use]
    pub fn new(
        scope: ScopeId,
        filter: TriggerFilter,
        handler: Arc<dyn CompletionHandler>,
        seq: u64,
    ) -> Self {
        Self {
            scope,
            filter,
            handler,
            seq,
        }
    }

    /// Returns the handler's name.
    #[must_use]
    pub fn handler_name(&self) -> &str {
        self.handler.name()
    }
}

impl fmt::Debug for CompletionEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompletionEntry")
            .field("scope", &self.scope)
            .field("filter", &self.filter)
            .field("handler", &self.handler.name())
            .field("seq", &self.seq)
            .finish()
    }
}
