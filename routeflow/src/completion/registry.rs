//! Per-scope storage of registered completion entries.

use super::{CompletionEntry, TriggerFilter, TriggerKind};
use crate::errors::RegistrationConflictError;
use crate::handler::CompletionHandler;
use crate::scope::{ScopeId, ScopeKind};
use std::collections::HashMap;
use std::sync::Arc;

/// Conflict policy applied when entries in one scope overlap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RegistryMode {
    /// Overlapping entries are resolved by the scope's positional policy.
    #[default]
    Lenient,
    /// Overlapping entries are rejected at registration time.
    Strict,
}

/// Process-wide store of completion entries, keyed by owning scope.
///
/// Populated at configuration-load time and read-only afterwards, so
/// concurrent reads during dispatch need no synchronization.
#[derive(Debug, Default)]
pub struct CompletionRegistry {
    entries: HashMap<ScopeId, Vec<CompletionEntry>>,
    mode: RegistryMode,
}

impl CompletionRegistry {
    /// Creates an empty registry with the lenient conflict policy.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty registry with the given conflict policy.
    #[must_use]
    pub fn with_mode(mode: RegistryMode) -> Self {
        Self {
            entries: HashMap::new(),
            mode,
        }
    }

    /// Registers a handler against a scope, assigning the scope's next
    /// declaration-order sequence number.
    ///
    /// # Errors
    ///
    /// In strict mode, returns [`RegistrationConflictError`] if an existing
    /// entry in the same scope could respond to the same trigger.
    pub fn register(
        &mut self,
        scope: ScopeId,
        filter: TriggerFilter,
        handler: Arc<dyn CompletionHandler>,
    ) -> Result<u64, RegistrationConflictError> {
        let slot = self.entries.entry(scope.clone()).or_default();
        let seq = slot.len() as u64;
        if self.mode == RegistryMode::Strict {
            if let Some(existing) = slot.iter().find(|entry| entry.filter.overlaps(filter)) {
                return Err(RegistrationConflictError::new(scope, existing.seq, seq));
            }
        }
        slot.push(CompletionEntry::new(scope, filter, handler, seq));
        Ok(seq)
    }

    /// Returns the entries registered in a scope, in declaration order.
    #[must_use]
    pub fn entries_for(&self, scope: &ScopeId) -> &[CompletionEntry] {
        self.entries.get(scope).map_or(&[], Vec::as_slice)
    }

    /// Returns the entries in a scope matching a trigger, declaration order
    /// preserved.
    #[must_use]
    pub fn matching_entries(&self, scope: &ScopeId, kind: TriggerKind) -> Vec<&CompletionEntry> {
        self.entries_for(scope)
            .iter()
            .filter(|entry| entry.filter.matches(kind))
            .collect()
    }

    /// Returns true if the scope has at least one registered entry.
    #[must_use]
    pub fn has_entries(&self, scope: &ScopeId) -> bool {
        !self.entries_for(scope).is_empty()
    }

    /// Returns the single entry a scope's positional policy honors, if the
    /// scope has any entries.
    ///
    /// Route-local scopes honor the LAST-defined entry; the global scope
    /// honors the FIRST-defined entry. The asymmetry is the documented
    /// contract, not an accident of implementation.
    #[must_use]
    pub fn effective_entry(&self, scope: &ScopeId, kind: ScopeKind) -> Option<&CompletionEntry> {
        let entries = self.entries.get(scope)?;
        match kind {
            ScopeKind::RouteLocal => entries.last(),
            ScopeKind::Global => entries.first(),
        }
    }

    /// Returns the total number of registered entries across all scopes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }

    /// Returns true if no entry is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.values().all(Vec::is_empty)
    }
}
