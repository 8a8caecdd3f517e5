//! Configuration-load-time registration of scopes and completion entries.
//!
//! Replaces dynamic route configuration with an explicit builder: scope ids,
//! scope kinds, trigger filters, and handler pipelines are declared in a
//! deterministic load order that assigns sequence numbers.

use crate::completion::{CompletionRegistry, RegistryMode, TriggerFilter};
use crate::errors::{ConfigValidationError, RouteflowError};
use crate::handler::CompletionHandler;
use crate::scope::{ScopeId, ScopeKind, ScopeTree};
use std::sync::Arc;

/// Default identifier of the global scope.
pub const GLOBAL_SCOPE_ID: &str = "global";

/// Immutable completion configuration: the scope tree plus the registry.
///
/// Built once at load time; shared read-only across all exchanges.
#[derive(Debug)]
pub struct CompletionConfig {
    scopes: ScopeTree,
    registry: CompletionRegistry,
}

impl CompletionConfig {
    /// Creates a new configuration builder.
    #[must_use]
    pub fn builder() -> CompletionConfigBuilder {
        CompletionConfigBuilder::new()
    }

    /// Returns the scope tree.
    #[must_use]
    pub fn scopes(&self) -> &ScopeTree {
        &self.scopes
    }

    /// Returns the completion registry.
    #[must_use]
    pub fn registry(&self) -> &CompletionRegistry {
        &self.registry
    }
}

/// Builder assembling scopes and completion entries in declaration order.
pub struct CompletionConfigBuilder {
    global_id: ScopeId,
    scope_defs: Vec<(ScopeId, Option<ScopeId>)>,
    entry_defs: Vec<(ScopeId, TriggerFilter, Arc<dyn CompletionHandler>)>,
    mode: RegistryMode,
}

impl CompletionConfigBuilder {
    /// Creates an empty builder with the default global scope id.
    #[must_use]
    pub fn new() -> Self {
        Self {
            global_id: ScopeId::new(GLOBAL_SCOPE_ID),
            scope_defs: Vec::new(),
            entry_defs: Vec::new(),
            mode: RegistryMode::Lenient,
        }
    }

    /// Overrides the global scope id.
    #[must_use]
    pub fn global_scope_id(mut self, id: impl Into<ScopeId>) -> Self {
        self.global_id = id.into();
        self
    }

    /// Declares a route-local scope directly under the global scope.
    #[must_use]
    pub fn route_scope(mut self, id: impl Into<ScopeId>) -> Self {
        self.scope_defs.push((id.into(), None));
        self
    }

    /// Declares a route-local scope nested inside another route scope.
    #[must_use]
    pub fn nested_scope(mut self, id: impl Into<ScopeId>, parent: impl Into<ScopeId>) -> Self {
        self.scope_defs.push((id.into(), Some(parent.into())));
        self
    }

    /// Registers a completion handler against a declared scope, in
    /// declaration order.
    #[must_use]
    pub fn on_completion(
        mut self,
        scope: impl Into<ScopeId>,
        filter: TriggerFilter,
        handler: Arc<dyn CompletionHandler>,
    ) -> Self {
        self.entry_defs.push((scope.into(), filter, handler));
        self
    }

    /// Registers a completion handler against the global scope.
    #[must_use]
    pub fn on_global_completion(
        mut self,
        filter: TriggerFilter,
        handler: Arc<dyn CompletionHandler>,
    ) -> Self {
        let global = self.global_id.clone();
        self.entry_defs.push((global, filter, handler));
        self
    }

    /// Rejects overlapping same-scope registrations instead of resolving
    /// them positionally.
    #[must_use]
    pub fn strict(mut self) -> Self {
        self.mode = RegistryMode::Strict;
        self
    }

    /// Validates the declarations and freezes the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error for duplicate or unknown scope references, or for a
    /// registration conflict in strict mode.
    pub fn build(self) -> Result<CompletionConfig, RouteflowError> {
        let Self {
            global_id,
            scope_defs,
            entry_defs,
            mode,
        } = self;

        let mut scopes = ScopeTree::new(global_id.clone());
        for (id, parent) in scope_defs {
            let parent = parent.unwrap_or_else(|| global_id.clone());
            scopes.insert(id, ScopeKind::RouteLocal, parent)?;
        }

        let mut registry = CompletionRegistry::with_mode(mode);
        for (scope, filter, handler) in entry_defs {
            if !scopes.contains(&scope) {
                return Err(ConfigValidationError::new(format!(
                    "completion entry registered against undeclared scope '{scope}'"
                ))
                .with_scopes(vec![scope.to_string()])
                .into());
            }
            registry.register(scope, filter, handler)?;
        }

        Ok(CompletionConfig { scopes, registry })
    }
}

impl Default for CompletionConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::NoOpHandler;

    fn noop() -> Arc<dyn CompletionHandler> {
        Arc::new(NoOpHandler::new("noop"))
    }

    #[test]
    fn test_empty_config_builds() {
        let config = CompletionConfig::builder().build().unwrap();
        assert_eq!(config.scopes().root().as_str(), GLOBAL_SCOPE_ID);
        assert!(config.registry().is_empty());
    }

    #[test]
    fn test_declaration_order_assigns_seq() {
        let config = CompletionConfig::builder()
            .route_scope("route-a")
            .on_completion("route-a", TriggerFilter::OnCompleteOnly, noop())
            .on_completion("route-a", TriggerFilter::OnFailureOnly, noop())
            .build()
            .unwrap();

        let entries = config.registry().entries_for(&ScopeId::new("route-a"));
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].seq, 0);
        assert_eq!(entries[0].filter, TriggerFilter::OnCompleteOnly);
        assert_eq!(entries[1].seq, 1);
        assert_eq!(entries[1].filter, TriggerFilter::OnFailureOnly);
    }

    #[test]
    fn test_nested_scope_parent_link() {
        let config = CompletionConfig::builder()
            .route_scope("outer")
            .nested_scope("inner", "outer")
            .build()
            .unwrap();

        let node = config.scopes().get(&ScopeId::new("inner")).unwrap();
        assert_eq!(node.parent, Some(ScopeId::new("outer")));
    }

    #[test]
    fn test_entry_against_undeclared_scope_rejected() {
        let err = CompletionConfig::builder()
            .on_completion("ghost", TriggerFilter::Both, noop())
            .build()
            .unwrap_err();
        assert!(matches!(err, RouteflowError::ConfigValidation(_)));
    }

    #[test]
    fn test_duplicate_scope_rejected() {
        let err = CompletionConfig::builder()
            .route_scope("route-a")
            .route_scope("route-a")
            .build()
            .unwrap_err();
        assert!(matches!(err, RouteflowError::ConfigValidation(_)));
    }

    #[test]
    fn test_strict_mode_surfaces_conflict() {
        let err = CompletionConfig::builder()
            .strict()
            .route_scope("route-a")
            .on_completion("route-a", TriggerFilter::Both, noop())
            .on_completion("route-a", TriggerFilter::OnFailureOnly, noop())
            .build()
            .unwrap_err();
        assert!(matches!(err, RouteflowError::RegistrationConflict(_)));
    }

    #[test]
    fn test_custom_global_scope_id() {
        let config = CompletionConfig::builder()
            .global_scope_id("context")
            .on_global_completion(TriggerFilter::Both, noop())
            .build()
            .unwrap();

        assert_eq!(config.scopes().root().as_str(), "context");
        assert!(config.registry().has_entries(&ScopeId::new("context")));
    }
}
