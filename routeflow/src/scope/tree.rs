//! Immutable scope tree built at configuration-load time.

use crate::errors::ConfigValidationError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Identifier for a declared scope.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScopeId(String);

impl ScopeId {
    /// Creates a new scope id.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ScopeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ScopeId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for ScopeId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// The nesting level at which completion handlers are declared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScopeKind {
    /// The single process-global scope at the root of the tree.
    Global,
    /// A route-local scope nested under the global scope.
    RouteLocal,
}

impl fmt::Display for ScopeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Global => write!(f, "global"),
            Self::RouteLocal => write!(f, "route_local"),
        }
    }
}

impl ScopeKind {
    /// Returns true for the global scope kind.
    #[must_use]
    pub fn is_global(&self) -> bool {
        matches!(self, Self::Global)
    }

    /// Returns true for the route-local scope kind.
    #[must_use]
    pub fn is_route_local(&self) -> bool {
        matches!(self, Self::RouteLocal)
    }
}

/// A single node in the scope tree. Immutable after construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScopeNode {
    /// The scope's identifier.
    pub id: ScopeId,
    /// The scope's kind.
    pub kind: ScopeKind,
    /// The parent scope, if any. Only the global root has none.
    pub parent: Option<ScopeId>,
}

/// Arena of immutable scope nodes, rooted at the single global scope.
///
/// Built once at configuration-load time; runtime traversal only walks
/// ancestor links, never mutates the tree.
#[derive(Debug, Clone)]
pub struct ScopeTree {
    root: ScopeId,
    nodes: HashMap<ScopeId, ScopeNode>,
}

impl ScopeTree {
    /// Creates a tree containing only the global root scope.
    #[must_use]
    pub fn new(root: impl Into<ScopeId>) -> Self {
        let root = root.into();
        let mut nodes = HashMap::new();
        nodes.insert(
            root.clone(),
            ScopeNode {
                id: root.clone(),
                kind: ScopeKind::Global,
                parent: None,
            },
        );
        Self { root, nodes }
    }

    /// Inserts a route-local scope under the given parent.
    ///
    /// # Errors
    ///
    /// Returns an error for a duplicate scope id, an unknown parent, or an
    /// attempt to declare a second global scope.
    pub fn insert(
        &mut self,
        id: ScopeId,
        kind: ScopeKind,
        parent: ScopeId,
    ) -> Result<(), ConfigValidationError> {
        if kind.is_global() {
            return Err(ConfigValidationError::new(format!(
                "scope '{id}' declared global: only the root scope '{}' may be global",
                self.root
            ))
            .with_scopes(vec![id.to_string()]));
        }
        if self.nodes.contains_key(&id) {
            return Err(
                ConfigValidationError::new(format!("duplicate scope id '{id}'"))
                    .with_scopes(vec![id.to_string()]),
            );
        }
        if !self.nodes.contains_key(&parent) {
            return Err(ConfigValidationError::new(format!(
                "scope '{id}' references unknown parent '{parent}'"
            ))
            .with_scopes(vec![id.to_string(), parent.to_string()]));
        }
        self.nodes.insert(
            id.clone(),
            ScopeNode {
                id,
                kind,
                parent: Some(parent),
            },
        );
        Ok(())
    }

    /// Returns the global root scope id.
    #[must_use]
    pub fn root(&self) -> &ScopeId {
        &self.root
    }

    /// Looks up a scope node by id.
    #[must_use]
    pub fn get(&self, id: &ScopeId) -> Option<&ScopeNode> {
        self.nodes.get(id)
    }

    /// Returns the kind of a declared scope.
    #[must_use]
    pub fn kind(&self, id: &ScopeId) -> Option<ScopeKind> {
        self.nodes.get(id).map(|node| node.kind)
    }

    /// Returns true if the scope is declared.
    #[must_use]
    pub fn contains(&self, id: &ScopeId) -> bool {
        self.nodes.contains_key(id)
    }

    /// Walks ancestor links from the given scope up to the root, excluding
    /// the scope itself.
    #[must_use]
    pub fn ancestors(&self, id: &ScopeId) -> Vec<ScopeId> {
        let mut ancestors = Vec::new();
        let mut current = self.nodes.get(id).and_then(|node| node.parent.clone());
        while let Some(parent) = current {
            current = self.nodes.get(&parent).and_then(|node| node.parent.clone());
            ancestors.push(parent);
        }
        ancestors
    }

    /// Returns the number of declared scopes, including the root.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns false: the tree always holds at least the root.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tree_starts_with_global_root() {
        let tree = ScopeTree::new("global");
        assert_eq!(tree.root().as_str(), "global");
        assert_eq!(tree.kind(tree.root()), Some(ScopeKind::Global));
        assert_eq!(tree.len(), 1);
    }

    #[test]
    fn test_insert_route_scope() {
        let mut tree = ScopeTree::new("global");
        tree.insert(
            ScopeId::new("route-a"),
            ScopeKind::RouteLocal,
            ScopeId::new("global"),
        )
        .unwrap();

        assert_eq!(
            tree.kind(&ScopeId::new("route-a")),
            Some(ScopeKind::RouteLocal)
        );
        assert_eq!(
            tree.get(&ScopeId::new("route-a")).unwrap().parent,
            Some(ScopeId::new("global"))
        );
    }

    #[test]
    fn test_duplicate_scope_rejected() {
        let mut tree = ScopeTree::new("global");
        tree.insert(
            ScopeId::new("route-a"),
            ScopeKind::RouteLocal,
            ScopeId::new("global"),
        )
        .unwrap();

        let err = tree
            .insert(
                ScopeId::new("route-a"),
                ScopeKind::RouteLocal,
                ScopeId::new("global"),
            )
            .unwrap_err();
        assert!(err.to_string().contains("duplicate"));
    }

    #[test]
    fn test_unknown_parent_rejected() {
        let mut tree = ScopeTree::new("global");
        let err = tree
            .insert(
                ScopeId::new("route-a"),
                ScopeKind::RouteLocal,
                ScopeId::new("missing"),
            )
            .unwrap_err();
        assert!(err.to_string().contains("unknown parent"));
    }

    #[test]
    fn test_second_global_rejected() {
        let mut tree = ScopeTree::new("global");
        let err = tree
            .insert(
                ScopeId::new("other"),
                ScopeKind::Global,
                ScopeId::new("global"),
            )
            .unwrap_err();
        assert!(err.to_string().contains("may be global"));
    }

    #[test]
    fn test_ancestors_walk() {
        let mut tree = ScopeTree::new("global");
        tree.insert(
            ScopeId::new("outer"),
            ScopeKind::RouteLocal,
            ScopeId::new("global"),
        )
        .unwrap();
        tree.insert(
            ScopeId::new("inner"),
            ScopeKind::RouteLocal,
            ScopeId::new("outer"),
        )
        .unwrap();

        let ancestors = tree.ancestors(&ScopeId::new("inner"));
        assert_eq!(ancestors, vec![ScopeId::new("outer"), ScopeId::new("global")]);
        assert!(tree.ancestors(tree.root()).is_empty());
    }
}
