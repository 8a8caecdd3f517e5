//! Scope modeling for completion-handler declarations.
//!
//! This module provides:
//! - The immutable scope tree built at configuration-load time
//! - The per-exchange stack of scopes active during pipeline execution

mod stack;
mod tree;

pub use stack::{ScopeFrame, ScopeStack};
pub use tree::{ScopeId, ScopeKind, ScopeNode, ScopeTree};
