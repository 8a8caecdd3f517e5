//! Completion notification: registration, selection, and invocation of
//! exactly one handler per terminated exchange.
//!
//! This module provides:
//! - Trigger classification and per-scope entry storage
//! - The dispatcher implementing the documented precedence rules
//! - The invoker isolating handler execution from the dispatch path

mod dispatcher;
mod entry;
mod invoker;
mod registry;

pub use dispatcher::{CompletionDispatcher, SelectionOutcome};
pub use entry::{CompletionEntry, TriggerFilter, TriggerKind};
pub use invoker::{HandlerInvoker, InvocationInfo, InvocationTracker};
pub use registry::{CompletionRegistry, RegistryMode};
