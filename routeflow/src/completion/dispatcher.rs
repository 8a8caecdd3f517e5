//! Exchange-termination dispatch: selects and invokes exactly one handler.

use super::invoker::HandlerInvoker;
use super::{CompletionEntry, TriggerKind};
use crate::config::CompletionConfig;
use crate::events::{DispatchEvent, EventSink, NoOpEventSink};
use crate::exchange::Exchange;
use crate::scope::{ScopeId, ScopeKind, ScopeStack};
use std::sync::Arc;
use tracing::{debug, warn};

/// The outcome of handler selection for a terminated exchange.
///
/// For any termination, zero or exactly one handler fires.
#[derive(Debug, Clone)]
pub enum SelectionOutcome {
    /// A scope claimed the notification and its effective entry matches the
    /// trigger.
    Selected(CompletionEntry),
    /// A scope claimed the notification, but its effective entry's filter
    /// does not match the trigger; nothing fires and no other scope is
    /// consulted.
    Suppressed {
        /// The scope that claimed the notification.
        scope: ScopeId,
        /// Sequence number of the non-matching effective entry.
        seq: u64,
    },
    /// No scope on the exchange's path has registered entries.
    NoHandler,
}

/// Observes exchange termination and invokes the winning completion handler
/// exactly once.
///
/// Selection follows the documented precedence rules:
/// - a route-local scope with any entries beats the global scope outright
/// - within a route-local scope, the LAST-defined entry is honored
/// - within the global scope, the FIRST-defined entry is honored
///
/// The within-scope asymmetry is the literal behavioral contract and is kept
/// as two named policies rather than normalized into one rule.
pub struct CompletionDispatcher {
    config: Arc<CompletionConfig>,
    invoker: HandlerInvoker,
    sink: Arc<dyn EventSink>,
}

impl CompletionDispatcher {
    /// Creates a dispatcher over a frozen completion configuration.
    #[must_use]
    pub fn new(config: Arc<CompletionConfig>) -> Self {
        Self {
            config,
            invoker: HandlerInvoker::new(),
            sink: Arc::new(NoOpEventSink),
        }
    }

    /// Sets the event sink, shared with the invoker.
    #[must_use]
    pub fn with_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.invoker = self.invoker.with_sink(sink.clone());
        self.sink = sink;
        self
    }

    /// Replaces the handler invoker.
    #[must_use]
    pub fn with_invoker(mut self, invoker: HandlerInvoker) -> Self {
        self.invoker = invoker;
        self
    }

    /// Selects the entry, if any, that fires for the given trigger and
    /// active scope chain.
    ///
    /// The innermost route-local scope with ANY registered entries claims
    /// the notification slot; there is no fall-through past it, whether or
    /// not its effective entry matches the trigger. Global entries are only
    /// consulted when no route-local scope on the chain holds entries.
    #[must_use]
    pub fn select(&self, kind: TriggerKind, scopes: &ScopeStack) -> SelectionOutcome {
        let tree = self.config.scopes();
        let registry = self.config.registry();

        for scope in scopes.active_scopes() {
            if tree.kind(scope) != Some(ScopeKind::RouteLocal) {
                continue;
            }
            let Some(entry) = registry.effective_entry(scope, ScopeKind::RouteLocal) else {
                continue;
            };
            return if entry.filter.matches(kind) {
                SelectionOutcome::Selected(entry.clone())
            } else {
                SelectionOutcome::Suppressed {
                    scope: scope.clone(),
                    seq: entry.seq,
                }
            };
        }

        let root = tree.root();
        match registry.effective_entry(root, ScopeKind::Global) {
            Some(entry) if entry.filter.matches(kind) => {
                SelectionOutcome::Selected(entry.clone())
            }
            Some(entry) => SelectionOutcome::Suppressed {
                scope: root.clone(),
                seq: entry.seq,
            },
            None => SelectionOutcome::NoHandler,
        }
    }

    /// Notifies the dispatcher that an exchange reached a terminal state.
    ///
    /// Called exactly once per exchange by the pipeline engine, at the point
    /// of termination while the exchange's scope chain is still live. The
    /// selected handler (if any) finishes before this method returns.
    ///
    /// This method never panics or propagates an error past its boundary:
    /// misuse is logged and ignored, and handler failures are contained by
    /// the invoker.
    pub async fn notify_termination(&self, exchange: &mut Exchange, scopes: &ScopeStack) {
        if exchange.suppresses_completions() {
            debug!(
                exchange_id = %exchange.id,
                "termination of handler-derived exchange, completion suppressed"
            );
            return;
        }
        let Some(kind) = exchange.state.trigger_kind() else {
            warn!(
                exchange_id = %exchange.id,
                state = %exchange.state,
                "termination notified for non-terminal exchange"
            );
            return;
        };
        if !exchange.mark_notified() {
            warn!(
                exchange_id = %exchange.id,
                "termination already notified for exchange"
            );
            return;
        }

        match kind {
            TriggerKind::Completed => {
                self.sink
                    .try_emit_event(DispatchEvent::exchange_completed(exchange.id));
            }
            TriggerKind::Failed => {
                self.sink.try_emit_event(DispatchEvent::exchange_failed(
                    exchange.id,
                    exchange.error.as_deref().unwrap_or_default(),
                ));
            }
        }

        match self.select(kind, scopes) {
            SelectionOutcome::Selected(entry) => {
                debug!(
                    exchange_id = %exchange.id,
                    scope = %entry.scope,
                    seq = entry.seq,
                    "completion handler selected"
                );
                self.sink.try_emit_event(DispatchEvent::selected(&entry));
                self.invoker.invoke(&entry, exchange).await;
            }
            SelectionOutcome::Suppressed { scope, seq } => {
                debug!(
                    exchange_id = %exchange.id,
                    scope = %scope,
                    seq,
                    "scope claimed completion but effective entry does not match trigger"
                );
                self.sink
                    .try_emit_event(DispatchEvent::suppressed(&scope, seq));
            }
            SelectionOutcome::NoHandler => {
                self.sink
                    .try_emit_event(DispatchEvent::no_handler(exchange.id));
            }
        }
    }
}
