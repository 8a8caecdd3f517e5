//! Handler sub-pipeline execution, isolated from the dispatch path.

use super::CompletionEntry;
use crate::errors::HandlerExecutionError;
use crate::events::{DispatchEvent, EventSink, NoOpEventSink};
use crate::exchange::Exchange;
use crate::scope::ScopeId;
use crate::utils::iso_timestamp;
use dashmap::DashMap;
use std::sync::Arc;
use tracing::{error, warn};
use uuid::Uuid;

/// Information about an in-flight handler invocation.
#[derive(Debug, Clone)]
pub struct InvocationInfo {
    /// The triggering exchange id.
    pub exchange_id: Uuid,
    /// The scope owning the running entry.
    pub scope: ScopeId,
    /// Sequence number of the running entry.
    pub seq: u64,
    /// When the invocation started (ISO 8601).
    pub started_at: String,
}

/// Thread-safe registry of in-flight handler invocations.
///
/// One invocation may be in flight per exchange id; a second begin for the
/// same id is rejected, which blocks recursive re-dispatch.
#[derive(Debug, Default)]
pub struct InvocationTracker {
    in_flight: DashMap<Uuid, InvocationInfo>,
}

impl InvocationTracker {
    /// Creates a new tracker.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the start of an invocation.
    ///
    /// Returns false if an invocation for the same exchange is already in
    /// flight.
    pub fn begin(&self, info: InvocationInfo) -> bool {
        match self.in_flight.entry(info.exchange_id) {
            dashmap::mapref::entry::Entry::Occupied(_) => false,
            dashmap::mapref::entry::Entry::Vacant(slot) => {
                slot.insert(info);
                true
            }
        }
    }

    /// Records the end of an invocation.
    pub fn finish(&self, exchange_id: Uuid) -> Option<InvocationInfo> {
        self.in_flight.remove(&exchange_id).map(|(_, info)| info)
    }

    /// Returns true if an invocation for the exchange is in flight.
    #[must_use]
    pub fn is_in_flight(&self, exchange_id: Uuid) -> bool {
        self.in_flight.contains_key(&exchange_id)
    }

    /// Returns the number of in-flight invocations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.in_flight.len()
    }

    /// Returns true if no invocation is in flight.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.in_flight.is_empty()
    }
}

/// Executes selected completion handlers.
///
/// The invoker is the containment boundary of §7: a handler failure is
/// logged and surfaced to the event sink, and never travels further.
pub struct HandlerInvoker {
    tracker: Arc<InvocationTracker>,
    sink: Arc<dyn EventSink>,
}

impl HandlerInvoker {
    /// Creates a new invoker with a fresh tracker and a no-op sink.
    #[must_use]
    pub fn new() -> Self {
        Self {
            tracker: Arc::new(InvocationTracker::new()),
            sink: Arc::new(NoOpEventSink),
        }
    }

    /// Sets the event sink.
    #[must_use]
    pub fn with_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Returns the invocation tracker.
    #[must_use]
    pub fn tracker(&self) -> &Arc<InvocationTracker> {
        &self.tracker
    }

    /// Runs the entry's handler against a derived copy of the exchange.
    ///
    /// The invocation completes before this method returns. Handler
    /// failures are converted to [`HandlerExecutionError`], logged, and
    /// emitted; they never propagate to the caller.
    pub async fn invoke(&self, entry: &CompletionEntry, exchange: &Exchange) {
        let info = InvocationInfo {
            exchange_id: exchange.id,
            scope: entry.scope.clone(),
            seq: entry.seq,
            started_at: iso_timestamp(),
        };
        if !self.tracker.begin(info) {
            warn!(
                exchange_id = %exchange.id,
                scope = %entry.scope,
                "completion already in flight for exchange, skipping re-entry"
            );
            return;
        }

        let mut derived = exchange.fork_for_handler();
        let result = entry.handler.run(&mut derived).await;
        self.tracker.finish(exchange.id);

        match result {
            Ok(()) => {
                self.sink
                    .try_emit_event(DispatchEvent::handler_invoked(entry, exchange.id));
            }
            Err(err) => {
                let exec_err = HandlerExecutionError::new(
                    entry.handler_name(),
                    entry.scope.clone(),
                    exchange.id,
                    err.to_string(),
                );
                error!(exchange_id = %exchange.id, scope = %entry.scope, "{exec_err}");
                self.sink.try_emit_event(DispatchEvent::handler_failed(
                    entry,
                    exchange.id,
                    &exec_err.reason,
                ));
            }
        }
    }
}

impl Default for HandlerInvoker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::completion::TriggerFilter;
    use crate::events::CollectingEventSink;
    use crate::handler::{FnHandler, RecordingHandler};

    fn entry_with(handler: Arc<dyn crate::handler::CompletionHandler>) -> CompletionEntry {
        CompletionEntry::new(ScopeId::new("route-a"), TriggerFilter::Both, handler, 0)
    }

    #[test]
    fn test_tracker_rejects_double_begin() {
        let tracker = InvocationTracker::new();
        let exchange_id = Uuid::new_v4();
        let info = InvocationInfo {
            exchange_id,
            scope: ScopeId::new("route-a"),
            seq: 0,
            started_at: iso_timestamp(),
        };

        assert!(tracker.begin(info.clone()));
        assert!(!tracker.begin(info));
        assert!(tracker.is_in_flight(exchange_id));

        tracker.finish(exchange_id);
        assert!(tracker.is_empty());
    }

    #[tokio::test]
    async fn test_invoke_runs_handler_with_payload() {
        let recorder = Arc::new(RecordingHandler::new("recorder"));
        let invoker = HandlerInvoker::new();

        let mut exchange = Exchange::new(serde_json::json!("hello"));
        exchange.complete().unwrap();

        invoker.invoke(&entry_with(recorder.clone()), &exchange).await;

        assert_eq!(recorder.received(), vec![serde_json::json!("hello")]);
        assert!(invoker.tracker().is_empty());
    }

    #[tokio::test]
    async fn test_invoke_leaves_original_untouched() {
        let mutator = Arc::new(FnHandler::new("mutator", |exchange: &mut Exchange| {
            exchange.payload = serde_json::json!("mutated");
            Ok(())
        }));
        let invoker = HandlerInvoker::new();

        let mut exchange = Exchange::new(serde_json::json!("original"));
        exchange.complete().unwrap();

        invoker.invoke(&entry_with(mutator), &exchange).await;

        assert_eq!(exchange.payload, serde_json::json!("original"));
    }

    #[tokio::test]
    async fn test_handler_failure_is_contained() {
        let failing = Arc::new(FnHandler::new("failing", |_exchange: &mut Exchange| {
            anyhow::bail!("handler blew up")
        }));
        let sink = Arc::new(CollectingEventSink::new());
        let invoker = HandlerInvoker::new().with_sink(sink.clone());

        let mut exchange = Exchange::new(serde_json::json!("x"));
        exchange.fail("boom").unwrap();

        invoker.invoke(&entry_with(failing), &exchange).await;

        assert_eq!(sink.count_of("completion.handler_failed"), 1);
        assert_eq!(sink.count_of("completion.handler_invoked"), 0);
        assert!(invoker.tracker().is_empty());
    }
}
