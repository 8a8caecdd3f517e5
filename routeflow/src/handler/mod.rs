//! Completion handler trait and implementations.
//!
//! A completion handler is the body of an `on completion` declaration: a
//! sub-pipeline run against a derived copy of the triggering exchange.

use crate::exchange::Exchange;
use async_trait::async_trait;
use parking_lot::RwLock;
use std::fmt::Debug;

/// Trait for completion handler bodies.
///
/// Handlers are user code: they return [`anyhow::Result`] and the subsystem
/// wraps any failure into a
/// [`HandlerExecutionError`](crate::errors::HandlerExecutionError) at the
/// invoker boundary.
#[async_trait]
pub trait CompletionHandler: Send + Sync {
    /// Returns the name of the handler.
    fn name(&self) -> &str;

    /// Runs the handler's sub-pipeline against a derived copy of the
    /// triggering exchange.
    async fn run(&self, exchange: &mut Exchange) -> anyhow::Result<()>;
}

/// A simple function-based handler.
pub struct FnHandler<F>
where
    F: Fn(&mut Exchange) -> anyhow::Result<()> + Send + Sync,
{
    name: String,
    func: F,
}

impl<F> FnHandler<F>
where
    F: Fn(&mut Exchange) -> anyhow::Result<()> + Send + Sync,
{
    /// Creates a new function-based handler.
    pub fn new(name: impl Into<String>, func: F) -> Self {
        Self {
            name: name.into(),
            func,
        }
    }
}

impl<F> Debug for FnHandler<F>
where
    F: Fn(&mut Exchange) -> anyhow::Result<()> + Send + Sync,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnHandler").field("name", &self.name).finish()
    }
}

#[async_trait]
impl<F> CompletionHandler for FnHandler<F>
where
    F: Fn(&mut Exchange) -> anyhow::Result<()> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&self, exchange: &mut Exchange) -> anyhow::Result<()> {
        (self.func)(exchange)
    }
}

/// A handler that does nothing.
#[derive(Debug, Clone)]
pub struct NoOpHandler {
    name: String,
}

impl NoOpHandler {
    /// Creates a new no-op handler.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

#[async_trait]
impl CompletionHandler for NoOpHandler {
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&self, _exchange: &mut Exchange) -> anyhow::Result<()> {
        Ok(())
    }
}

/// A handler that records the payload of every exchange it receives.
///
/// Assertions read the recorded payloads back, the same way the observing
/// endpoints in a routing test count and inspect delivered messages.
#[derive(Debug)]
pub struct RecordingHandler {
    name: String,
    received: RwLock<Vec<serde_json::Value>>,
}

impl RecordingHandler {
    /// Creates a new recording handler.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            received: RwLock::new(Vec::new()),
        }
    }

    /// Returns all recorded payloads, in delivery order.
    #[must_use]
    pub fn received(&self) -> Vec<serde_json::Value> {
        self.received.read().clone()
    }

    /// Returns the number of recorded deliveries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.received.read().len()
    }

    /// Returns true if nothing was delivered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.received.read().is_empty()
    }
}

#[async_trait]
impl CompletionHandler for RecordingHandler {
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&self, exchange: &mut Exchange) -> anyhow::Result<()> {
        self.received.write().push(exchange.payload.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fn_handler() {
        let handler = FnHandler::new("stamp", |exchange: &mut Exchange| {
            exchange.payload = serde_json::json!("stamped");
            Ok(())
        });
        assert_eq!(handler.name(), "stamp");

        let mut exchange = Exchange::new(serde_json::json!("raw"));
        tokio_test::block_on(handler.run(&mut exchange)).unwrap();
        assert_eq!(exchange.payload, serde_json::json!("stamped"));
    }

    #[test]
    fn test_noop_handler() {
        let handler = NoOpHandler::new("noop");
        assert_eq!(handler.name(), "noop");

        let mut exchange = Exchange::new(serde_json::json!("raw"));
        tokio_test::block_on(handler.run(&mut exchange)).unwrap();
        assert_eq!(exchange.payload, serde_json::json!("raw"));
    }

    #[test]
    fn test_recording_handler_collects_payloads() {
        let handler = RecordingHandler::new("recorder");
        assert!(handler.is_empty());

        let mut first = Exchange::new(serde_json::json!("one"));
        let mut second = Exchange::new(serde_json::json!("two"));
        tokio_test::block_on(handler.run(&mut first)).unwrap();
        tokio_test::block_on(handler.run(&mut second)).unwrap();

        assert_eq!(handler.len(), 2);
        assert_eq!(
            handler.received(),
            vec![serde_json::json!("one"), serde_json::json!("two")]
        );
    }
}
