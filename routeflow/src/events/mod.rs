//! Observability for the completion dispatch path.

mod event;
mod sink;

pub use event::DispatchEvent;
pub use sink::{CollectingEventSink, EventSink, LoggingEventSink, NoOpEventSink};
