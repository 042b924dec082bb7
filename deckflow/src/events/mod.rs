//! Event sinks for pipeline observability.
//!
//! The runner reports every lifecycle transition to the pipeline's sink.

mod sink;

pub use sink::{CollectingEventSink, EventSink, LoggingEventSink, NoOpEventSink};

#[cfg(test)]
pub use sink::MockEventSink;
