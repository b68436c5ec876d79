//! Bridges engine domain events onto the SSE event bus.

mod sink;

pub use sink::WebDomainEventSink;
