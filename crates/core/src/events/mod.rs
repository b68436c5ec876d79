//! Domain events module.
//!
//! Provides domain event types and the sink trait the valuation engine emits
//! through. This is the only notification path out of the core; runtime
//! adapters (HTTP/SSE) implement the sink.

mod domain_event;
mod sink;

pub use domain_event::*;
pub use sink::*;
