use kabufolio_core::events::{DomainEvent, DomainEventSink};

use crate::events::{
    EventBus, ServerEvent, HOLDINGS_CHANGED, PORTFOLIO_REFRESHED, STORAGE_DEGRADED,
};

/// Publishes every domain event on the [`EventBus`] with the event itself as
/// the JSON payload.
#[derive(Clone)]
pub struct WebDomainEventSink {
    event_bus: EventBus,
}

impl WebDomainEventSink {
    pub fn new(event_bus: EventBus) -> Self {
        Self { event_bus }
    }
}

fn event_name(event: &DomainEvent) -> &'static str {
    match event {
        DomainEvent::HoldingsChanged { .. } => HOLDINGS_CHANGED,
        DomainEvent::PortfolioRefreshed { .. } => PORTFOLIO_REFRESHED,
        DomainEvent::StorageDegraded { .. } => STORAGE_DEGRADED,
    }
}

impl DomainEventSink for WebDomainEventSink {
    fn emit(&self, event: DomainEvent) {
        let name = event_name(&event);
        let server_event = match serde_json::to_value(&event) {
            Ok(payload) => ServerEvent::with_payload(name, payload),
            Err(err) => {
                tracing::warn!("Failed to serialize domain event {}: {}", name, err);
                ServerEvent::new(name)
            }
        };
        self.event_bus.publish(server_event);
    }
}
