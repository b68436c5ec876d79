//! Domain event types.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Events emitted by the valuation engine after state changes.
///
/// These are facts about the portfolio; adapters (HTTP/SSE, desktop shells)
/// decide how to surface them.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DomainEvent {
    /// Holdings were added, removed or cleared.
    HoldingsChanged {
        added: Vec<String>,
        removed: Vec<String>,
    },

    /// A refresh finished and produced a new summary.
    PortfolioRefreshed {
        total_value: Decimal,
        degraded: bool,
    },

    /// A write did not reach durable storage; in-memory state was kept.
    StorageDegraded { message: String },
}

impl DomainEvent {
    pub fn holding_added(id: impl Into<String>) -> Self {
        Self::HoldingsChanged {
            added: vec![id.into()],
            removed: Vec::new(),
        }
    }

    pub fn holdings_removed(ids: Vec<String>) -> Self {
        Self::HoldingsChanged {
            added: Vec::new(),
            removed: ids,
        }
    }

    pub fn portfolio_refreshed(total_value: Decimal, degraded: bool) -> Self {
        Self::PortfolioRefreshed {
            total_value,
            degraded,
        }
    }

    pub fn storage_degraded(message: impl Into<String>) -> Self {
        Self::StorageDegraded {
            message: message.into(),
        }
    }
}
