//! Valuation settings - tunables for caching, timeouts and history.

mod settings_model;

pub use settings_model::ValuationSettings;
