//! FX module - the USD/JPY exchange rate used to report foreign holdings.

mod fx_model;

pub use fx_model::{ExchangeRate, RateSource};
