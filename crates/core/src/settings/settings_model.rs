use std::time::Duration;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_USD_JPY_RATE, REPORTING_CURRENCY, SNAPSHOT_CAPACITY};
use crate::errors::{Error, Result};

const MIN_TTL: Duration = Duration::from_secs(5 * 60);
const MAX_TTL: Duration = Duration::from_secs(15 * 60);
const MIN_FETCH_TIMEOUT: Duration = Duration::from_secs(10);
const MAX_FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Runtime configuration of the valuation engine and its collaborators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ValuationSettings {
    pub reporting_currency: String,
    /// Freshness window of cached stock prices
    pub price_ttl_secs: u64,
    /// Freshness window of the cached exchange rate
    pub fx_ttl_secs: u64,
    /// Upper bound on any single provider call
    pub fetch_timeout_secs: u64,
    pub snapshot_capacity: usize,
    /// JPY per USD used until a live rate has been fetched
    pub default_fx_rate: Decimal,
}

impl Default for ValuationSettings {
    fn default() -> Self {
        Self {
            reporting_currency: REPORTING_CURRENCY.to_string(),
            price_ttl_secs: 10 * 60,
            fx_ttl_secs: 10 * 60,
            fetch_timeout_secs: 15,
            snapshot_capacity: SNAPSHOT_CAPACITY,
            default_fx_rate: DEFAULT_USD_JPY_RATE,
        }
    }
}

impl ValuationSettings {
    pub fn price_ttl(&self) -> Duration {
        Duration::from_secs(self.price_ttl_secs)
    }

    pub fn fx_ttl(&self) -> Duration {
        Duration::from_secs(self.fx_ttl_secs)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    /// Checks every value against its allowed range.
    pub fn validate(&self) -> Result<()> {
        for (name, ttl) in [("priceTtlSecs", self.price_ttl()), ("fxTtlSecs", self.fx_ttl())] {
            if ttl < MIN_TTL || ttl > MAX_TTL {
                return Err(Error::InvalidConfigValue(format!(
                    "{} must be between {} and {} seconds, got {}",
                    name,
                    MIN_TTL.as_secs(),
                    MAX_TTL.as_secs(),
                    ttl.as_secs()
                )));
            }
        }
        let timeout = self.fetch_timeout();
        if timeout < MIN_FETCH_TIMEOUT || timeout > MAX_FETCH_TIMEOUT {
            return Err(Error::InvalidConfigValue(format!(
                "fetchTimeoutSecs must be between {} and {} seconds, got {}",
                MIN_FETCH_TIMEOUT.as_secs(),
                MAX_FETCH_TIMEOUT.as_secs(),
                timeout.as_secs()
            )));
        }
        if self.snapshot_capacity == 0 {
            return Err(Error::InvalidConfigValue(
                "snapshotCapacity must be at least 1".to_string(),
            ));
        }
        if self.default_fx_rate <= Decimal::ZERO {
            return Err(Error::InvalidConfigValue(format!(
                "defaultFxRate must be positive, got {}",
                self.default_fx_rate
            )));
        }
        if self.reporting_currency.trim().is_empty() {
            return Err(Error::InvalidConfigValue(
                "reportingCurrency must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}
