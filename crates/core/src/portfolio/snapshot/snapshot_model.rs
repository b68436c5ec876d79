use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, Months, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::ValidationError;

/// Total portfolio value at a point in time. Immutable once recorded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioSnapshot {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    /// In the reporting currency
    pub total_value: Decimal,
}

impl PortfolioSnapshot {
    pub fn new(timestamp: DateTime<Utc>, total_value: Decimal) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            timestamp,
            total_value,
        }
    }
}

/// Chart ranges offered to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimeRange {
    #[serde(rename = "1W")]
    OneWeek,
    #[serde(rename = "1M")]
    OneMonth,
    #[serde(rename = "3M")]
    ThreeMonths,
    #[serde(rename = "1Y")]
    OneYear,
    #[serde(rename = "5Y")]
    FiveYears,
}

impl TimeRange {
    pub const ALL: [TimeRange; 5] = [
        TimeRange::OneWeek,
        TimeRange::OneMonth,
        TimeRange::ThreeMonths,
        TimeRange::OneYear,
        TimeRange::FiveYears,
    ];

    pub const fn code(&self) -> &'static str {
        match self {
            TimeRange::OneWeek => "1W",
            TimeRange::OneMonth => "1M",
            TimeRange::ThreeMonths => "3M",
            TimeRange::OneYear => "1Y",
            TimeRange::FiveYears => "5Y",
        }
    }

    /// Inclusive lower bound of the range ending at `now`.
    pub fn since(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        let bound = match self {
            TimeRange::OneWeek => now.checked_sub_signed(Duration::weeks(1)),
            TimeRange::OneMonth => now.checked_sub_months(Months::new(1)),
            TimeRange::ThreeMonths => now.checked_sub_months(Months::new(3)),
            TimeRange::OneYear => now.checked_sub_months(Months::new(12)),
            TimeRange::FiveYears => now.checked_sub_months(Months::new(60)),
        };
        bound.unwrap_or(DateTime::<Utc>::MIN_UTC)
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for TimeRange {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = s.trim().to_ascii_uppercase();
        TimeRange::ALL
            .into_iter()
            .find(|range| range.code() == code)
            .ok_or_else(|| {
                ValidationError::InvalidInput(format!(
                    "Unknown time range '{}', expected one of 1W, 1M, 3M, 1Y, 5Y",
                    s
                ))
            })
    }
}
