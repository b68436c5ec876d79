use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Market a stock trades on.
///
/// `Domestic` is the Tokyo Stock Exchange (quoted in JPY); `Foreign` covers
/// the US exchanges (quoted in USD).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Market {
    Domestic,
    Foreign,
}

impl Market {
    /// Trading currency for the market.
    pub const fn currency(&self) -> &'static str {
        match self {
            Market::Domestic => "JPY",
            Market::Foreign => "USD",
        }
    }

    /// Exchange suffix providers expect on symbols of this market.
    pub const fn provider_suffix(&self) -> Option<&'static str> {
        match self {
            Market::Domestic => Some(".T"),
            Market::Foreign => None,
        }
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            Market::Domestic => "DOMESTIC",
            Market::Foreign => "FOREIGN",
        }
    }
}

impl fmt::Display for Market {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Market {
    type Err = String;

    /// Accepts the canonical names plus the country shorthands `JP` / `US`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "DOMESTIC" | "JP" => Ok(Market::Domestic),
            "FOREIGN" | "US" => Ok(Market::Foreign),
            other => Err(format!("Unknown market '{}'", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_currency_per_market() {
        assert_eq!(Market::Domestic.currency(), "JPY");
        assert_eq!(Market::Foreign.currency(), "USD");
    }

    #[test]
    fn test_parse_market() {
        assert_eq!("domestic".parse::<Market>().unwrap(), Market::Domestic);
        assert_eq!(" US ".parse::<Market>().unwrap(), Market::Foreign);
        assert!("LSE".parse::<Market>().is_err());
    }

    #[test]
    fn test_serde_names() {
        let json = serde_json::to_string(&Market::Foreign).unwrap();
        assert_eq!(json, "\"FOREIGN\"");
        let market: Market = serde_json::from_str("\"DOMESTIC\"").unwrap();
        assert_eq!(market, Market::Domestic);
    }
}
