use std::{net::SocketAddr, time::Duration};

use anyhow::{anyhow, Context};
use kabufolio_core::settings::ValuationSettings;
use rust_decimal::Decimal;

/// Headroom for storage writes on top of the two sequential fetch phases.
const REFRESH_MARGIN: Duration = Duration::from_secs(5);

/// Which quote provider the server talks to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderKind {
    Yahoo,
    /// REST backend exposing `/price`, `/exchange-rate` and `/search`
    Backend { base_url: String },
}

pub struct Config {
    pub listen_addr: SocketAddr,
    pub db_path: String,
    pub cors_allow: Vec<String>,
    pub request_timeout: Duration,
    pub provider: ProviderKind,
    /// `None` disables the background refresh
    pub refresh_interval: Option<Duration>,
    pub settings: ValuationSettings,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup; unset keys take defaults.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let listen_addr: SocketAddr = var("KF_LISTEN_ADDR")
            .unwrap_or_else(|| "0.0.0.0:8080".to_string())
            .parse()
            .context("Invalid KF_LISTEN_ADDR")?;
        let db_path = var("KF_DB_PATH").unwrap_or_else(|| "./db/kabufolio.db".into());
        let cors_allow = var("KF_CORS_ALLOW_ORIGINS")
            .unwrap_or_else(|| "*".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        let timeout_ms: u64 =
            parse_or("KF_REQUEST_TIMEOUT_MS", var("KF_REQUEST_TIMEOUT_MS"), 60_000)?;

        let provider = match var("KF_QUOTE_PROVIDER").map(|kind| kind.to_ascii_lowercase()) {
            None => ProviderKind::Yahoo,
            Some(kind) if kind == "yahoo" => ProviderKind::Yahoo,
            Some(kind) if kind == "backend" => ProviderKind::Backend {
                base_url: var("KF_QUOTE_BACKEND_URL").ok_or_else(|| {
                    anyhow!("KF_QUOTE_BACKEND_URL is required for the backend provider")
                })?,
            },
            Some(other) => return Err(anyhow!("Unknown KF_QUOTE_PROVIDER '{}'", other)),
        };

        let refresh_secs: u64 =
            parse_or("KF_REFRESH_INTERVAL_SECS", var("KF_REFRESH_INTERVAL_SECS"), 0)?;
        let refresh_interval = (refresh_secs > 0).then(|| Duration::from_secs(refresh_secs));

        let defaults = ValuationSettings::default();
        let settings = ValuationSettings {
            price_ttl_secs: parse_or(
                "KF_PRICE_TTL_SECS",
                var("KF_PRICE_TTL_SECS"),
                defaults.price_ttl_secs,
            )?,
            fx_ttl_secs: parse_or("KF_FX_TTL_SECS", var("KF_FX_TTL_SECS"), defaults.fx_ttl_secs)?,
            fetch_timeout_secs: parse_or(
                "KF_FETCH_TIMEOUT_SECS",
                var("KF_FETCH_TIMEOUT_SECS"),
                defaults.fetch_timeout_secs,
            )?,
            snapshot_capacity: parse_or(
                "KF_SNAPSHOT_CAPACITY",
                var("KF_SNAPSHOT_CAPACITY"),
                defaults.snapshot_capacity,
            )?,
            default_fx_rate: parse_or::<Decimal>(
                "KF_DEFAULT_FX_RATE",
                var("KF_DEFAULT_FX_RATE"),
                defaults.default_fx_rate,
            )?,
            ..defaults
        };
        settings.validate()?;

        // A refresh waits for the rate, then for the price fan-out.
        let request_timeout = Duration::from_millis(timeout_ms);
        let slowest_refresh = settings.fetch_timeout() * 2 + REFRESH_MARGIN;
        if request_timeout < slowest_refresh {
            return Err(anyhow!(
                "KF_REQUEST_TIMEOUT_MS must be at least {} ms with a {} s fetch timeout",
                slowest_refresh.as_millis(),
                settings.fetch_timeout_secs
            ));
        }

        Ok(Self {
            listen_addr,
            db_path,
            cors_allow,
            request_timeout,
            provider,
            refresh_interval,
            settings,
        })
    }
}

fn parse_or<T>(key: &str, raw: Option<String>, default: T) -> anyhow::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match raw {
        None => Ok(default),
        Some(raw) => raw
            .parse()
            .map_err(|e| anyhow!("Invalid {} '{}': {}", key, raw, e)),
    }
}
