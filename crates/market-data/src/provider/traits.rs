//! Quote provider trait definition.

use async_trait::async_trait;

use crate::errors::FetchError;
use crate::models::{Market, Price, Rate, StockCandidate};

/// Uniform interface over the external price / exchange-rate services.
///
/// Implementations must map an HTTP 2xx response with a usable body to `Ok`,
/// and everything else to [`FetchError::Upstream`] or
/// [`FetchError::Unreachable`]. They must not panic on expected failures.
///
/// # Example
///
/// ```ignore
/// use async_trait::async_trait;
/// use kabufolio_market_data::{FetchError, Market, Price, QuoteProvider, Rate, StockCandidate};
///
/// struct FixedProvider;
///
/// #[async_trait]
/// impl QuoteProvider for FixedProvider {
///     fn id(&self) -> &'static str {
///         "FIXED"
///     }
///
///     // ... implement get_price, get_exchange_rate, search
/// }
/// ```
#[async_trait]
pub trait QuoteProvider: Send + Sync {
    /// Constant identifier like "YAHOO" or "BACKEND". Used for logging and as
    /// the `source` of returned values.
    fn id(&self) -> &'static str;

    /// Fetch the latest price for `symbol` on `market`.
    ///
    /// The symbol is normalized (see [`normalize_symbol`](crate::normalize_symbol))
    /// before dispatch.
    async fn get_price(&self, symbol: &str, market: Market) -> Result<Price, FetchError>;

    /// Fetch the current USD/JPY rate (JPY per one USD).
    async fn get_exchange_rate(&self) -> Result<Rate, FetchError>;

    /// Search for stocks on `market` matching `query`.
    async fn search(&self, query: &str, market: Market)
        -> Result<Vec<StockCandidate>, FetchError>;
}
