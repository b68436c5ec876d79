use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Instant;

use futures::future::join_all;
use kabufolio_market_data::{FetchError, Market, Price, StockCandidate};
use log::{debug, info, warn};
use tokio::sync::Mutex;

use crate::errors::{Result, WriteOutcome};
use crate::events::{DomainEvent, DomainEventSink};
use crate::fx::{ExchangeRate, RateSource};
use crate::holdings::{Holding, HoldingStore, NewHolding};
use crate::portfolio::snapshot::{PortfolioSnapshot, SnapshotHistory, TimeRange};
use crate::portfolio::valuation::{
    saturated_symbols, summarize, MutationResult, PortfolioSummary, RefreshStatus,
};
use crate::quotes::{CachedValue, Freshness, PriceCache, PriceKey};
use crate::settings::ValuationSettings;
use crate::utils::time_utils::Clock;

/// State guarded by the engine's single-writer lock.
#[derive(Default)]
struct EngineState {
    /// Ticket counter value when the last completed refresh started
    last_run_marker: u64,
    /// Result of that refresh; cleared by holding mutations
    last_summary: Option<PortfolioSummary>,
}

/// Owns the live exchange rate and drives refreshes.
///
/// `refresh`, `add_holding`, `remove_holding` and `clear_holdings` are
/// serialized behind one async mutex. A refresh requested while another is
/// running waits for it and, if a refresh that started after the request has
/// completed by then, returns that result instead of running again.
pub struct ValuationEngine {
    settings: ValuationSettings,
    price_cache: Arc<PriceCache>,
    holding_store: Arc<HoldingStore>,
    snapshot_history: Arc<SnapshotHistory>,
    event_sink: Arc<dyn DomainEventSink>,
    clock: Arc<dyn Clock>,
    state: Mutex<EngineState>,
    tickets: AtomicU64,
    exchange_rate: RwLock<ExchangeRate>,
    status: RwLock<RefreshStatus>,
}

impl ValuationEngine {
    pub fn new(
        settings: ValuationSettings,
        price_cache: Arc<PriceCache>,
        holding_store: Arc<HoldingStore>,
        snapshot_history: Arc<SnapshotHistory>,
        event_sink: Arc<dyn DomainEventSink>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let fallback = ExchangeRate::fallback(settings.default_fx_rate, clock.now());
        Self {
            settings,
            price_cache,
            holding_store,
            snapshot_history,
            event_sink,
            clock,
            state: Mutex::new(EngineState::default()),
            tickets: AtomicU64::new(0),
            status: RwLock::new(RefreshStatus::initial(fallback.clone())),
            exchange_rate: RwLock::new(fallback),
        }
    }

    /// Summary of the current holdings at the current rate. Touches no
    /// provider and no storage.
    pub fn summary(&self) -> PortfolioSummary {
        summarize(
            &self.holding_store.list(),
            &self.exchange_rate(),
            &self.settings.reporting_currency,
        )
    }

    pub fn exchange_rate(&self) -> ExchangeRate {
        self.exchange_rate
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn last_status(&self) -> RefreshStatus {
        self.status
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn holdings(&self) -> Vec<Holding> {
        self.holding_store.list()
    }

    pub fn history(&self, range: TimeRange) -> Vec<PortfolioSnapshot> {
        self.snapshot_history.list_range(range)
    }

    pub async fn search(
        &self,
        query: &str,
        market: Market,
    ) -> std::result::Result<Vec<StockCandidate>, FetchError> {
        self.price_cache.search(query, market).await
    }

    /// Refreshes the exchange rate and every holding's price, persists the
    /// new prices, and records a snapshot.
    ///
    /// Never fails. Fetch and storage problems fall back to last-known values
    /// and are reported through [`last_status`](Self::last_status).
    pub async fn refresh(&self) -> PortfolioSummary {
        let ticket = self.tickets.fetch_add(1, Ordering::SeqCst);
        let mut state = self.state.lock().await;

        if state.last_run_marker > ticket {
            if let Some(summary) = &state.last_summary {
                debug!("Refresh {} coalesced into a newer run", ticket);
                return summary.clone();
            }
        }

        // Committed only once the run completes, so a cancelled run never
        // lets a later caller reuse an older summary.
        let marker = self.tickets.load(Ordering::SeqCst);
        let summary = self.run_refresh().await;
        state.last_run_marker = marker;
        state.last_summary = Some(summary.clone());
        summary
    }

    /// Validates and adds a holding, then recomputes the summary.
    ///
    /// Validation errors are returned before the engine lock is taken.
    pub async fn add_holding(&self, new_holding: NewHolding) -> Result<MutationResult<Holding>> {
        new_holding.validate(self.clock.now().date_naive())?;

        let mut state = self.state.lock().await;
        let outcome = self.holding_store.create(new_holding).await?;
        state.last_summary = None;

        self.event_sink
            .emit(DomainEvent::holding_added(outcome.value.id.clone()));
        Ok(self.mutation_result(outcome))
    }

    /// Removes a holding by id. Unknown ids leave everything unchanged and
    /// yield `false`.
    pub async fn remove_holding(&self, id: &str) -> MutationResult<bool> {
        let mut state = self.state.lock().await;
        let outcome = self.holding_store.delete(id).await;
        if outcome.value {
            state.last_summary = None;
            self.event_sink
                .emit(DomainEvent::holdings_removed(vec![id.to_string()]));
        }
        self.mutation_result(outcome)
    }

    /// Removes every holding and drops cached quotes.
    pub async fn clear_holdings(&self) -> MutationResult<usize> {
        let mut state = self.state.lock().await;
        let removed: Vec<String> = self.holding_store.list().into_iter().map(|h| h.id).collect();
        let outcome = self.holding_store.clear().await;
        self.price_cache.invalidate_all();
        state.last_summary = None;

        if !removed.is_empty() {
            self.event_sink.emit(DomainEvent::holdings_removed(removed));
        }
        self.mutation_result(outcome)
    }

    fn mutation_result<T>(&self, outcome: WriteOutcome<T>) -> MutationResult<T> {
        if let Some(message) = &outcome.storage_error {
            self.event_sink
                .emit(DomainEvent::storage_degraded(message.clone()));
        }
        MutationResult {
            value: outcome.value,
            summary: self.summary(),
            storage_warning: outcome.storage_error,
        }
    }

    async fn run_refresh(&self) -> PortfolioSummary {
        let started = Instant::now();
        let mut warnings = Vec::new();
        let mut degraded = false;

        // 1. Exchange rate
        let rate = match self.price_cache.get_exchange_rate().await {
            Ok(cached) => {
                if let Some(err) = &cached.error {
                    degraded = true;
                    warnings.push(format!("Exchange rate served from cache: {}", err));
                }
                let rate = ExchangeRate::from_provider(&cached.value, rate_source(cached.freshness));
                self.set_exchange_rate(rate.clone());
                rate
            }
            Err(err) => {
                degraded = true;
                let known = self.exchange_rate();
                let rate = match known.source {
                    RateSource::Fallback => known,
                    _ => known.with_source(RateSource::Cached),
                };
                warn!(
                    "Exchange rate unavailable, keeping {} ({:?}): {}",
                    rate.rate, rate.source, err
                );
                warnings.push(format!("Exchange rate unavailable: {}", err));
                rate
            }
        };

        // 2. One fetch per distinct (symbol, market)
        let holdings = self.holding_store.list();
        let mut keys: Vec<PriceKey> = Vec::new();
        for holding in &holdings {
            let key = PriceKey::new(holding.symbol(), holding.market());
            if !keys.contains(&key) {
                keys.push(key);
            }
        }
        let results = join_all(
            keys.iter()
                .map(|key| self.price_cache.get_price(&key.symbol, key.market)),
        )
        .await;
        let quotes: HashMap<PriceKey, std::result::Result<CachedValue<Price>, FetchError>> =
            keys.into_iter().zip(results).collect();

        // 3. Merge fetched prices; failures keep the last-known price
        let now = self.clock.now();
        let mut failed_symbols = Vec::new();
        let mut stale_symbols = Vec::new();
        let mut refreshed = Vec::new();
        let mut updated = Vec::with_capacity(holdings.len());
        for holding in holdings {
            let key = PriceKey::new(holding.symbol(), holding.market());
            match quotes.get(&key) {
                Some(Ok(quote)) => {
                    if let Some(err) = &quote.error {
                        degraded = true;
                        if push_unique(&mut stale_symbols, &key.symbol) {
                            warnings.push(format!("{} served from cache: {}", key.symbol, err));
                        }
                    }
                    if quote.value.value != holding.stock.price {
                        let fresh = holding.with_stock(holding.stock.with_price(quote.value.value), now);
                        refreshed.push(fresh.clone());
                        updated.push(fresh);
                    } else {
                        updated.push(holding);
                    }
                }
                Some(Err(err)) => {
                    degraded = true;
                    if push_unique(&mut failed_symbols, &key.symbol) {
                        warnings.push(format!("{}: {}", key.symbol, err));
                    }
                    updated.push(holding);
                }
                None => updated.push(holding),
            }
        }

        // 4-5. Value and sum
        let summary = summarize(&updated, &rate, &self.settings.reporting_currency);
        if summary.saturated {
            degraded = true;
            let symbols = saturated_symbols(&summary);
            warn!("Valuation exceeded the representable range: {:?}", symbols);
            warnings.push(if symbols.is_empty() {
                "Portfolio totals exceed the representable range".to_string()
            } else {
                format!("Value out of range for {}", symbols.join(", "))
            });
        }

        // 6. Persist refreshed prices
        let mut durable = true;
        let persisted = self.holding_store.replace_stocks(refreshed).await;
        if let Some(message) = persisted.storage_error {
            durable = false;
            warnings.push(format!("Prices not saved: {}", message));
            self.event_sink.emit(DomainEvent::storage_degraded(message));
        }

        // 7. Snapshot
        let snapshot = self.snapshot_history.append(summary.total_value).await;
        if let Some(message) = snapshot.storage_error {
            durable = false;
            warnings.push(format!("Snapshot not saved: {}", message));
            self.event_sink.emit(DomainEvent::storage_degraded(message));
        }

        info!(
            "Portfolio refreshed in {:?}: total {} {}, {} holdings, degraded={}",
            started.elapsed(),
            summary.total_value,
            summary.reporting_currency,
            summary.holdings.len(),
            degraded
        );

        self.set_status(RefreshStatus {
            degraded,
            failed_symbols,
            stale_symbols,
            fx_source: rate.source,
            exchange_rate: rate,
            warnings,
            durable,
            refreshed_at: Some(now),
        });
        self.event_sink.emit(DomainEvent::portfolio_refreshed(
            summary.total_value,
            degraded,
        ));

        // 8.
        summary
    }

    fn set_exchange_rate(&self, rate: ExchangeRate) {
        *self
            .exchange_rate
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = rate;
    }

    fn set_status(&self, status: RefreshStatus) {
        *self
            .status
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = status;
    }
}

fn rate_source(freshness: Freshness) -> RateSource {
    match freshness {
        Freshness::Live => RateSource::Live,
        Freshness::Cached | Freshness::Stale => RateSource::Cached,
    }
}

/// Pushes `symbol` unless already present; returns whether it was added.
fn push_unique(symbols: &mut Vec<String>, symbol: &str) -> bool {
    if symbols.iter().any(|s| s == symbol) {
        return false;
    }
    symbols.push(symbol.to_string());
    true
}
