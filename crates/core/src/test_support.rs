//! Fakes shared by the core service tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration as StdDuration;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use kabufolio_market_data::{
    normalize_symbol, FetchError, Market, Price, QuoteProvider, Rate, StockCandidate,
};
use rust_decimal::Decimal;

use crate::errors::{DatabaseError, Error, Result};
use crate::events::{DomainEvent, DomainEventSink};
use crate::holdings::{Holding, HoldingRepositoryTrait, NewHolding, Stock};
use crate::portfolio::snapshot::{PortfolioSnapshot, SnapshotRepositoryTrait};
use crate::utils::time_utils::ManualClock;

pub const PROVIDER_ID: &str = "FAKE";

pub fn start_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 3, 0, 0, 0).unwrap()
}

pub fn manual_clock() -> Arc<ManualClock> {
    Arc::new(ManualClock::new(start_time()))
}

pub fn new_holding(
    symbol: &str,
    market: Market,
    quantity: Decimal,
    purchase_price: Decimal,
    current_price: Decimal,
) -> NewHolding {
    NewHolding {
        stock: Stock::new(symbol, symbol, market, current_price),
        quantity,
        purchase_price,
        purchase_date: NaiveDate::from_ymd_opt(2024, 1, 10).unwrap(),
        account: "Brokerage".to_string(),
    }
}

fn storage_failure() -> Error {
    Error::Database(DatabaseError::QueryFailed("disk I/O error".to_string()))
}

// =========================================================================
// Quote provider
// =========================================================================

/// Scripted provider. Prices are keyed by normalized symbol; unknown symbols
/// answer with an upstream error.
#[derive(Default)]
pub struct FakeQuoteProvider {
    prices: Mutex<HashMap<String, std::result::Result<Decimal, FetchError>>>,
    rate: Mutex<Option<std::result::Result<Decimal, FetchError>>>,
    delay: Mutex<Option<StdDuration>>,
    price_calls: AtomicUsize,
    rate_calls: AtomicUsize,
}

impl FakeQuoteProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_price(&self, symbol: &str, market: Market, value: Decimal) {
        self.prices
            .lock()
            .unwrap()
            .insert(normalize_symbol(symbol, market), Ok(value));
    }

    pub fn fail_price(&self, symbol: &str, market: Market, error: FetchError) {
        self.prices
            .lock()
            .unwrap()
            .insert(normalize_symbol(symbol, market), Err(error));
    }

    pub fn set_rate(&self, value: Decimal) {
        *self.rate.lock().unwrap() = Some(Ok(value));
    }

    pub fn fail_rate(&self, error: FetchError) {
        *self.rate.lock().unwrap() = Some(Err(error));
    }

    /// Every call sleeps this long before answering.
    pub fn set_delay(&self, delay: StdDuration) {
        *self.delay.lock().unwrap() = Some(delay);
    }

    pub fn price_calls(&self) -> usize {
        self.price_calls.load(Ordering::SeqCst)
    }

    pub fn rate_calls(&self) -> usize {
        self.rate_calls.load(Ordering::SeqCst)
    }

    async fn pause(&self) {
        let delay = *self.delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
    }
}

pub fn upstream(message: &str) -> FetchError {
    FetchError::upstream(PROVIDER_ID, message)
}

#[async_trait]
impl QuoteProvider for FakeQuoteProvider {
    fn id(&self) -> &'static str {
        PROVIDER_ID
    }

    async fn get_price(
        &self,
        symbol: &str,
        market: Market,
    ) -> std::result::Result<Price, FetchError> {
        self.price_calls.fetch_add(1, Ordering::SeqCst);
        self.pause().await;
        let scripted = self.prices.lock().unwrap().get(symbol).cloned();
        let value = scripted.unwrap_or_else(|| Err(upstream("unknown symbol")))?;
        Ok(Price {
            symbol: symbol.to_string(),
            market,
            value,
            currency: market.currency().to_string(),
            name: None,
            timestamp: start_time(),
            source: PROVIDER_ID.to_string(),
        })
    }

    async fn get_exchange_rate(&self) -> std::result::Result<Rate, FetchError> {
        self.rate_calls.fetch_add(1, Ordering::SeqCst);
        self.pause().await;
        let scripted = self.rate.lock().unwrap().clone();
        let value = scripted.unwrap_or_else(|| Err(upstream("no rate scripted")))?;
        Ok(Rate::usd_jpy(value, start_time(), PROVIDER_ID))
    }

    async fn search(
        &self,
        query: &str,
        market: Market,
    ) -> std::result::Result<Vec<StockCandidate>, FetchError> {
        self.pause().await;
        Ok(self
            .prices
            .lock()
            .unwrap()
            .keys()
            .filter(|symbol| symbol.contains(&query.to_ascii_uppercase()))
            .map(|symbol| StockCandidate {
                symbol: symbol.clone(),
                name: symbol.clone(),
                market,
                exchange: String::new(),
                currency: market.currency().to_string(),
            })
            .collect())
    }
}

// =========================================================================
// Repositories
// =========================================================================

#[derive(Default)]
pub struct InMemoryHoldingRepository {
    rows: Mutex<Vec<Holding>>,
    fail_writes: AtomicBool,
}

impl InMemoryHoldingRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rows(rows: Vec<Holding>) -> Self {
        Self {
            rows: Mutex::new(rows),
            fail_writes: AtomicBool::new(false),
        }
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn rows(&self) -> Vec<Holding> {
        self.rows.lock().unwrap().clone()
    }

    fn check_writable(&self) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(storage_failure());
        }
        Ok(())
    }
}

#[async_trait]
impl HoldingRepositoryTrait for InMemoryHoldingRepository {
    fn list(&self) -> Result<Vec<Holding>> {
        Ok(self.rows())
    }

    async fn insert(&self, holding: Holding) -> Result<Holding> {
        self.check_writable()?;
        self.rows.lock().unwrap().push(holding.clone());
        Ok(holding)
    }

    async fn delete(&self, id: &str) -> Result<usize> {
        self.check_writable()?;
        let mut rows = self.rows.lock().unwrap();
        let before = rows.len();
        rows.retain(|h| h.id != id);
        Ok(before - rows.len())
    }

    async fn delete_all(&self) -> Result<usize> {
        self.check_writable()?;
        let mut rows = self.rows.lock().unwrap();
        let count = rows.len();
        rows.clear();
        Ok(count)
    }

    async fn update_stocks(&self, holdings: &[Holding]) -> Result<usize> {
        self.check_writable()?;
        let mut rows = self.rows.lock().unwrap();
        let mut updated = 0;
        for row in rows.iter_mut() {
            if let Some(fresh) = holdings.iter().find(|h| h.id == row.id) {
                row.stock = fresh.stock.clone();
                updated += 1;
            }
        }
        Ok(updated)
    }
}

#[derive(Default)]
pub struct InMemorySnapshotRepository {
    rows: Mutex<Vec<PortfolioSnapshot>>,
    fail_writes: AtomicBool,
    fail_reads: AtomicBool,
}

impl InMemorySnapshotRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rows(rows: Vec<PortfolioSnapshot>) -> Self {
        Self {
            rows: Mutex::new(rows),
            ..Self::default()
        }
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn rows(&self) -> Vec<PortfolioSnapshot> {
        self.rows.lock().unwrap().clone()
    }
}

#[async_trait]
impl SnapshotRepositoryTrait for InMemorySnapshotRepository {
    fn list_since(&self, since: Option<DateTime<Utc>>) -> Result<Vec<PortfolioSnapshot>> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(storage_failure());
        }
        Ok(self
            .rows()
            .into_iter()
            .filter(|s| since.map_or(true, |since| s.timestamp >= since))
            .collect())
    }

    async fn append(&self, snapshot: &PortfolioSnapshot) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(storage_failure());
        }
        self.rows.lock().unwrap().push(snapshot.clone());
        Ok(())
    }

    async fn prune_to(&self, keep: usize) -> Result<usize> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(storage_failure());
        }
        let mut rows = self.rows.lock().unwrap();
        let excess = rows.len().saturating_sub(keep);
        rows.drain(..excess);
        Ok(excess)
    }
}

/// Sink that keeps every emitted event for later assertions.
#[derive(Default)]
pub struct RecordingSink {
    events: Mutex<Vec<DomainEvent>>,
}

impl RecordingSink {
    pub fn events(&self) -> Vec<DomainEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn is_empty(&self) -> bool {
        self.events.lock().unwrap().is_empty()
    }
}

impl DomainEventSink for RecordingSink {
    fn emit(&self, event: DomainEvent) {
        self.events.lock().unwrap().push(event);
    }
}
