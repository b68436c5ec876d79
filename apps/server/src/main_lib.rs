use std::sync::Arc;

use crate::{
    config::{Config, ProviderKind},
    domain_events::WebDomainEventSink,
    events::EventBus,
};
use kabufolio_core::{
    events::DomainEventSink,
    holdings::HoldingStore,
    portfolio::{snapshot::SnapshotHistory, valuation::ValuationEngine},
    quotes::PriceCache,
    utils::time_utils::{Clock, SystemClock},
};
use kabufolio_market_data::{BackendQuoteProvider, QuoteProvider, YahooChartProvider};
use kabufolio_storage_sqlite::{
    create_pool, init, run_migrations, spawn_writer, HoldingRepository, SnapshotRepository,
};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

pub struct AppState {
    pub engine: Arc<ValuationEngine>,
    pub event_bus: EventBus,
    pub db_path: String,
}

/// Installs the global subscriber. `KF_LOG_FORMAT=json` switches to JSON
/// lines; `log` records from the library crates are bridged in.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = std::env::var("KF_LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(fmt::layer().json().with_current_span(false))
            .init();
    } else {
        registry.with(fmt::layer()).init();
    }
}

pub fn build_provider(config: &Config) -> Arc<dyn QuoteProvider> {
    let timeout = config.settings.fetch_timeout();
    match &config.provider {
        ProviderKind::Yahoo => Arc::new(YahooChartProvider::with_timeout(timeout)),
        ProviderKind::Backend { base_url } => {
            Arc::new(BackendQuoteProvider::with_timeout(base_url.clone(), timeout))
        }
    }
}

pub async fn build_state(config: &Config) -> anyhow::Result<Arc<AppState>> {
    build_state_with_provider(config, build_provider(config)).await
}

/// Opens the database, loads holdings and history, and wires the engine
/// around `provider`.
pub async fn build_state_with_provider(
    config: &Config,
    provider: Arc<dyn QuoteProvider>,
) -> anyhow::Result<Arc<AppState>> {
    let db_path = init(&config.db_path)?;
    tracing::info!("Database path in use: {}", db_path);

    let pool = create_pool(&db_path)?;
    run_migrations(&pool)?;
    let writer = spawn_writer((*pool).clone());

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let event_bus = EventBus::new(256);
    let event_sink: Arc<dyn DomainEventSink> = Arc::new(WebDomainEventSink::new(event_bus.clone()));

    tracing::info!("Quote provider: {}", provider.id());
    let price_cache = Arc::new(PriceCache::new(provider, &config.settings, clock.clone()));

    let holding_repository = Arc::new(HoldingRepository::new(pool.clone(), writer.clone()));
    let holding_store = Arc::new(HoldingStore::load(holding_repository, clock.clone())?);

    let snapshot_repository = Arc::new(SnapshotRepository::new(pool.clone(), writer.clone()));
    let snapshot_history = Arc::new(SnapshotHistory::load(
        snapshot_repository,
        config.settings.snapshot_capacity,
        clock.clone(),
    ));
    tracing::info!(
        "Loaded {} holdings and {} snapshots",
        holding_store.len(),
        snapshot_history.len()
    );

    let engine = Arc::new(ValuationEngine::new(
        config.settings.clone(),
        price_cache,
        holding_store,
        snapshot_history,
        event_sink,
        clock,
    ));

    Ok(Arc::new(AppState {
        engine,
        event_bus,
        db_path,
    }))
}
