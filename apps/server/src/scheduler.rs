//! Background scheduler for periodic portfolio refreshes.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::main_lib::AppState;

/// Starts refreshing every `every`. The first tick fires immediately, so the
/// portfolio is valued once at startup.
pub fn start_refresh_scheduler(state: Arc<AppState>, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!("Refresh scheduler started ({}s interval)", every.as_secs());

        let mut ticker = interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            run_scheduled_refresh(&state).await;
        }
    })
}

async fn run_scheduled_refresh(state: &Arc<AppState>) {
    debug!("Running scheduled refresh");
    let summary = state.engine.refresh().await;
    let status = state.engine.last_status();
    if status.degraded {
        warn!(
            "Scheduled refresh degraded: {} failed, {} stale, rate {:?}",
            status.failed_symbols.len(),
            status.stale_symbols.len(),
            status.fx_source
        );
    } else {
        debug!(
            "Scheduled refresh done: {} {}",
            summary.total_value, summary.reporting_currency
        );
    }
}
