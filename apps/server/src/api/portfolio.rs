use std::{convert::Infallible, str::FromStr, sync::Arc, time::Duration};

use axum::{
    extract::{Query, State},
    response::sse::{Event as SseEvent, KeepAlive, Sse},
    routing::{get, post},
    Json, Router,
};
use futures_core::stream::Stream;
use kabufolio_core::portfolio::{
    snapshot::{PortfolioSnapshot, TimeRange},
    valuation::{PortfolioSummary, RefreshStatus},
};
use serde::Deserialize;
use tokio_stream::wrappers::{errors::BroadcastStreamRecvError, BroadcastStream};

use crate::{error::ApiResult, main_lib::AppState};

#[derive(Deserialize)]
struct HistoryQuery {
    range: Option<String>,
}

async fn get_summary(State(state): State<Arc<AppState>>) -> Json<PortfolioSummary> {
    Json(state.engine.summary())
}

/// Runs (or joins) a refresh. Degradation is reported through
/// `/portfolio/status`.
///
/// The refresh runs on its own task so a dropped request (client gone,
/// request timeout) still completes the run and records its snapshot.
async fn refresh_portfolio(
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<PortfolioSummary>> {
    let engine = state.engine.clone();
    let summary = tokio::spawn(async move { engine.refresh().await })
        .await
        .map_err(|e| kabufolio_core::Error::Unexpected(format!("Refresh task failed: {}", e)))?;
    Ok(Json(summary))
}

async fn get_status(State(state): State<Arc<AppState>>) -> Json<RefreshStatus> {
    Json(state.engine.last_status())
}

async fn get_history(
    State(state): State<Arc<AppState>>,
    Query(q): Query<HistoryQuery>,
) -> ApiResult<Json<Vec<PortfolioSnapshot>>> {
    let range = match q.range.as_deref() {
        Some(code) => TimeRange::from_str(code).map_err(kabufolio_core::Error::from)?,
        None => TimeRange::OneMonth,
    };
    Ok(Json(state.engine.history(range)))
}

async fn stream_events(
    State(state): State<Arc<AppState>>,
) -> Sse<impl Stream<Item = Result<SseEvent, Infallible>>> {
    let receiver = BroadcastStream::new(state.event_bus.subscribe());
    let stream = tokio_stream::StreamExt::filter_map(receiver, |event| match event {
        Ok(evt) => {
            let sse_event = SseEvent::default().event(evt.name);
            let sse_event = if let Some(payload) = evt.payload {
                match sse_event.json_data(payload) {
                    Ok(ev) => ev,
                    Err(err) => {
                        tracing::error!(
                            "Failed to serialize SSE payload for {}: {}",
                            evt.name,
                            err
                        );
                        return None;
                    }
                }
            } else {
                sse_event.data("null")
            };
            Some(Ok(sse_event))
        }
        Err(BroadcastStreamRecvError::Lagged(skipped)) => {
            tracing::debug!("SSE client lagged, skipped {} events", skipped);
            None
        }
    });

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/portfolio/summary", get(get_summary))
        .route("/portfolio/refresh", post(refresh_portfolio))
        .route("/portfolio/status", get(get_status))
        .route("/portfolio/history", get(get_history))
        .route("/events", get(stream_events))
}
