use std::{str::FromStr, sync::Arc};

use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use kabufolio_market_data::{Market, StockCandidate};
use serde::Deserialize;

use crate::{
    error::{ApiError, ApiResult},
    main_lib::AppState,
};

#[derive(Deserialize)]
struct SearchQuery {
    query: String,
    market: Option<String>,
}

/// Symbol search, uncached. Defaults to the domestic market.
async fn search_stocks(
    State(state): State<Arc<AppState>>,
    Query(q): Query<SearchQuery>,
) -> ApiResult<Json<Vec<StockCandidate>>> {
    let market = match q.market.as_deref() {
        Some(raw) => Market::from_str(raw).map_err(ApiError::BadRequest)?,
        None => Market::Domestic,
    };
    let candidates = state.engine.search(&q.query, market).await?;
    Ok(Json(candidates))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/search", get(search_stocks))
}
