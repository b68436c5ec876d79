use std::sync::Arc;

use axum::{
    extract::{Path, State},
    routing::{delete, get},
    Json, Router,
};
use chrono::NaiveDate;
use kabufolio_core::{
    holdings::{Holding, NewHolding, Stock},
    portfolio::valuation::MutationResult,
};
use kabufolio_market_data::Market;
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::{error::ApiResult, main_lib::AppState};

/// Flat form of [`NewHolding`] as sent by the UI.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddHoldingRequest {
    pub symbol: String,
    #[serde(default)]
    pub name: String,
    pub market: Market,
    /// Last-known price; zero until the first refresh if omitted
    #[serde(default)]
    pub price: Decimal,
    pub quantity: Decimal,
    pub purchase_price: Decimal,
    pub purchase_date: NaiveDate,
    #[serde(default)]
    pub account: String,
}

impl From<AddHoldingRequest> for NewHolding {
    fn from(req: AddHoldingRequest) -> Self {
        NewHolding {
            stock: Stock::new(&req.symbol, req.name, req.market, req.price),
            quantity: req.quantity,
            purchase_price: req.purchase_price,
            purchase_date: req.purchase_date,
            account: req.account,
        }
    }
}

async fn list_holdings(State(state): State<Arc<AppState>>) -> Json<Vec<Holding>> {
    Json(state.engine.holdings())
}

async fn add_holding(
    State(state): State<Arc<AppState>>,
    Json(req): Json<AddHoldingRequest>,
) -> ApiResult<Json<MutationResult<Holding>>> {
    let result = state.engine.add_holding(req.into()).await?;
    Ok(Json(result))
}

/// Unknown ids are a no-op answered with `value: false`.
async fn remove_holding(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Json<MutationResult<bool>> {
    Json(state.engine.remove_holding(&id).await)
}

async fn clear_holdings(State(state): State<Arc<AppState>>) -> Json<MutationResult<usize>> {
    Json(state.engine.clear_holdings().await)
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/holdings",
            get(list_holdings).post(add_holding).delete(clear_holdings),
        )
        .route("/holdings/{id}", delete(remove_holding))
}
