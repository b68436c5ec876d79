use rust_decimal::Decimal;

use crate::fx::ExchangeRate;
use crate::holdings::Holding;
use crate::portfolio::valuation::{HoldingValuation, PortfolioSummary};

const HUNDRED: Decimal = Decimal::ONE_HUNDRED;

/// Tracks whether any step left the `Decimal` range and had to saturate.
#[derive(Default)]
struct Saturation(bool);

impl Saturation {
    fn mul(&mut self, a: Decimal, b: Decimal) -> Decimal {
        a.checked_mul(b).unwrap_or_else(|| {
            self.0 = true;
            a.saturating_mul(b)
        })
    }

    fn add(&mut self, a: Decimal, b: Decimal) -> Decimal {
        a.checked_add(b).unwrap_or_else(|| {
            self.0 = true;
            a.saturating_add(b)
        })
    }

    fn sub(&mut self, a: Decimal, b: Decimal) -> Decimal {
        a.checked_sub(b).unwrap_or_else(|| {
            self.0 = true;
            a.saturating_sub(b)
        })
    }
}

/// Values one holding in the reporting currency.
///
/// ```text
/// current_value = price * quantity * factor
/// cost_basis    = purchase_price * quantity * factor
/// gain_loss     = current_value - cost_basis
/// ```
///
/// `factor` is the exchange rate for foreign holdings and 1 for domestic
/// ones. A product outside the `Decimal` range saturates and sets
/// `saturated` on the result.
pub fn value_holding(holding: &Holding, rate: &ExchangeRate) -> HoldingValuation {
    let market = holding.market();
    let factor = rate.conversion_factor(market);
    let mut saturation = Saturation::default();
    let market_value = saturation.mul(holding.stock.price, holding.quantity);
    let current_value = saturation.mul(market_value, factor);
    let market_cost = saturation.mul(holding.purchase_price, holding.quantity);
    let cost_basis = saturation.mul(market_cost, factor);
    let gain_loss = saturation.sub(current_value, cost_basis);

    HoldingValuation {
        holding_id: holding.id.clone(),
        symbol: holding.stock.symbol.clone(),
        name: holding.stock.name.clone(),
        market,
        account: holding.account.clone(),
        purchase_date: holding.purchase_date,
        quantity: holding.quantity,
        purchase_price: holding.purchase_price,
        current_price: holding.stock.price,
        currency: holding.stock.currency.clone(),
        conversion_factor: factor,
        current_value,
        cost_basis,
        gain_loss,
        gain_loss_pct: gain_loss_pct(gain_loss, cost_basis),
        saturated: saturation.0,
    }
}

/// Sums per-holding values into a summary. Totals are exact sums of the
/// per-holding values; nothing is rounded. Totals that leave the `Decimal`
/// range saturate and set `saturated`.
pub fn summarize(
    holdings: &[Holding],
    rate: &ExchangeRate,
    reporting_currency: &str,
) -> PortfolioSummary {
    let valuations: Vec<HoldingValuation> =
        holdings.iter().map(|h| value_holding(h, rate)).collect();

    let mut saturation = Saturation(valuations.iter().any(|v| v.saturated));
    let mut total_value = Decimal::ZERO;
    let mut total_cost_basis = Decimal::ZERO;
    for valuation in &valuations {
        total_value = saturation.add(total_value, valuation.current_value);
        total_cost_basis = saturation.add(total_cost_basis, valuation.cost_basis);
    }
    let total_gain_loss = saturation.sub(total_value, total_cost_basis);

    PortfolioSummary {
        reporting_currency: reporting_currency.to_string(),
        total_value,
        total_cost_basis,
        total_gain_loss,
        total_gain_loss_pct: gain_loss_pct(total_gain_loss, total_cost_basis),
        exchange_rate: rate.rate,
        saturated: saturation.0,
        holdings: valuations,
    }
}

/// Symbols whose valuation left the representable range.
pub fn saturated_symbols(summary: &PortfolioSummary) -> Vec<String> {
    let mut symbols: Vec<String> = Vec::new();
    for valuation in summary.holdings.iter().filter(|v| v.saturated) {
        if !symbols.contains(&valuation.symbol) {
            symbols.push(valuation.symbol.clone());
        }
    }
    symbols
}

/// `gain_loss / cost_basis * 100`, or 0 when the cost basis is 0.
pub fn gain_loss_pct(gain_loss: Decimal, cost_basis: Decimal) -> Decimal {
    if cost_basis.is_zero() {
        return Decimal::ZERO;
    }
    gain_loss
        .checked_div(cost_basis)
        .and_then(|ratio| ratio.checked_mul(HUNDRED))
        .unwrap_or(Decimal::ZERO)
}
