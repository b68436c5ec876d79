use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Currency all totals are reported in
pub const REPORTING_CURRENCY: &str = "JPY";

/// Maximum number of points kept by the snapshot history
pub const SNAPSHOT_CAPACITY: usize = 90;

/// USD/JPY used before any live rate has ever been fetched
pub const DEFAULT_USD_JPY_RATE: Decimal = dec!(150);

/// Largest quantity or per-unit price accepted for a new holding
pub const MAX_HOLDING_AMOUNT: Decimal = dec!(1_000_000_000_000);
