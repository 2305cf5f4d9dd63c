/// Canonical code of the lifecycle income fund.
pub const L_INCOME_FUND_CODE: &str = "L-INCOME";

/// The five individual base funds, in display order.
pub const BASE_FUND_CODES: [&str; 5] = ["G", "F", "C", "S", "I"];

/// Funds every user is expected to have a position row for.
pub const BASELINE_FUND_CODES: [&str; 6] = ["G", "F", "C", "S", "I", L_INCOME_FUND_CODE];

/// Hour (UTC) at which the trading day's closing prices become authoritative.
/// Approximates the US market close across daylight saving time.
pub const MARKET_CLOSE_CUTOFF_HOUR_UTC: u32 = 22;

/// Default upper bound on a single price-source fetch.
pub const DEFAULT_PRICE_FETCH_TIMEOUT_SECS: u64 = 10;

/// Decimal places kept for market values.
pub const MARKET_VALUE_PRECISION: u32 = 2;

/// Decimal places kept for mix percentages.
pub const MIX_PERCENT_PRECISION: u32 = 4;

/// Decimal places kept for units derived from a legacy balance.
pub const DERIVED_UNITS_PRECISION: u32 = 6;
