use chrono::{NaiveDate, NaiveDateTime};
use log::debug;
use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use std::collections::BTreeMap;

use crate::constants::{DERIVED_UNITS_PRECISION, MARKET_VALUE_PRECISION, MIX_PERCENT_PRECISION};
use crate::funds::normalize_fund_code;
use crate::portfolio::valuation::valuation_model::{
    CacheWriteback, FundSummaryItem, HoldingsOrigin, HoldingsState, ValuationOutcome,
    ValuationSummary,
};
use crate::positions::{FundPosition, PositionCacheUpdate};
use crate::prices::FundPriceMap;
use crate::profiles::{ProfileAggregate, ProfileBalanceUpdate};

/// A holding derived from the legacy percentage fields. Never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct SynthesizedPosition {
    pub fund_code: &'static str,
    pub percent: Decimal,
    pub value: Decimal,
}

/// The holdings a valuation works from. Real rows always win; legacy data is
/// only consulted when the user has no position rows at all.
#[derive(Debug, Clone, PartialEq)]
pub enum ResolvedPositions<'a> {
    Recorded(&'a [FundPosition]),
    Synthesized(Vec<SynthesizedPosition>),
    Empty,
}

pub fn resolve_positions(state: &HoldingsState) -> ResolvedPositions<'_> {
    if !state.positions.is_empty() {
        return ResolvedPositions::Recorded(&state.positions);
    }
    match &state.profile {
        Some(profile) if profile.has_legacy_holdings() => {
            ResolvedPositions::Synthesized(synthesize_from_profile(profile))
        }
        _ => ResolvedPositions::Empty,
    }
}

fn synthesize_from_profile(profile: &ProfileAggregate) -> Vec<SynthesizedPosition> {
    profile
        .legacy_allocations()
        .into_iter()
        .filter(|(_, percent)| !percent.is_zero())
        .map(|(fund_code, percent)| SynthesizedPosition {
            fund_code,
            percent,
            value: round_market_value(profile.current_balance * percent / dec!(100)),
        })
        .collect()
}

/// Canonicalizes price keys and drops prices that cannot value anything.
pub fn normalize_prices(raw: FundPriceMap) -> FundPriceMap {
    raw.into_iter()
        .filter_map(|(code, price)| {
            let canonical = normalize_fund_code(&code);
            if price <= Decimal::ZERO {
                debug!("Ignoring non-positive price {} for fund {}", price, canonical);
                return None;
            }
            Some((canonical, price))
        })
        .collect()
}

pub fn round_market_value(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(MARKET_VALUE_PRECISION, RoundingStrategy::MidpointAwayFromZero)
}

pub fn mix_percent(market_value: Decimal, total: Decimal) -> Decimal {
    if total <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    (market_value * dec!(100) / total)
        .round_dp_with_strategy(MIX_PERCENT_PRECISION, RoundingStrategy::MidpointAwayFromZero)
}

/// Values a user's holdings against `prices` and describes the cache refresh.
///
/// Pure: reading and writing the stores is the caller's job.
pub fn calculate_valuation(
    user_id: &str,
    state: &HoldingsState,
    prices: &FundPriceMap,
    as_of_day: NaiveDate,
    calculated_at: NaiveDateTime,
) -> ValuationOutcome {
    let (summary, position_updates) = match resolve_positions(state) {
        ResolvedPositions::Recorded(positions) => {
            value_recorded_positions(user_id, positions, prices, as_of_day)
        }
        // Without any prices a legacy profile has nothing to value against either.
        ResolvedPositions::Synthesized(_) if prices.is_empty() => {
            debug!(
                "No prices for legacy holdings of user {} on {}",
                user_id, as_of_day
            );
            (ValuationSummary::empty(user_id, as_of_day), Vec::new())
        }
        ResolvedPositions::Synthesized(synthesized) => (
            value_synthesized_positions(user_id, &synthesized, prices, as_of_day),
            Vec::new(),
        ),
        ResolvedPositions::Empty => (ValuationSummary::empty(user_id, as_of_day), Vec::new()),
    };

    let profile_balance = state.profile.as_ref().map(|_| ProfileBalanceUpdate {
        total_balance: summary.total_market_value,
        last_updated_at: calculated_at,
    });

    ValuationOutcome {
        writeback: CacheWriteback {
            as_of_day,
            position_updates,
            profile_balance,
        },
        summary,
    }
}

#[derive(Default)]
struct FundAccumulator {
    price: Decimal,
    units: Decimal,
    market_value: Decimal,
    contribution_percent: Decimal,
    // (position_id, market value of that row)
    rows: Vec<(String, Decimal)>,
}

fn value_recorded_positions(
    user_id: &str,
    positions: &[FundPosition],
    prices: &FundPriceMap,
    as_of_day: NaiveDate,
) -> (ValuationSummary, Vec<PositionCacheUpdate>) {
    // Keyed by canonical code so rows stored under older spellings fold into one line.
    let mut funds: BTreeMap<String, FundAccumulator> = BTreeMap::new();
    let mut total = Decimal::ZERO;

    for position in positions {
        let fund_code = normalize_fund_code(&position.fund_code);
        let Some(&price) = prices.get(&fund_code) else {
            debug!(
                "No price for fund {} (user {}); leaving it out of the {} valuation",
                fund_code, user_id, as_of_day
            );
            continue;
        };

        let market_value = round_market_value(position.units * price);
        total += market_value;

        let fund = funds.entry(fund_code).or_default();
        fund.price = price;
        fund.units += position.units;
        fund.market_value += market_value;
        fund.contribution_percent += position.contribution_percent;
        fund.rows.push((position.id.clone(), market_value));
    }

    let mut items = Vec::with_capacity(funds.len());
    let mut updates = Vec::new();
    for (fund_code, fund) in funds {
        for (position_id, row_value) in &fund.rows {
            updates.push(PositionCacheUpdate {
                position_id: position_id.clone(),
                price: fund.price,
                market_value: *row_value,
                mix_percent: mix_percent(*row_value, total),
            });
        }
        items.push(FundSummaryItem {
            mix_percent: mix_percent(fund.market_value, total),
            fund_code,
            price: Some(fund.price),
            units: Some(fund.units),
            market_value: fund.market_value,
            contribution_percent: fund.contribution_percent,
        });
    }

    let summary = ValuationSummary {
        user_id: user_id.to_string(),
        as_of_day,
        items,
        total_market_value: total,
        origin: HoldingsOrigin::Positions,
    };
    (summary, updates)
}

fn value_synthesized_positions(
    user_id: &str,
    synthesized: &[SynthesizedPosition],
    prices: &FundPriceMap,
    as_of_day: NaiveDate,
) -> ValuationSummary {
    let total: Decimal = synthesized.iter().map(|p| p.value).sum();

    let mut items: Vec<FundSummaryItem> = synthesized
        .iter()
        .map(|position| {
            let price = prices.get(position.fund_code).copied();
            FundSummaryItem {
                fund_code: position.fund_code.to_string(),
                price,
                units: price.map(|p| (position.value / p).round_dp(DERIVED_UNITS_PRECISION)),
                market_value: position.value,
                mix_percent: mix_percent(position.value, total),
                contribution_percent: position.percent,
            }
        })
        .collect();
    items.sort_by(|a, b| a.fund_code.cmp(&b.fund_code));

    ValuationSummary {
        user_id: user_id.to_string(),
        as_of_day,
        items,
        total_market_value: total,
        origin: HoldingsOrigin::LegacyProfile,
    }
}
