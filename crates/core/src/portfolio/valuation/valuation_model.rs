//! Retirement valuation domain models.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::errors::Result;
use crate::positions::{FundPosition, PositionCacheUpdate};
use crate::profiles::{ProfileAggregate, ProfileBalanceUpdate};

/// Where the holdings behind a summary came from.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HoldingsOrigin {
    /// Per-fund position rows.
    Positions,
    /// Synthesized from the legacy percentage fields of the profile.
    LegacyProfile,
    /// Nothing to value.
    None,
}

/// One fund line of a valuation summary.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FundSummaryItem {
    pub fund_code: String,
    /// Always set for position-backed items; legacy items may be unpriced.
    pub price: Option<Decimal>,
    /// Held units, or the units implied by a legacy balance when a price is known.
    pub units: Option<Decimal>,
    pub market_value: Decimal,
    pub mix_percent: Decimal,
    pub contribution_percent: Decimal,
}

/// Point-in-time valuation of a user's retirement holdings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ValuationSummary {
    pub user_id: String,
    pub as_of_day: NaiveDate,
    /// Sorted by fund code ascending.
    pub items: Vec<FundSummaryItem>,
    pub total_market_value: Decimal,
    pub origin: HoldingsOrigin,
}

impl ValuationSummary {
    pub fn empty(user_id: impl Into<String>, as_of_day: NaiveDate) -> Self {
        Self {
            user_id: user_id.into(),
            as_of_day,
            items: Vec::new(),
            total_market_value: Decimal::ZERO,
            origin: HoldingsOrigin::None,
        }
    }

    pub fn item(&self, fund_code: &str) -> Option<&FundSummaryItem> {
        self.items.iter().find(|item| item.fund_code == fund_code)
    }
}

/// Everything stored about a user that a valuation reads.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HoldingsState {
    pub positions: Vec<FundPosition>,
    pub profile: Option<ProfileAggregate>,
}

/// Denormalized values to persist after a valuation.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheWriteback {
    pub as_of_day: NaiveDate,
    pub position_updates: Vec<PositionCacheUpdate>,
    /// `None` when the user has no profile row.
    pub profile_balance: Option<ProfileBalanceUpdate>,
}

/// Result of valuing one [`HoldingsState`].
#[derive(Debug, Clone, PartialEq)]
pub struct ValuationOutcome {
    pub summary: ValuationSummary,
    pub writeback: CacheWriteback,
}

/// Valuation step run by the repository between reading holdings and writing caches.
pub type ValuationJob = Box<dyn FnOnce(&HoldingsState) -> Result<ValuationOutcome> + Send + 'static>;
