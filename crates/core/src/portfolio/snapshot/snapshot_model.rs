//! Historical snapshot domain models.

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::portfolio::valuation::FundSummaryItem;

/// Immutable valuation of one fund for one user on one as-of day.
///
/// Unique on `(user_id, fund_code, as_of_day)`; written once, never updated.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FundSnapshot {
    pub id: String,
    pub user_id: String,
    pub fund_code: String,
    pub price: Option<Decimal>,
    pub units: Option<Decimal>,
    pub market_value: Decimal,
    pub mix_percent: Decimal,
    pub contribution_percent_at_capture: Decimal,
    pub as_of_day: NaiveDate,
    pub captured_at: NaiveDateTime,
}

/// Input model for a snapshot row.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NewFundSnapshot {
    pub user_id: String,
    pub fund_code: String,
    pub price: Option<Decimal>,
    pub units: Option<Decimal>,
    pub market_value: Decimal,
    pub mix_percent: Decimal,
    pub contribution_percent_at_capture: Decimal,
    pub as_of_day: NaiveDate,
    pub captured_at: NaiveDateTime,
}

impl NewFundSnapshot {
    pub fn from_item(
        user_id: &str,
        as_of_day: NaiveDate,
        captured_at: NaiveDateTime,
        item: &FundSummaryItem,
    ) -> Self {
        Self {
            user_id: user_id.to_string(),
            fund_code: item.fund_code.clone(),
            price: item.price,
            units: item.units,
            market_value: item.market_value,
            mix_percent: item.mix_percent,
            contribution_percent_at_capture: item.contribution_percent,
            as_of_day,
            captured_at,
        }
    }
}

/// Result of writing one day's snapshot set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotWrite {
    Inserted(usize),
    /// Another writer already captured this day; nothing was written.
    AlreadyPresent,
}

/// What [`super::SnapshotServiceTrait::capture_if_absent`] did.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", tag = "status")]
pub enum CaptureOutcome {
    AlreadyCaptured { as_of_day: NaiveDate },
    NothingToCapture { as_of_day: NaiveDate },
    Captured { as_of_day: NaiveDate, rows: usize },
}

impl CaptureOutcome {
    pub fn as_of_day(&self) -> NaiveDate {
        match self {
            CaptureOutcome::AlreadyCaptured { as_of_day }
            | CaptureOutcome::NothingToCapture { as_of_day }
            | CaptureOutcome::Captured { as_of_day, .. } => *as_of_day,
        }
    }
}

/// All snapshot rows of one as-of day with their total.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DailySnapshotTotal {
    pub as_of_day: NaiveDate,
    pub total_market_value: Decimal,
    pub items: Vec<FundSnapshot>,
}
