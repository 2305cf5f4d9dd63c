//! Fund position domain models.

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::errors::{Result, ValidationError};
use crate::funds::normalize_fund_code;

/// Current holding of one fund for one user. Unique on `(user_id, fund_code)`.
///
/// The `cached_*` fields and `last_priced_as_of` are a materialized view owned by
/// the valuation engine; user edits never write them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FundPosition {
    pub id: String,
    pub user_id: String,
    pub fund_code: String,
    pub contribution_percent: Decimal,
    pub units: Decimal,
    pub cached_price: Option<Decimal>,
    pub cached_market_value: Option<Decimal>,
    pub cached_mix_percent: Option<Decimal>,
    pub last_priced_as_of: Option<NaiveDate>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Input model for creating a position row.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NewFundPosition {
    pub user_id: String,
    pub fund_code: String,
    pub contribution_percent: Decimal,
    pub units: Decimal,
}

impl NewFundPosition {
    pub fn new(
        user_id: impl Into<String>,
        fund_code: &str,
        contribution_percent: Decimal,
        units: Decimal,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            fund_code: normalize_fund_code(fund_code),
            contribution_percent,
            units,
        }
    }

    /// A zero-unit, zero-contribution placeholder row.
    pub fn baseline(user_id: impl Into<String>, fund_code: &str) -> Self {
        Self::new(user_id, fund_code, Decimal::ZERO, Decimal::ZERO)
    }

    pub fn validate(&self) -> Result<()> {
        if self.user_id.trim().is_empty() {
            return Err(ValidationError::MissingField("userId".to_string()).into());
        }
        if self.fund_code.trim().is_empty() {
            return Err(ValidationError::MissingField("fundCode".to_string()).into());
        }
        if self.units < Decimal::ZERO {
            return Err(ValidationError::InvalidInput(format!(
                "Units for fund {} must not be negative (got {})",
                self.fund_code, self.units
            ))
            .into());
        }
        Ok(())
    }
}

/// Cache values written back onto one position row by a valuation run.
#[derive(Debug, Clone, PartialEq)]
pub struct PositionCacheUpdate {
    pub position_id: String,
    pub price: Decimal,
    pub market_value: Decimal,
    pub mix_percent: Decimal,
}
