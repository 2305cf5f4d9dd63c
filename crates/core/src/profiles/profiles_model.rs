//! Retirement profile aggregate models.

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::errors::{Result, ValidationError};

/// Single-row per-user aggregate.
///
/// The five `*_fund_percent` fields and `current_balance` predate per-fund
/// position rows and are only read to synthesize holdings for users that never
/// migrated. `total_balance` and `last_updated_at` are rewritten by every
/// valuation run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProfileAggregate {
    pub user_id: String,
    pub employee_contribution_percent: Option<Decimal>,
    pub employer_match_percent: Option<Decimal>,
    pub g_fund_percent: Decimal,
    pub f_fund_percent: Decimal,
    pub c_fund_percent: Decimal,
    pub s_fund_percent: Decimal,
    pub i_fund_percent: Decimal,
    pub current_balance: Decimal,
    pub target_balance: Option<Decimal>,
    pub total_balance: Option<Decimal>,
    pub last_updated_at: Option<NaiveDateTime>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl ProfileAggregate {
    /// Legacy base-fund percentages as `(fund_code, percent)` pairs, in G/F/C/S/I order.
    pub fn legacy_allocations(&self) -> [(&'static str, Decimal); 5] {
        [
            ("G", self.g_fund_percent),
            ("F", self.f_fund_percent),
            ("C", self.c_fund_percent),
            ("S", self.s_fund_percent),
            ("I", self.i_fund_percent),
        ]
    }

    /// True when the legacy fields alone describe a valuable holding.
    pub fn has_legacy_holdings(&self) -> bool {
        self.current_balance > Decimal::ZERO
            && self
                .legacy_allocations()
                .iter()
                .any(|(_, percent)| !percent.is_zero())
    }
}

/// Input model for creating or updating a profile. Never carries the
/// valuation-owned `total_balance`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    pub user_id: String,
    pub employee_contribution_percent: Option<Decimal>,
    pub employer_match_percent: Option<Decimal>,
    pub g_fund_percent: Decimal,
    pub f_fund_percent: Decimal,
    pub c_fund_percent: Decimal,
    pub s_fund_percent: Decimal,
    pub i_fund_percent: Decimal,
    pub current_balance: Decimal,
    pub target_balance: Option<Decimal>,
}

impl ProfileUpdate {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.user_id.trim().is_empty() {
            return Err(ValidationError::MissingField("userId".to_string()).into());
        }
        if self.current_balance < Decimal::ZERO {
            return Err(ValidationError::InvalidInput(
                "Current balance must not be negative".to_string(),
            )
            .into());
        }
        Ok(())
    }
}

/// Denormalized total written back by a valuation run.
#[derive(Debug, Clone, PartialEq)]
pub struct ProfileBalanceUpdate {
    pub total_balance: Decimal,
    pub last_updated_at: NaiveDateTime,
}
