//! Database models for fund positions.

use chrono::NaiveDateTime;
use diesel::prelude::*;
use nestegg_core::positions::{FundPosition, NewFundPosition};

use crate::utils::{
    decimal_to_text, opt_text_to_decimal, text_to_day, text_to_decimal, text_to_timestamp,
    timestamp_to_text,
};

/// Database model for fund positions
#[derive(Queryable, Selectable, Insertable, Identifiable, PartialEq, Debug, Clone)]
#[diesel(table_name = crate::schema::fund_positions)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct FundPositionDB {
    pub id: String,
    pub user_id: String,
    pub fund_code: String,
    pub contribution_percent: String,
    pub units: String,
    pub cached_price: Option<String>,
    pub cached_market_value: Option<String>,
    pub cached_mix_percent: Option<String>,
    pub last_priced_as_of: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl FundPositionDB {
    /// Builds a fresh row with no cached valuation.
    pub fn from_new(id: String, new: NewFundPosition, now: NaiveDateTime) -> Self {
        let stamp = timestamp_to_text(now);
        Self {
            id,
            user_id: new.user_id,
            fund_code: new.fund_code,
            contribution_percent: decimal_to_text(new.contribution_percent),
            units: decimal_to_text(new.units),
            cached_price: None,
            cached_market_value: None,
            cached_mix_percent: None,
            last_priced_as_of: None,
            created_at: stamp.clone(),
            updated_at: stamp,
        }
    }
}

impl From<FundPositionDB> for FundPosition {
    fn from(db: FundPositionDB) -> Self {
        Self {
            contribution_percent: text_to_decimal("contribution_percent", &db.contribution_percent),
            units: text_to_decimal("units", &db.units),
            cached_price: opt_text_to_decimal("cached_price", db.cached_price.as_deref()),
            cached_market_value: opt_text_to_decimal(
                "cached_market_value",
                db.cached_market_value.as_deref(),
            ),
            cached_mix_percent: opt_text_to_decimal(
                "cached_mix_percent",
                db.cached_mix_percent.as_deref(),
            ),
            last_priced_as_of: db.last_priced_as_of.as_deref().map(text_to_day),
            created_at: text_to_timestamp(&db.created_at),
            updated_at: text_to_timestamp(&db.updated_at),
            id: db.id,
            user_id: db.user_id,
            fund_code: db.fund_code,
        }
    }
}
