//! Database model for daily fund snapshots.

use diesel::prelude::*;
use nestegg_core::portfolio::snapshot::{FundSnapshot, NewFundSnapshot};

use crate::utils::{
    day_to_text, decimal_to_text, opt_decimal_to_text, opt_text_to_decimal, text_to_day,
    text_to_decimal, text_to_timestamp, timestamp_to_text,
};

/// Database model for daily fund snapshots
#[derive(Queryable, Selectable, Insertable, PartialEq, Debug, Clone)]
#[diesel(table_name = crate::schema::fund_snapshots)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct FundSnapshotDB {
    pub id: String,
    pub user_id: String,
    pub fund_code: String,
    pub price: Option<String>,
    pub units: Option<String>,
    pub market_value: String,
    pub mix_percent: String,
    pub contribution_percent_at_capture: String,
    pub as_of_day: String,
    pub captured_at: String,
}

impl FundSnapshotDB {
    pub fn from_new(id: String, new: NewFundSnapshot) -> Self {
        Self {
            id,
            price: opt_decimal_to_text(new.price),
            units: opt_decimal_to_text(new.units),
            market_value: decimal_to_text(new.market_value),
            mix_percent: decimal_to_text(new.mix_percent),
            contribution_percent_at_capture: decimal_to_text(new.contribution_percent_at_capture),
            as_of_day: day_to_text(new.as_of_day),
            captured_at: timestamp_to_text(new.captured_at),
            user_id: new.user_id,
            fund_code: new.fund_code,
        }
    }
}

impl From<FundSnapshotDB> for FundSnapshot {
    fn from(db: FundSnapshotDB) -> Self {
        Self {
            price: opt_text_to_decimal("price", db.price.as_deref()),
            units: opt_text_to_decimal("units", db.units.as_deref()),
            market_value: text_to_decimal("market_value", &db.market_value),
            mix_percent: text_to_decimal("mix_percent", &db.mix_percent),
            contribution_percent_at_capture: text_to_decimal(
                "contribution_percent_at_capture",
                &db.contribution_percent_at_capture,
            ),
            as_of_day: text_to_day(&db.as_of_day),
            captured_at: text_to_timestamp(&db.captured_at),
            id: db.id,
            user_id: db.user_id,
            fund_code: db.fund_code,
        }
    }
}
