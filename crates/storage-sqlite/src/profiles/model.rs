//! Database models for retirement profiles.

use diesel::prelude::*;
use nestegg_core::profiles::{ProfileAggregate, ProfileUpdate};

use crate::utils::{
    decimal_to_text, opt_decimal_to_text, opt_text_to_decimal, text_to_decimal,
    text_to_timestamp,
};

/// Database model for retirement profiles
#[derive(Queryable, Selectable, Identifiable, Insertable, PartialEq, Debug, Clone)]
#[diesel(table_name = crate::schema::retirement_profiles)]
#[diesel(primary_key(user_id))]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct RetirementProfileDB {
    pub user_id: String,
    pub employee_contribution_percent: Option<String>,
    pub employer_match_percent: Option<String>,
    pub g_fund_percent: String,
    pub f_fund_percent: String,
    pub c_fund_percent: String,
    pub s_fund_percent: String,
    pub i_fund_percent: String,
    pub current_balance: String,
    pub target_balance: Option<String>,
    pub total_balance: Option<String>,
    pub last_updated_at: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// User-owned columns written by a profile upsert. Never touches the
/// valuation-owned `total_balance` and `last_updated_at`.
#[derive(AsChangeset, Debug, Clone)]
#[diesel(table_name = crate::schema::retirement_profiles)]
#[diesel(treat_none_as_null = true)]
pub struct RetirementProfileChangeset {
    pub employee_contribution_percent: Option<String>,
    pub employer_match_percent: Option<String>,
    pub g_fund_percent: String,
    pub f_fund_percent: String,
    pub c_fund_percent: String,
    pub s_fund_percent: String,
    pub i_fund_percent: String,
    pub current_balance: String,
    pub target_balance: Option<String>,
    pub updated_at: String,
}

impl RetirementProfileChangeset {
    pub fn new(update: &ProfileUpdate, now: String) -> Self {
        Self {
            employee_contribution_percent: opt_decimal_to_text(
                update.employee_contribution_percent,
            ),
            employer_match_percent: opt_decimal_to_text(update.employer_match_percent),
            g_fund_percent: decimal_to_text(update.g_fund_percent),
            f_fund_percent: decimal_to_text(update.f_fund_percent),
            c_fund_percent: decimal_to_text(update.c_fund_percent),
            s_fund_percent: decimal_to_text(update.s_fund_percent),
            i_fund_percent: decimal_to_text(update.i_fund_percent),
            current_balance: decimal_to_text(update.current_balance),
            target_balance: opt_decimal_to_text(update.target_balance),
            updated_at: now,
        }
    }

    pub fn into_new_row(self, user_id: String, created_at: String) -> RetirementProfileDB {
        RetirementProfileDB {
            user_id,
            employee_contribution_percent: self.employee_contribution_percent,
            employer_match_percent: self.employer_match_percent,
            g_fund_percent: self.g_fund_percent,
            f_fund_percent: self.f_fund_percent,
            c_fund_percent: self.c_fund_percent,
            s_fund_percent: self.s_fund_percent,
            i_fund_percent: self.i_fund_percent,
            current_balance: self.current_balance,
            target_balance: self.target_balance,
            total_balance: None,
            last_updated_at: None,
            created_at,
            updated_at: self.updated_at,
        }
    }
}

impl From<RetirementProfileDB> for ProfileAggregate {
    fn from(db: RetirementProfileDB) -> Self {
        Self {
            employee_contribution_percent: opt_text_to_decimal(
                "employee_contribution_percent",
                db.employee_contribution_percent.as_deref(),
            ),
            employer_match_percent: opt_text_to_decimal(
                "employer_match_percent",
                db.employer_match_percent.as_deref(),
            ),
            g_fund_percent: text_to_decimal("g_fund_percent", &db.g_fund_percent),
            f_fund_percent: text_to_decimal("f_fund_percent", &db.f_fund_percent),
            c_fund_percent: text_to_decimal("c_fund_percent", &db.c_fund_percent),
            s_fund_percent: text_to_decimal("s_fund_percent", &db.s_fund_percent),
            i_fund_percent: text_to_decimal("i_fund_percent", &db.i_fund_percent),
            current_balance: text_to_decimal("current_balance", &db.current_balance),
            target_balance: opt_text_to_decimal("target_balance", db.target_balance.as_deref()),
            total_balance: opt_text_to_decimal("total_balance", db.total_balance.as_deref()),
            last_updated_at: db.last_updated_at.as_deref().map(text_to_timestamp),
            created_at: text_to_timestamp(&db.created_at),
            updated_at: text_to_timestamp(&db.updated_at),
            user_id: db.user_id,
        }
    }
}
