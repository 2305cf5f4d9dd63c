use async_trait::async_trait;
use diesel::prelude::*;
use diesel::SqliteConnection;

use nestegg_core::errors::Result;
use nestegg_core::portfolio::valuation::{
    CacheWriteback, HoldingsState, ValuationJob, ValuationRepositoryTrait, ValuationSummary,
};
use nestegg_core::positions::FundPosition;
use nestegg_core::profiles::ProfileAggregate;

use crate::db::WriteHandle;
use crate::errors::StorageError;
use crate::positions::load_positions;
use crate::profiles::load_profile;
use crate::schema::{fund_positions, retirement_profiles};
use crate::utils::{day_to_text, decimal_to_text, timestamp_to_text};

/// Runs valuation jobs as read-compute-write units on the writer connection.
pub struct ValuationRepository {
    writer: WriteHandle,
}

impl ValuationRepository {
    pub fn new(writer: WriteHandle) -> Self {
        Self { writer }
    }
}

fn apply_writeback(
    conn: &mut SqliteConnection,
    owner: &str,
    writeback: &CacheWriteback,
) -> Result<()> {
    let priced_as_of = day_to_text(writeback.as_of_day);
    for update in &writeback.position_updates {
        diesel::update(
            fund_positions::table
                .filter(fund_positions::id.eq(&update.position_id))
                .filter(fund_positions::user_id.eq(owner)),
        )
        .set((
            fund_positions::cached_price.eq(Some(decimal_to_text(update.price))),
            fund_positions::cached_market_value.eq(Some(decimal_to_text(update.market_value))),
            fund_positions::cached_mix_percent.eq(Some(decimal_to_text(update.mix_percent))),
            fund_positions::last_priced_as_of.eq(Some(priced_as_of.clone())),
        ))
        .execute(conn)
        .map_err(StorageError::from)?;
    }

    if let Some(balance) = &writeback.profile_balance {
        diesel::update(retirement_profiles::table.find(owner))
            .set((
                retirement_profiles::total_balance
                    .eq(Some(decimal_to_text(balance.total_balance))),
                retirement_profiles::last_updated_at
                    .eq(Some(timestamp_to_text(balance.last_updated_at))),
            ))
            .execute(conn)
            .map_err(StorageError::from)?;
    }
    Ok(())
}

#[async_trait]
impl ValuationRepositoryTrait for ValuationRepository {
    async fn refresh_valuation(
        &self,
        user_id: &str,
        job: ValuationJob,
    ) -> Result<ValuationSummary> {
        let owner = user_id.to_string();
        self.writer
            .exec(move |conn| -> Result<ValuationSummary> {
                let state = HoldingsState {
                    positions: load_positions(conn, &owner)?
                        .into_iter()
                        .map(FundPosition::from)
                        .collect(),
                    profile: load_profile(conn, &owner)?.map(ProfileAggregate::from),
                };

                let outcome = job(&state)?;
                apply_writeback(conn, &owner, &outcome.writeback)?;
                Ok(outcome.summary)
            })
            .await
    }
}
