use async_trait::async_trait;
use chrono::NaiveDate;
use log::{debug, info};
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use std::sync::Arc;

use super::{
    CaptureOutcome, DailySnapshotTotal, FundSnapshot, NewFundSnapshot, SnapshotRepositoryTrait,
    SnapshotServiceTrait, SnapshotWrite,
};
use crate::errors::Result;
use crate::portfolio::valuation::ValuationServiceTrait;
use crate::utils::{Clock, UserLocks};

pub struct SnapshotService {
    snapshot_repository: Arc<dyn SnapshotRepositoryTrait>,
    valuation_service: Arc<dyn ValuationServiceTrait>,
    clock: Arc<dyn Clock>,
    user_locks: UserLocks,
}

impl SnapshotService {
    pub fn new(
        snapshot_repository: Arc<dyn SnapshotRepositoryTrait>,
        valuation_service: Arc<dyn ValuationServiceTrait>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            snapshot_repository,
            valuation_service,
            clock,
            user_locks: UserLocks::new(),
        }
    }
}

/// Groups ordered snapshot rows into per-day totals.
fn group_by_day(rows: Vec<FundSnapshot>) -> Vec<DailySnapshotTotal> {
    let mut days: BTreeMap<NaiveDate, Vec<FundSnapshot>> = BTreeMap::new();
    for row in rows {
        days.entry(row.as_of_day).or_default().push(row);
    }

    days.into_iter()
        .map(|(as_of_day, mut items)| {
            items.sort_by(|a, b| a.fund_code.cmp(&b.fund_code));
            let total_market_value = items
                .iter()
                .map(|item| item.market_value)
                .sum::<Decimal>();
            DailySnapshotTotal {
                as_of_day,
                total_market_value,
                items,
            }
        })
        .collect()
}

#[async_trait]
impl SnapshotServiceTrait for SnapshotService {
    async fn capture_if_absent(&self, user_id: &str) -> Result<CaptureOutcome> {
        let _guard = self.user_locks.lock(user_id).await;

        let as_of_day = self.valuation_service.current_as_of();
        if self
            .snapshot_repository
            .has_snapshots_for_day(user_id, as_of_day)?
        {
            debug!(
                "Snapshot for user '{}' on {} already captured",
                user_id, as_of_day
            );
            return Ok(CaptureOutcome::AlreadyCaptured { as_of_day });
        }

        let summary = self.valuation_service.summarize(user_id).await?;
        if summary.items.is_empty() {
            debug!(
                "Nothing to snapshot for user '{}' on {}",
                user_id, summary.as_of_day
            );
            return Ok(CaptureOutcome::NothingToCapture {
                as_of_day: summary.as_of_day,
            });
        }

        // A set missing prices would lock the day before prices recover.
        if let Some(unpriced) = summary.items.iter().find(|item| item.price.is_none()) {
            info!(
                "Deferring snapshot for user '{}' on {}: fund {} has no price",
                user_id, summary.as_of_day, unpriced.fund_code
            );
            return Ok(CaptureOutcome::NothingToCapture {
                as_of_day: summary.as_of_day,
            });
        }

        let captured_at = self.clock.now().naive_utc();
        let rows: Vec<NewFundSnapshot> = summary
            .items
            .iter()
            .map(|item| NewFundSnapshot::from_item(user_id, summary.as_of_day, captured_at, item))
            .collect();

        match self
            .snapshot_repository
            .save_day_if_absent(user_id, summary.as_of_day, rows)
            .await?
        {
            SnapshotWrite::Inserted(rows) => {
                info!(
                    "Captured {} snapshot row(s) for user '{}' on {}",
                    rows, user_id, summary.as_of_day
                );
                Ok(CaptureOutcome::Captured {
                    as_of_day: summary.as_of_day,
                    rows,
                })
            }
            SnapshotWrite::AlreadyPresent => {
                debug!(
                    "Snapshot for user '{}' on {} written concurrently; skipping",
                    user_id, summary.as_of_day
                );
                Ok(CaptureOutcome::AlreadyCaptured {
                    as_of_day: summary.as_of_day,
                })
            }
        }
    }

    fn get_snapshots_for_day(
        &self,
        user_id: &str,
        as_of_day: NaiveDate,
    ) -> Result<Vec<FundSnapshot>> {
        self.snapshot_repository
            .get_snapshots_for_day(user_id, as_of_day)
    }

    fn get_history(
        &self,
        user_id: &str,
        start_day: Option<NaiveDate>,
        end_day: Option<NaiveDate>,
    ) -> Result<Vec<DailySnapshotTotal>> {
        let rows = self
            .snapshot_repository
            .get_snapshots_in_range(user_id, start_day, end_day)?;
        Ok(group_by_day(rows))
    }
}
