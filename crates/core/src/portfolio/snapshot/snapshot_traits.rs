//! Snapshot repository and service traits.

use async_trait::async_trait;
use chrono::NaiveDate;

use super::{CaptureOutcome, DailySnapshotTotal, FundSnapshot, NewFundSnapshot, SnapshotWrite};
use crate::errors::Result;

/// Repository trait for the append-only snapshot store.
#[async_trait]
pub trait SnapshotRepositoryTrait: Send + Sync {
    /// Whether any row exists for the user on the given day.
    fn has_snapshots_for_day(&self, user_id: &str, as_of_day: NaiveDate) -> Result<bool>;

    /// Rows of one day, ordered by fund code.
    fn get_snapshots_for_day(&self, user_id: &str, as_of_day: NaiveDate)
        -> Result<Vec<FundSnapshot>>;

    /// Rows within an optional inclusive day range, ordered by day then fund code.
    fn get_snapshots_in_range(
        &self,
        user_id: &str,
        start_day: Option<NaiveDate>,
        end_day: Option<NaiveDate>,
    ) -> Result<Vec<FundSnapshot>>;

    /// Writes the whole set for `(user_id, as_of_day)` in one transaction unless
    /// rows for that key already exist, in which case nothing is written.
    async fn save_day_if_absent(
        &self,
        user_id: &str,
        as_of_day: NaiveDate,
        snapshots: Vec<NewFundSnapshot>,
    ) -> Result<SnapshotWrite>;
}

/// Trait for snapshot capture and history operations
#[async_trait]
pub trait SnapshotServiceTrait: Send + Sync {
    /// Persists today's valuation for the user unless it was already captured.
    /// Safe to call repeatedly and concurrently.
    async fn capture_if_absent(&self, user_id: &str) -> Result<CaptureOutcome>;

    fn get_snapshots_for_day(&self, user_id: &str, as_of_day: NaiveDate)
        -> Result<Vec<FundSnapshot>>;

    /// Per-day totals, oldest first.
    fn get_history(
        &self,
        user_id: &str,
        start_day: Option<NaiveDate>,
        end_day: Option<NaiveDate>,
    ) -> Result<Vec<DailySnapshotTotal>>;
}
