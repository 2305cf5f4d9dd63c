use async_trait::async_trait;
use log::info;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;

use crate::constants::BASELINE_FUND_CODES;
use crate::errors::Result;
use crate::funds::normalize_fund_code;
use crate::positions::positions_model::NewFundPosition;
use crate::positions::positions_traits::FundPositionRepositoryTrait;
use crate::utils::UserLocks;

/// Result of a baseline backfill run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BackfillReport {
    /// Rows inserted, or that would be inserted on a dry run.
    pub created: usize,
    /// Baseline funds the user already held a row for.
    pub existing: usize,
    pub missing_codes: Vec<String>,
    pub dry_run: bool,
}

/// Trait for baseline position backfill
#[async_trait]
pub trait BackfillServiceTrait: Send + Sync {
    /// Ensures the user has a row for every baseline fund. Existing rows are
    /// never touched, so repeated runs create nothing new.
    async fn backfill_base_funds(&self, user_id: &str, dry_run: bool) -> Result<BackfillReport>;
}

pub struct BackfillService {
    position_repository: Arc<dyn FundPositionRepositoryTrait>,
    user_locks: UserLocks,
}

impl BackfillService {
    pub fn new(position_repository: Arc<dyn FundPositionRepositoryTrait>) -> Self {
        Self {
            position_repository,
            user_locks: UserLocks::new(),
        }
    }

    /// Baseline codes with no matching row, in baseline order.
    fn missing_codes(&self, user_id: &str) -> Result<Vec<String>> {
        let held: HashSet<String> = self
            .position_repository
            .list_positions(user_id)?
            .iter()
            .map(|position| normalize_fund_code(&position.fund_code))
            .collect();

        Ok(BASELINE_FUND_CODES
            .iter()
            .filter(|code| !held.contains(**code))
            .map(|code| code.to_string())
            .collect())
    }
}

#[async_trait]
impl BackfillServiceTrait for BackfillService {
    async fn backfill_base_funds(&self, user_id: &str, dry_run: bool) -> Result<BackfillReport> {
        let _guard = self.user_locks.lock(user_id).await;

        let missing_codes = self.missing_codes(user_id)?;
        let created = if dry_run || missing_codes.is_empty() {
            missing_codes.len()
        } else {
            let rows: Vec<NewFundPosition> = missing_codes
                .iter()
                .map(|code| NewFundPosition::baseline(user_id, code))
                .collect();
            self.position_repository
                .insert_missing_positions(rows)
                .await?
        };

        // Rows the insert skipped were written by someone else meanwhile.
        let report = BackfillReport {
            created,
            existing: BASELINE_FUND_CODES.len().saturating_sub(created),
            missing_codes,
            dry_run,
        };
        info!(
            "Backfill for user '{}' (dry run: {}): {} created, {} existing",
            user_id, dry_run, report.created, report.existing
        );
        Ok(report)
    }
}
