use async_trait::async_trait;

use crate::errors::Result;
use crate::positions::positions_model::{FundPosition, NewFundPosition};

/// Trait for fund position repository operations
#[async_trait]
pub trait FundPositionRepositoryTrait: Send + Sync {
    /// All position rows of a user, ordered by fund code.
    fn list_positions(&self, user_id: &str) -> Result<Vec<FundPosition>>;

    /// Inserts rows, skipping any whose `(user_id, fund_code)` already exists.
    /// Returns the number of rows actually created.
    async fn insert_missing_positions(&self, positions: Vec<NewFundPosition>) -> Result<usize>;

    /// Replaces the user's whole position set (delete-then-reinsert) in one transaction.
    async fn replace_positions(
        &self,
        user_id: &str,
        positions: Vec<NewFundPosition>,
    ) -> Result<Vec<FundPosition>>;
}
