//! Valuation repository and service traits.

use async_trait::async_trait;
use chrono::NaiveDate;
use futures::future::BoxFuture;

use super::{ValuationJob, ValuationSummary};
use crate::errors::Result;

/// Signal that resolves when the caller no longer wants the result.
pub type CancelSignal = BoxFuture<'static, ()>;

/// Repository trait for refreshing the valuation materialized view.
#[async_trait]
pub trait ValuationRepositoryTrait: Send + Sync {
    /// Loads the user's positions and profile, runs `job` on them and applies the
    /// returned [`super::CacheWriteback`], all inside one write transaction.
    ///
    /// Readers observe either every cached field from before the call or every
    /// cached field from after it.
    async fn refresh_valuation(&self, user_id: &str, job: ValuationJob)
        -> Result<ValuationSummary>;
}

/// Trait for valuation service operations
#[async_trait]
pub trait ValuationServiceTrait: Send + Sync {
    /// Values the user's holdings at the current as-of day and refreshes the
    /// cached valuation fields.
    ///
    /// Missing prices never fail the call; only persistence errors do.
    async fn summarize(&self, user_id: &str) -> Result<ValuationSummary>;

    /// Like [`Self::summarize`], but a price fetch still running when `cancel`
    /// resolves is abandoned and treated as "no prices".
    async fn summarize_until(&self, user_id: &str, cancel: CancelSignal)
        -> Result<ValuationSummary>;

    /// The as-of day a call made right now would use.
    fn current_as_of(&self) -> NaiveDate;
}
