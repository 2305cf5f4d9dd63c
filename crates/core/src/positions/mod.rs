//! Fund positions - per-user, per-fund current state rows.

mod backfill_service;
mod positions_model;
mod positions_traits;

pub use backfill_service::{BackfillReport, BackfillService, BackfillServiceTrait};
pub use positions_model::{FundPosition, NewFundPosition, PositionCacheUpdate};
pub use positions_traits::FundPositionRepositoryTrait;
