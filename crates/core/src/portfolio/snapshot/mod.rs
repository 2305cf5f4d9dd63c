//! Daily snapshots - immutable per-day captures of a valuation summary.

mod snapshot_model;
pub mod snapshot_service;
mod snapshot_traits;

pub use snapshot_model::*;
pub use snapshot_service::*;
pub use snapshot_traits::*;

#[cfg(test)]
mod snapshot_service_tests;
