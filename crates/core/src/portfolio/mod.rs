//! Portfolio valuation and daily snapshot capture.

pub mod snapshot;
pub mod valuation;
