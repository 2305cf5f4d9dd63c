//! Nestegg Core - Domain entities, services, and traits.
//!
//! This crate contains the retirement fund valuation logic: fund code
//! normalization, trading-day resolution, valuation with the legacy profile
//! fallback, daily snapshot capture and baseline backfill.
//! It is database-agnostic and defines traits that are implemented
//! by the `storage-sqlite` crate.

pub mod constants;
pub mod errors;
pub mod funds;
pub mod portfolio;
pub mod positions;
pub mod prices;
pub mod profiles;
pub mod utils;

#[cfg(test)]
pub(crate) mod test_support;

// Re-export error types
pub use errors::Error;
pub use errors::Result;
