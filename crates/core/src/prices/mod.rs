//! Fund price collaborators.

mod price_source;

pub use price_source::{FundPriceMap, PriceSourceError, PriceSourceTrait, StaticPriceSource};
