//! Price source trait and the in-process implementation.
//!
//! Acquiring fund prices from an external provider is not part of this crate;
//! hosts plug their own provider in through [`PriceSourceTrait`].

use async_trait::async_trait;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::RwLock;
use thiserror::Error;

use crate::funds::normalize_fund_code;

/// Current prices keyed by canonical fund code.
pub type FundPriceMap = HashMap<String, Decimal>;

/// Errors a price source may report.
///
/// "No data" is not an error: sources return an empty map instead.
#[derive(Error, Debug)]
pub enum PriceSourceError {
    /// The source could not be reached or answered with garbage.
    #[error("Price source transport error: {source_id} - {message}")]
    Transport { source_id: String, message: String },

    /// The fetch did not finish before the configured deadline.
    #[error("Price source timed out: {source_id}")]
    Timeout { source_id: String },

    /// The caller gave up before the fetch finished.
    #[error("Price fetch cancelled")]
    Cancelled,
}

/// Supplies the current price of every fund the source knows about.
#[async_trait]
pub trait PriceSourceTrait: Send + Sync {
    /// Identifier used in logs.
    fn id(&self) -> &'static str;

    /// Latest price per fund. Keys should be canonical fund codes; the valuation
    /// engine normalizes them again, so looser spellings are tolerated.
    async fn get_current_prices(&self) -> Result<FundPriceMap, PriceSourceError>;
}

/// Price source backed by a fixed in-memory map.
///
/// Useful for hosts that receive prices by other means (file drop, message bus)
/// and for tests.
#[derive(Debug, Default)]
pub struct StaticPriceSource {
    prices: RwLock<FundPriceMap>,
}

impl StaticPriceSource {
    pub fn new<I, K>(prices: I) -> Self
    where
        I: IntoIterator<Item = (K, Decimal)>,
        K: AsRef<str>,
    {
        let source = Self::default();
        source.replace(prices);
        source
    }

    /// Swaps the whole price set.
    pub fn replace<I, K>(&self, prices: I)
    where
        I: IntoIterator<Item = (K, Decimal)>,
        K: AsRef<str>,
    {
        let normalized: FundPriceMap = prices
            .into_iter()
            .map(|(code, price)| (normalize_fund_code(code.as_ref()), price))
            .collect();
        match self.prices.write() {
            Ok(mut guard) => *guard = normalized,
            Err(poisoned) => *poisoned.into_inner() = normalized,
        }
    }

    pub fn len(&self) -> usize {
        self.prices.read().map(|p| p.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl PriceSourceTrait for StaticPriceSource {
    fn id(&self) -> &'static str {
        "STATIC"
    }

    async fn get_current_prices(&self) -> Result<FundPriceMap, PriceSourceError> {
        match self.prices.read() {
            Ok(guard) => Ok(guard.clone()),
            Err(poisoned) => Ok(poisoned.into_inner().clone()),
        }
    }
}
