use async_trait::async_trait;
use chrono::NaiveDate;
use futures::FutureExt;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};

use super::valuation_calculator::{calculate_valuation, normalize_prices};
use super::{
    CancelSignal, HoldingsState, ValuationRepositoryTrait, ValuationServiceTrait, ValuationSummary,
};
use crate::constants::{DEFAULT_PRICE_FETCH_TIMEOUT_SECS, MARKET_CLOSE_CUTOFF_HOUR_UTC};
use crate::errors::Result;
use crate::prices::{FundPriceMap, PriceSourceError, PriceSourceTrait};
use crate::utils::{resolve_as_of_with_cutoff, Clock, UserLocks};

/// Tunables of the valuation engine.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ValuationConfig {
    /// Hour (UTC) from which today's closing prices count.
    pub cutoff_hour_utc: u32,
    /// Deadline for one price-source fetch.
    pub price_fetch_timeout: Duration,
}

impl Default for ValuationConfig {
    fn default() -> Self {
        Self {
            cutoff_hour_utc: MARKET_CLOSE_CUTOFF_HOUR_UTC,
            price_fetch_timeout: Duration::from_secs(DEFAULT_PRICE_FETCH_TIMEOUT_SECS),
        }
    }
}

pub struct ValuationService {
    valuation_repository: Arc<dyn ValuationRepositoryTrait>,
    price_source: Arc<dyn PriceSourceTrait>,
    clock: Arc<dyn Clock>,
    config: ValuationConfig,
    user_locks: UserLocks,
}

impl ValuationService {
    pub fn new(
        valuation_repository: Arc<dyn ValuationRepositoryTrait>,
        price_source: Arc<dyn PriceSourceTrait>,
        clock: Arc<dyn Clock>,
        config: ValuationConfig,
    ) -> Self {
        Self {
            valuation_repository,
            price_source,
            clock,
            config,
            user_locks: UserLocks::new(),
        }
    }

    /// Fetches and canonicalizes current prices. Every failure mode collapses
    /// into an empty map.
    async fn fetch_prices(&self, cancel: CancelSignal) -> FundPriceMap {
        let source_id = self.price_source.id();
        let fetch = tokio::time::timeout(
            self.config.price_fetch_timeout,
            self.price_source.get_current_prices(),
        );

        let result = tokio::select! {
            fetched = fetch => match fetched {
                Ok(inner) => inner,
                Err(_) => Err(PriceSourceError::Timeout {
                    source_id: source_id.to_string(),
                }),
            },
            _ = cancel => Err(PriceSourceError::Cancelled),
        };

        match result {
            Ok(raw) => {
                let prices = normalize_prices(raw);
                if prices.is_empty() {
                    warn!(
                        "Price source {} returned no usable prices; valuing without prices",
                        source_id
                    );
                }
                prices
            }
            Err(e) => {
                warn!("{}. Valuing without prices.", e);
                FundPriceMap::new()
            }
        }
    }
}

#[async_trait]
impl ValuationServiceTrait for ValuationService {
    async fn summarize(&self, user_id: &str) -> Result<ValuationSummary> {
        self.summarize_until(user_id, futures::future::pending().boxed())
            .await
    }

    async fn summarize_until(
        &self,
        user_id: &str,
        cancel: CancelSignal,
    ) -> Result<ValuationSummary> {
        let started = Instant::now();
        let _guard = self.user_locks.lock(user_id).await;

        let now = self.clock.now();
        let as_of_day = resolve_as_of_with_cutoff(now, self.config.cutoff_hour_utc);

        // Prices are fetched before the write transaction opens so no lock is
        // held across the network round-trip.
        let prices = self.fetch_prices(cancel).await;

        let owner = user_id.to_string();
        let calculated_at = now.naive_utc();
        let summary = self
            .valuation_repository
            .refresh_valuation(
                user_id,
                Box::new(move |state: &HoldingsState| {
                    Ok(calculate_valuation(
                        &owner,
                        state,
                        &prices,
                        as_of_day,
                        calculated_at,
                    ))
                }),
            )
            .await?;

        debug!(
            "Valued {} fund(s) for user '{}' as of {} (total {}, origin {:?}) in {:?}",
            summary.items.len(),
            user_id,
            summary.as_of_day,
            summary.total_market_value,
            summary.origin,
            started.elapsed()
        );
        Ok(summary)
    }

    fn current_as_of(&self) -> NaiveDate {
        resolve_as_of_with_cutoff(self.clock.now(), self.config.cutoff_hour_utc)
    }
}
