use std::path::PathBuf;
use std::time::Duration;

use nestegg_core::constants::{DEFAULT_PRICE_FETCH_TIMEOUT_SECS, MARKET_CLOSE_CUTOFF_HOUR_UTC};
use nestegg_core::portfolio::valuation::ValuationConfig;

const DEFAULT_DB_PATH: &str = "./db/nestegg.db";
const DEFAULT_CAPTURE_INTERVAL_SECS: u64 = 15 * 60;

pub struct Config {
    pub db_path: String,
    /// JSON file with the current price per fund; absent means "no prices".
    pub prices_file: Option<PathBuf>,
    pub capture_interval: Duration,
    pub price_fetch_timeout: Duration,
    pub cutoff_hour_utc: u32,
}

impl Config {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup. Unparsable values fall back to defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let number = |key: &str, default: u64| -> u64 {
            lookup(key)
                .and_then(|raw| raw.trim().parse().ok())
                .unwrap_or(default)
        };

        let db_path = lookup("NESTEGG_DB_PATH").unwrap_or_else(|| DEFAULT_DB_PATH.into());
        let prices_file = lookup("NESTEGG_PRICES_FILE")
            .filter(|raw| !raw.trim().is_empty())
            .map(PathBuf::from);
        let capture_interval_secs =
            number("NESTEGG_CAPTURE_INTERVAL_SECS", DEFAULT_CAPTURE_INTERVAL_SECS).max(1);
        let timeout_ms = number(
            "NESTEGG_PRICE_TIMEOUT_MS",
            DEFAULT_PRICE_FETCH_TIMEOUT_SECS * 1000,
        );
        let cutoff_hour_utc = number(
            "NESTEGG_CUTOFF_HOUR_UTC",
            u64::from(MARKET_CLOSE_CUTOFF_HOUR_UTC),
        )
        .min(23) as u32;

        Self {
            db_path,
            prices_file,
            capture_interval: Duration::from_secs(capture_interval_secs),
            price_fetch_timeout: Duration::from_millis(timeout_ms),
            cutoff_hour_utc,
        }
    }

    pub fn valuation_config(&self) -> ValuationConfig {
        ValuationConfig {
            cutoff_hour_utc: self.cutoff_hour_utc,
            price_fetch_timeout: self.price_fetch_timeout,
        }
    }
}
