//! Price source reading a JSON object of `{ "fundCode": price }` from disk.
//!
//! The file is re-read on every fetch so an external job can drop fresh prices
//! in place without restarting the worker.

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde_json::Value;
use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::str::FromStr;
use tracing::{debug, warn};

use nestegg_core::funds::normalize_fund_code;
use nestegg_core::prices::{FundPriceMap, PriceSourceError, PriceSourceTrait};

const SOURCE_ID: &str = "PRICE_FILE";

pub struct JsonFilePriceSource {
    path: PathBuf,
}

impl JsonFilePriceSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn transport_error(&self, message: impl std::fmt::Display) -> PriceSourceError {
        PriceSourceError::Transport {
            source_id: SOURCE_ID.to_string(),
            message: format!("{}: {}", self.path.display(), message),
        }
    }
}

/// Accepts prices written as JSON numbers or numeric strings; anything else is skipped.
fn parse_price(code: &str, value: &Value) -> Option<Decimal> {
    let parsed = match value {
        Value::Number(n) => Decimal::from_str(&n.to_string()).ok(),
        Value::String(s) => Decimal::from_str(s.trim()).ok(),
        _ => None,
    };
    if parsed.is_none() {
        warn!("Ignoring unreadable price for fund {}: {}", code, value);
    }
    parsed
}

#[async_trait]
impl PriceSourceTrait for JsonFilePriceSource {
    fn id(&self) -> &'static str {
        SOURCE_ID
    }

    async fn get_current_prices(&self) -> Result<FundPriceMap, PriceSourceError> {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("Price file {} does not exist yet", self.path.display());
                return Ok(FundPriceMap::new());
            }
            Err(e) => return Err(self.transport_error(e)),
        };

        let entries: HashMap<String, Value> =
            serde_json::from_str(&raw).map_err(|e| self.transport_error(e))?;

        Ok(entries
            .iter()
            .filter_map(|(code, value)| {
                parse_price(code, value).map(|price| (normalize_fund_code(code), price))
            })
            .collect())
    }
}
