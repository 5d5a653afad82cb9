//! Price feed with a 60-second persisted cache and fixed fallback.
//!
//! Listing valuation needs the protocol and ether prices on every refresh
//! tick. A snapshot younger than the TTL is served verbatim with no network
//! call; on expiry the feed re-fetches and persists. Any failure falls back
//! to the fixed snapshot so a price outage never blanks the page.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use tracing::warn;

use crate::error::{Result, VbeaError};
use crate::rest::HttpClient;
use crate::store::{LocalStore, KEY_CRYPTO_PRICES};
use crate::types::PriceSnapshot;

/// Snapshot validity window.
pub const PRICE_CACHE_TTL_MS: u64 = 60_000;

/// Hard-coded prices used when both the cache and the fetch fail.
pub const FALLBACK_PRICES: &[(&str, f64)] = &[("ethereum", 3607.21), ("virtual-protocol", 4.25)];

/// Symbols fetched by default.
pub const DEFAULT_PRICE_IDS: &[&str] = &["virtual-protocol", "ethereum"];

/// USD price retrieval over the price API.
#[derive(Clone)]
pub struct PriceFeed {
    http: HttpClient,
    store: Arc<LocalStore>,
    ids: Vec<String>,
}

impl PriceFeed {
    pub fn new(http: HttpClient, store: Arc<LocalStore>) -> Self {
        Self {
            http,
            store,
            ids: DEFAULT_PRICE_IDS.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Current prices: fresh cache, else fetch-and-persist, else fallback.
    ///
    /// Never fails; the caller always gets a usable snapshot.
    pub async fn fetch(&self) -> PriceSnapshot {
        self.fetch_at(now_ms()).await
    }

    async fn fetch_at(&self, now_ms: u64) -> PriceSnapshot {
        if let Some(snapshot) = self.store.get_json::<PriceSnapshot>(KEY_CRYPTO_PRICES) {
            if snapshot.is_fresh(now_ms, PRICE_CACHE_TTL_MS) {
                return snapshot;
            }
        }

        match self.fetch_remote(now_ms).await {
            Ok(snapshot) => {
                if let Err(e) = self.store.set_json(KEY_CRYPTO_PRICES, &snapshot) {
                    warn!(error = %e, "failed to persist price snapshot");
                }
                snapshot
            }
            Err(e) => {
                warn!(error = %e, "price fetch failed, using fallback prices");
                Self::fallback(now_ms)
            }
        }
    }

    async fn fetch_remote(&self, now_ms: u64) -> Result<PriceSnapshot> {
        let ids = self.ids.join(",");
        let data: HashMap<String, HashMap<String, f64>> = self
            .http
            .get(
                "/api/v3/simple/price",
                &[("ids", ids.as_str()), ("vs_currencies", "usd")],
            )
            .await?;

        let mut prices = HashMap::with_capacity(self.ids.len());
        for id in &self.ids {
            let usd = data
                .get(id)
                .and_then(|entry| entry.get("usd"))
                .copied()
                .ok_or_else(|| VbeaError::Validation(format!("no usd price for {id}")))?;
            prices.insert(id.clone(), usd);
        }
        Ok(PriceSnapshot {
            timestamp: now_ms,
            prices,
        })
    }

    /// The fixed snapshot. Never persisted, so a later tick retries.
    pub fn fallback(now_ms: u64) -> PriceSnapshot {
        PriceSnapshot {
            timestamp: now_ms,
            prices: FALLBACK_PRICES
                .iter()
                .map(|(id, usd)| (id.to_string(), *usd))
                .collect(),
        }
    }
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
