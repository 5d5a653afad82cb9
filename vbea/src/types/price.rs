use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Cached symbol → USD price mapping with its fetch time.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PriceSnapshot {
    /// Fetch time, milliseconds since the Unix epoch.
    pub timestamp: u64,
    pub prices: HashMap<String, f64>,
}

impl PriceSnapshot {
    /// `true` while the snapshot is younger than `ttl_ms`.
    pub fn is_fresh(&self, now_ms: u64, ttl_ms: u64) -> bool {
        now_ms.saturating_sub(self.timestamp) < ttl_ms
    }

    pub fn price(&self, symbol: &str) -> f64 {
        self.prices.get(symbol).copied().unwrap_or(0.0)
    }
}
