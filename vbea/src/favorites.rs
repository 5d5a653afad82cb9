//! Favorites store: locally starred item IDs with a tier-dependent cap.
//!
//! Membership lives under `favoriteAgents` as a JSON array of string IDs in
//! insertion order. Capacity follows the persisted premium sentinel at the
//! time of the add; shrinking capacity never evicts, it only blocks new
//! additions.

use std::sync::Arc;

use crate::error::{Result, VbeaError};
use crate::store::{LocalStore, KEY_FAVORITE_AGENTS, KEY_WALLET_PREMIUM};

/// Favorites cap for the regular tier.
pub const REGULAR_FAVORITE_LIMIT: usize = 5;
/// Favorites cap for premium holders.
pub const PREMIUM_FAVORITE_LIMIT: usize = 50;

/// Locally persisted favorite set.
#[derive(Clone)]
pub struct Favorites {
    store: Arc<LocalStore>,
}

impl Favorites {
    pub fn new(store: Arc<LocalStore>) -> Self {
        Self { store }
    }

    /// Current cap, derived from the premium sentinel.
    pub fn capacity(&self) -> usize {
        if self.store.flag(KEY_WALLET_PREMIUM) {
            PREMIUM_FAVORITE_LIMIT
        } else {
            REGULAR_FAVORITE_LIMIT
        }
    }

    /// Members in insertion order.
    pub fn list(&self) -> Vec<String> {
        self.store
            .get_json(KEY_FAVORITE_AGENTS)
            .unwrap_or_default()
    }

    pub fn count(&self) -> usize {
        self.list().len()
    }

    pub fn is_favorited(&self, item_id: &str) -> bool {
        let id = normalize(item_id);
        self.list().iter().any(|f| *f == id)
    }

    /// Flip membership for `item_id`, persisting before returning.
    ///
    /// Returns `true` when the item was added. Adding at capacity fails with
    /// [`VbeaError::CapacityExceeded`] carrying the active limit and premium
    /// flag so callers can pick the right messaging; the set is unchanged.
    /// Removal is always allowed, including from an over-capacity set.
    pub fn toggle(&self, item_id: &str) -> Result<bool> {
        let id = normalize(item_id);
        if id.is_empty() {
            return Err(VbeaError::Validation("empty item id".into()));
        }

        let mut favorites = self.list();
        if let Some(index) = favorites.iter().position(|f| *f == id) {
            favorites.remove(index);
            self.store.set_json(KEY_FAVORITE_AGENTS, &favorites)?;
            return Ok(false);
        }

        let limit = self.capacity();
        if favorites.len() >= limit {
            return Err(VbeaError::CapacityExceeded {
                limit,
                premium: self.store.flag(KEY_WALLET_PREMIUM),
            });
        }
        favorites.push(id);
        self.store.set_json(KEY_FAVORITE_AGENTS, &favorites)?;
        Ok(true)
    }
}

fn normalize(item_id: &str) -> String {
    item_id.trim().to_string()
}
