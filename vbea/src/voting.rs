//! Vote/flag synchronizer.
//!
//! Submits votes and flags to the voting backend and reconciles the local
//! caches with authoritative counts. Summaries and flag counts are cached
//! per item for the lifetime of the process with no TTL; an entry is only
//! invalidated by a local mutating action. Two instances can therefore show
//! counts stale relative to each other, which is accepted.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use rand::Rng;
use tracing::warn;

use crate::error::{Result, VbeaError};
use crate::notify::{Notifier, Severity};
use crate::rest::HttpClient;
use crate::session::SessionManager;
use crate::store::{LocalStore, KEY_WALLET_PREMIUM};
use crate::types::{
    FlagCountEntry, FlagDetails, VoteDirection, VoteRequest, VoteSummary, VoteSummaryEntry,
};

/// Minimum trimmed length of a flag reason.
pub const MIN_FLAG_REASON_LEN: usize = 10;

/// Per-item vote and flag state, reconciled against the backend.
pub struct VoteSync {
    http: HttpClient,
    store: Arc<LocalStore>,
    notifier: Arc<dyn Notifier>,
    summaries: HashMap<String, VoteSummary>,
    flag_counts: HashMap<String, u64>,
    /// Items with a vote or flag submission currently in flight.
    pending: HashSet<String>,
}

impl VoteSync {
    pub fn new(http: HttpClient, store: Arc<LocalStore>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            http,
            store,
            notifier,
            summaries: HashMap::new(),
            flag_counts: HashMap::new(),
            pending: HashSet::new(),
        }
    }

    /// Submit a vote and re-fetch the item's authoritative summary.
    ///
    /// Requires an active session. A duplicate submission while one is in
    /// flight for the same item is rejected with [`VbeaError::Busy`]; the
    /// guard holds through the post-success summary re-fetch. A 401
    /// tears the local session down as a side effect. On failure displayed
    /// counts are left untouched.
    pub async fn vote(
        &mut self,
        session: &mut SessionManager,
        account: &str,
        item_id: &str,
        direction: VoteDirection,
    ) -> Result<VoteSummary> {
        let token = session
            .token()
            .map(str::to_string)
            .ok_or(VbeaError::Unauthenticated)?;
        let id = normalize(item_id);

        if !self.pending.insert(id.clone()) {
            return Err(VbeaError::Busy);
        }
        let result = self
            .http
            .post_vote(
                direction,
                &VoteRequest {
                    item_id: id.clone(),
                    user_wallet_address: account.to_string(),
                    reason: None,
                },
                &token,
                &idempotency_key(),
            )
            .await;

        match result {
            Ok(()) => {
                // Drop the cached entry and re-fetch past the cache so the
                // displayed counts come from the backend tally. The item stays
                // pending until the re-fetch settles.
                self.summaries.remove(&id);
                let summary = self.vote_summary(&id, true).await;
                self.pending.remove(&id);
                self.notifier.toast(
                    Severity::Success,
                    &format!("{} successfully", direction.label()),
                );
                Ok(summary)
            }
            Err(e) if e.is_unauthorized() => {
                self.pending.remove(&id);
                session.handle_unauthenticated();
                Err(VbeaError::Unauthenticated)
            }
            Err(e) => {
                self.pending.remove(&id);
                self.notifier.toast(Severity::Error, &e.to_string());
                Err(e)
            }
        }
    }

    /// Submit a flag report and refresh that item's flag count.
    ///
    /// The reason-length check runs before any network call; the UI runs the
    /// same check to gate its submit control. Premium eligibility is checked
    /// client-side against the persisted sentinel.
    pub async fn flag(
        &mut self,
        session: &mut SessionManager,
        account: &str,
        item_id: &str,
        reason: &str,
    ) -> Result<()> {
        let reason = reason.trim();
        if reason.chars().count() < MIN_FLAG_REASON_LEN {
            return Err(VbeaError::Validation(format!(
                "flag reason must be at least {MIN_FLAG_REASON_LEN} characters"
            )));
        }
        if !self.store.flag(KEY_WALLET_PREMIUM) {
            return Err(VbeaError::PremiumRequired(
                "only premium users can flag content".into(),
            ));
        }
        let token = session
            .token()
            .map(str::to_string)
            .ok_or(VbeaError::Unauthenticated)?;
        let id = normalize(item_id);

        if !self.pending.insert(id.clone()) {
            return Err(VbeaError::Busy);
        }
        let result = self
            .http
            .post_flag(
                &VoteRequest {
                    item_id: id.clone(),
                    user_wallet_address: account.to_string(),
                    reason: Some(reason.to_string()),
                },
                &token,
                &idempotency_key(),
            )
            .await;

        match result {
            Ok(()) => {
                self.batch_flag_counts(std::slice::from_ref(&id)).await;
                self.pending.remove(&id);
                self.notifier
                    .toast(Severity::Success, "Content flagged successfully");
                Ok(())
            }
            Err(e) if e.is_unauthorized() => {
                self.pending.remove(&id);
                session.handle_unauthenticated();
                Err(VbeaError::Unauthenticated)
            }
            Err(e) => {
                self.pending.remove(&id);
                self.notifier.toast(Severity::Error, &e.to_string());
                Err(e)
            }
        }
    }

    /// Vote tallies for one item, cached unless `skip_cache`.
    ///
    /// Fetch failures degrade to an all-zero summary without caching it.
    pub async fn vote_summary(&mut self, item_id: &str, skip_cache: bool) -> VoteSummary {
        let id = normalize(item_id);
        if !skip_cache {
            if let Some(summary) = self.summaries.get(&id) {
                return summary.clone();
            }
        }
        match self.http.get_vote_summary(&id).await {
            Ok(summary) => {
                self.summaries.insert(id, summary.clone());
                summary
            }
            Err(e) => {
                warn!(item_id = %id, error = %e, "vote summary fetch failed");
                VoteSummary::default()
            }
        }
    }

    /// Full flag listing for one item; degrades to an empty listing.
    pub async fn flag_details(&self, item_id: &str) -> FlagDetails {
        let id = normalize(item_id);
        match self.http.get_flag_details(&id).await {
            Ok(details) => details,
            Err(e) => {
                warn!(item_id = %id, error = %e, "flag details fetch failed");
                FlagDetails::empty(&id)
            }
        }
    }

    /// Flag counts for a page of items in one round-trip.
    ///
    /// Missing IDs default to 0; a transport error degrades the whole page
    /// to zeros instead of failing the render.
    pub async fn batch_flag_counts(&mut self, item_ids: &[String]) -> HashMap<String, u64> {
        if item_ids.is_empty() {
            return HashMap::new();
        }
        let entries = match self.http.get_batch_flag_counts(item_ids).await {
            Ok(entries) => entries,
            Err(e) => {
                warn!(error = %e, "batch flag count fetch failed, defaulting to zero");
                Vec::new()
            }
        };
        self.apply_flag_counts(item_ids, entries)
    }

    /// Merge batch flag-count entries into the cache, keyed by each entry's
    /// item ID. Requested IDs without an entry get 0.
    pub fn apply_flag_counts(
        &mut self,
        item_ids: &[String],
        entries: Vec<FlagCountEntry>,
    ) -> HashMap<String, u64> {
        let by_id: HashMap<String, u64> = entries
            .into_iter()
            .map(|e| (e.item_id, e.flag_count))
            .collect();

        let mut out = HashMap::with_capacity(item_ids.len());
        for id in item_ids {
            let id = normalize(id);
            let count = by_id.get(&id).copied().unwrap_or(0);
            self.flag_counts.insert(id.clone(), count);
            out.insert(id, count);
        }
        out
    }

    /// Vote tallies for a page of items in one round-trip.
    ///
    /// Results are matched by each entry's explicit item ID, never by
    /// request position. Missing IDs default to zero summaries; transport
    /// errors degrade the same way.
    pub async fn batch_vote_counts(&mut self, item_ids: &[String]) -> HashMap<String, VoteSummary> {
        if item_ids.is_empty() {
            return HashMap::new();
        }
        let entries = match self.http.get_batch_vote_counts(item_ids).await {
            Ok(entries) => entries,
            Err(e) => {
                warn!(error = %e, "batch vote count fetch failed, defaulting to zero");
                Vec::new()
            }
        };
        self.apply_vote_counts(item_ids, entries)
    }

    /// Merge batch vote-tally entries into the cache, keyed by each entry's
    /// item ID. Requested IDs without an entry get zero summaries.
    pub fn apply_vote_counts(
        &mut self,
        item_ids: &[String],
        entries: Vec<VoteSummaryEntry>,
    ) -> HashMap<String, VoteSummary> {
        let by_id: HashMap<String, VoteSummary> = entries
            .into_iter()
            .map(|e| (e.item_id, e.summary))
            .collect();

        let mut out = HashMap::with_capacity(item_ids.len());
        for id in item_ids {
            let id = normalize(id);
            let summary = by_id.get(&id).cloned().unwrap_or_default();
            self.summaries.insert(id.clone(), summary.clone());
            out.insert(id, summary);
        }
        out
    }

    /// Last cached flag count for an item, if any batch has covered it.
    pub fn cached_flag_count(&self, item_id: &str) -> Option<u64> {
        self.flag_counts.get(&normalize(item_id)).copied()
    }

    /// Last cached vote summary for an item.
    pub fn cached_summary(&self, item_id: &str) -> Option<&VoteSummary> {
        self.summaries.get(&normalize(item_id))
    }
}

fn normalize(item_id: &str) -> String {
    item_id.trim().to_string()
}

/// Client-generated key so a retried submission is safe to replay.
fn idempotency_key() -> String {
    let mut bytes = [0u8; 16];
    rand::thread_rng().fill(&mut bytes);
    hex::encode(bytes)
}
