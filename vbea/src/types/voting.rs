use serde::{Deserialize, Serialize};

/// Direction of a vote submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteDirection {
    Up,
    Down,
}

impl VoteDirection {
    /// Endpoint path segment for this direction.
    pub fn endpoint(&self) -> &'static str {
        match self {
            VoteDirection::Up => "/api/voting/upvote",
            VoteDirection::Down => "/api/voting/downvote",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            VoteDirection::Up => "Upvoted",
            VoteDirection::Down => "Downvoted",
        }
    }
}

/// Body for vote and flag submissions.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteRequest {
    pub item_id: String,
    pub user_wallet_address: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Authoritative vote tallies for one item.
///
/// Cache-only on the client; the backend is the sole source of truth.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteSummary {
    pub upvote_count: u64,
    pub downvote_count: u64,
    /// Fraction of upvotes in `[0, 1]`.
    pub upvote_ratio: f64,
}

/// One element of the batch vote-count response, keyed by item ID.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteSummaryEntry {
    pub item_id: String,
    #[serde(flatten)]
    pub summary: VoteSummary,
}

/// One element of the batch flag-count response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlagCountEntry {
    pub item_id: String,
    #[serde(default)]
    pub flag_count: u64,
}

/// Full flag listing for one item.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlagDetails {
    pub item_id: String,
    pub total_flags: u64,
    #[serde(default)]
    pub flags: Vec<FlagEntry>,
}

impl FlagDetails {
    /// Empty listing used when the detail fetch degrades.
    pub fn empty(item_id: &str) -> Self {
        Self {
            item_id: item_id.to_string(),
            total_flags: 0,
            flags: Vec::new(),
        }
    }
}

/// A single flag report.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlagEntry {
    pub reason: String,
    pub user_wallet_address: String,
    pub created_at: String,
}
