use crate::error::Result;
use crate::rest::HttpClient;
use crate::types::*;

impl HttpClient {
    // --- Auth ---

    /// GET /api/auth/nonce - One-time sign-in nonce.
    pub async fn get_nonce(&self) -> Result<NonceResponse> {
        self.get("/api/auth/nonce", &[]).await
    }

    /// POST /api/auth/verify - Exchange a signed message for a token.
    pub async fn post_verify(&self, req: &VerifyRequest) -> Result<VerifyResponse> {
        self.post_json("/api/auth/verify", req, None, None).await
    }

    /// GET /api/auth/session - Introspect the bearer token. 2xx/4xx only.
    pub async fn get_session(&self, token: &str) -> Result<()> {
        self.get_status("/api/auth/session", token).await
    }

    /// POST /api/auth/signout - Invalidate the token server-side.
    pub async fn post_signout(&self, token: &str) -> Result<()> {
        self.post_empty("/api/auth/signout", token).await
    }

    // --- Voting ---

    /// POST /api/voting/upvote or /api/voting/downvote.
    pub async fn post_vote(
        &self,
        direction: VoteDirection,
        req: &VoteRequest,
        token: &str,
        idempotency_key: &str,
    ) -> Result<()> {
        self.post_json_status(direction.endpoint(), req, Some(token), Some(idempotency_key))
            .await
    }

    /// POST /api/voting/flag - Premium-gated report with a free-text reason.
    pub async fn post_flag(
        &self,
        req: &VoteRequest,
        token: &str,
        idempotency_key: &str,
    ) -> Result<()> {
        self.post_json_status("/api/voting/flag", req, Some(token), Some(idempotency_key))
            .await
    }

    /// GET /api/voting/{itemId}/summary - Authoritative vote tallies.
    pub async fn get_vote_summary(&self, item_id: &str) -> Result<VoteSummary> {
        self.get(&format!("/api/voting/{item_id}/summary"), &[])
            .await
    }

    /// GET /api/voting/{itemId}/flags - Full flag listing for one item.
    pub async fn get_flag_details(&self, item_id: &str) -> Result<FlagDetails> {
        self.get(&format!("/api/voting/{item_id}/flags"), &[]).await
    }

    /// GET /api/voting/batch-flag-counts?itemIds=... - Flag counts for a page.
    pub async fn get_batch_flag_counts(&self, item_ids: &[String]) -> Result<Vec<FlagCountEntry>> {
        let query: Vec<(&str, &str)> = item_ids.iter().map(|id| ("itemIds", id.as_str())).collect();
        self.get("/api/voting/batch-flag-counts", &query).await
    }

    /// GET /api/voting/batch-vote-counts?itemIds=... - Vote tallies for a page.
    ///
    /// Each element carries its item ID; results are mapped by ID, never by
    /// request position.
    pub async fn get_batch_vote_counts(&self, item_ids: &[String]) -> Result<Vec<VoteSummaryEntry>> {
        let query: Vec<(&str, &str)> = item_ids.iter().map(|id| ("itemIds", id.as_str())).collect();
        self.get("/api/voting/batch-vote-counts", &query).await
    }
}
