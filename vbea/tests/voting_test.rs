//! Integration tests for vote/flag submission and the count caches.

use std::sync::{Arc, Mutex};

use vbea::store::{KEY_AUTH_TOKEN, KEY_WALLET_PREMIUM};
use vbea::{
    HttpClient, LocalStore, Notifier, SessionManager, Severity, SiweConfig, VbeaError,
    VoteDirection, VoteSync,
};
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[derive(Default)]
struct RecordingNotifier {
    toasts: Mutex<Vec<(Severity, String)>>,
}

impl Notifier for RecordingNotifier {
    fn toast(&self, severity: Severity, message: &str) {
        self.toasts
            .lock()
            .unwrap()
            .push((severity, message.to_string()));
    }
}

impl RecordingNotifier {
    fn messages(&self) -> Vec<String> {
        self.toasts
            .lock()
            .unwrap()
            .iter()
            .map(|(_, m)| m.clone())
            .collect()
    }
}

struct Harness {
    store: Arc<LocalStore>,
    notifier: Arc<RecordingNotifier>,
    session: SessionManager,
    voting: VoteSync,
}

fn harness(server: &MockServer, token: Option<&str>) -> Harness {
    let store = Arc::new(LocalStore::in_memory());
    if let Some(token) = token {
        store.set_str(KEY_AUTH_TOKEN, token).unwrap();
    }
    let notifier = Arc::new(RecordingNotifier::default());
    let http = HttpClient::new(&server.uri());
    let session = SessionManager::new(
        http.clone(),
        store.clone(),
        notifier.clone(),
        SiweConfig::default(),
    );
    let voting = VoteSync::new(http, store.clone(), notifier.clone());
    Harness {
        store,
        notifier,
        session,
        voting,
    }
}

#[tokio::test]
async fn test_vote_requires_session_with_zero_network() {
    let server = MockServer::start().await;
    let mut h = harness(&server, None);

    let err = h
        .voting
        .vote(&mut h.session, "0xAbc", "42", VoteDirection::Up)
        .await
        .unwrap_err();

    assert!(matches!(err, VbeaError::Unauthenticated));
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_vote_refetches_summary_past_cache() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/voting/upvote"))
        .and(body_partial_json(serde_json::json!({
            "itemId": "42",
            "userWalletAddress": "0xAbc"
        })))
        .and(header("authorization", "Bearer tok-1"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/voting/42/summary"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "upvoteCount": 7,
            "downvoteCount": 2,
            "upvoteRatio": 0.7777
        })))
        .expect(1)
        .mount(&server)
        .await;

    let mut h = harness(&server, Some("tok-1"));

    let summary = h
        .voting
        .vote(&mut h.session, "0xAbc", "42", VoteDirection::Up)
        .await
        .unwrap();

    assert_eq!(summary.upvote_count, 7);
    assert_eq!(summary.downvote_count, 2);
    assert_eq!(h.voting.cached_summary("42").unwrap().upvote_count, 7);
    assert!(h
        .notifier
        .messages()
        .iter()
        .any(|m| m == "Upvoted successfully"));
}

#[tokio::test]
async fn test_vote_sends_idempotency_key() {
    let server = MockServer::start().await;

    // Any 32-hex-char key is accepted; the mock only checks presence.
    Mock::given(method("POST"))
        .and(path("/api/voting/downvote"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/voting/42/summary"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "upvoteCount": 0,
            "downvoteCount": 1,
            "upvoteRatio": 0.0
        })))
        .mount(&server)
        .await;

    let mut h = harness(&server, Some("tok-1"));
    h.voting
        .vote(&mut h.session, "0xAbc", "42", VoteDirection::Down)
        .await
        .unwrap();

    let requests = server.received_requests().await.unwrap();
    let post = requests
        .iter()
        .find(|r| r.url.path() == "/api/voting/downvote")
        .unwrap();
    let key = post
        .headers
        .get("idempotency-key")
        .and_then(|v| v.to_str().ok())
        .unwrap();
    assert_eq!(key.len(), 32);
    assert!(key.chars().all(|c| c.is_ascii_hexdigit()));
}

#[tokio::test]
async fn test_vote_guard_released_after_summary_refetch() {
    let server = MockServer::start().await;

    // The in-flight guard must hold through the post-success re-fetch and
    // release even when that re-fetch degrades, so the item never jams.
    Mock::given(method("POST"))
        .and(path("/api/voting/upvote"))
        .respond_with(ResponseTemplate::new(200))
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/voting/42/summary"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let mut h = harness(&server, Some("tok-1"));

    let first = h
        .voting
        .vote(&mut h.session, "0xAbc", "42", VoteDirection::Up)
        .await
        .unwrap();
    assert_eq!(first.upvote_count, 0);

    let second = h
        .voting
        .vote(&mut h.session, "0xAbc", "42", VoteDirection::Up)
        .await;
    assert!(!matches!(second, Err(VbeaError::Busy)));
    assert!(second.is_ok());
}

#[tokio::test]
async fn test_vote_401_tears_down_session() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/voting/upvote"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let mut h = harness(&server, Some("tok-dead"));
    assert!(h.session.is_signed_in());

    let err = h
        .voting
        .vote(&mut h.session, "0xAbc", "42", VoteDirection::Up)
        .await
        .unwrap_err();

    assert!(matches!(err, VbeaError::Unauthenticated));
    assert!(!h.session.is_signed_in());
    assert!(h.store.get_str(KEY_AUTH_TOKEN).is_none());
    assert!(h
        .notifier
        .messages()
        .iter()
        .any(|m| m == "Please connect your wallet"));
}

#[tokio::test]
async fn test_flag_short_reason_fails_before_network() {
    let server = MockServer::start().await;
    let mut h = harness(&server, Some("tok-1"));
    h.store.set_str(KEY_WALLET_PREMIUM, "true").unwrap();

    let err = h
        .voting
        .flag(&mut h.session, "0xAbc", "42", "too short")
        .await
        .unwrap_err();

    assert!(matches!(err, VbeaError::Validation(_)));
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_flag_requires_premium() {
    let server = MockServer::start().await;
    let mut h = harness(&server, Some("tok-1"));

    let err = h
        .voting
        .flag(&mut h.session, "0xAbc", "42", "this reason is long enough")
        .await
        .unwrap_err();

    assert!(matches!(err, VbeaError::PremiumRequired(_)));
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_flag_success_refreshes_count() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/voting/flag"))
        .and(body_partial_json(serde_json::json!({
            "itemId": "42",
            "reason": "this listing impersonates another project"
        })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/voting/batch-flag-counts"))
        .and(query_param("itemIds", "42"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            { "itemId": "42", "flagCount": 3 }
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let mut h = harness(&server, Some("tok-1"));
    h.store.set_str(KEY_WALLET_PREMIUM, "true").unwrap();

    h.voting
        .flag(
            &mut h.session,
            "0xAbc",
            "42",
            "this listing impersonates another project",
        )
        .await
        .unwrap();

    assert_eq!(h.voting.cached_flag_count("42"), Some(3));
    assert!(h
        .notifier
        .messages()
        .iter()
        .any(|m| m == "Content flagged successfully"));
}

#[tokio::test]
async fn test_batch_counts_keyed_by_item_id() {
    let server = MockServer::start().await;

    // Entries come back reordered and partial; mapping must go by ID.
    Mock::given(method("GET"))
        .and(path("/api/voting/batch-vote-counts"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            { "itemId": "9", "upvoteCount": 1, "downvoteCount": 0, "upvoteRatio": 1.0 },
            { "itemId": "7", "upvoteCount": 4, "downvoteCount": 4, "upvoteRatio": 0.5 }
        ])))
        .mount(&server)
        .await;

    let mut h = harness(&server, None);
    let ids = vec!["7".to_string(), "8".to_string(), "9".to_string()];
    let counts = h.voting.batch_vote_counts(&ids).await;

    assert_eq!(counts["7"].upvote_count, 4);
    assert_eq!(counts["9"].upvote_count, 1);
    // Requested but absent from the response: zero summary.
    assert_eq!(counts["8"].upvote_count, 0);
    assert_eq!(counts["8"].downvote_count, 0);
}

#[tokio::test]
async fn test_batch_flag_counts_degrade_to_zero_on_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/voting/batch-flag-counts"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let mut h = harness(&server, None);
    let ids = vec!["1".to_string(), "2".to_string()];
    let counts = h.voting.batch_flag_counts(&ids).await;

    assert_eq!(counts["1"], 0);
    assert_eq!(counts["2"], 0);
    // The degraded zeros are still cached for rendering.
    assert_eq!(h.voting.cached_flag_count("1"), Some(0));
}

#[tokio::test]
async fn test_summary_fetch_degrades_without_caching() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/voting/13/summary"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let mut h = harness(&server, None);
    let summary = h.voting.vote_summary("13", false).await;

    assert_eq!(summary.upvote_count, 0);
    // The zero default is not cached, so a later fetch retries.
    assert!(h.voting.cached_summary("13").is_none());
}
