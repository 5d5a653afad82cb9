use serde::{Deserialize, Serialize};

/// One-time nonce issued by the backend to prevent signature replay.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NonceResponse {
    pub nonce: String,
}

/// Body for `POST /api/auth/verify`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyRequest {
    pub message: String,
    pub signature: String,
    pub address: String,
    pub nonce: String,
}

/// Response from `POST /api/auth/verify`.
///
/// A missing token on a 2xx response is treated as a verification failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyResponse {
    pub token: Option<String>,
}
