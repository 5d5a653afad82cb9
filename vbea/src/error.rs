use thiserror::Error;

#[derive(Error, Debug)]
pub enum VbeaError {
    #[error("HTTP error {status}: {message}")]
    Http { status: u16, message: String },

    #[error("request error: {0}")]
    Request(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("signature verification failed: {0}")]
    Verification(String),

    #[error("not signed in")]
    Unauthenticated,

    #[error("favorites limit of {limit} reached")]
    CapacityExceeded { limit: usize, premium: bool },

    #[error("validation error: {0}")]
    Validation(String),

    #[error("premium membership required: {0}")]
    PremiumRequired(String),

    #[error("wrong network: expected chain {expected}, connected to {actual}")]
    WrongNetwork { expected: u64, actual: u64 },

    #[error("signing error: {0}")]
    Signing(String),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("rpc error: {0}")]
    Rpc(String),

    #[error("operation already in flight")]
    Busy,
}

impl VbeaError {
    /// HTTP 401 from an authenticated endpoint.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, VbeaError::Http { status: 401, .. })
    }
}

pub type Result<T> = std::result::Result<T, VbeaError>;
