pub mod config;
pub mod error;
pub mod favorites;
pub mod listings;
pub mod notify;
pub mod prices;
pub mod rest;
pub mod session;
pub mod store;
pub mod types;
pub mod voting;
pub mod wallet;

// ---- Top-level re-exports for ergonomic usage ----

// Config + errors
pub use config::{PremiumConfig, SiweConfig, VbeaConfig};
pub use error::{Result, VbeaError};

// REST client
pub use rest::HttpClient;

// State engine components
pub use favorites::Favorites;
pub use listings::ListingsClient;
pub use prices::PriceFeed;
pub use session::{local_wallet, SessionManager, SignFn};
pub use store::LocalStore;
pub use voting::VoteSync;
pub use wallet::{BalanceProvider, JsonRpcProvider, PremiumStatus, WalletBinding};

// Notification seam
pub use notify::{Notifier, Severity, TracingNotifier};

// Core types
pub use types::{
    FlagCountEntry, FlagDetails, FlagEntry, Listing, ListingFilters, ListingsPage, PriceSnapshot,
    Tab, VoteDirection, VoteRequest, VoteSummary, VoteSummaryEntry,
};
