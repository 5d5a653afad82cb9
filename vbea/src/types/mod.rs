mod auth;
mod listing;
mod price;
mod voting;

pub use auth::{NonceResponse, VerifyRequest, VerifyResponse};
pub use listing::{Listing, ListingFilters, ListingsPage, Pagination, PaginationMeta, Tab};
pub use price::PriceSnapshot;
pub use voting::{
    FlagCountEntry, FlagDetails, FlagEntry, VoteDirection, VoteRequest, VoteSummary,
    VoteSummaryEntry,
};
