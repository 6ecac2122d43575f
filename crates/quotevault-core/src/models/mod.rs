//! Data models for QuoteVault

mod collection;
mod quote;
mod user;

pub use collection::{
    AddToCollectionOutcome, Collection, CollectionId, FavoriteQuote, FavoriteToggle,
};
pub(crate) use quote::parse_rows;
pub use quote::{Quote, QuoteCategory, QuoteId, QuoteSummary};
pub use user::UserId;
