//! quotevault-core - Core library for QuoteVault
//!
//! This crate contains the shared models, Supabase clients, and business logic
//! (daily quote resolution, feed paging, favorites, collections, image export)
//! used by every QuoteVault front end.

pub mod auth;
pub mod collections;
pub mod config;
pub mod daily;
pub mod error;
pub mod export;
pub mod favorites;
pub mod feed;
pub mod models;
pub mod remote;
pub mod state;
pub mod util;

pub use auth::{AuthError, AuthSession, SessionPersistence, SignUpOutcome, SupabaseAuthClient};
pub use config::ClientConfig;
pub use daily::{DailyQuoteResolver, DailyQuoteStore, HistoryInsert};
pub use error::{Error, Result};
pub use models::{
    AddToCollectionOutcome, Collection, CollectionId, FavoriteQuote, FavoriteToggle, Quote,
    QuoteCategory, QuoteId, QuoteSummary, UserId,
};
pub use remote::{Backdrop, StorageClient, SupabaseRestClient};
pub use state::{AppContext, Palette, SessionHandle, ThemeHandle, ThemeMode};
