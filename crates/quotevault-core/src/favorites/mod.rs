//! Favorites: remote toggle plus the optimistic local liked set.

use std::collections::HashSet;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{FavoriteQuote, FavoriteToggle, QuoteId, UserId};

/// Backend operations on the `favorites` table.
#[async_trait]
pub trait FavoriteStore: Send + Sync {
    /// Favorite row id for `(user, quote)`, if liked
    async fn find_favorite(&self, user: &UserId, quote: &QuoteId) -> Result<Option<String>>;

    async fn insert_favorite(&self, user: &UserId, quote: &QuoteId) -> Result<()>;

    async fn delete_favorite(&self, favorite_id: &str) -> Result<()>;

    async fn liked_quote_ids(&self, user: &UserId) -> Result<Vec<QuoteId>>;

    /// Favorited quotes, newest favorite first
    async fn list_favorites(&self, user: &UserId) -> Result<Vec<FavoriteQuote>>;
}

/// Flip the remote favorite state: unlike when a row exists, like otherwise.
pub async fn toggle_favorite<S>(store: &S, user: &UserId, quote: &QuoteId) -> Result<FavoriteToggle>
where
    S: FavoriteStore + ?Sized,
{
    if let Some(favorite_id) = store.find_favorite(user, quote).await? {
        store.delete_favorite(&favorite_id).await?;
        return Ok(FavoriteToggle::Unliked);
    }

    match store.insert_favorite(user, quote).await {
        Ok(()) => Ok(FavoriteToggle::Liked),
        // Another device liked it between the check and the insert.
        Err(error) if error.is_unique_violation() => Ok(FavoriteToggle::Liked),
        Err(error) => Err(error),
    }
}

pub async fn is_liked<S>(store: &S, user: &UserId, quote: &QuoteId) -> Result<bool>
where
    S: FavoriteStore + ?Sized,
{
    Ok(store.find_favorite(user, quote).await?.is_some())
}

/// A local flip awaiting the remote result.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use = "a pending toggle must be settled"]
pub struct PendingToggle {
    quote: QuoteId,
    was_liked: bool,
}

impl PendingToggle {
    pub const fn quote(&self) -> &QuoteId {
        &self.quote
    }

    pub const fn was_liked(&self) -> bool {
        self.was_liked
    }
}

/// Liked quote ids as the UI currently shows them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LikedQuotes {
    liked: HashSet<QuoteId>,
}

impl LikedQuotes {
    pub fn from_ids(ids: impl IntoIterator<Item = QuoteId>) -> Self {
        Self {
            liked: ids.into_iter().collect(),
        }
    }

    pub async fn load<S>(store: &S, user: &UserId) -> Result<Self>
    where
        S: FavoriteStore + ?Sized,
    {
        Ok(Self::from_ids(store.liked_quote_ids(user).await?))
    }

    pub fn is_liked(&self, quote: &QuoteId) -> bool {
        self.liked.contains(quote)
    }

    pub fn len(&self) -> usize {
        self.liked.len()
    }

    pub fn is_empty(&self) -> bool {
        self.liked.is_empty()
    }

    /// Phase one: flip the local state immediately.
    pub fn apply(&mut self, quote: &QuoteId) -> PendingToggle {
        let was_liked = self.is_liked(quote);
        self.set(quote, !was_liked);
        PendingToggle {
            quote: quote.clone(),
            was_liked,
        }
    }

    /// Phase two: adopt the remote state, or restore the previous one on failure.
    pub fn settle(&mut self, pending: PendingToggle, outcome: &Result<FavoriteToggle>) {
        match outcome {
            Ok(state) => self.set(&pending.quote, state.is_liked()),
            Err(error) => {
                tracing::warn!(
                    quote = %pending.quote,
                    "Favorite update failed, rolling back: {}",
                    error
                );
                self.set(&pending.quote, pending.was_liked);
            }
        }
    }

    /// Apply locally, toggle remotely, and roll back if the remote call fails.
    pub async fn toggle_optimistic<S>(
        &mut self,
        store: &S,
        user: &UserId,
        quote: &QuoteId,
    ) -> Result<FavoriteToggle>
    where
        S: FavoriteStore + ?Sized,
    {
        let pending = self.apply(quote);
        let outcome = toggle_favorite(store, user, quote).await;
        self.settle(pending, &outcome);
        outcome
    }

    fn set(&mut self, quote: &QuoteId, liked: bool) {
        if liked {
            self.liked.insert(quote.clone());
        } else {
            self.liked.remove(quote);
        }
    }
}
