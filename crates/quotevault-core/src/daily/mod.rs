//! Daily quote resolution.
//!
//! One quote per user per calendar date. Server-side history is the source of
//! truth: the first resolution of a day picks a quote the user has never been
//! shown and records it; every later call that day replays the recorded pick.
//! Concurrent first resolutions are settled by the unique `(user_id, date)`
//! constraint on the history table, not by client-side locking.

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::error::{Error, Result};
use crate::models::{Quote, QuoteId, UserId};

/// Outcome of a history write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryInsert {
    Inserted,
    /// An entry for this `(user, date)` already exists
    DuplicateKey,
}

/// Backend operations the resolver depends on.
#[async_trait]
pub trait DailyQuoteStore: Send + Sync {
    /// Quote recorded for `(user, date)`, if any
    async fn find_history_entry(&self, user: &UserId, date: NaiveDate) -> Result<Option<Quote>>;

    /// Random quote absent from the user's entire history
    async fn pick_unique_quote_for_user(&self, user: &UserId) -> Result<Option<Quote>>;

    /// Any quote, with no uniqueness guarantee
    async fn pick_arbitrary_quote(&self) -> Result<Option<Quote>>;

    async fn insert_history_entry(
        &self,
        user: &UserId,
        quote: &QuoteId,
        date: NaiveDate,
    ) -> Result<HistoryInsert>;
}

/// Where a resolved quote came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Source {
    History,
    UniquePick,
    Fallback,
}

impl Source {
    const fn needs_recording(self) -> bool {
        matches!(self, Self::UniquePick)
    }
}

/// Resolves the quote of the day against a [`DailyQuoteStore`].
#[derive(Debug, Clone)]
pub struct DailyQuoteResolver<S> {
    store: S,
}

impl<S: DailyQuoteStore> DailyQuoteResolver<S> {
    pub const fn new(store: S) -> Self {
        Self { store }
    }

    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Return the quote of the day for `user` on `date`.
    ///
    /// Lookup, selection and fallback failures propagate. History write
    /// failures never fail the call: the quote is already determined.
    pub async fn resolve(&self, user: &UserId, date: NaiveDate) -> Result<Quote> {
        let (quote, source) = self.select(user, date).await?;

        if source.needs_recording() {
            self.record(user, &quote, date).await;
        }

        tracing::debug!(
            user = %user,
            %date,
            quote = %quote.id,
            source = ?source,
            "Resolved daily quote"
        );
        Ok(quote)
    }

    async fn select(&self, user: &UserId, date: NaiveDate) -> Result<(Quote, Source)> {
        if let Some(existing) = self.store.find_history_entry(user, date).await? {
            return Ok((existing, Source::History));
        }

        if let Some(fresh) = self.store.pick_unique_quote_for_user(user).await? {
            return Ok((fresh, Source::UniquePick));
        }

        tracing::info!(user = %user, "No unseen quote left; falling back to an arbitrary quote");
        match self.store.pick_arbitrary_quote().await? {
            Some(fallback) => Ok((fallback, Source::Fallback)),
            None => Err(Error::NoQuotesAvailable),
        }
    }

    async fn record(&self, user: &UserId, quote: &Quote, date: NaiveDate) {
        match self.store.insert_history_entry(user, &quote.id, date).await {
            Ok(HistoryInsert::Inserted) => {}
            Ok(HistoryInsert::DuplicateKey) => {
                tracing::debug!(
                    user = %user,
                    %date,
                    "Daily quote already recorded by a concurrent resolution"
                );
            }
            Err(error) => {
                tracing::warn!(user = %user, %date, "Failed to record daily quote: {}", error);
            }
        }
    }
}

#[cfg(test)]
mod tests;
