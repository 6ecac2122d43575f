//! Quote feed pagination.

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{Quote, QuoteCategory, QuoteId};

/// Quotes fetched per page.
pub const PAGE_SIZE: usize = 10;

/// Read access to the quote table.
#[async_trait]
pub trait QuoteFeedStore: Send + Sync {
    /// One page of quotes, newest first, optionally restricted to `categories`
    async fn fetch_quotes(&self, page: usize, categories: &[QuoteCategory]) -> Result<Vec<Quote>>;

    async fn get_quote(&self, id: &QuoteId) -> Result<Option<Quote>>;
}

/// Client-side pager over [`QuoteFeedStore::fetch_quotes`].
///
/// The page index only advances when a page returned rows, so a transient
/// empty response never skips a page.
#[derive(Debug, Clone, Default)]
pub struct QuoteFeed {
    quotes: Vec<Quote>,
    categories: Vec<QuoteCategory>,
    next_page: usize,
    exhausted: bool,
}

impl QuoteFeed {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_categories(categories: Vec<QuoteCategory>) -> Self {
        let mut feed = Self::new();
        feed.set_categories(categories);
        feed
    }

    pub fn quotes(&self) -> &[Quote] {
        &self.quotes
    }

    pub fn categories(&self) -> &[QuoteCategory] {
        &self.categories
    }

    pub const fn next_page(&self) -> usize {
        self.next_page
    }

    /// Whether the last fetched page was short
    pub const fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    /// Replace the category filter. Returns `true` and clears loaded quotes when it changed.
    pub fn set_categories(&mut self, mut categories: Vec<QuoteCategory>) -> bool {
        categories.sort_by_key(|category| category.as_str());
        categories.dedup();
        if categories == self.categories {
            return false;
        }
        self.categories = categories;
        self.quotes.clear();
        self.next_page = 0;
        self.exhausted = false;
        true
    }

    /// Reload from the first page, replacing everything loaded so far.
    pub async fn refresh<S>(&mut self, store: &S) -> Result<&[Quote]>
    where
        S: QuoteFeedStore + ?Sized,
    {
        let page = store.fetch_quotes(0, &self.categories).await?;
        self.exhausted = page.len() < PAGE_SIZE;
        self.next_page = usize::from(!page.is_empty());
        self.quotes = page;
        Ok(&self.quotes)
    }

    /// Append the next page. Returns how many quotes were added.
    pub async fn load_more<S>(&mut self, store: &S) -> Result<usize>
    where
        S: QuoteFeedStore + ?Sized,
    {
        if self.exhausted {
            return Ok(0);
        }

        let page = store.fetch_quotes(self.next_page, &self.categories).await?;
        let added = page.len();
        self.exhausted = added < PAGE_SIZE;
        if added > 0 {
            self.quotes.extend(page);
            self.next_page += 1;
        }
        tracing::debug!(
            page = self.next_page,
            added,
            exhausted = self.exhausted,
            "Loaded feed page"
        );
        Ok(added)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use chrono::{TimeZone, Utc};
    use pretty_assertions::assert_eq;

    use super::*;

    struct PagedStore {
        quotes: Vec<Quote>,
        requests: Mutex<Vec<(usize, Vec<QuoteCategory>)>>,
    }

    impl PagedStore {
        fn new(count: usize) -> Self {
            let quotes = (0..count)
                .map(|index| Quote {
                    id: QuoteId::new(format!("q{index}")).unwrap(),
                    text: format!("text {index}"),
                    author: "Author".to_string(),
                    category: if index % 2 == 0 {
                        QuoteCategory::Love
                    } else {
                        QuoteCategory::Humor
                    },
                    created_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
                })
                .collect();
            Self {
                quotes,
                requests: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl QuoteFeedStore for PagedStore {
        async fn fetch_quotes(
            &self,
            page: usize,
            categories: &[QuoteCategory],
        ) -> Result<Vec<Quote>> {
            self.requests
                .lock()
                .unwrap()
                .push((page, categories.to_vec()));
            Ok(self
                .quotes
                .iter()
                .filter(|quote| categories.is_empty() || categories.contains(&quote.category))
                .skip(page * PAGE_SIZE)
                .take(PAGE_SIZE)
                .cloned()
                .collect())
        }

        async fn get_quote(&self, id: &QuoteId) -> Result<Option<Quote>> {
            Ok(self.quotes.iter().find(|quote| &quote.id == id).cloned())
        }
    }

    #[tokio::test]
    async fn load_more_walks_pages_until_short_page() {
        let store = PagedStore::new(25);
        let mut feed = QuoteFeed::new();

        feed.refresh(&store).await.unwrap();
        assert_eq!(feed.quotes().len(), 10);
        assert_eq!(feed.next_page(), 1);

        assert_eq!(feed.load_more(&store).await.unwrap(), 10);
        assert_eq!(feed.load_more(&store).await.unwrap(), 5);
        assert!(feed.is_exhausted());
        assert_eq!(feed.load_more(&store).await.unwrap(), 0);

        assert_eq!(feed.quotes().len(), 25);
        assert_eq!(feed.quotes()[10].id.as_str(), "q10");
        assert_eq!(store.requests.lock().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn empty_page_does_not_advance() {
        let store = PagedStore::new(10);
        let mut feed = QuoteFeed::new();
        feed.refresh(&store).await.unwrap();
        assert!(!feed.is_exhausted());

        assert_eq!(feed.load_more(&store).await.unwrap(), 0);
        assert_eq!(feed.next_page(), 1);
        assert!(feed.is_exhausted());
    }

    #[tokio::test]
    async fn changing_categories_resets_the_pager() {
        let store = PagedStore::new(30);
        let mut feed = QuoteFeed::new();
        feed.refresh(&store).await.unwrap();
        feed.load_more(&store).await.unwrap();

        assert!(feed.set_categories(vec![QuoteCategory::Love, QuoteCategory::Love]));
        assert!(feed.quotes().is_empty());
        assert_eq!(feed.next_page(), 0);
        assert!(!feed.set_categories(vec![QuoteCategory::Love]));

        feed.refresh(&store).await.unwrap();
        assert!(feed
            .quotes()
            .iter()
            .all(|quote| quote.category == QuoteCategory::Love));
        let last = store.requests.lock().unwrap().last().cloned().unwrap();
        assert_eq!(last, (0, vec![QuoteCategory::Love]));
    }
}
