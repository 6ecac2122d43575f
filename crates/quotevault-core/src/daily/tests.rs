use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{NaiveDate, TimeZone, Utc};
use pretty_assertions::assert_eq;
use tokio::sync::Barrier;

use super::*;
use crate::models::QuoteCategory;

// =========================================================================
// In-memory store honoring the backend contract
// =========================================================================

#[derive(Default)]
struct Calls {
    find: AtomicUsize,
    pick_unique: AtomicUsize,
    pick_arbitrary: AtomicUsize,
    insert: AtomicUsize,
    duplicates: AtomicUsize,
}

#[derive(Clone, Default)]
struct MockDailyStore {
    quotes: Arc<Mutex<Vec<Quote>>>,
    history: Arc<Mutex<HashMap<(UserId, NaiveDate), QuoteId>>>,
    calls: Arc<Calls>,
    unique_disabled: bool,
    fail_find: bool,
    fail_pick_unique: bool,
    fail_pick_arbitrary: bool,
    fail_insert: bool,
    pick_barrier: Option<Arc<Barrier>>,
}

impl MockDailyStore {
    fn with_quotes(ids: &[&str]) -> Self {
        Self {
            quotes: Arc::new(Mutex::new(ids.iter().map(|id| quote(id)).collect())),
            ..Self::default()
        }
    }

    fn record(&self, user: &UserId, date: NaiveDate, quote_id: &str) {
        self.history
            .lock()
            .unwrap()
            .insert((user.clone(), date), QuoteId::new(quote_id).unwrap());
    }

    fn history_len(&self) -> usize {
        self.history.lock().unwrap().len()
    }

    fn count(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DailyQuoteStore for MockDailyStore {
    async fn find_history_entry(&self, user: &UserId, date: NaiveDate) -> Result<Option<Quote>> {
        self.calls.find.fetch_add(1, Ordering::SeqCst);
        if self.fail_find {
            return Err(Error::Api {
                status: 503,
                code: None,
                message: "service unavailable".to_string(),
            });
        }
        let history = self.history.lock().unwrap();
        let Some(quote_id) = history.get(&(user.clone(), date)) else {
            return Ok(None);
        };
        Ok(self
            .quotes
            .lock()
            .unwrap()
            .iter()
            .find(|quote| &quote.id == quote_id)
            .cloned())
    }

    async fn pick_unique_quote_for_user(&self, user: &UserId) -> Result<Option<Quote>> {
        self.calls.pick_unique.fetch_add(1, Ordering::SeqCst);
        if let Some(barrier) = &self.pick_barrier {
            barrier.wait().await;
        }
        if self.fail_pick_unique {
            return Err(Error::Api {
                status: 500,
                code: Some("P0001".to_string()),
                message: "rpc failed".to_string(),
            });
        }
        if self.unique_disabled {
            return Ok(None);
        }
        let history = self.history.lock().unwrap();
        let seen = history
            .iter()
            .filter(|((owner, _), _)| owner == user)
            .map(|(_, quote_id)| quote_id.clone())
            .collect::<Vec<_>>();
        Ok(self
            .quotes
            .lock()
            .unwrap()
            .iter()
            .find(|quote| !seen.contains(&quote.id))
            .cloned())
    }

    async fn pick_arbitrary_quote(&self) -> Result<Option<Quote>> {
        self.calls.pick_arbitrary.fetch_add(1, Ordering::SeqCst);
        if self.fail_pick_arbitrary {
            return Err(Error::Api {
                status: 504,
                code: None,
                message: "gateway timeout".to_string(),
            });
        }
        Ok(self.quotes.lock().unwrap().first().cloned())
    }

    async fn insert_history_entry(
        &self,
        user: &UserId,
        quote: &QuoteId,
        date: NaiveDate,
    ) -> Result<HistoryInsert> {
        self.calls.insert.fetch_add(1, Ordering::SeqCst);
        if self.fail_insert {
            return Err(Error::Api {
                status: 500,
                code: None,
                message: "write failed".to_string(),
            });
        }
        let mut history = self.history.lock().unwrap();
        let key = (user.clone(), date);
        if history.contains_key(&key) {
            self.calls.duplicates.fetch_add(1, Ordering::SeqCst);
            return Ok(HistoryInsert::DuplicateKey);
        }
        history.insert(key, quote.clone());
        Ok(HistoryInsert::Inserted)
    }
}

fn quote(id: &str) -> Quote {
    Quote {
        id: QuoteId::new(id).unwrap(),
        text: format!("Quote text {id}"),
        author: "Anonymous".to_string(),
        category: QuoteCategory::Wisdom,
        created_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
    }
}

fn user(id: &str) -> UserId {
    UserId::new(id).unwrap()
}

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, d).unwrap()
}

// =========================================================================
// Resolution
// =========================================================================

#[tokio::test]
async fn existing_history_is_replayed_without_selection_or_write() {
    let store = MockDailyStore::with_quotes(&["q1", "q2", "q3"]);
    let u1 = user("u1");
    store.record(&u1, day(1), "q2");
    let resolver = DailyQuoteResolver::new(store.clone());

    for _ in 0..3 {
        let resolved = resolver.resolve(&u1, day(1)).await.unwrap();
        assert_eq!(resolved.id.as_str(), "q2");
    }

    assert_eq!(MockDailyStore::count(&store.calls.find), 3);
    assert_eq!(MockDailyStore::count(&store.calls.pick_unique), 0);
    assert_eq!(MockDailyStore::count(&store.calls.pick_arbitrary), 0);
    assert_eq!(MockDailyStore::count(&store.calls.insert), 0);
}

#[tokio::test]
async fn first_resolution_picks_and_records_then_replays() {
    let store = MockDailyStore::with_quotes(&["q7"]);
    let u1 = user("u1");
    let resolver = DailyQuoteResolver::new(store.clone());

    let first = resolver.resolve(&u1, day(1)).await.unwrap();
    assert_eq!(first.id.as_str(), "q7");
    assert_eq!(MockDailyStore::count(&store.calls.pick_unique), 1);
    assert_eq!(MockDailyStore::count(&store.calls.insert), 1);
    assert_eq!(store.history_len(), 1);

    let second = resolver.resolve(&u1, day(1)).await.unwrap();
    assert_eq!(second.id, first.id);
    assert_eq!(MockDailyStore::count(&store.calls.pick_unique), 1);
    assert_eq!(MockDailyStore::count(&store.calls.insert), 1);
}

#[tokio::test]
async fn fallback_pick_is_returned_but_never_recorded() {
    let store = MockDailyStore {
        unique_disabled: true,
        ..MockDailyStore::with_quotes(&["f1", "f2"])
    };
    let resolver = DailyQuoteResolver::new(store.clone());

    let resolved = resolver.resolve(&user("u1"), day(1)).await.unwrap();

    assert_eq!(resolved.id.as_str(), "f1");
    assert_eq!(MockDailyStore::count(&store.calls.pick_arbitrary), 1);
    assert_eq!(MockDailyStore::count(&store.calls.insert), 0);
    assert_eq!(store.history_len(), 0);
}

#[tokio::test]
async fn concurrent_first_resolutions_both_succeed_with_one_write() {
    let store = MockDailyStore {
        pick_barrier: Some(Arc::new(Barrier::new(2))),
        ..MockDailyStore::with_quotes(&["q1", "q2"])
    };
    let u1 = user("u1");
    let resolver = DailyQuoteResolver::new(store.clone());

    let (left, right) = tokio::join!(resolver.resolve(&u1, day(1)), resolver.resolve(&u1, day(1)));

    assert!(left.is_ok());
    assert!(right.is_ok());
    assert_eq!(MockDailyStore::count(&store.calls.pick_unique), 2);
    assert_eq!(MockDailyStore::count(&store.calls.insert), 2);
    assert_eq!(MockDailyStore::count(&store.calls.duplicates), 1);
    assert_eq!(store.history_len(), 1);
}

#[tokio::test]
async fn empty_selection_and_fallback_is_terminal() {
    let store = MockDailyStore {
        unique_disabled: true,
        ..MockDailyStore::default()
    };
    let resolver = DailyQuoteResolver::new(store.clone());

    let error = resolver.resolve(&user("u1"), day(1)).await.unwrap_err();

    assert!(matches!(error, Error::NoQuotesAvailable));
    assert_eq!(MockDailyStore::count(&store.calls.insert), 0);
}

#[tokio::test]
async fn unique_pick_excludes_quotes_seen_on_earlier_days() {
    let store = MockDailyStore::with_quotes(&["q1", "q2", "q3"]);
    let u1 = user("u1");
    store.record(&u1, day(1), "q1");
    store.record(&u1, day(2), "q2");
    let resolver = DailyQuoteResolver::new(store.clone());

    let resolved = resolver.resolve(&u1, day(3)).await.unwrap();

    assert_eq!(resolved.id.as_str(), "q3");
}

#[tokio::test]
async fn history_is_scoped_per_user() {
    let store = MockDailyStore::with_quotes(&["q1", "q2"]);
    store.record(&user("u2"), day(1), "q1");
    let resolver = DailyQuoteResolver::new(store.clone());

    let resolved = resolver.resolve(&user("u1"), day(1)).await.unwrap();

    assert_eq!(resolved.id.as_str(), "q1");
    assert_eq!(store.history_len(), 2);
}

#[tokio::test]
async fn lookup_failure_propagates_without_selection() {
    let store = MockDailyStore {
        fail_find: true,
        ..MockDailyStore::with_quotes(&["q1"])
    };
    let resolver = DailyQuoteResolver::new(store.clone());

    let error = resolver.resolve(&user("u1"), day(1)).await.unwrap_err();

    assert!(matches!(error, Error::Api { status: 503, .. }));
    assert_eq!(MockDailyStore::count(&store.calls.pick_unique), 0);
}

#[tokio::test]
async fn history_write_failure_does_not_fail_resolution() {
    let store = MockDailyStore {
        fail_insert: true,
        ..MockDailyStore::with_quotes(&["q1"])
    };
    let resolver = DailyQuoteResolver::new(store.clone());

    let resolved = resolver.resolve(&user("u1"), day(1)).await.unwrap();

    assert_eq!(resolved.id.as_str(), "q1");
    assert_eq!(MockDailyStore::count(&store.calls.insert), 1);
}

#[tokio::test]
async fn unique_pick_failure_propagates_without_fallback_or_write() {
    let store = MockDailyStore {
        fail_pick_unique: true,
        ..MockDailyStore::with_quotes(&["q1"])
    };
    let resolver = DailyQuoteResolver::new(store.clone());

    let error = resolver.resolve(&user("u1"), day(1)).await.unwrap_err();

    assert!(matches!(error, Error::Api { status: 500, .. }));
    assert_eq!(MockDailyStore::count(&store.calls.pick_unique), 1);
    assert_eq!(MockDailyStore::count(&store.calls.pick_arbitrary), 0);
    assert_eq!(MockDailyStore::count(&store.calls.insert), 0);
    assert_eq!(store.history_len(), 0);
}

#[tokio::test]
async fn fallback_failure_propagates_without_write() {
    let store = MockDailyStore {
        unique_disabled: true,
        fail_pick_arbitrary: true,
        ..MockDailyStore::with_quotes(&["q1"])
    };
    let resolver = DailyQuoteResolver::new(store.clone());

    let error = resolver.resolve(&user("u1"), day(1)).await.unwrap_err();

    assert!(matches!(error, Error::Api { status: 504, .. }));
    assert_eq!(MockDailyStore::count(&store.calls.pick_unique), 1);
    assert_eq!(MockDailyStore::count(&store.calls.pick_arbitrary), 1);
    assert_eq!(MockDailyStore::count(&store.calls.insert), 0);
}
