//! User collections of quotes.

use async_trait::async_trait;

use crate::error::{Error, Result};
use crate::models::{AddToCollectionOutcome, Collection, CollectionId, QuoteId, QuoteSummary, UserId};

/// Backend operations on `collections` and `collection_quotes`.
#[async_trait]
pub trait CollectionStore: Send + Sync {
    /// Collections with item counts, newest first
    async fn list_collections(&self, user: &UserId) -> Result<Vec<Collection>>;

    async fn collection_quotes(&self, collection: &CollectionId) -> Result<Vec<QuoteSummary>>;

    async fn create_collection(&self, user: &UserId, name: &str) -> Result<Collection>;

    /// Raw insert; a duplicate pair surfaces as a unique-violation error
    async fn insert_collection_quote(&self, collection: &CollectionId, quote: &QuoteId) -> Result<()>;
}

/// Trimmed collection name, rejecting blanks.
pub fn normalize_collection_name(name: &str) -> Result<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        Err(Error::InvalidInput("Collection name cannot be empty".into()))
    } else {
        Ok(trimmed.to_string())
    }
}

pub async fn create_collection<S>(store: &S, user: &UserId, name: &str) -> Result<Collection>
where
    S: CollectionStore + ?Sized,
{
    let name = normalize_collection_name(name)?;
    let collection = store.create_collection(user, &name).await?;
    tracing::info!(collection = %collection.id, "Created collection '{}'", collection.name);
    Ok(collection)
}

/// Add `quote` to `collection`; a quote already present is not an error.
pub async fn add_quote_to_collection<S>(
    store: &S,
    collection: &CollectionId,
    quote: &QuoteId,
) -> Result<AddToCollectionOutcome>
where
    S: CollectionStore + ?Sized,
{
    match store.insert_collection_quote(collection, quote).await {
        Ok(()) => Ok(AddToCollectionOutcome::Added),
        Err(error) if error.is_unique_violation() => {
            tracing::debug!(collection = %collection, quote = %quote, "Quote already in collection");
            Ok(AddToCollectionOutcome::AlreadyPresent)
        }
        Err(error) => Err(error),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::sync::Mutex;

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::error::UNIQUE_VIOLATION_CODE;

    #[derive(Default)]
    struct MockCollectionStore {
        collections: Mutex<Vec<Collection>>,
        items: Mutex<HashSet<(CollectionId, QuoteId)>>,
    }

    #[async_trait]
    impl CollectionStore for MockCollectionStore {
        async fn list_collections(&self, _user: &UserId) -> Result<Vec<Collection>> {
            let items = self.items.lock().unwrap();
            Ok(self
                .collections
                .lock()
                .unwrap()
                .iter()
                .map(|collection| Collection {
                    count: items.iter().filter(|(id, _)| id == &collection.id).count(),
                    ..collection.clone()
                })
                .collect())
        }

        async fn collection_quotes(&self, _collection: &CollectionId) -> Result<Vec<QuoteSummary>> {
            Ok(Vec::new())
        }

        async fn create_collection(&self, _user: &UserId, name: &str) -> Result<Collection> {
            let mut collections = self.collections.lock().unwrap();
            let collection = Collection {
                id: CollectionId::new(format!("c{}", collections.len() + 1))?,
                name: name.to_string(),
                created_at: None,
                count: 0,
            };
            collections.push(collection.clone());
            Ok(collection)
        }

        async fn insert_collection_quote(
            &self,
            collection: &CollectionId,
            quote: &QuoteId,
        ) -> Result<()> {
            let inserted = self
                .items
                .lock()
                .unwrap()
                .insert((collection.clone(), quote.clone()));
            if inserted {
                Ok(())
            } else {
                Err(Error::Api {
                    status: 409,
                    code: Some(UNIQUE_VIOLATION_CODE.to_string()),
                    message: "duplicate key value violates unique constraint".to_string(),
                })
            }
        }
    }

    #[tokio::test]
    async fn create_collection_trims_name() {
        let store = MockCollectionStore::default();
        let user = UserId::new("u1").unwrap();

        let created = create_collection(&store, &user, "  Mornings ").await.unwrap();

        assert_eq!(created.name, "Mornings");
    }

    #[tokio::test]
    async fn create_collection_rejects_blank_name() {
        let store = MockCollectionStore::default();
        let user = UserId::new("u1").unwrap();

        let error = create_collection(&store, &user, "   ").await.unwrap_err();

        assert!(matches!(error, Error::InvalidInput(_)));
        assert!(store.collections.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn adding_twice_reports_already_present() {
        let store = MockCollectionStore::default();
        let user = UserId::new("u1").unwrap();
        let collection = create_collection(&store, &user, "Mornings").await.unwrap();
        let quote = QuoteId::new("q1").unwrap();

        let first = add_quote_to_collection(&store, &collection.id, &quote)
            .await
            .unwrap();
        let second = add_quote_to_collection(&store, &collection.id, &quote)
            .await
            .unwrap();

        assert_eq!(first, AddToCollectionOutcome::Added);
        assert_eq!(second, AddToCollectionOutcome::AlreadyPresent);
        let listed = store.list_collections(&user).await.unwrap();
        assert_eq!(listed[0].count, 1);
    }
}
