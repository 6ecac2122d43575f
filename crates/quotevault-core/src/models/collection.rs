//! Collection and favorite models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::quote::{parse_timestamp, QuoteSummary};
use crate::error::{Error, Result};

/// Identifier of a user-owned collection
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CollectionId(String);

impl CollectionId {
    pub fn new(raw: impl Into<String>) -> Result<Self> {
        let raw = raw.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(Error::InvalidInput("Collection ID cannot be empty".into()));
        }
        Ok(Self(trimmed.to_string()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CollectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A named group of quotes with its item count
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "CollectionRecord")]
pub struct Collection {
    pub id: CollectionId,
    pub name: String,
    pub created_at: Option<DateTime<Utc>>,
    /// Number of quotes in the collection
    pub count: usize,
}

/// Result of adding a quote to a collection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AddToCollectionOutcome {
    Added,
    /// The quote was already in the collection; treated as success
    AlreadyPresent,
}

/// A favorited quote, flattened from the `favorites -> quotes` join
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FavoriteQuote {
    pub favorite_id: String,
    #[serde(flatten)]
    pub quote: QuoteSummary,
}

/// Liked state after a favorite toggle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FavoriteToggle {
    Liked,
    Unliked,
}

impl FavoriteToggle {
    #[must_use]
    pub const fn is_liked(self) -> bool {
        matches!(self, Self::Liked)
    }
}

#[derive(Debug, Deserialize)]
struct CollectionRecord {
    id: Option<serde_json::Value>,
    name: Option<String>,
    created_at: Option<String>,
    #[serde(default)]
    count: Option<usize>,
    // PostgREST embeds aggregates as `[{"count": n}]`
    #[serde(default)]
    collection_quotes: Option<Vec<CountRow>>,
}

#[derive(Debug, Deserialize)]
struct CountRow {
    count: usize,
}

impl TryFrom<CollectionRecord> for Collection {
    type Error = Error;

    fn try_from(record: CollectionRecord) -> Result<Self> {
        let id = match record.id {
            Some(serde_json::Value::String(value)) => CollectionId::new(value),
            Some(serde_json::Value::Number(value)) => CollectionId::new(value.to_string()),
            _ => Err(Error::InvalidInput(String::new())),
        }
        .map_err(|_| Error::InvalidRecord("collection id is missing".to_string()))?;

        let name = crate::util::normalize_text_option(record.name)
            .ok_or_else(|| Error::InvalidRecord(format!("collection {id} has no name")))?;

        let count = record
            .count
            .or_else(|| {
                record
                    .collection_quotes
                    .and_then(|rows| rows.first().map(|row| row.count))
            })
            .unwrap_or(0);

        Ok(Self {
            id,
            name,
            created_at: record.created_at.as_deref().and_then(parse_timestamp),
            count,
        })
    }
}
