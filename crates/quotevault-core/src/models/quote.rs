//! Quote model

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// Opaque identifier of a quote row
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QuoteId(String);

impl QuoteId {
    /// Wrap a backend identifier, rejecting blank values
    pub fn new(raw: impl Into<String>) -> Result<Self> {
        let raw = raw.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(Error::InvalidInput("Quote ID cannot be empty".into()));
        }
        Ok(Self(trimmed.to_string()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for QuoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for QuoteId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

/// Fixed set of quote categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QuoteCategory {
    Motivation,
    Love,
    Success,
    Wisdom,
    Humor,
}

impl QuoteCategory {
    pub const ALL: [Self; 5] = [
        Self::Motivation,
        Self::Love,
        Self::Success,
        Self::Wisdom,
        Self::Humor,
    ];

    /// Name as stored in the `category` column
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Motivation => "Motivation",
            Self::Love => "Love",
            Self::Success => "Success",
            Self::Wisdom => "Wisdom",
            Self::Humor => "Humor",
        }
    }
}

impl fmt::Display for QuoteCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QuoteCategory {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let needle = s.trim();
        Self::ALL
            .into_iter()
            .find(|category| category.as_str().eq_ignore_ascii_case(needle))
            .ok_or_else(|| Error::InvalidInput(format!("Unknown quote category: {needle}")))
    }
}

/// A quote as served by the backend. Read-only on the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "QuoteRecord")]
pub struct Quote {
    pub id: QuoteId,
    pub text: String,
    pub author: String,
    pub category: QuoteCategory,
    pub created_at: DateTime<Utc>,
}

impl Quote {
    /// Plain-text rendering used by share sheets and the CLI
    #[must_use]
    pub fn share_text(&self) -> String {
        format!("\"{}\"\n\n\u{2014} {}", self.text, self.author)
    }

    #[must_use]
    pub fn summary(&self) -> QuoteSummary {
        QuoteSummary {
            id: self.id.clone(),
            text: self.text.clone(),
            author: self.author.clone(),
        }
    }
}

/// The `id, text, author` projection returned by favorite and collection joins
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "QuoteSummaryRecord")]
pub struct QuoteSummary {
    pub id: QuoteId,
    pub text: String,
    pub author: String,
}

/// Untrusted quote row as it arrives over the wire
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct QuoteRecord {
    id: Option<serde_json::Value>,
    text: Option<String>,
    author: Option<String>,
    category: Option<String>,
    created_at: Option<String>,
}

impl TryFrom<QuoteRecord> for Quote {
    type Error = Error;

    fn try_from(record: QuoteRecord) -> Result<Self> {
        let id = parse_record_id(record.id)?;
        let text = parse_record_text(record.text, &id)?;
        let category = record
            .category
            .ok_or_else(|| Error::InvalidRecord(format!("quote {id} has no category")))?
            .parse()
            .map_err(|_| Error::InvalidRecord(format!("quote {id} has an unknown category")))?;
        let created_at = record
            .created_at
            .as_deref()
            .and_then(parse_timestamp)
            .ok_or_else(|| {
                Error::InvalidRecord(format!("quote {id} has a missing or invalid created_at"))
            })?;

        Ok(Self {
            id,
            text,
            author: normalize_author(record.author),
            category,
            created_at,
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
struct QuoteSummaryRecord {
    id: Option<serde_json::Value>,
    text: Option<String>,
    author: Option<String>,
}

impl TryFrom<QuoteSummaryRecord> for QuoteSummary {
    type Error = Error;

    fn try_from(record: QuoteSummaryRecord) -> Result<Self> {
        let id = parse_record_id(record.id)?;
        let text = parse_record_text(record.text, &id)?;
        Ok(Self {
            id,
            text,
            author: normalize_author(record.author),
        })
    }
}

// Postgres ids may be uuid strings or bigint numbers.
fn parse_record_id(raw: Option<serde_json::Value>) -> Result<QuoteId> {
    match raw {
        Some(serde_json::Value::String(value)) => QuoteId::new(value)
            .map_err(|_| Error::InvalidRecord("quote id is empty".to_string())),
        Some(serde_json::Value::Number(value)) => QuoteId::new(value.to_string())
            .map_err(|_| Error::InvalidRecord("quote id is empty".to_string())),
        _ => Err(Error::InvalidRecord("quote id is missing".to_string())),
    }
}

fn parse_record_text(raw: Option<String>, id: &QuoteId) -> Result<String> {
    raw.map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
        .ok_or_else(|| Error::InvalidRecord(format!("quote {id} has empty text")))
}

fn normalize_author(raw: Option<String>) -> String {
    crate::util::normalize_text_option(raw).unwrap_or_else(|| "Unknown".to_string())
}

/// Parse `timestamptz` (RFC 3339) or bare `timestamp` columns as UTC.
pub(crate) fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .map(|naive| naive.and_utc())
}

/// Parse rows leniently: malformed rows are logged and skipped.
pub(crate) fn parse_rows<T>(rows: Vec<serde_json::Value>, kind: &str) -> Vec<T>
where
    T: serde::de::DeserializeOwned,
{
    rows.into_iter()
        .filter_map(|row| match serde_json::from_value::<T>(row) {
            Ok(parsed) => Some(parsed),
            Err(error) => {
                tracing::warn!("Skipping malformed {} record: {}", kind, error);
                None
            }
        })
        .collect()
}
