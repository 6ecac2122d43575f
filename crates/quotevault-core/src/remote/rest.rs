//! PostgREST client implementing every store trait against Supabase.

use std::fmt;

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::{header, Client, Method, RequestBuilder, StatusCode};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::collections::CollectionStore;
use crate::config::ClientConfig;
use crate::daily::{DailyQuoteStore, HistoryInsert};
use crate::error::{Error, Result};
use crate::favorites::FavoriteStore;
use crate::feed::{QuoteFeedStore, PAGE_SIZE};
use crate::models::{
    parse_rows, Collection, CollectionId, FavoriteQuote, Quote, QuoteCategory, QuoteId,
    QuoteSummary, UserId,
};
use crate::util::compact_text;

const QUOTES: &str = "quotes";
const DAILY_HISTORY: &str = "user_daily_quotes";
const FAVORITES: &str = "favorites";
const COLLECTIONS: &str = "collections";
const COLLECTION_QUOTES: &str = "collection_quotes";
const UNIQUE_QUOTE_RPC: &str = "rpc/get_random_unique_quote";

const SINGLE_OBJECT: &str = "application/vnd.pgrst.object+json";

/// Row-level data access for a signed-in (or anonymous) client.
#[derive(Clone)]
pub struct SupabaseRestClient {
    rest_url: String,
    anon_key: String,
    access_token: Option<String>,
    client: Client,
}

impl fmt::Debug for SupabaseRestClient {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("SupabaseRestClient")
            .field("rest_url", &self.rest_url)
            .field("anon_key", &"[REDACTED]")
            .field(
                "access_token",
                &self.access_token.as_ref().map(|_| "[REDACTED]"),
            )
            .finish_non_exhaustive()
    }
}

impl SupabaseRestClient {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let client = Client::builder().timeout(config.request_timeout()).build()?;
        Ok(Self {
            rest_url: config.rest_url(),
            anon_key: config.supabase_anon_key.clone(),
            access_token: None,
            client,
        })
    }

    /// Copy of this client that authenticates as the session's user.
    #[must_use]
    pub fn with_access_token(&self, access_token: impl Into<String>) -> Self {
        Self {
            access_token: Some(access_token.into()),
            ..self.clone()
        }
    }

    pub fn rest_url(&self) -> &str {
        &self.rest_url
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let bearer = self.access_token.as_deref().unwrap_or(&self.anon_key);
        self.client
            .request(method, format!("{}/{path}", self.rest_url))
            .header("apikey", &self.anon_key)
            .bearer_auth(bearer)
    }

    fn select(&self, table: &str, columns: &str) -> RequestBuilder {
        self.request(Method::GET, table).query(&[("select", columns)])
    }

    fn insert(&self, table: &str, body: &Value) -> RequestBuilder {
        self.request(Method::POST, table)
            .header("Prefer", "return=minimal")
            .json(body)
    }

    async fn send_json(&self, request: RequestBuilder) -> Result<Value> {
        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(parse_api_error(status, &body));
        }
        if body.trim().is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&body)?)
    }

    async fn send_empty(&self, request: RequestBuilder) -> Result<()> {
        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let body = response.text().await.unwrap_or_default();
        Err(parse_api_error(status, &body))
    }

    async fn fetch_rows(&self, request: RequestBuilder) -> Result<Vec<Value>> {
        Ok(into_rows(self.send_json(request).await?))
    }
}

#[async_trait]
impl DailyQuoteStore for SupabaseRestClient {
    async fn find_history_entry(&self, user: &UserId, date: NaiveDate) -> Result<Option<Quote>> {
        let request = self.select(DAILY_HISTORY, "quotes(*)").query(&[
            ("user_id", eq(user)),
            ("date", eq(date)),
            ("limit", "1".to_string()),
        ]);
        let rows = self.fetch_rows(request).await?;
        rows.into_iter()
            .next()
            .and_then(|mut row| row.get_mut("quotes").map(Value::take))
            .filter(|quote| !quote.is_null())
            .map(parse_quote)
            .transpose()
    }

    async fn pick_unique_quote_for_user(&self, user: &UserId) -> Result<Option<Quote>> {
        let request = self
            .request(Method::POST, UNIQUE_QUOTE_RPC)
            .json(&json!({ "user_uuid": user.as_str() }));
        let payload = self.send_json(request).await?;
        into_rows(payload)
            .into_iter()
            .next()
            // A function returning a composite type yields all-null columns for "no row".
            .filter(|row| row.get("id").is_some_and(|id| !id.is_null()))
            .map(parse_quote)
            .transpose()
    }

    async fn pick_arbitrary_quote(&self) -> Result<Option<Quote>> {
        let request = self.select(QUOTES, "*").query(&[
            ("order", "created_at.asc"),
            ("limit", "1"),
        ]);
        let rows = self.fetch_rows(request).await?;
        rows.into_iter().next().map(parse_quote).transpose()
    }

    async fn insert_history_entry(
        &self,
        user: &UserId,
        quote: &QuoteId,
        date: NaiveDate,
    ) -> Result<HistoryInsert> {
        let body = json!({
            "user_id": user.as_str(),
            "quote_id": quote.as_str(),
            "date": date.to_string(),
        });
        match self.send_empty(self.insert(DAILY_HISTORY, &body)).await {
            Ok(()) => Ok(HistoryInsert::Inserted),
            Err(error) if error.is_unique_violation() => Ok(HistoryInsert::DuplicateKey),
            Err(error) => Err(error),
        }
    }
}

#[async_trait]
impl QuoteFeedStore for SupabaseRestClient {
    async fn fetch_quotes(&self, page: usize, categories: &[QuoteCategory]) -> Result<Vec<Quote>> {
        let mut request = self.select(QUOTES, "*").query(&[
            ("order", "created_at.desc".to_string()),
            ("offset", (page * PAGE_SIZE).to_string()),
            ("limit", PAGE_SIZE.to_string()),
        ]);
        if !categories.is_empty() {
            let names = categories
                .iter()
                .map(|category| category.as_str())
                .collect::<Vec<_>>()
                .join(",");
            request = request.query(&[("category", format!("in.({names})"))]);
        }
        let rows = self.fetch_rows(request).await?;
        Ok(parse_rows(rows, "quote"))
    }

    async fn get_quote(&self, id: &QuoteId) -> Result<Option<Quote>> {
        let request = self
            .select(QUOTES, "*")
            .query(&[("id", eq(id)), ("limit", "1".to_string())]);
        let rows = self.fetch_rows(request).await?;
        rows.into_iter().next().map(parse_quote).transpose()
    }
}

#[async_trait]
impl FavoriteStore for SupabaseRestClient {
    async fn find_favorite(&self, user: &UserId, quote: &QuoteId) -> Result<Option<String>> {
        let request = self.select(FAVORITES, "id").query(&[
            ("user_id", eq(user)),
            ("quote_id", eq(quote)),
            ("limit", "1".to_string()),
        ]);
        let rows = self.fetch_rows(request).await?;
        Ok(rows
            .first()
            .and_then(|row| row.get("id"))
            .and_then(value_to_id))
    }

    async fn insert_favorite(&self, user: &UserId, quote: &QuoteId) -> Result<()> {
        let body = json!({ "user_id": user.as_str(), "quote_id": quote.as_str() });
        self.send_empty(self.insert(FAVORITES, &body)).await
    }

    async fn delete_favorite(&self, favorite_id: &str) -> Result<()> {
        let request = self
            .request(Method::DELETE, FAVORITES)
            .query(&[("id", format!("eq.{favorite_id}"))]);
        self.send_empty(request).await
    }

    async fn liked_quote_ids(&self, user: &UserId) -> Result<Vec<QuoteId>> {
        let request = self
            .select(FAVORITES, "quote_id")
            .query(&[("user_id", eq(user))]);
        let rows = self.fetch_rows(request).await?;
        Ok(rows
            .iter()
            .filter_map(|row| row.get("quote_id").and_then(value_to_id))
            .filter_map(|id| QuoteId::new(id).ok())
            .collect())
    }

    async fn list_favorites(&self, user: &UserId) -> Result<Vec<FavoriteQuote>> {
        let request = self
            .select(FAVORITES, "id,quote:quotes(id,text,author)")
            .query(&[
                ("user_id", eq(user)),
                ("order", "created_at.desc".to_string()),
            ]);
        let rows = self.fetch_rows(request).await?;
        Ok(parse_rows::<FavoriteRow>(rows, "favorite")
            .into_iter()
            .filter_map(|row| {
                Some(FavoriteQuote {
                    favorite_id: value_to_id(&row.id)?,
                    quote: row.quote,
                })
            })
            .collect())
    }
}

#[async_trait]
impl CollectionStore for SupabaseRestClient {
    async fn list_collections(&self, user: &UserId) -> Result<Vec<Collection>> {
        let request = self
            .select(COLLECTIONS, "*,collection_quotes(count)")
            .query(&[
                ("user_id", eq(user)),
                ("order", "created_at.desc".to_string()),
            ]);
        let rows = self.fetch_rows(request).await?;
        Ok(parse_rows(rows, "collection"))
    }

    async fn collection_quotes(&self, collection: &CollectionId) -> Result<Vec<QuoteSummary>> {
        let request = self
            .select(COLLECTION_QUOTES, "quote:quotes(id,text,author)")
            .query(&[("collection_id", eq(collection))]);
        let rows = self.fetch_rows(request).await?;
        let quotes = rows
            .into_iter()
            .filter_map(|mut row| row.get_mut("quote").map(Value::take))
            .filter(|quote| !quote.is_null())
            .collect();
        Ok(parse_rows(quotes, "collection quote"))
    }

    async fn create_collection(&self, user: &UserId, name: &str) -> Result<Collection> {
        let request = self
            .request(Method::POST, COLLECTIONS)
            .header("Prefer", "return=representation")
            .header(header::ACCEPT, SINGLE_OBJECT)
            .json(&json!({ "user_id": user.as_str(), "name": name }));
        let payload = self.send_json(request).await?;
        let row = into_rows(payload)
            .into_iter()
            .next()
            .ok_or_else(|| Error::InvalidRecord("create collection returned no row".into()))?;
        serde_json::from_value(row).map_err(|error| Error::InvalidRecord(error.to_string()))
    }

    async fn insert_collection_quote(
        &self,
        collection: &CollectionId,
        quote: &QuoteId,
    ) -> Result<()> {
        let body = json!({
            "collection_id": collection.as_str(),
            "quote_id": quote.as_str(),
        });
        self.send_empty(self.insert(COLLECTION_QUOTES, &body)).await
    }
}

#[derive(Debug, Deserialize)]
struct FavoriteRow {
    id: Value,
    quote: QuoteSummary,
}

#[derive(Debug, Deserialize)]
struct PostgrestErrorBody {
    code: Option<String>,
    message: Option<String>,
    details: Option<String>,
    hint: Option<String>,
    msg: Option<String>,
    error: Option<String>,
}

fn eq(value: impl fmt::Display) -> String {
    format!("eq.{value}")
}

fn into_rows(payload: Value) -> Vec<Value> {
    match payload {
        Value::Array(rows) => rows,
        Value::Null => Vec::new(),
        row => vec![row],
    }
}

fn parse_quote(value: Value) -> Result<Quote> {
    serde_json::from_value(value).map_err(|error| Error::InvalidRecord(error.to_string()))
}

fn value_to_id(value: &Value) -> Option<String> {
    match value {
        Value::String(id) if !id.trim().is_empty() => Some(id.trim().to_string()),
        Value::Number(id) => Some(id.to_string()),
        _ => None,
    }
}

pub(crate) fn parse_api_error(status: StatusCode, body: &str) -> Error {
    if let Ok(payload) = serde_json::from_str::<PostgrestErrorBody>(body) {
        let message = payload
            .message
            .or(payload.msg)
            .or(payload.error)
            .map(|message| {
                let mut message = message.trim().to_string();
                if let Some(details) = payload.details.filter(|d| !d.trim().is_empty()) {
                    message = format!("{message}: {}", details.trim());
                }
                if let Some(hint) = payload.hint.filter(|h| !h.trim().is_empty()) {
                    message = format!("{message} (hint: {})", hint.trim());
                }
                message
            });
        if let Some(message) = message {
            return Error::Api {
                status: status.as_u16(),
                code: payload.code,
                message,
            };
        }
    }

    let trimmed = compact_text(body);
    Error::Api {
        status: status.as_u16(),
        code: None,
        message: if trimmed.is_empty() {
            format!("HTTP {}", status.as_u16())
        } else {
            trimmed
        },
    }
}
