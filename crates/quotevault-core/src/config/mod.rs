//! Client configuration.
//!
//! `ClientConfig` carries the public Supabase endpoint and anon key plus the
//! storage bucket that holds export backdrops. These values are safe to ship;
//! user secrets live in the session, never here.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::util::{is_http_url, normalize_text_option};

pub const DEFAULT_BACKDROP_BUCKET: &str = "backdrops";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

/// Validated backend configuration shared by every client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClientConfig {
    /// Project URL, e.g. `https://project.supabase.co` (no trailing slash)
    pub supabase_url: String,
    /// Public anon key sent as `apikey`
    pub supabase_anon_key: String,
    #[serde(default = "default_backdrop_bucket")]
    pub backdrop_bucket: String,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl ClientConfig {
    pub fn new(supabase_url: impl Into<String>, supabase_anon_key: impl Into<String>) -> Result<Self> {
        let config = Self {
            supabase_url: supabase_url.into(),
            supabase_anon_key: supabase_anon_key.into(),
            backdrop_bucket: default_backdrop_bucket(),
            request_timeout_secs: default_request_timeout_secs(),
        };
        config.validated()
    }

    /// Build from optional parts; `Ok(None)` when both are absent.
    ///
    /// Supplying only one of URL/key is a configuration error.
    pub fn from_optional(
        supabase_url: Option<String>,
        supabase_anon_key: Option<String>,
    ) -> Result<Option<Self>> {
        match (
            normalize_text_option(supabase_url),
            normalize_text_option(supabase_anon_key),
        ) {
            (None, None) => Ok(None),
            (Some(url), Some(key)) => Self::new(url, key).map(Some),
            (Some(_), None) => Err(Error::Config("Supabase anon key is missing".to_string())),
            (None, Some(_)) => Err(Error::Config("Supabase URL is missing".to_string())),
        }
    }

    #[must_use]
    pub fn with_backdrop_bucket(mut self, bucket: impl Into<String>) -> Self {
        self.backdrop_bucket = bucket.into();
        self
    }

    /// Override the per-request timeout. Whole seconds only; anything under one second is rejected.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Result<Self> {
        self.request_timeout_secs = timeout.as_secs();
        self.validated()
    }

    /// Trim, normalize, and check every field.
    pub fn validated(self) -> Result<Self> {
        let supabase_url = normalize_text_option(Some(self.supabase_url))
            .ok_or_else(|| Error::Config("Supabase URL must not be empty".to_string()))?;
        if !is_http_url(&supabase_url) {
            return Err(Error::Config(
                "Supabase URL must include http:// or https://".to_string(),
            ));
        }
        let supabase_anon_key = normalize_text_option(Some(self.supabase_anon_key))
            .ok_or_else(|| Error::Config("Supabase anon key must not be empty".to_string()))?;
        let backdrop_bucket = normalize_text_option(Some(self.backdrop_bucket))
            .unwrap_or_else(default_backdrop_bucket);
        if self.request_timeout_secs == 0 {
            return Err(Error::Config(
                "Request timeout must be greater than zero".to_string(),
            ));
        }

        Ok(Self {
            supabase_url: supabase_url.trim_end_matches('/').to_string(),
            supabase_anon_key,
            backdrop_bucket,
            request_timeout_secs: self.request_timeout_secs,
        })
    }

    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// PostgREST base, `<url>/rest/v1`
    #[must_use]
    pub fn rest_url(&self) -> String {
        format!("{}/rest/v1", self.supabase_url)
    }

    /// GoTrue base, `<url>/auth/v1`
    #[must_use]
    pub fn auth_url(&self) -> String {
        format!("{}/auth/v1", self.supabase_url)
    }

    /// Storage base, `<url>/storage/v1`
    #[must_use]
    pub fn storage_url(&self) -> String {
        format!("{}/storage/v1", self.supabase_url)
    }
}

fn default_backdrop_bucket() -> String {
    DEFAULT_BACKDROP_BUCKET.to_string()
}

const fn default_request_timeout_secs() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}
