//! Supabase Storage access for export backdrops.

use std::fmt;

use reqwest::Client;
use serde::Deserialize;
use serde_json::json;

use crate::config::ClientConfig;
use crate::error::{Error, Result};
use crate::remote::parse_api_error;

const LIST_LIMIT: usize = 100;
const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "webp", "gif", "bmp"];

/// A publicly readable backdrop image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Backdrop {
    pub name: String,
    pub public_url: String,
}

#[derive(Clone)]
pub struct StorageClient {
    storage_url: String,
    anon_key: String,
    bucket: String,
    client: Client,
}

impl fmt::Debug for StorageClient {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("StorageClient")
            .field("storage_url", &self.storage_url)
            .field("bucket", &self.bucket)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Deserialize)]
struct StorageObject {
    name: String,
    /// Folders come back without an id
    id: Option<String>,
}

impl StorageClient {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let client = Client::builder().timeout(config.request_timeout()).build()?;
        Ok(Self {
            storage_url: config.storage_url(),
            anon_key: config.supabase_anon_key.clone(),
            bucket: config.backdrop_bucket.clone(),
            client,
        })
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// Image objects at the bucket root, sorted by name.
    pub async fn list_backdrops(&self) -> Result<Vec<Backdrop>> {
        let response = self
            .client
            .post(format!("{}/object/list/{}", self.storage_url, self.bucket))
            .header("apikey", &self.anon_key)
            .bearer_auth(&self.anon_key)
            .json(&json!({
                "prefix": "",
                "limit": LIST_LIMIT,
                "offset": 0,
                "sortBy": { "column": "name", "order": "asc" },
            }))
            .send()
            .await?;
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(parse_api_error(status, &body));
        }

        let objects: Vec<StorageObject> = serde_json::from_str(&body)?;
        let backdrops = objects
            .into_iter()
            .filter(|object| object.id.is_some() && is_image_name(&object.name))
            .map(|object| Backdrop {
                public_url: self.public_url(&object.name),
                name: object.name,
            })
            .collect::<Vec<_>>();
        tracing::debug!(bucket = %self.bucket, count = backdrops.len(), "Listed backdrops");
        Ok(backdrops)
    }

    pub fn public_url(&self, name: &str) -> String {
        format!(
            "{}/object/public/{}/{}",
            self.storage_url,
            self.bucket,
            urlencoding::encode(name)
        )
    }

    /// Raw bytes of any http(s) URL, used for remote backdrops.
    pub async fn download(&self, url: &str) -> Result<Vec<u8>> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::Api {
                status: status.as_u16(),
                code: None,
                message: format!("Failed to download {url}"),
            });
        }
        Ok(response.bytes().await?.to_vec())
    }
}

fn is_image_name(name: &str) -> bool {
    name.rsplit_once('.').is_some_and(|(stem, extension)| {
        !stem.is_empty()
            && IMAGE_EXTENSIONS
                .iter()
                .any(|candidate| extension.eq_ignore_ascii_case(candidate))
    })
}
