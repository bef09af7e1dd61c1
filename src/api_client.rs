use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::time::Duration;

use crate::search::params::{SearchParams, PAGE_SIZE};

pub const DEFAULT_BASE_URL: &str = "https://www.googleapis.com/books/v1";

/// Environment variable consulted for the API credential.
/// The key is never compiled into the binary.
pub const API_KEY_ENV: &str = "GOOGLE_BOOKS_API_KEY";

/// Response of the volumes endpoint. The `items` field is absent when a page
/// is past the end of the result set; we treat that as an empty page.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct VolumeList {
    #[serde(default)]
    pub items: Vec<Volume>,
    #[serde(default, rename = "totalItems")]
    pub total_items: Option<u64>,
}

/// One search result. Treated as opaque beyond the fields we display;
/// missing optional fields default rather than fail deserialization.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Volume {
    #[serde(default)]
    pub id: String,
    #[serde(default, rename = "volumeInfo")]
    pub info: VolumeInfo,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VolumeInfo {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub authors: Vec<String>,
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub published_date: Option<String>,
    #[serde(default)]
    pub image_links: Option<ImageLinks>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageLinks {
    #[serde(default)]
    pub thumbnail: Option<String>,
    #[serde(default)]
    pub small_thumbnail: Option<String>,
}

impl Volume {
    pub fn display_title(&self) -> &str {
        if self.info.title.is_empty() {
            "(untitled)"
        } else {
            &self.info.title
        }
    }

    pub fn has_thumbnail(&self) -> bool {
        self.info
            .image_links
            .as_ref()
            .map(|l| l.thumbnail.is_some() || l.small_thumbnail.is_some())
            .unwrap_or(false)
    }
}

/// Blocking client for the Google Books volumes endpoint.
#[derive(Clone)]
pub struct BooksClient {
    base_url: String,
    api_key: Option<String>,
    client: reqwest::blocking::Client,
}

impl BooksClient {
    pub fn new(base_url: &str, api_key: Option<String>) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            client: reqwest::blocking::Client::builder()
                .timeout(Duration::from_secs(15))
                .build()
                .unwrap_or_else(|_| reqwest::blocking::Client::new()),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Query parameters for one page fetch. The `subject` value is the empty
    /// string when no category filter is applied; `key` is omitted entirely
    /// when no credential is configured.
    pub fn query_pairs(
        params: &SearchParams,
        start_index: usize,
        api_key: Option<&str>,
    ) -> Vec<(String, String)> {
        let mut pairs = vec![
            ("q".to_string(), params.term.clone()),
            ("subject".to_string(), params.category.subject_param()),
            ("orderBy".to_string(), params.sort.as_str().to_string()),
            ("maxResults".to_string(), PAGE_SIZE.to_string()),
            ("startIndex".to_string(), start_index.to_string()),
        ];
        if let Some(key) = api_key {
            pairs.push(("key".to_string(), key.to_string()));
        }
        pairs
    }

    /// Fetch one page of results starting at `start_index`.
    pub fn fetch_page(&self, params: &SearchParams, start_index: usize) -> Result<VolumeList> {
        let pairs = Self::query_pairs(params, start_index, self.api_key.as_deref());

        let response = self
            .client
            .get(format!("{}/volumes", self.base_url))
            .query(&pairs)
            .send()
            .context("volumes request failed")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(anyhow!("volumes request returned {}: {}", status, body));
        }

        let list: VolumeList = response
            .json()
            .context("failed to decode volumes response")?;
        Ok(list)
    }
}
