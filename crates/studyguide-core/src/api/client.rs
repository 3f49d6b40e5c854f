//! API client for the catalog backend.
//!
//! This module provides the `ApiClient` struct for fetching paginated
//! collections and single records.

use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use rand::Rng;
use reqwest::{header, Client};
use serde::{de::DeserializeOwned, Deserialize};
use tracing::{debug, warn};

use super::{ApiError, CatalogSource};
use crate::config::Config;
use crate::models::{Exam, Guide, Item, ItemType, Scholarship};

// ============================================================================
// Constants
// ============================================================================

/// Path prefix of every catalog endpoint
const API_PREFIX: &str = "/api";

/// Maximum number of retries for rate-limited (429) requests.
/// 3 retries with exponential backoff usually succeeds without excessive delay.
const MAX_RATE_LIMIT_RETRIES: u32 = 3;

/// Initial backoff delay in milliseconds for rate limiting.
const INITIAL_BACKOFF_MS: u64 = 1000;

/// Upper bound on random jitter added to each backoff
const BACKOFF_JITTER_MS: u64 = 250;

/// Hard stop for page walking in case the server reports a bogus page count
const MAX_PAGES: u32 = 1000;

/// One page of a collection endpoint:
/// `{ "<collection>": [...], "total", "page", "limit", "totalPages" }`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PageResponse<T> {
    #[serde(alias = "exams", alias = "scholarships", alias = "guides")]
    items: Vec<T>,
    #[serde(default)]
    total: u64,
    page: u32,
    #[serde(default)]
    total_pages: u32,
}

/// API client for the catalog backend.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    page_size: u32,
    initial_backoff_ms: u64,
}

impl ApiClient {
    pub fn new(config: &Config) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .build()?;

        Ok(Self {
            client,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            page_size: config.page_size.max(1),
            initial_backoff_ms: INITIAL_BACKOFF_MS,
        })
    }

    /// Override the first rate-limit backoff delay
    pub fn with_initial_backoff(mut self, backoff: Duration) -> Self {
        self.initial_backoff_ms = backoff.as_millis() as u64;
        self
    }

    fn collection_url(&self, kind: ItemType, page: u32) -> String {
        format!(
            "{}{}/{}?page={}&limit={}",
            self.base_url,
            API_PREFIX,
            kind.endpoint(),
            page,
            self.page_size
        )
    }

    fn record_url(&self, kind: ItemType, id: &str) -> String {
        format!("{}{}/{}/{}", self.base_url, API_PREFIX, kind.endpoint(), id)
    }

    /// Check if response is successful, returning an error with body if not.
    /// Returns Ok(Some(response)) for success, Ok(None) for rate limit (should retry),
    /// or Err for other errors.
    async fn check_response_for_retry(
        response: reqwest::Response,
    ) -> Result<Option<reqwest::Response>, ApiError> {
        if response.status().is_success() {
            Ok(Some(response))
        } else if response.status().as_u16() == 429 {
            Ok(None)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body))
        }
    }

    async fn get<T: DeserializeOwned>(&self, url: &str) -> Result<T, ApiError> {
        let mut retries = 0;
        let mut backoff_ms = self.initial_backoff_ms;

        loop {
            let response = self
                .client
                .get(url)
                .header(header::ACCEPT, "application/json")
                .send()
                .await?;

            match Self::check_response_for_retry(response).await? {
                Some(response) => {
                    let body = response.text().await?;
                    return serde_json::from_str(&body).map_err(|e| {
                        ApiError::InvalidResponse(format!("Failed to parse JSON from {}: {}", url, e))
                    });
                }
                None => {
                    retries += 1;
                    if retries > MAX_RATE_LIMIT_RETRIES {
                        return Err(ApiError::RateLimited);
                    }
                    let jitter = rand::thread_rng().gen_range(0..=BACKOFF_JITTER_MS.min(backoff_ms));
                    warn!(url = url, retry = retries, backoff_ms = backoff_ms, "Rate limited, backing off");
                    tokio::time::sleep(Duration::from_millis(backoff_ms + jitter)).await;
                    backoff_ms *= 2;
                }
            }
        }
    }

    /// Fetch every page of a collection and concatenate in server order
    pub async fn fetch_all<T: DeserializeOwned>(&self, kind: ItemType) -> Result<Vec<T>, ApiError> {
        let mut items = Vec::new();
        let mut page = 1;

        loop {
            let url = self.collection_url(kind, page);
            let response: PageResponse<T> = self.get(&url).await?;
            let received = response.items.len();
            items.extend(response.items);

            debug!(
                kind = %kind,
                page = response.page,
                total_pages = response.total_pages,
                received,
                "Fetched catalog page"
            );

            // Stop on the requested page, not the one echoed back
            if received == 0 || page >= response.total_pages || page >= MAX_PAGES {
                if response.total > 0 && items.len() as u64 != response.total {
                    warn!(kind = %kind, expected = response.total, got = items.len(), "Collection size mismatch");
                }
                return Ok(items);
            }
            page += 1;
        }
    }

    /// Fetch a single record by id
    pub async fn fetch_one<T: Item>(&self, id: &str) -> Result<T, ApiError> {
        let url = self.record_url(T::KIND, id);
        self.get(&url).await
    }
}

#[async_trait]
impl CatalogSource for ApiClient {
    async fn fetch_exams(&self) -> Result<Vec<Exam>, ApiError> {
        self.fetch_all(ItemType::Exam).await
    }

    async fn fetch_scholarships(&self) -> Result<Vec<Scholarship>, ApiError> {
        self.fetch_all(ItemType::Scholarship).await
    }

    async fn fetch_guides(&self) -> Result<Vec<Guide>, ApiError> {
        self.fetch_all(ItemType::Guide).await
    }
}
