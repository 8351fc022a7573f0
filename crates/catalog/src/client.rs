//! HTTP client for the library open-data API.

use std::time::Duration;

use reqwest::Client;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};

use crate::envelope::{ApiEnvelope, BookListPayload, LibraryListPayload, UsageAnalysisPayload};
use crate::error::CatalogError;
use crate::types::{CatalogBook, Library, RecommendType, UsageAnalysis};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Parameters for the book-search endpoint.
///
/// Exactly one of `keyword`, `title`, `isbn13` is normally set; the upstream
/// accepts any combination and intersects them.
#[derive(Debug, Clone)]
pub struct SearchBooks {
    pub keyword: Option<String>,
    pub title: Option<String>,
    pub isbn13: Option<String>,
    /// 1-based page number.
    pub page: u32,
    pub page_size: u32,
}

impl Default for SearchBooks {
    fn default() -> Self {
        Self { keyword: None, title: None, isbn13: None, page: 1, page_size: 10 }
    }
}

impl SearchBooks {
    /// Free-text keyword search.
    #[must_use]
    pub fn keyword(keyword: impl Into<String>) -> Self {
        Self { keyword: Some(keyword.into()), ..Self::default() }
    }

    /// Title search, used when resolving a known book.
    #[must_use]
    pub fn title(title: impl Into<String>) -> Self {
        Self { title: Some(title.into()), ..Self::default() }
    }

    #[must_use]
    pub fn page(mut self, page: u32) -> Self {
        self.page = page;
        self
    }

    #[must_use]
    pub fn page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }
}

/// Authenticated client for the library open-data API.
///
/// Every request carries `authKey` and `format=json`. The base URL is
/// configurable so tests and staging can point elsewhere.
#[derive(Debug, Clone)]
pub struct LibraryClient {
    client: Client,
    base_url: String,
    auth_key: String,
}

impl LibraryClient {
    /// Create a client with the default request timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if the auth key is empty or the HTTP client cannot
    /// be built.
    pub fn new(
        base_url: impl Into<String>,
        auth_key: impl Into<String>,
    ) -> Result<Self, CatalogError> {
        Self::with_timeout(base_url, auth_key, DEFAULT_TIMEOUT)
    }

    /// Create a client with an explicit per-request timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if the auth key is empty or the HTTP client cannot
    /// be built.
    pub fn with_timeout(
        base_url: impl Into<String>,
        auth_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, CatalogError> {
        let auth_key = auth_key.into();
        if auth_key.is_empty() {
            return Err(CatalogError::Config(
                "library API auth key is required".to_string(),
            ));
        }

        let base_url = base_url.into().trim_end_matches('/').to_string();
        if base_url.is_empty() {
            return Err(CatalogError::Config(
                "library API base URL is required".to_string(),
            ));
        }

        let client = Client::builder()
            .user_agent("booknaru-catalog/0.3")
            .timeout(timeout)
            .build()
            .map_err(CatalogError::Http)?;

        Ok(Self { client, base_url, auth_key })
    }

    /// Search the catalog: `GET /v1/srchBooks`.
    #[instrument(skip(self))]
    pub async fn search_books(&self, params: &SearchBooks) -> Result<Vec<CatalogBook>, CatalogError> {
        let page = params.page.to_string();
        let page_size = params.page_size.to_string();

        let mut query: Vec<(&str, &str)> = Vec::with_capacity(5);
        if let Some(keyword) = params.keyword.as_deref() {
            query.push(("keyword", keyword));
        }
        if let Some(title) = params.title.as_deref() {
            query.push(("title", title));
        }
        if let Some(isbn13) = params.isbn13.as_deref() {
            query.push(("isbn13", isbn13));
        }
        query.push(("pageNo", &page));
        query.push(("pageSize", &page_size));

        let envelope: ApiEnvelope<BookListPayload> = self.get("/v1/srchBooks", &query).await?;
        let mut payload = envelope.response;
        if let Some(message) = payload.error.take() {
            return Err(CatalogError::Upstream(message));
        }
        Ok(payload.into_books())
    }

    /// Usage analysis for one book: `GET /v1/usageAnalysisList`.
    #[instrument(skip(self))]
    pub async fn usage_analysis(&self, isbn13: &str) -> Result<UsageAnalysis, CatalogError> {
        let envelope: ApiEnvelope<UsageAnalysisPayload> =
            self.get("/v1/usageAnalysisList", &[("isbn13", isbn13)]).await?;
        let mut payload = envelope.response;
        if let Some(message) = payload.error.take() {
            return Err(CatalogError::Upstream(message));
        }
        Ok(payload.into_analysis())
    }

    /// Static recommendation list: `GET /v1/recommandList`.
    ///
    /// The upstream accepts several ISBNs at once, joined with `;`.
    #[instrument(skip(self, isbn13s), fields(isbn_count = isbn13s.len()))]
    pub async fn recommend_list(
        &self,
        isbn13s: &[String],
        kind: RecommendType,
    ) -> Result<Vec<CatalogBook>, CatalogError> {
        if isbn13s.is_empty() {
            return Err(CatalogError::Config(
                "recommend_list requires at least one ISBN".to_string(),
            ));
        }
        let joined = isbn13s.join(";");

        let envelope: ApiEnvelope<BookListPayload> = self
            .get("/v1/recommandList", &[("isbn13", &joined), ("type", kind.as_param())])
            .await?;
        let mut payload = envelope.response;
        if let Some(message) = payload.error.take() {
            return Err(CatalogError::Upstream(message));
        }
        Ok(payload.into_books())
    }

    /// Libraries holding a book within one region: `GET /v1/libSrchByBook`.
    #[instrument(skip(self))]
    pub async fn libraries_by_book(
        &self,
        isbn13: &str,
        region_code: &str,
    ) -> Result<Vec<Library>, CatalogError> {
        let envelope: ApiEnvelope<LibraryListPayload> = self
            .get("/v1/libSrchByBook", &[("isbn", isbn13), ("region", region_code)])
            .await?;
        let mut payload = envelope.response;
        if let Some(message) = payload.error.take() {
            return Err(CatalogError::Upstream(message));
        }
        Ok(payload.into_libraries())
    }

    /// Make a GET request against the open-data API.
    async fn get<T>(&self, path: &str, params: &[(&str, &str)]) -> Result<T, CatalogError>
    where
        T: DeserializeOwned,
    {
        let url = format!("{}{path}", self.base_url);
        debug!(url = %url, "library API request");

        let response = self
            .client
            .get(&url)
            .query(&[("authKey", self.auth_key.as_str()), ("format", "json")])
            .query(params)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(CatalogError::Api { status: status.as_u16(), message });
        }

        let body = response.text().await?;
        serde_json::from_str(&body).map_err(CatalogError::Decode)
    }
}
