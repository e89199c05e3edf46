//! Competitor discovery through web search.
//!
//! The pipeline only depends on the [`SearchProvider`] contract: given a
//! keyword and a result bound, return candidate URLs in rank order.
//! [`HtmlSearch`] implements it by scraping an HTML search-results page.

mod parser;

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, info, instrument};
use url::Url;

use wordy_shared::{Result, WordyError};

/// Maximum number of redirects to follow when fetching a results page.
const MAX_REDIRECTS: usize = 3;

/// Default timeout in seconds for the search request.
const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Results pages reject obvious bot user agents.
const USER_AGENT: &str = concat!("Mozilla/5.0 (compatible; Wordy/", env!("CARGO_PKG_VERSION"), ")");

// ---------------------------------------------------------------------------
// SearchProvider
// ---------------------------------------------------------------------------

/// Source of candidate competitor URLs for a keyword.
#[async_trait]
pub trait SearchProvider: Send + Sync {
    /// Return at most `max_results` URLs, best match first.
    async fn discover(&self, keyword: &str, max_results: usize) -> Result<Vec<String>>;
}

// ---------------------------------------------------------------------------
// HtmlSearch
// ---------------------------------------------------------------------------

/// Search provider backed by an HTML results endpoint (`<endpoint>?q=<keyword>`).
#[derive(Debug, Clone)]
pub struct HtmlSearch {
    client: Client,
    endpoint: Url,
}

impl HtmlSearch {
    /// Create a provider for `endpoint` with the default timeout.
    pub fn new(endpoint: &str) -> Result<Self> {
        Self::with_timeout(endpoint, DEFAULT_TIMEOUT_SECS)
    }

    pub fn with_timeout(endpoint: &str, timeout_secs: u64) -> Result<Self> {
        let endpoint = Url::parse(endpoint)
            .map_err(|e| WordyError::config(format!("invalid search endpoint '{endpoint}': {e}")))?;

        let client = Client::builder()
            .user_agent(USER_AGENT)
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| WordyError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { client, endpoint })
    }
}

#[async_trait]
impl SearchProvider for HtmlSearch {
    #[instrument(skip(self), fields(endpoint = %self.endpoint))]
    async fn discover(&self, keyword: &str, max_results: usize) -> Result<Vec<String>> {
        let keyword = keyword.trim();
        if keyword.is_empty() {
            return Err(WordyError::validation("search keyword must not be empty"));
        }

        let mut page_url = self.endpoint.clone();
        page_url.query_pairs_mut().append_pair("q", keyword);

        debug!(url = %page_url, "requesting search results");

        let response = self
            .client
            .get(page_url.as_str())
            .send()
            .await
            .map_err(|e| WordyError::Search(format!("{page_url}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(WordyError::Search(format!("{page_url}: HTTP {status}")));
        }

        let body = response
            .text()
            .await
            .map_err(|e| WordyError::Search(format!("{page_url}: failed to read body: {e}")))?;

        let mut urls = parser::parse_results(&body, &page_url);
        urls.truncate(max_results);

        info!(results = urls.len(), "search results discovered");

        Ok(urls)
    }
}
