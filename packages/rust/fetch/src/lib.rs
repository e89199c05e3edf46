//! Page fetching and visible-text extraction.
//!
//! The [`Fetcher`] is the failure boundary for remote sources: every transport,
//! status, or decoding problem becomes an empty [`FetchResult`] carrying the
//! reason, so callers can keep going when any subset of sources fails.

mod extract;

use std::time::Duration;

use reqwest::Client;
use tracing::{debug, instrument, warn};

use wordy_shared::{FetchResult, Result, WordyError};

pub use extract::visible_text;

/// User-Agent string for page requests.
const USER_AGENT: &str = concat!("Wordy/", env!("CARGO_PKG_VERSION"));

/// Maximum number of redirects to follow per page.
const MAX_REDIRECTS: usize = 5;

/// Default per-page timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

// ---------------------------------------------------------------------------
// Fetcher
// ---------------------------------------------------------------------------

/// HTTP fetcher that turns a URL into the visible text of the page.
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
}

impl Fetcher {
    /// Create a fetcher whose requests give up after `timeout_secs`.
    pub fn new(timeout_secs: u64) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| WordyError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { client })
    }

    /// Fetch `url` and extract its text. Never fails; see [`FetchResult::failure`].
    #[instrument(skip(self))]
    pub async fn fetch(&self, url: &str) -> FetchResult {
        debug!("fetching page");

        let response = match self.client.get(url).send().await {
            Ok(response) => response,
            Err(e) => return failed(url, None, format!("request failed: {e}")),
        };

        let status = response.status();
        let status_code = status.as_u16();

        if !status.is_success() {
            return failed(url, Some(status_code), format!("HTTP {status}"));
        }

        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                return failed(url, Some(status_code), format!("failed to read body: {e}"));
            }
        };

        let text = visible_text(&body);
        debug!(
            status_code,
            body_len = body.len(),
            text_len = text.len(),
            "page fetched"
        );

        FetchResult::success(url, text, status_code)
    }
}

fn failed(url: &str, status_code: Option<u16>, reason: String) -> FetchResult {
    warn!(%url, %reason, "fetch failed, source contributes no text");
    FetchResult::failed(url, status_code, reason)
}

#[cfg(test)]
mod tests {
    use super::*;

    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn fetch_extracts_visible_text() {
        let server = MockServer::start().await;

        let page = r#"<html>
            <head><title>Shop</title><style>body { color: red; }</style></head>
            <body>
                <h1>Fast shipping</h1>
                <script>trackVisitor("analytics");</script>
                <p>Great prices</p>
            </body>
        </html>"#;

        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(200).set_body_string(page))
            .mount(&server)
            .await;

        let fetcher = Fetcher::new(DEFAULT_TIMEOUT_SECS).unwrap();
        let result = fetcher.fetch(&server.uri()).await;

        assert!(!result.is_failure(), "unexpected failure: {:?}", result.failure);
        assert_eq!(result.status_code, Some(200));
        assert!(result.text.contains("Fast shipping"));
        assert!(result.text.contains("Great prices"));
        assert!(!result.text.contains("analytics"));
        assert!(!result.text.contains("color"));
    }

    #[tokio::test]
    async fn fetch_error_status_yields_empty_result() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/missing"))
            .respond_with(ResponseTemplate::new(404).set_body_string("<p>not here</p>"))
            .mount(&server)
            .await;

        let fetcher = Fetcher::new(DEFAULT_TIMEOUT_SECS).unwrap();
        let result = fetcher.fetch(&format!("{}/missing", server.uri())).await;

        assert!(result.is_failure());
        assert!(result.text.is_empty());
        assert_eq!(result.status_code, Some(404));
        assert!(result.failure.unwrap().contains("404"));
    }

    #[tokio::test]
    async fn fetch_unreachable_host_yields_empty_result() {
        // Port 9 (discard) on localhost is closed on test machines.
        let fetcher = Fetcher::new(2).unwrap();
        let result = fetcher.fetch("http://127.0.0.1:9/").await;

        assert!(result.is_failure());
        assert!(result.text.is_empty());
        assert_eq!(result.status_code, None);
    }

    #[tokio::test]
    async fn fetch_invalid_url_yields_empty_result() {
        let fetcher = Fetcher::new(DEFAULT_TIMEOUT_SECS).unwrap();
        let result = fetcher.fetch("not a url").await;

        assert!(result.is_failure());
        assert!(result.text.is_empty());
    }

    #[tokio::test]
    async fn fetch_times_out() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string("<p>slow</p>")
                    .set_delay(Duration::from_secs(3)),
            )
            .mount(&server)
            .await;

        let fetcher = Fetcher::new(1).unwrap();
        let result = fetcher.fetch(&server.uri()).await;

        assert!(result.is_failure());
        assert!(result.text.is_empty());
    }
}
