//! Core domain types shared by the fetch and pipeline crates.

use std::fmt;

// ---------------------------------------------------------------------------
// Source
// ---------------------------------------------------------------------------

/// Which side of the comparison a source belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceRole {
    /// The requester's own website.
    Own,
    /// A page discovered through search.
    Competitor,
}

impl fmt::Display for SourceRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Own => f.write_str("self"),
            Self::Competitor => f.write_str("competitor"),
        }
    }
}

/// A URL whose text takes part in the comparison.
#[derive(Debug, Clone)]
pub struct Source {
    /// URL as supplied by the user or the search provider.
    pub url: String,
    /// Own site or competitor.
    pub role: SourceRole,
}

impl Source {
    pub fn own(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            role: SourceRole::Own,
        }
    }

    pub fn competitor(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            role: SourceRole::Competitor,
        }
    }

    /// Identity key: trailing-slash and surrounding-whitespace insensitive.
    pub fn identity(&self) -> &str {
        normalize_url(&self.url)
    }

    /// Whether two sources refer to the same page.
    pub fn same_page(&self, other: &Source) -> bool {
        self.identity() == other.identity()
    }
}

/// Normalize a URL for identity comparison.
pub fn normalize_url(url: &str) -> &str {
    url.trim().trim_end_matches('/')
}

// ---------------------------------------------------------------------------
// FetchResult
// ---------------------------------------------------------------------------

/// Outcome of fetching one source. An empty `text` with a `failure` means
/// the source contributes nothing.
#[derive(Debug, Clone)]
pub struct FetchResult {
    /// The URL that was requested.
    pub url: String,
    /// Visible text of the page (empty on failure).
    pub text: String,
    /// HTTP status, when a response arrived.
    pub status_code: Option<u16>,
    /// Why the fetch produced no text, if it failed.
    pub failure: Option<String>,
}

impl FetchResult {
    pub fn success(url: impl Into<String>, text: String, status_code: u16) -> Self {
        Self {
            url: url.into(),
            text,
            status_code: Some(status_code),
            failure: None,
        }
    }

    pub fn failed(url: impl Into<String>, status_code: Option<u16>, reason: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            text: String::new(),
            status_code,
            failure: Some(reason.into()),
        }
    }

    pub fn is_failure(&self) -> bool {
        self.failure.is_some()
    }
}
