//! Search-results page parser.
//!
//! Result links on the HTML endpoint are `a.result__a` anchors. Their `href`
//! is either the target URL itself or a redirect of the form
//! `//duckduckgo.com/l/?uddg=<percent-encoded target>&rut=...`.

use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};
use url::Url;

/// Organic result anchors.
static RESULT_LINK_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a.result__a").expect("result link selector"));

/// Query parameter carrying the real target of a redirect link.
const REDIRECT_PARAM: &str = "uddg";

/// Class on the container of a sponsored result.
const AD_RESULT_CLASS: &str = "result--ad";

/// Subdomain the HTML results page is served from.
const HTML_SUBDOMAIN: &str = "html.";

/// Extract result URLs from a results page, in page order.
///
/// `page_url` resolves protocol-relative and relative links. Links that do not
/// resolve to an external http(s) URL are dropped.
pub(crate) fn parse_results(html: &str, page_url: &Url) -> Vec<String> {
    let doc = Html::parse_document(html);

    doc.select(&RESULT_LINK_SEL)
        .filter(|a| !is_ad(a))
        .filter_map(|a| a.value().attr("href"))
        .filter_map(|href| resolve_result_link(href, page_url))
        .collect()
}

/// Whether the anchor sits inside a sponsored result.
fn is_ad(anchor: &ElementRef<'_>) -> bool {
    anchor
        .ancestors()
        .filter_map(ElementRef::wrap)
        .any(|el| el.value().classes().any(|class| class == AD_RESULT_CLASS))
}

/// Whether `host` belongs to the search engine serving `page_url`, including
/// its apex domain and any other subdomain of it.
fn is_engine_host(host: &str, page_url: &Url) -> bool {
    let Some(page_host) = page_url.host_str() else {
        return false;
    };
    let engine = page_host.strip_prefix(HTML_SUBDOMAIN).unwrap_or(page_host);

    host == engine
        || host
            .strip_suffix(engine)
            .is_some_and(|prefix| prefix.ends_with('.'))
}

/// Turn one result `href` into the target URL.
fn resolve_result_link(href: &str, page_url: &Url) -> Option<String> {
    let link = page_url.join(href.trim()).ok()?;

    let redirect = link
        .query_pairs()
        .find(|(key, _)| key == REDIRECT_PARAM)
        .map(|(_, value)| value.into_owned());

    let target = match redirect {
        Some(value) => Url::parse(&value).ok()?,
        None => link,
    };

    match target.scheme() {
        "http" | "https" => {}
        _ => return None,
    }

    // Internal links (ad trackers, pagination) point back at the search engine.
    if target
        .host_str()
        .is_none_or(|host| is_engine_host(host, page_url))
    {
        return None;
    }

    Some(target.to_string())
}
