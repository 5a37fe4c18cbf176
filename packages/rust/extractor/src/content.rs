//! Per-URL content extraction and the concurrent batch fan-out.
//!
//! [`ContentExtractor::extract`] never fails: every transport, parse, or
//! heuristic problem is folded into the returned reference's
//! `failure_reason` so one bad URL can never abort its siblings.

use std::time::Duration;

use reqwest::Client;
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue};
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, instrument, warn};

use researchbrief_shared::{BriefError, Result, SourceReference};

use crate::noise::strip_noise;

/// User-Agent string for fetch requests.
const USER_AGENT: &str = concat!("researchbrief/", env!("CARGO_PKG_VERSION"));

/// Per-fetch timeout.
const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Maximum redirects followed per fetch.
const MAX_REDIRECTS: usize = 5;

/// Content-root candidates, tried in priority order before falling back to
/// the whole document.
const ROOT_SELECTORS: &[&str] = &["article", "main", ".content", ".post", ".entry", "body"];

/// Minimum length of a text block worth keeping (anti-fragment heuristic).
const MIN_BLOCK_CHARS: usize = 40;

/// Minimum length of the joined text for an extraction to count as success.
const MIN_TEXT_CHARS: usize = 100;

/// Fetches one page and reduces it to a title plus cleaned text.
#[derive(Clone)]
pub struct ContentExtractor {
    client: Client,
}

impl ContentExtractor {
    /// Create an extractor with the bounded HTTP client from the fetch contract.
    pub fn new() -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("text/html"));

        let client = Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .timeout(FETCH_TIMEOUT)
            .build()
            .map_err(|e| BriefError::config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { client })
    }

    /// Extract one URL. All failure is data, never an error.
    #[instrument(skip_all, fields(url = %url))]
    pub async fn extract(&self, url: &str) -> SourceReference {
        let body = match self.fetch(url).await {
            Ok(body) => body,
            Err(reason) => {
                debug!(%reason, "fetch failed");
                return SourceReference::failure(url, reason);
            }
        };

        let reference = extract_from_html(url, &body);
        if let Some(reason) = &reference.failure_reason {
            debug!(%reason, "extraction failed");
        } else {
            debug!(
                title = %reference.title,
                chars = reference.full_text.chars().count(),
                "extraction succeeded"
            );
        }
        reference
    }

    /// Fetch the page body, mapping every transport problem to a message.
    async fn fetch(&self, url: &str) -> std::result::Result<String, String> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| e.to_string())?;

        let status = response.status();
        if !status.is_success() {
            return Err(format!("HTTP {status}"));
        }

        response.text().await.map_err(|e| e.to_string())
    }

    /// Extract a whole batch concurrently — one task per URL, no shared
    /// state, results joined back in input order. Slow or failing URLs
    /// never block or fail their siblings; the batch always has the same
    /// length and order as the input.
    #[instrument(skip_all, fields(urls = urls.len()))]
    pub async fn extract_all(&self, urls: &[String]) -> Vec<SourceReference> {
        let mut handles = Vec::with_capacity(urls.len());
        for url in urls {
            let extractor = self.clone();
            let url = url.clone();
            handles.push(tokio::spawn(async move { extractor.extract(&url).await }));
        }

        let mut batch = Vec::with_capacity(urls.len());
        for (handle, url) in handles.into_iter().zip(urls) {
            match handle.await {
                Ok(reference) => batch.push(reference),
                Err(e) => {
                    warn!(%url, error = %e, "extraction task aborted");
                    batch.push(SourceReference::failure(
                        url,
                        format!("extraction task aborted: {e}"),
                    ));
                }
            }
        }
        batch
    }
}

// ---------------------------------------------------------------------------
// HTML reduction
// ---------------------------------------------------------------------------

/// Reduce an HTML body to a source reference.
fn extract_from_html(url: &str, html: &str) -> SourceReference {
    // Title comes from the document as fetched, before noise removal.
    let doc = Html::parse_document(html);
    let title = extract_title(&doc, url);

    let cleaned = strip_noise(html);
    let cleaned_doc = Html::parse_document(&cleaned);
    let text = collect_text(&cleaned_doc);

    if text.chars().count() < MIN_TEXT_CHARS {
        return SourceReference::failure(url, "no meaningful content");
    }

    SourceReference::success(url, title, text)
}

/// Title preference: `<title>` text, first `<h1>` text, the URL itself.
fn extract_title(doc: &Html, url: &str) -> String {
    for sel_str in ["title", "h1"] {
        let sel = Selector::parse(sel_str).expect("static selector");
        if let Some(el) = doc.select(&sel).next() {
            let text = el.text().collect::<String>().trim().to_string();
            if !text.is_empty() {
                return text;
            }
        }
    }
    url.to_string()
}

/// Select the content root in priority order, falling back to the document.
fn content_root(doc: &Html) -> Option<ElementRef<'_>> {
    for sel_str in ROOT_SELECTORS {
        let sel = Selector::parse(sel_str).expect("static selector");
        if let Some(el) = doc.select(&sel).next() {
            return Some(el);
        }
    }
    None
}

/// Collect paragraph, heading, and list-item text under the content root.
///
/// Each block is trimmed; blocks shorter than [`MIN_BLOCK_CHARS`] are
/// dropped; survivors join with a blank line in document order.
fn collect_text(doc: &Html) -> String {
    let block_sel = Selector::parse("p, h1, h2, h3, li").expect("static selector");

    let blocks: Vec<String> = match content_root(doc) {
        Some(root) => root
            .select(&block_sel)
            .map(|el| el.text().collect::<String>().trim().to_string())
            .collect(),
        None => doc
            .select(&block_sel)
            .map(|el| el.text().collect::<String>().trim().to_string())
            .collect(),
    };

    blocks
        .into_iter()
        .filter(|b| b.chars().count() >= MIN_BLOCK_CHARS)
        .collect::<Vec<_>>()
        .join("\n\n")
}
