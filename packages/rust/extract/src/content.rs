//! Shared HTTP fetching and HTML content helpers for the built-in extractors.
//!
//! `scraper::Html` is not `Send`, so every parse is confined to a synchronous
//! helper that takes the page source as `&str` and returns owned data —
//! nothing HTML-shaped is ever held across an await point.

use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;
use reqwest::Client;
use scraper::{Html, Selector};
use tracing::debug;
use url::Url;

use knowledgeharvest_shared::{FailureReason, HarvestError, Result};

/// User-Agent string for page requests.
const USER_AGENT: &str = concat!("KnowledgeHarvest/", env!("CARGO_PKG_VERSION"));

/// Content containers tried in priority order when extracting a page body.
const CONTENT_SELECTORS: &[&str] = &[
    "article",
    ".post-content",
    ".entry-content",
    ".available-content",
    ".content",
    "main",
    r#"[role="main"]"#,
];

/// Selectors tried in order when extracting an author byline.
const AUTHOR_SELECTORS: &[&str] = &[
    r#"meta[name="author"]"#,
    ".author",
    ".by-author",
    ".post-author",
    r#"[rel="author"]"#,
    ".byline",
    ".byline-name",
];

// ---------------------------------------------------------------------------
// FetchClient
// ---------------------------------------------------------------------------

/// Thin wrapper over `reqwest::Client` with rate limiting between requests.
#[derive(Clone)]
pub struct FetchClient {
    client: Client,
    rate_limit_ms: u64,
}

impl FetchClient {
    /// Build a client with the crate UA, limited redirects, and a request
    /// timeout. `rate_limit_ms` is slept before every request when non-zero.
    pub fn new(rate_limit_ms: u64) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .redirect(reqwest::redirect::Policy::limited(5))
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| HarvestError::config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            rate_limit_ms,
        })
    }

    /// Fetch a page as text, mapping transport and HTTP-status failures to
    /// [`FailureReason::Network`].
    pub async fn fetch_text(&self, url: &Url) -> std::result::Result<String, FailureReason> {
        self.throttle().await;
        debug!(%url, "fetching page");

        let response = self
            .client
            .get(url.as_str())
            .send()
            .await
            .map_err(|e| FailureReason::Network(format!("{url}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FailureReason::Network(format!("{url}: HTTP {status}")));
        }

        response
            .text()
            .await
            .map_err(|e| FailureReason::Network(format!("{url}: body read failed: {e}")))
    }

    /// Fetch a resource as raw bytes (for remote documents).
    pub async fn fetch_bytes(&self, url: &Url) -> std::result::Result<Vec<u8>, FailureReason> {
        self.throttle().await;
        debug!(%url, "fetching document");

        let response = self
            .client
            .get(url.as_str())
            .send()
            .await
            .map_err(|e| FailureReason::Network(format!("{url}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FailureReason::Network(format!("{url}: HTTP {status}")));
        }

        response
            .bytes()
            .await
            .map(|b| b.to_vec())
            .map_err(|e| FailureReason::Network(format!("{url}: body read failed: {e}")))
    }

    async fn throttle(&self) {
        if self.rate_limit_ms > 0 {
            tokio::time::sleep(Duration::from_millis(self.rate_limit_ms)).await;
        }
    }
}

// ---------------------------------------------------------------------------
// Page parsing
// ---------------------------------------------------------------------------

/// Title, body markdown, and author pulled out of one HTML page.
#[derive(Debug, Clone)]
pub struct PageContent {
    pub title: Option<String>,
    pub markdown: String,
    pub author: Option<String>,
}

/// Parse a fetched page into title, markdown body, and author.
///
/// Body extraction tries the content-container chain, falling back to the
/// whole `<body>`; the selected HTML is converted to Markdown via `htmd`.
pub fn parse_page(html: &str) -> std::result::Result<PageContent, FailureReason> {
    let doc = Html::parse_document(html);

    let title = extract_title(&doc);
    let author = extract_author(&doc);
    let content_html = select_content_html(&doc);

    let converter = htmd::HtmlToMarkdown::builder()
        .skip_tags(vec!["script", "style", "nav", "iframe", "noscript", "svg"])
        .build();

    let raw_markdown = converter
        .convert(&content_html)
        .map_err(|e| FailureReason::Parse(format!("markdown conversion failed: {e}")))?;

    Ok(PageContent {
        title,
        markdown: tidy_markdown(&raw_markdown),
        author,
    })
}

/// Pick the main content container's HTML, stripping page chrome.
fn select_content_html(doc: &Html) -> String {
    for sel_str in CONTENT_SELECTORS {
        if let Ok(sel) = Selector::parse(sel_str) {
            if let Some(el) = doc.select(&sel).next() {
                return el.inner_html();
            }
        }
    }

    // Last resort: whole body.
    let body_sel = Selector::parse("body").expect("valid selector");
    doc.select(&body_sel)
        .next()
        .map(|el| el.inner_html())
        .unwrap_or_default()
}

/// Extract the page title: first `<h1>`, then `<title>`.
fn extract_title(doc: &Html) -> Option<String> {
    for sel_str in ["h1", "title"] {
        let sel = Selector::parse(sel_str).expect("valid selector");
        if let Some(el) = doc.select(&sel).next() {
            let text = clean_text(&el.text().collect::<String>());
            if !text.is_empty() {
                return Some(text);
            }
        }
    }
    None
}

/// Extract an author from common meta/byline patterns.
fn extract_author(doc: &Html) -> Option<String> {
    for sel_str in AUTHOR_SELECTORS {
        let sel = Selector::parse(sel_str).expect("valid selector");
        if let Some(el) = doc.select(&sel).next() {
            let text = if el.value().name() == "meta" {
                el.value().attr("content").unwrap_or("").to_string()
            } else {
                el.text().collect::<String>()
            };
            let text = clean_text(&text);
            if !text.is_empty() {
                return Some(text);
            }
        }
    }
    None
}

// ---------------------------------------------------------------------------
// Link collection
// ---------------------------------------------------------------------------

/// Collect same-host links whose href matches one of `patterns`, resolved
/// against `base`, deduplicated in document order, capped at `max`.
pub fn collect_links(html: &str, base: &Url, patterns: &[&str], max: usize) -> Vec<Url> {
    let doc = Html::parse_document(html);
    let link_sel = Selector::parse("a[href]").expect("valid selector");

    let mut links: Vec<Url> = Vec::new();

    for el in doc.select(&link_sel) {
        let Some(href) = el.value().attr("href") else {
            continue;
        };

        // Skip anchors, javascript:, mailto:
        if href.starts_with('#') || href.starts_with("javascript:") || href.starts_with("mailto:")
        {
            continue;
        }

        if !patterns.iter().any(|p| href.contains(p)) {
            continue;
        }

        let Ok(mut resolved) = base.join(href) else {
            continue;
        };
        resolved.set_fragment(None);

        if resolved.host_str() != base.host_str() {
            continue;
        }

        // The index page itself is not an entry.
        if resolved.path().trim_end_matches('/') == base.path().trim_end_matches('/') {
            continue;
        }

        if !links.contains(&resolved) {
            links.push(resolved);
        }

        if links.len() >= max {
            break;
        }
    }

    links
}

// ---------------------------------------------------------------------------
// Text cleanup
// ---------------------------------------------------------------------------

/// Collapse whitespace runs and strip zero-width characters.
pub fn clean_text(text: &str) -> String {
    static WS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));
    static ZW_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"[\u{200b}-\u{200d}\u{feff}]").expect("valid regex"));

    let collapsed = WS_RE.replace_all(text.trim(), " ");
    ZW_RE.replace_all(&collapsed, "").into_owned()
}

/// Trim converted markdown and collapse runs of blank lines.
fn tidy_markdown(md: &str) -> String {
    static BLANKS_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"\n{3,}").expect("valid regex"));

    BLANKS_RE.replace_all(md.trim(), "\n\n").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_text_collapses_whitespace() {
        assert_eq!(clean_text("  hello \n\t world  "), "hello world");
        assert_eq!(clean_text("zero\u{200b}width"), "zerowidth");
    }

    #[test]
    fn parse_page_extracts_title_body_author() {
        let html = r#"<html>
            <head><title>Fallback</title><meta name="author" content="Ada Lovelace"></head>
            <body>
                <nav><a href="/">Home</a></nav>
                <article>
                    <h1>Understanding Heaps</h1>
                    <p>A heap is a tree-shaped structure.</p>
                    <pre><code>heapify(xs)</code></pre>
                </article>
            </body>
        </html>"#;

        let page = parse_page(html).expect("parse");
        assert_eq!(page.title.as_deref(), Some("Understanding Heaps"));
        assert_eq!(page.author.as_deref(), Some("Ada Lovelace"));
        assert!(page.markdown.contains("A heap is a tree-shaped structure."));
        assert!(page.markdown.contains("heapify(xs)"));
        assert!(!page.markdown.contains("Home"));
    }

    #[test]
    fn parse_page_falls_back_to_document_title() {
        let html = "<html><head><title>Plain Page</title></head><body><p>Text.</p></body></html>";
        let page = parse_page(html).expect("parse");
        assert_eq!(page.title.as_deref(), Some("Plain Page"));
        assert!(page.author.is_none());
    }

    #[test]
    fn collect_links_filters_by_pattern_and_host() {
        let html = r##"<html><body>
            <a href="/blog/post-1">One</a>
            <a href="/blog/post-2">Two</a>
            <a href="/blog/post-1">One again</a>
            <a href="https://other.example.net/blog/external">External</a>
            <a href="/about">About</a>
            <a href="#section">Anchor</a>
        </body></html>"##;

        let base = Url::parse("https://example.com/blog").unwrap();
        let links = collect_links(html, &base, &["/blog/"], 10);

        let as_strings: Vec<String> = links.iter().map(|u| u.to_string()).collect();
        assert_eq!(
            as_strings,
            vec![
                "https://example.com/blog/post-1".to_string(),
                "https://example.com/blog/post-2".to_string(),
            ]
        );
    }

    #[test]
    fn collect_links_respects_cap() {
        let html: String = (0..20)
            .map(|i| format!("<a href=\"/blog/post-{i}\">p{i}</a>"))
            .collect();
        let base = Url::parse("https://example.com/blog").unwrap();

        let links = collect_links(&html, &base, &["/blog/"], 5);
        assert_eq!(links.len(), 5);
    }

    #[test]
    fn collect_links_skips_the_index_itself() {
        let html = r#"<a href="/blog">Index</a><a href="/blog/">Index slash</a><a href="/blog/post">Post</a>"#;
        let base = Url::parse("https://example.com/blog").unwrap();

        let links = collect_links(html, &base, &["/blog"], 10);
        assert_eq!(links.len(), 1);
        assert!(links[0].path().ends_with("/post"));
    }
}
