//! Listing extractor: index page → entry links → one record per page.
//!
//! Covers blog indexes, topic/company listings, and guide listings; the three
//! differ only in which entry links they follow.

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use url::Url;

use knowledgeharvest_shared::FailureReason;

use crate::content::{FetchClient, collect_links, parse_page};
use crate::extractor::{ExtractResult, Extractor, RawRecord};
use crate::source::SourceDescriptor;

/// Extracts every linked entry from an index-style page.
pub struct ListingExtractor {
    client: FetchClient,
    name: &'static str,
    link_patterns: &'static [&'static str],
    max_pages: usize,
}

impl ListingExtractor {
    /// Blog index: follows `/blog/` post links (and Substack `/p/` posts).
    pub fn blog(client: FetchClient, max_pages: usize) -> Self {
        Self {
            client,
            name: "blog",
            link_patterns: &["/blog/", "/p/"],
            max_pages,
        }
    }

    /// Topic listing: follows company-guide links.
    pub fn topics(client: FetchClient, max_pages: usize) -> Self {
        Self {
            client,
            name: "topic-listing",
            link_patterns: &["/companies/"],
            max_pages,
        }
    }

    /// Guide listing: follows guide and learn links.
    pub fn guides(client: FetchClient, max_pages: usize) -> Self {
        Self {
            client,
            name: "guide-listing",
            link_patterns: &["/guides/", "/learn/"],
            max_pages,
        }
    }
}

#[async_trait]
impl Extractor for ListingExtractor {
    async fn extract(
        &self,
        source: &SourceDescriptor,
        cancel: &CancellationToken,
    ) -> ExtractResult {
        let base = Url::parse(source.locator())
            .map_err(|e| FailureReason::Parse(format!("{}: {e}", source.locator())))?;

        let index_html = self.client.fetch_text(&base).await?;
        let links = collect_links(&index_html, &base, self.link_patterns, self.max_pages);

        debug!(
            source = %source.id,
            strategy = self.name,
            entries = links.len(),
            "collected listing entries"
        );

        let mut records = Vec::with_capacity(links.len());

        for link in links {
            if cancel.is_cancelled() {
                return Err(FailureReason::Cancelled);
            }

            let html = match self.client.fetch_text(&link).await {
                Ok(html) => html,
                Err(e) => {
                    // One unreachable entry never fails the listing.
                    warn!(url = %link, error = %e, "failed to fetch entry, skipping");
                    continue;
                }
            };

            match parse_page(&html) {
                Ok(page) => {
                    let mut record = RawRecord::new(
                        page.title.unwrap_or_else(|| "Untitled".into()),
                        page.markdown,
                        link.to_string(),
                    );
                    record.author = page.author;
                    records.push(record);
                }
                Err(e) => {
                    warn!(url = %link, error = %e, "failed to parse entry, skipping");
                }
            }
        }

        Ok(records)
    }

    fn name(&self) -> &str {
        self.name
    }
}
