//! Document extractor: uploaded or remote text documents, split by chapter.

use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use url::Url;

use knowledgeharvest_shared::{ContentType, FailureReason};

use crate::content::{FetchClient, clean_text};
use crate::extractor::{ExtractResult, Extractor, RawRecord};
use crate::source::SourceDescriptor;

/// Chapters beyond this are folded into the last one.
const MAX_CHAPTERS: usize = 8;

static CHAPTER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^\s*chapter\s+\d+").expect("valid regex"));

/// Extracts records from text documents, one per chapter when the document
/// is chaptered, otherwise a single record for the whole document.
///
/// Binary format decoding (PDF, EPUB, ...) is an upstream concern: this
/// extractor expects UTF-8 text and reports a parse failure otherwise.
pub struct DocumentExtractor {
    client: FetchClient,
}

impl DocumentExtractor {
    pub fn new(client: FetchClient) -> Self {
        Self { client }
    }

    async fn load_text(
        &self,
        source: &SourceDescriptor,
    ) -> std::result::Result<String, FailureReason> {
        let bytes = match source.payload() {
            Some(bytes) => bytes.to_vec(),
            None => {
                let url = Url::parse(source.locator())
                    .map_err(|e| FailureReason::Parse(format!("{}: {e}", source.locator())))?;
                self.client.fetch_bytes(&url).await?
            }
        };

        String::from_utf8(bytes).map_err(|_| {
            FailureReason::Parse(format!("{}: document is not UTF-8 text", source.locator()))
        })
    }
}

#[async_trait]
impl Extractor for DocumentExtractor {
    async fn extract(
        &self,
        source: &SourceDescriptor,
        _cancel: &CancellationToken,
    ) -> ExtractResult {
        let text = self.load_text(source).await?;

        if text.trim().is_empty() {
            return Err(FailureReason::Parse(format!(
                "{}: document is empty",
                source.locator()
            )));
        }

        let locator = source.locator();
        let chapters = split_chapters(&text);

        debug!(source = %source.id, chapters = chapters.len(), "document split");

        if chapters.is_empty() {
            // Un-chaptered document: a single record titled by filename.
            return Ok(vec![RawRecord::new(
                document_title(locator),
                text.trim().to_string(),
                locator.to_string(),
            )]);
        }

        let records = chapters
            .into_iter()
            .map(|(title, body)| {
                let mut record = RawRecord::new(title, body, locator.to_string());
                record.content_type = Some(ContentType::Book);
                record
            })
            .collect();

        Ok(records)
    }

    fn name(&self) -> &str {
        "document"
    }
}

/// Split document text on `Chapter N` heading lines, capped at
/// [`MAX_CHAPTERS`]. Text before the first heading belongs to the first
/// chapter. Returns an empty vec when the document has no chapter headings.
fn split_chapters(text: &str) -> Vec<(String, String)> {
    let mut chapters: Vec<(String, Vec<&str>)> = Vec::new();
    let mut preamble: Vec<&str> = Vec::new();

    for line in text.lines() {
        if CHAPTER_RE.is_match(line) && chapters.len() < MAX_CHAPTERS {
            chapters.push((clean_text(line), vec![line]));
        } else if let Some((_, body)) = chapters.last_mut() {
            body.push(line);
        } else {
            preamble.push(line);
        }
    }

    if chapters.is_empty() {
        return Vec::new();
    }

    if !preamble.is_empty() {
        let (_, first_body) = &mut chapters[0];
        preamble.append(first_body);
        *first_body = preamble;
    }

    chapters
        .into_iter()
        .map(|(title, body)| (title, body.join("\n").trim().to_string()))
        .collect()
}

/// Derive a display title from a filename or URL: last path segment,
/// extension stripped.
fn document_title(locator: &str) -> String {
    let name = locator
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(locator)
        .split('?')
        .next()
        .unwrap_or(locator);

    let stem = name.rsplit_once('.').map(|(s, _)| s).unwrap_or(name);
    if stem.is_empty() {
        locator.to_string()
    } else {
        stem.to_string()
    }
}
