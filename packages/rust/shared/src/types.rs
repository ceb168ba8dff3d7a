//! Core domain types for KnowledgeHarvest runs.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// RunId
// ---------------------------------------------------------------------------

/// A UUID v7 wrapper for ingestion run identifiers (time-sortable).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunId(pub Uuid);

impl RunId {
    /// Generate a new time-sortable run identifier.
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for RunId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

// ---------------------------------------------------------------------------
// ContentType
// ---------------------------------------------------------------------------

/// Canonical content category of a knowledge item.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    Blog,
    Book,
    Document,
    Guide,
    Other,
}

impl std::fmt::Display for ContentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Blog => "blog",
            Self::Book => "book",
            Self::Document => "document",
            Self::Guide => "guide",
            Self::Other => "other",
        };
        write!(f, "{s}")
    }
}

// ---------------------------------------------------------------------------
// KnowledgeItem
// ---------------------------------------------------------------------------

/// A single normalized entry in the knowledge base.
///
/// Wire field names (`team_id`, `source_url`, `content_type`) are the
/// downstream indexer's schema; immutable once placed into a result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnowledgeItem {
    /// Item title, non-empty after trimming.
    pub title: String,
    /// Markdown (or plain-text) body, non-empty.
    pub content: String,
    /// Canonical content category.
    pub content_type: ContentType,
    /// Where this content came from (URL or uploaded filename).
    pub source_url: String,
    /// Item author; `"Unknown"` when the source did not carry one.
    pub author: String,
    /// Owning tenant.
    pub team_id: String,
    /// Stable hash over `(source_url, title)`, used for in-run dedup.
    pub fingerprint: String,
}

impl KnowledgeItem {
    /// Compute the dedup fingerprint for a `(source_url, title)` pair.
    ///
    /// Stable across runs: SHA-256 over the locator and the trimmed title.
    pub fn fingerprint_of(source_url: &str, title: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(source_url.as_bytes());
        hasher.update(b"\n");
        hasher.update(title.trim().as_bytes());
        format!("{:x}", hasher.finalize())
    }
}

// ---------------------------------------------------------------------------
// RunSummary / KnowledgeBase
// ---------------------------------------------------------------------------

/// Aggregated statistics for one completed (or aborted) run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    /// Number of knowledge items that survived normalization and dedup.
    pub total_items: usize,
    /// Item count per content type present in the result.
    pub content_types: BTreeMap<ContentType, usize>,
    /// Number of sources whose extraction succeeded.
    pub sources_processed: usize,
    /// Wall-clock duration of the run, serialized as e.g. `"12.34s"`.
    #[serde(with = "duration_string")]
    pub processing_time: Duration,
}

/// The tenant-scoped result document: `{team_id, items[], summary}`.
///
/// Assembled once at the end of a run; owned by the caller thereafter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeBase {
    /// Owning tenant.
    pub team_id: String,
    /// Flattened items, grouped by source completion order.
    pub items: Vec<KnowledgeItem>,
    /// Run statistics.
    pub summary: RunSummary,
}

/// Serde adapter: `Duration` as a `"12.34s"` string on the wire.
pub mod duration_string {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer, de::Error};

    pub fn serialize<S: Serializer>(d: &Duration, ser: S) -> Result<S::Ok, S::Error> {
        ser.serialize_str(&format!("{:.2}s", d.as_secs_f64()))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(de: D) -> Result<Duration, D::Error> {
        let s = String::deserialize(de)?;
        let secs: f64 = s
            .trim_end_matches('s')
            .parse()
            .map_err(|e| D::Error::custom(format!("invalid duration {s:?}: {e}")))?;
        Ok(Duration::from_secs_f64(secs))
    }
}
