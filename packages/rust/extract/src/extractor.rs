//! Extractor capability contract and registry.
//!
//! Extractors are the single extension point for supporting a new kind of
//! source: implement [`Extractor`], register it for a [`SourceKind`], and the
//! orchestrator picks it up without modification. The registry always
//! resolves — a generic fallback handles unregistered kinds.

use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use knowledgeharvest_shared::{ContentType, FailureReason, Result, RunConfig};

use crate::content::FetchClient;
use crate::extractors::{DocumentExtractor, GenericExtractor, ListingExtractor};
use crate::source::{SourceDescriptor, SourceKind};

// ---------------------------------------------------------------------------
// Raw records
// ---------------------------------------------------------------------------

/// Extractor output before normalization. Owned by the extractor that
/// produced it until handed to the normalizer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRecord {
    /// Extracted title, possibly empty (normalization drops empty titles).
    pub title: String,
    /// Extracted body text/markdown.
    pub body: String,
    /// Where this content came from (page URL, or filename for uploads).
    pub locator: String,
    /// Author, when the source carried one.
    pub author: Option<String>,
    /// Content-type override. `None` means "derive from the source kind";
    /// only extractors that know better (e.g. chaptered documents) set it.
    pub content_type: Option<ContentType>,
}

impl RawRecord {
    pub fn new(
        title: impl Into<String>,
        body: impl Into<String>,
        locator: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
            locator: locator.into(),
            author: None,
            content_type: None,
        }
    }
}

/// What an extractor returns: records on success, a structured reason on
/// failure. Failures are per-source data and never abort the batch.
pub type ExtractResult = std::result::Result<Vec<RawRecord>, FailureReason>;

// ---------------------------------------------------------------------------
// Trait
// ---------------------------------------------------------------------------

/// Capability contract for source extraction strategies.
///
/// Implementations may perform network or file I/O and must poll `cancel`
/// between requests so a cancelled run winds down promptly. The descriptor
/// is never mutated. Any internal failure must come back as a
/// [`FailureReason`] — the orchestrator treats every call as total.
#[async_trait]
pub trait Extractor: Send + Sync {
    /// Extract zero or more raw content records from the source.
    async fn extract(
        &self,
        source: &SourceDescriptor,
        cancel: &CancellationToken,
    ) -> ExtractResult;

    /// Human-readable strategy name for tracing.
    fn name(&self) -> &str;
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// Ordered mapping from [`SourceKind`] to extraction strategy.
///
/// Resolution never fails: kinds without a registered strategy (including
/// `GenericSite` and `Unknown`) route to the fallback extractor, so every
/// descriptor is runnable.
pub struct ExtractorRegistry {
    entries: Vec<(SourceKind, Arc<dyn Extractor>)>,
    fallback: Arc<dyn Extractor>,
}

impl std::fmt::Debug for ExtractorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExtractorRegistry")
            .field(
                "entries",
                &self
                    .entries
                    .iter()
                    .map(|(kind, extractor)| (kind, extractor.name()))
                    .collect::<Vec<_>>(),
            )
            .field("fallback", &self.fallback.name())
            .finish()
    }
}

impl ExtractorRegistry {
    /// Create an empty registry with the given fallback strategy.
    pub fn new(fallback: Arc<dyn Extractor>) -> Self {
        Self {
            entries: Vec::new(),
            fallback,
        }
    }

    /// Registry with all built-in extractors wired to one shared HTTP client.
    pub fn with_builtins(config: &RunConfig) -> Result<Self> {
        let client = FetchClient::new(config.rate_limit_ms)?;

        let mut registry = Self::new(Arc::new(GenericExtractor::new(client.clone())));
        registry.register(
            SourceKind::BlogIndex,
            Arc::new(ListingExtractor::blog(client.clone(), config.max_pages)),
        );
        registry.register(
            SourceKind::TopicIndex,
            Arc::new(ListingExtractor::topics(client.clone(), config.max_pages)),
        );
        registry.register(
            SourceKind::GuideIndex,
            Arc::new(ListingExtractor::guides(client.clone(), config.max_pages)),
        );
        registry.register(
            SourceKind::Document,
            Arc::new(DocumentExtractor::new(client)),
        );

        Ok(registry)
    }

    /// Register a strategy for a kind. Entries are consulted in registration
    /// order, first match wins.
    pub fn register(&mut self, kind: SourceKind, extractor: Arc<dyn Extractor>) {
        self.entries.push((kind, extractor));
    }

    /// Resolve the strategy responsible for a descriptor. Always succeeds.
    pub fn resolve(&self, source: &SourceDescriptor) -> Arc<dyn Extractor> {
        for (kind, extractor) in &self.entries {
            if *kind == source.kind {
                return Arc::clone(extractor);
            }
        }
        Arc::clone(&self.fallback)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{SourceId, SourceInput};

    fn descriptor(kind: SourceKind) -> SourceDescriptor {
        SourceDescriptor {
            id: SourceId(0),
            kind,
            input: SourceInput::Remote("https://example.com/".into()),
        }
    }

    #[test]
    fn builtin_registry_routes_by_kind() {
        let registry = ExtractorRegistry::with_builtins(&RunConfig::default()).unwrap();

        assert_eq!(registry.resolve(&descriptor(SourceKind::BlogIndex)).name(), "blog");
        assert_eq!(
            registry.resolve(&descriptor(SourceKind::TopicIndex)).name(),
            "topic-listing"
        );
        assert_eq!(
            registry.resolve(&descriptor(SourceKind::GuideIndex)).name(),
            "guide-listing"
        );
        assert_eq!(
            registry.resolve(&descriptor(SourceKind::Document)).name(),
            "document"
        );
    }

    #[test]
    fn unregistered_kinds_fall_back_to_generic() {
        let registry = ExtractorRegistry::with_builtins(&RunConfig::default()).unwrap();

        assert_eq!(
            registry.resolve(&descriptor(SourceKind::GenericSite)).name(),
            "generic"
        );
        assert_eq!(registry.resolve(&descriptor(SourceKind::Unknown)).name(), "generic");
    }

    #[test]
    fn registration_order_wins() {
        let config = RunConfig::default();
        let client = FetchClient::new(0).unwrap();
        let mut registry = ExtractorRegistry::with_builtins(&config).unwrap();

        // A second registration for the same kind never shadows the first.
        registry.register(
            SourceKind::BlogIndex,
            Arc::new(GenericExtractor::new(client)),
        );
        assert_eq!(registry.resolve(&descriptor(SourceKind::BlogIndex)).name(), "blog");
    }
}
