//! Source descriptors and classification rules.
//!
//! A batch submission is turned into an ordered list of immutable
//! [`SourceDescriptor`]s before any I/O happens. Classification of remote
//! addresses into a [`SourceKind`] is driven by an ordered rule table
//! evaluated top-to-bottom, first match wins.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use url::Url;

// ---------------------------------------------------------------------------
// Identity and kind
// ---------------------------------------------------------------------------

/// Run-scoped source identifier, sequential in input order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct SourceId(pub usize);

impl std::fmt::Display for SourceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Where a source came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SourceOrigin {
    RemoteAddress,
    UploadedDocument,
}

/// Inferred extraction category for a source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SourceKind {
    /// A page listing blog posts to fetch individually.
    BlogIndex,
    /// A topic/company listing page linking to guide pages.
    TopicIndex,
    /// A learning/guide listing page.
    GuideIndex,
    /// An arbitrary single web page.
    GenericSite,
    /// An uploaded or remote document (PDF and friends).
    Document,
    /// Could not be classified (e.g. not a parseable URL).
    Unknown,
}

impl std::fmt::Display for SourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::BlogIndex => "blog-index",
            Self::TopicIndex => "topic-index",
            Self::GuideIndex => "guide-index",
            Self::GenericSite => "generic-site",
            Self::Document => "document",
            Self::Unknown => "unknown",
        };
        write!(f, "{s}")
    }
}

// ---------------------------------------------------------------------------
// Inputs
// ---------------------------------------------------------------------------

/// A document uploaded alongside the URL list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedDocument {
    /// Original filename, used as the source locator.
    pub filename: String,
    /// Raw file content.
    pub bytes: Vec<u8>,
}

impl UploadedDocument {
    pub fn new(filename: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            filename: filename.into(),
            bytes: bytes.into(),
        }
    }
}

/// One entry of a batch submission: a remote address or an uploaded document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceInput {
    Remote(String),
    Upload(UploadedDocument),
}

// ---------------------------------------------------------------------------
// Descriptor
// ---------------------------------------------------------------------------

/// Normalized, immutable representation of one input source.
///
/// Identity is `id`; construction performs no network or file access.
#[derive(Debug, Clone)]
pub struct SourceDescriptor {
    /// Run-scoped sequential identifier.
    pub id: SourceId,
    /// Inferred extraction category.
    pub kind: SourceKind,
    /// The raw input this descriptor was built from.
    pub input: SourceInput,
}

impl SourceDescriptor {
    /// Where this source came from.
    pub fn origin(&self) -> SourceOrigin {
        match self.input {
            SourceInput::Remote(_) => SourceOrigin::RemoteAddress,
            SourceInput::Upload(_) => SourceOrigin::UploadedDocument,
        }
    }

    /// The source locator: the URL for remote sources, the filename for uploads.
    pub fn locator(&self) -> &str {
        match &self.input {
            SourceInput::Remote(url) => url,
            SourceInput::Upload(doc) => &doc.filename,
        }
    }

    /// Uploaded file content, if this descriptor wraps an upload.
    pub fn payload(&self) -> Option<&[u8]> {
        match &self.input {
            SourceInput::Upload(doc) => Some(&doc.bytes),
            SourceInput::Remote(_) => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Classification
// ---------------------------------------------------------------------------

/// One entry of the ordered classification table.
#[derive(Debug, Clone)]
pub struct ClassificationRule {
    /// Pattern matched against the full remote address.
    pub pattern: Regex,
    /// Kind assigned on match.
    pub kind: SourceKind,
}

impl ClassificationRule {
    pub fn new(pattern: Regex, kind: SourceKind) -> Self {
        Self { pattern, kind }
    }
}

/// Ordered, first-match-wins classifier for remote addresses.
#[derive(Debug, Clone)]
pub struct Classifier {
    rules: Vec<ClassificationRule>,
}

static DEFAULT_RULES: LazyLock<Vec<(&str, SourceKind)>> = LazyLock::new(|| {
    vec![
        // File type beats path patterns.
        (r"(?i)\.pdf(\?.*)?$", SourceKind::Document),
        (r"(?i)/topics([#/]|$)", SourceKind::TopicIndex),
        (r"(?i)/(learn|guides)([#/]|$)", SourceKind::GuideIndex),
        (r"(?i)/blog([#/]|$)", SourceKind::BlogIndex),
        (r"(?i)//[^/]*substack\.com", SourceKind::BlogIndex),
    ]
});

impl Classifier {
    /// Build a classifier from an explicit rule table.
    pub fn new(rules: Vec<ClassificationRule>) -> Self {
        Self { rules }
    }

    /// Classifier with the built-in rule table.
    pub fn with_default_rules() -> Self {
        let rules = DEFAULT_RULES
            .iter()
            .map(|(pattern, kind)| {
                ClassificationRule::new(
                    Regex::new(pattern).expect("built-in rule pattern is valid"),
                    *kind,
                )
            })
            .collect();
        Self::new(rules)
    }

    /// Classify a remote address. Unmatched addresses get [`SourceKind::GenericSite`];
    /// addresses that do not parse as URLs get [`SourceKind::Unknown`].
    pub fn classify(&self, address: &str) -> SourceKind {
        if Url::parse(address).is_err() {
            return SourceKind::Unknown;
        }

        for rule in &self.rules {
            if rule.pattern.is_match(address) {
                return rule.kind;
            }
        }

        SourceKind::GenericSite
    }
}

impl Default for Classifier {
    fn default() -> Self {
        Self::with_default_rules()
    }
}

/// Build descriptors for a batch, assigning sequential ids in input order.
///
/// Purely descriptor construction: no network or file access, cannot fail.
pub fn build_descriptors(
    inputs: Vec<SourceInput>,
    classifier: &Classifier,
) -> Vec<SourceDescriptor> {
    inputs
        .into_iter()
        .enumerate()
        .map(|(i, input)| {
            let kind = match &input {
                SourceInput::Remote(address) => classifier.classify(address),
                SourceInput::Upload(_) => SourceKind::Document,
            };
            SourceDescriptor {
                id: SourceId(i),
                kind,
                input,
            }
        })
        .collect()
}
