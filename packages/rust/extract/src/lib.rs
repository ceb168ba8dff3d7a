//! Source classification, the extractor contract, and built-in extractors.
//!
//! This crate provides:
//! - [`source`] — Source descriptors and the ordered classification-rule table
//! - [`Extractor`] / [`ExtractorRegistry`] — the pluggable extraction contract
//! - [`extractors`] — Built-in strategies (listing pages, documents, generic)
//! - [`content`] — Shared HTTP fetching and HTML helpers

pub mod content;
pub mod extractor;
pub mod extractors;
pub mod source;

pub use content::{FetchClient, PageContent, clean_text, collect_links, parse_page};
pub use extractor::{ExtractResult, Extractor, ExtractorRegistry, RawRecord};
pub use extractors::{DocumentExtractor, GenericExtractor, ListingExtractor};
pub use source::{
    ClassificationRule, Classifier, SourceDescriptor, SourceId, SourceInput, SourceKind,
    SourceOrigin, UploadedDocument, build_descriptors,
};
