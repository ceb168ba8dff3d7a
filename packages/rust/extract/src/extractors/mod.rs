//! Built-in extraction strategies.
//!
//! Reference implementations of the [`Extractor`](crate::Extractor) contract:
//! listing pages (blog/topic/guide indexes), text documents, and a generic
//! single-page fallback.

mod document;
mod generic;
mod listing;

pub use document::DocumentExtractor;
pub use generic::GenericExtractor;
pub use listing::ListingExtractor;
