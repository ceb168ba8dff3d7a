//! Core ingestion pipeline for KnowledgeHarvest.
//!
//! This crate ties classification, extraction, normalization, and
//! aggregation into the end-to-end run workflow:
//!
//! - [`run`] — the run orchestrator ([`Run`], [`RunRequest`], [`RunOutcome`])
//! - [`normalize`] — raw-record normalization into [`KnowledgeItem`]s
//! - [`aggregate`] — final result assembly
//! - [`events`] — progress state and the progress/log event stream
//!
//! [`KnowledgeItem`]: knowledgeharvest_shared::KnowledgeItem

pub mod aggregate;
pub mod events;
pub mod normalize;
pub mod run;

pub use aggregate::aggregate;
pub use events::{EventLevel, EventStream, ProgressEvent, RunProgress};
pub use normalize::{UNKNOWN_AUTHOR, content_type_for, normalize};
pub use run::{
    ExtractionOutcome, OutcomeStatus, Run, RunOutcome, RunRequest, RunState, SourceReport,
};
