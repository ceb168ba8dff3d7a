//! Shared types, error model, and configuration for KnowledgeHarvest.
//!
//! This crate is the foundation depended on by all other KnowledgeHarvest crates.
//! It provides:
//! - [`HarvestError`] — the unified batch-level error type
//! - [`FailureReason`] — structured per-source failure data
//! - Domain types ([`KnowledgeItem`], [`KnowledgeBase`], [`RunSummary`], [`RunId`])
//! - Configuration ([`AppConfig`], [`RunConfig`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, IngestConfig, RunConfig, config_dir, config_file_path, init_config,
    load_config, load_config_from,
};
pub use error::{FailureReason, HarvestError, Result};
pub use types::{ContentType, KnowledgeBase, KnowledgeItem, RunId, RunSummary};
