//! Shared types, error model, and configuration for researchbrief.
//!
//! This crate is the foundation depended on by all other researchbrief crates.
//! It provides:
//! - [`BriefError`] — the unified error type
//! - Domain types ([`SourceReference`], [`Brief`], [`BriefRecord`], [`BriefOutcome`])
//! - Configuration ([`AppConfig`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, DefaultsConfig, GroqConfig, config_dir, config_file_path, expand_home,
    init_config, load_config, load_config_from, resolve_api_key,
};
pub use error::{BriefError, Result};
pub use types::{
    Brief, BriefOutcome, BriefRecord, BriefSummary, ConflictingClaim, FailedSource, KeyPoint,
    MAX_URLS, SNIPPET_MAX_CHARS, STORED_SNIPPET_MAX_CHARS, SourceReference, StoredSource,
    truncate_chars,
};
