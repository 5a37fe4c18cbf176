//! LLM provider client, prompt construction, and brief generation.
//!
//! This crate provides:
//! - [`LlmClient`] — chat-completions client with typed failures
//! - [`prompt`] — deterministic prompt rendering
//! - [`repair`] — tolerant extraction + strict parsing of model output
//! - [`BriefGenerator`] — the bounded retry loop producing a [`Brief`]
//!
//! [`Brief`]: researchbrief_shared::Brief

pub mod generator;
pub mod prompt;
pub mod provider;
pub mod repair;

pub use generator::BriefGenerator;
pub use prompt::build_brief_prompt;
pub use provider::{LlmClient, ProviderError, ProviderErrorKind};
pub use repair::parse_brief;
