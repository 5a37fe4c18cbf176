//! Core orchestration for ResearchBrief.
//!
//! Ties extraction, generation, and storage into the end-to-end brief
//! pipeline, plus a health probe over the external dependencies.

pub mod orchestrator;
pub mod status;

pub use orchestrator::Orchestrator;
pub use status::{check, ComponentStatus, StatusReport};
