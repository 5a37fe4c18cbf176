//! Page fetching, boilerplate filtering, and concurrent multi-source extraction.
//!
//! This crate provides:
//! - [`noise`] — rules classifying markup nodes as boilerplate
//! - [`ContentExtractor`] — fetches one URL and reduces it to a title + cleaned snippet
//! - [`ContentExtractor::extract_all`] — order-preserving concurrent fan-out over a URL batch

pub mod content;
pub mod noise;

pub use content::ContentExtractor;
pub use noise::{is_noise_element, strip_noise};
