//! Core domain types for the research brief pipeline.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Maximum snippet length handed to the LLM, in characters.
pub const SNIPPET_MAX_CHARS: usize = 3000;

/// Maximum snippet length in the persisted source projection, in characters.
pub const STORED_SNIPPET_MAX_CHARS: usize = 500;

/// Maximum number of URLs accepted per request.
pub const MAX_URLS: usize = 10;

// ---------------------------------------------------------------------------
// SourceReference
// ---------------------------------------------------------------------------

/// One extracted source, produced exactly once per input URL.
///
/// Exactly one of a non-empty `snippet` or a populated `failure_reason`
/// carries meaning — never both.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceReference {
    /// The URL as given in the request.
    pub url: String,
    /// Page title; falls back to the URL itself when no title was found.
    pub title: String,
    /// First [`SNIPPET_MAX_CHARS`] characters of the cleaned text.
    pub snippet: String,
    /// The complete cleaned text.
    pub full_text: String,
    /// Why extraction failed, if it did.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure_reason: Option<String>,
}

impl SourceReference {
    /// Build a successful reference from cleaned text.
    pub fn success(url: impl Into<String>, title: impl Into<String>, full_text: String) -> Self {
        Self {
            url: url.into(),
            title: title.into(),
            snippet: truncate_chars(&full_text, SNIPPET_MAX_CHARS),
            full_text,
            failure_reason: None,
        }
    }

    /// Build a failed reference. The title mirrors the URL so callers always
    /// have something to display.
    pub fn failure(url: impl Into<String>, reason: impl Into<String>) -> Self {
        let url = url.into();
        Self {
            title: url.clone(),
            url,
            snippet: String::new(),
            full_text: String::new(),
            failure_reason: Some(reason.into()),
        }
    }

    /// Whether this source extracted successfully.
    pub fn is_success(&self) -> bool {
        self.failure_reason.is_none() && !self.snippet.is_empty()
    }
}

/// A failed source surfaced alongside the generated brief.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedSource {
    pub url: String,
    pub reason: String,
}

// ---------------------------------------------------------------------------
// Brief
// ---------------------------------------------------------------------------

/// The structured synthesis result parsed from the model's JSON output.
///
/// Field names serialize in camelCase because that is the exact schema the
/// prompt instructs the model to emit.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Brief {
    pub title: String,
    pub summary: String,
    pub key_points: Vec<KeyPoint>,
    #[serde(default)]
    pub conflicting_claims: Vec<ConflictingClaim>,
    #[serde(default)]
    pub to_verify: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// One cited key point.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyPoint {
    /// The key insight or finding.
    pub point: String,
    /// 0-based index into the successful-source list given to the generator.
    pub source_index: i64,
    /// Short quote or paraphrase from that source.
    #[serde(default)]
    pub snippet: String,
}

/// A conflict between two sources.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConflictingClaim {
    pub claim: String,
    /// 0-based index of the first source.
    pub source_a: i64,
    /// 0-based index of the second source.
    pub source_b: i64,
    #[serde(default)]
    pub details: String,
}

impl Brief {
    /// Collect every citation index that falls outside `[0, source_count)`.
    ///
    /// Out-of-range indices are passed through unchanged downstream; this
    /// exists so callers can log them.
    pub fn out_of_range_indices(&self, source_count: usize) -> Vec<i64> {
        let in_range = |i: i64| i >= 0 && (i as usize) < source_count;
        let mut out = Vec::new();
        for kp in &self.key_points {
            if !in_range(kp.source_index) {
                out.push(kp.source_index);
            }
        }
        for cc in &self.conflicting_claims {
            if !in_range(cc.source_a) {
                out.push(cc.source_a);
            }
            if !in_range(cc.source_b) {
                out.push(cc.source_b);
            }
        }
        out
    }
}

// ---------------------------------------------------------------------------
// Persisted shapes
// ---------------------------------------------------------------------------

/// The 500-character source projection persisted next to each brief.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredSource {
    pub url: String,
    pub title: String,
    pub snippet: String,
}

impl From<&SourceReference> for StoredSource {
    fn from(src: &SourceReference) -> Self {
        Self {
            url: src.url.clone(),
            title: src.title.clone(),
            snippet: truncate_chars(&src.snippet, STORED_SNIPPET_MAX_CHARS),
        }
    }
}

/// A fully hydrated brief record read back from the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BriefRecord {
    pub id: i64,
    pub title: String,
    pub urls: Vec<String>,
    pub brief: Brief,
    pub sources: Vec<StoredSource>,
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
}

/// A history row: everything but the brief body and sources.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BriefSummary {
    pub id: i64,
    pub title: String,
    pub urls: Vec<String>,
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
}

/// The orchestrator's terminal success shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BriefOutcome {
    pub id: i64,
    pub brief: Brief,
    pub sources: Vec<StoredSource>,
    pub failed_sources: Vec<FailedSource>,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Truncate to at most `max_chars` characters, never splitting a char.
pub fn truncate_chars(s: &str, max_chars: usize) -> String {
    s.chars().take(max_chars).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_reference_bounds_snippet() {
        let text = "x".repeat(SNIPPET_MAX_CHARS + 500);
        let src = SourceReference::success("https://example.com/a", "A", text.clone());
        assert!(src.is_success());
        assert_eq!(src.snippet.chars().count(), SNIPPET_MAX_CHARS);
        assert_eq!(src.full_text, text);
        assert!(src.failure_reason.is_none());
    }

    #[test]
    fn failure_reference_is_exclusive() {
        let src = SourceReference::failure("https://example.com/a", "connect timeout");
        assert!(!src.is_success());
        assert!(src.snippet.is_empty());
        assert_eq!(src.title, src.url);
        assert_eq!(src.failure_reason.as_deref(), Some("connect timeout"));
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        // Multi-byte chars must not be split mid-sequence.
        let s = "é".repeat(10);
        let t = truncate_chars(&s, 4);
        assert_eq!(t, "éééé");
    }

    #[test]
    fn brief_wire_format_is_camel_case() {
        let brief = Brief {
            title: "T".into(),
            summary: "S".into(),
            key_points: vec![KeyPoint {
                point: "p1".into(),
                source_index: 0,
                snippet: "q".into(),
            }],
            conflicting_claims: vec![ConflictingClaim {
                claim: "c".into(),
                source_a: 0,
                source_b: 1,
                details: "d".into(),
            }],
            to_verify: vec!["v".into()],
            tags: vec!["t".into()],
        };
        let json = serde_json::to_string(&brief).unwrap();
        assert!(json.contains(r#""keyPoints""#));
        assert!(json.contains(r#""sourceIndex""#));
        assert!(json.contains(r#""sourceA""#));
        assert!(json.contains(r#""toVerify""#));

        let parsed: Brief = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.key_points.len(), 1);
        assert_eq!(parsed.conflicting_claims[0].source_b, 1);
    }

    #[test]
    fn brief_parses_with_missing_optional_arrays() {
        let json = r#"{"title":"T","summary":"S","keyPoints":[]}"#;
        let parsed: Brief = serde_json::from_str(json).unwrap();
        assert!(parsed.conflicting_claims.is_empty());
        assert!(parsed.to_verify.is_empty());
        assert!(parsed.tags.is_empty());
    }

    #[test]
    fn out_of_range_indices_reported() {
        let brief = Brief {
            title: "T".into(),
            summary: "S".into(),
            key_points: vec![
                KeyPoint {
                    point: "ok".into(),
                    source_index: 1,
                    snippet: String::new(),
                },
                KeyPoint {
                    point: "bad".into(),
                    source_index: 5,
                    snippet: String::new(),
                },
            ],
            conflicting_claims: vec![ConflictingClaim {
                claim: "c".into(),
                source_a: -1,
                source_b: 0,
                details: String::new(),
            }],
            to_verify: vec![],
            tags: vec![],
        };
        assert_eq!(brief.out_of_range_indices(2), vec![5, -1]);
        assert!(brief.out_of_range_indices(6).contains(&-1));
    }

    #[test]
    fn stored_source_projection_bounds_snippet() {
        let src = SourceReference::success(
            "https://example.com/a",
            "A",
            "y".repeat(SNIPPET_MAX_CHARS),
        );
        let stored = StoredSource::from(&src);
        assert_eq!(stored.snippet.chars().count(), STORED_SNIPPET_MAX_CHARS);
        assert_eq!(stored.url, src.url);
    }
}
