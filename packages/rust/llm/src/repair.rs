//! Tolerant extraction and strict parsing of model output.
//!
//! Providers wrap JSON in prose, Markdown fencing, or stray control bytes.
//! Parsing is two-stage: first a tolerant pass that cleans the text and
//! locates the first balanced `{...}` span with a bracket-depth scanner,
//! then a strict `serde_json` pass against the brief schema that names the
//! failing field.

use researchbrief_shared::Brief;

use crate::provider::{ProviderError, ProviderErrorKind};

/// Strip Markdown code fences and raw control characters.
///
/// Embedded newline/carriage-return/tab become a single space; other control
/// bytes are dropped.
pub fn clean_response(raw: &str) -> String {
    let defenced = raw.replace("```json", "").replace("```", "");

    let mut cleaned = String::with_capacity(defenced.len());
    for ch in defenced.chars() {
        match ch {
            '\n' | '\r' | '\t' => cleaned.push(' '),
            c if c.is_control() => {}
            c => cleaned.push(c),
        }
    }
    cleaned.trim().to_string()
}

/// Find the first balanced `{...}` span.
///
/// Depth tracking skips over JSON string literals (including escapes) so
/// braces inside strings never unbalance the scan.
pub fn extract_json_span(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, ch) in text[start..].char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_string = false;
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..start + i + 1]);
                }
            }
            _ => {}
        }
    }
    None
}

/// Clean, locate, and strictly parse a brief from raw model output.
pub fn parse_brief(raw: &str) -> Result<Brief, ProviderError> {
    let cleaned = clean_response(raw);

    let span = extract_json_span(&cleaned).ok_or_else(|| ProviderError {
        kind: ProviderErrorKind::Malformed,
        message: "model response contained no JSON object".into(),
    })?;

    serde_json::from_str(span).map_err(|e| ProviderError {
        kind: ProviderErrorKind::Malformed,
        message: format!("brief JSON did not match the schema: {e}"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID_BRIEF: &str = r#"{
        "title": "T",
        "summary": "S",
        "keyPoints": [{"point": "p", "sourceIndex": 0, "snippet": "q"}],
        "conflictingClaims": [],
        "toVerify": ["v1", "v2", "v3"],
        "tags": ["a", "b"]
    }"#;

    #[test]
    fn clean_strips_fences_and_control_bytes() {
        let raw = "```json\n{\"a\":\t1}\u{1}\n```";
        let cleaned = clean_response(raw);
        assert_eq!(cleaned, "{\"a\": 1}");
    }

    #[test]
    fn span_ignores_braces_inside_strings() {
        let text = r#"prefix {"a": "close me } not", "b": {"c": 1}} suffix"#;
        let span = extract_json_span(text).unwrap();
        assert_eq!(span, r#"{"a": "close me } not", "b": {"c": 1}}"#);
    }

    #[test]
    fn span_handles_escaped_quotes() {
        let text = r#"{"a": "quote \" then } brace"}"#;
        assert_eq!(extract_json_span(text), Some(text));
    }

    #[test]
    fn span_is_greedy_from_first_brace() {
        let text = r#"{"first": 1} {"second": 2}"#;
        assert_eq!(extract_json_span(text), Some(r#"{"first": 1}"#));
    }

    #[test]
    fn unbalanced_text_has_no_span() {
        assert_eq!(extract_json_span(r#"{"a": 1"#), None);
        assert_eq!(extract_json_span("no braces here"), None);
    }

    #[test]
    fn parses_fenced_brief() {
        let raw = format!("Here is your brief:\n```json\n{VALID_BRIEF}\n```\nHope it helps!");
        let brief = parse_brief(&raw).unwrap();
        assert_eq!(brief.title, "T");
        assert_eq!(brief.key_points.len(), 1);
        assert_eq!(brief.to_verify.len(), 3);
    }

    #[test]
    fn parses_bare_brief_with_embedded_newlines() {
        let brief = parse_brief(VALID_BRIEF).unwrap();
        assert_eq!(brief.key_points[0].source_index, 0);
    }

    #[test]
    fn prose_without_json_is_malformed() {
        let err = parse_brief("I cannot produce a brief for these sources.").unwrap_err();
        assert_eq!(err.kind, ProviderErrorKind::Malformed);
        assert!(err.message.contains("no JSON object"));
    }

    #[test]
    fn schema_mismatch_names_the_field() {
        let err = parse_brief(r#"{"summary": "only a summary"}"#).unwrap_err();
        assert_eq!(err.kind, ProviderErrorKind::Malformed);
        assert!(err.message.contains("title"));
    }
}
