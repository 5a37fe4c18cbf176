//! Prompt construction for brief generation.
//!
//! Pure and deterministic: the same sources always render the same prompt.
//! Display indices are 1-based; the model is told to cite with 0-based
//! indices into the same list.

use researchbrief_shared::SourceReference;

/// Render successful sources into the single synthesis instruction.
pub fn build_brief_prompt(sources: &[SourceReference]) -> String {
    let formatted_sources = sources
        .iter()
        .enumerate()
        .map(|(i, s)| {
            format!(
                "--- SOURCE {}: {}\nURL: {}\n\n{}\n---",
                i + 1,
                s.title,
                s.url,
                s.snippet
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n");

    format!(
        r#"You are a research analyst. Analyze these {count} sources and produce a structured research brief.

{formatted_sources}

Respond ONLY with a valid JSON object in this exact structure (no markdown, no extra text):
{{
  "title": "A descriptive title for this research brief",
  "summary": "2-3 paragraph overall summary of all sources combined",
  "keyPoints": [
    {{
      "point": "The key insight or finding",
      "sourceIndex": 0,
      "snippet": "A short direct quote or paraphrase from that source (max 100 chars)"
    }}
  ],
  "conflictingClaims": [
    {{
      "claim": "Description of the conflict",
      "sourceA": 0,
      "sourceB": 1,
      "details": "What source A says vs what source B says"
    }}
  ],
  "toVerify": [
    "Claim or fact that should be independently verified",
    "Another item to verify"
  ],
  "tags": ["topic1", "topic2", "topic3"]
}}

Rules:
- keyPoints should have 5-10 items
- toVerify should have 3-5 items
- conflictingClaims can be empty array [] if none exist
- sourceIndex is 0-based index into the provided sources
- Keep all text concise and professional
- tags should be 3-5 short topic keywords"#,
        count = sources.len(),
    )
}
