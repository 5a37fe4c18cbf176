//! End-to-end brief pipeline: URLs → extract → generate → persist.

use std::time::Instant;

use tracing::{info, instrument, warn};
use url::Url;

use researchbrief_extractor::ContentExtractor;
use researchbrief_llm::BriefGenerator;
use researchbrief_shared::{
    BriefError, BriefOutcome, FailedSource, Result, SourceReference, StoredSource, MAX_URLS,
};
use researchbrief_storage::BriefStore;

/// Drives one brief from raw URLs to a persisted record.
pub struct Orchestrator {
    extractor: ContentExtractor,
    generator: BriefGenerator,
    store: BriefStore,
}

impl Orchestrator {
    pub fn new(extractor: ContentExtractor, generator: BriefGenerator, store: BriefStore) -> Self {
        Self {
            extractor,
            generator,
            store,
        }
    }

    /// Run the full pipeline for a batch of URLs.
    ///
    /// Validation rejects the whole request; after that, individual source
    /// failures are tolerated as long as at least one extraction succeeds.
    #[instrument(skip_all, fields(urls = urls.len()))]
    pub async fn run(&self, urls: &[String]) -> Result<BriefOutcome> {
        let start = Instant::now();
        validate_urls(urls)?;

        info!(count = urls.len(), "extracting sources");
        let references = self.extractor.extract_all(urls).await;

        let (successes, failures) = partition_sources(references);
        if successes.is_empty() {
            return Err(BriefError::ExtractionFailed { failures });
        }
        if !failures.is_empty() {
            warn!(
                failed = failures.len(),
                ok = successes.len(),
                "continuing with partial sources"
            );
        }

        let brief = self.generator.generate(&successes).await?;

        let out_of_range = brief.out_of_range_indices(successes.len());
        if !out_of_range.is_empty() {
            warn!(?out_of_range, "brief cites source indices outside the batch");
        }

        let stored: Vec<StoredSource> = successes.iter().map(StoredSource::from).collect();
        let id = self
            .store
            .insert_brief(
                record_title(&brief.title),
                &to_json(urls)?,
                &to_json(&brief)?,
                &to_json(&stored)?,
                &to_json(&brief.tags)?,
            )
            .await?;

        info!(id, elapsed = ?start.elapsed(), "brief persisted");
        Ok(BriefOutcome {
            id,
            brief,
            sources: stored,
            failed_sources: failures,
        })
    }
}

/// Reject empty batches, oversized batches, and non-http(s) URLs.
///
/// All offending URLs are reported in one pass rather than stopping at the
/// first bad entry.
fn validate_urls(urls: &[String]) -> Result<()> {
    if urls.is_empty() {
        return Err(BriefError::invalid_input(
            "at least one URL is required",
            Vec::new(),
        ));
    }
    if urls.len() > MAX_URLS {
        return Err(BriefError::invalid_input(
            format!("too many URLs: {} (maximum is {MAX_URLS})", urls.len()),
            Vec::new(),
        ));
    }

    let invalid: Vec<String> = urls
        .iter()
        .filter(|u| !is_http_url(u))
        .cloned()
        .collect();
    if !invalid.is_empty() {
        return Err(BriefError::invalid_input(
            format!("{} invalid URL(s)", invalid.len()),
            invalid,
        ));
    }
    Ok(())
}

fn is_http_url(raw: &str) -> bool {
    match Url::parse(raw) {
        Ok(url) => matches!(url.scheme(), "http" | "https"),
        Err(_) => false,
    }
}

/// Split extraction results into usable sources and failure records,
/// preserving the input order within each side.
fn partition_sources(
    references: Vec<SourceReference>,
) -> (Vec<SourceReference>, Vec<FailedSource>) {
    let mut successes = Vec::new();
    let mut failures = Vec::new();
    for reference in references {
        if reference.is_success() {
            successes.push(reference);
        } else {
            failures.push(FailedSource {
                url: reference.url,
                reason: reference
                    .failure_reason
                    .unwrap_or_else(|| "unknown failure".to_string()),
            });
        }
    }
    (successes, failures)
}

/// History rows need a non-blank title even when the model omits one.
fn record_title(title: &str) -> &str {
    if title.trim().is_empty() {
        "Research Brief"
    } else {
        title
    }
}

fn to_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<String> {
    serde_json::to_string(value).map_err(|e| BriefError::Storage(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use researchbrief_llm::LlmClient;
    use serde_json::json;
    use std::time::Duration;
    use uuid::Uuid;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const BRIEF_BODY: &str = r#"{
        "title": "Async Rust",
        "summary": "Two sources agree on the basics.",
        "keyPoints": [{"point": "Futures are lazy", "sourceIndex": 0, "snippet": "lazy"}],
        "conflictingClaims": [],
        "toVerify": ["benchmark numbers"],
        "tags": ["rust", "async"]
    }"#;

    fn article(body: &str) -> String {
        format!(
            "<html><head><title>Async Rust</title></head><body><article><p>{body}</p></article></body></html>"
        )
    }

    async fn orchestrator_against(llm: &MockServer) -> Orchestrator {
        let client = LlmClient::new(&llm.uri(), "test-key", "test-model").unwrap();
        let generator = BriefGenerator::new(client)
            .with_backoff(Duration::from_millis(5), Duration::from_millis(5));
        let tmp = std::env::temp_dir().join(format!("rb_core_{}.db", Uuid::now_v7()));
        let store = BriefStore::open(&tmp).await.unwrap();
        Orchestrator::new(ContentExtractor::new().unwrap(), generator, store)
    }

    fn chat_completion(content: &str) -> ResponseTemplate {
        ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{"message": {"role": "assistant", "content": content}}]
        }))
    }

    #[tokio::test]
    async fn empty_batch_is_rejected() {
        let llm = MockServer::start().await;
        let orchestrator = orchestrator_against(&llm).await;

        let err = orchestrator.run(&[]).await.unwrap_err();
        assert!(matches!(err, BriefError::InvalidInput { .. }));
    }

    #[tokio::test]
    async fn oversized_batch_is_rejected_without_network() {
        let llm = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(chat_completion(BRIEF_BODY))
            .expect(0)
            .mount(&llm)
            .await;
        let orchestrator = orchestrator_against(&llm).await;

        let urls: Vec<String> = (0..11).map(|i| format!("https://s{i}.example/")).collect();
        let err = orchestrator.run(&urls).await.unwrap_err();
        match err {
            BriefError::InvalidInput { message, .. } => assert!(message.contains("11")),
            other => panic!("expected InvalidInput, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn every_bad_url_is_enumerated() {
        let llm = MockServer::start().await;
        let orchestrator = orchestrator_against(&llm).await;

        let urls = vec![
            "https://ok.example/".to_string(),
            "ftp://files.example/".to_string(),
            "not a url".to_string(),
        ];
        let err = orchestrator.run(&urls).await.unwrap_err();
        match err {
            BriefError::InvalidInput { invalid, .. } => {
                assert_eq!(invalid, vec!["ftp://files.example/", "not a url"]);
            }
            other => panic!("expected InvalidInput, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn all_sources_failing_stops_before_generation() {
        let llm = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(chat_completion(BRIEF_BODY))
            .expect(0)
            .mount(&llm)
            .await;
        let content = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&content)
            .await;
        let orchestrator = orchestrator_against(&llm).await;

        let urls = vec![format!("{}/a", content.uri()), format!("{}/b", content.uri())];
        let err = orchestrator.run(&urls).await.unwrap_err();
        match err {
            BriefError::ExtractionFailed { failures } => {
                assert_eq!(failures.len(), 2);
                assert!(failures[0].reason.contains("500"));
            }
            other => panic!("expected ExtractionFailed, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn partial_failure_still_produces_a_brief() {
        let llm = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(chat_completion(BRIEF_BODY))
            .expect(1)
            .mount(&llm)
            .await;

        let content = MockServer::start().await;
        let long = "Futures in Rust are lazy and do nothing until polled. ".repeat(4);
        Mock::given(method("GET"))
            .and(path("/good"))
            .respond_with(ResponseTemplate::new(200).set_body_string(article(&long)))
            .mount(&content)
            .await;
        Mock::given(method("GET"))
            .and(path("/bad"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&content)
            .await;

        let orchestrator = orchestrator_against(&llm).await;
        let urls = vec![
            format!("{}/good", content.uri()),
            format!("{}/bad", content.uri()),
        ];

        let outcome = orchestrator.run(&urls).await.unwrap();
        assert_eq!(outcome.brief.title, "Async Rust");
        assert_eq!(outcome.sources.len(), 1);
        assert_eq!(outcome.failed_sources.len(), 1);
        assert!(outcome.failed_sources[0].url.ends_with("/bad"));
        assert!(outcome.failed_sources[0].reason.contains("404"));
    }

    #[tokio::test]
    async fn blank_brief_title_gets_a_placeholder() {
        let llm = MockServer::start().await;
        let untitled = BRIEF_BODY.replace(r#""title": "Async Rust""#, r#""title": "  ""#);
        Mock::given(method("POST"))
            .respond_with(chat_completion(&untitled))
            .mount(&llm)
            .await;

        let content = MockServer::start().await;
        let long = "Rust ownership prevents data races at compile time. ".repeat(4);
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string(article(&long)))
            .mount(&content)
            .await;

        let orchestrator = orchestrator_against(&llm).await;
        let urls = vec![format!("{}/one", content.uri())];
        let outcome = orchestrator.run(&urls).await.unwrap();

        let record = orchestrator
            .store
            .get_brief(outcome.id)
            .await
            .unwrap()
            .expect("persisted record");
        assert_eq!(record.title, "Research Brief");
        // The brief body itself keeps whatever the model said.
        assert_eq!(record.brief.title, "  ");
    }

    #[tokio::test]
    async fn happy_path_persists_and_reads_back() {
        let llm = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(chat_completion(BRIEF_BODY))
            .mount(&llm)
            .await;

        let content = MockServer::start().await;
        let long = "Rust ownership prevents data races at compile time. ".repeat(4);
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string(article(&long)))
            .mount(&content)
            .await;

        let client = LlmClient::new(&llm.uri(), "test-key", "test-model").unwrap();
        let generator = BriefGenerator::new(client);
        let tmp = std::env::temp_dir().join(format!("rb_core_{}.db", Uuid::now_v7()));
        let store = BriefStore::open(&tmp).await.unwrap();
        let orchestrator =
            Orchestrator::new(ContentExtractor::new().unwrap(), generator, store);

        let urls = vec![format!("{}/one", content.uri())];
        let outcome = orchestrator.run(&urls).await.unwrap();
        assert!(outcome.id > 0);
        assert!(outcome.failed_sources.is_empty());

        let record = orchestrator
            .store
            .get_brief(outcome.id)
            .await
            .unwrap()
            .expect("persisted record");
        assert_eq!(record.title, "Async Rust");
        assert_eq!(record.urls, urls);
        assert_eq!(record.tags, vec!["rust", "async"]);
        assert_eq!(record.sources.len(), 1);
    }
}
