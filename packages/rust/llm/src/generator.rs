//! Brief generation with a bounded, typed retry loop.
//!
//! At most three sequential attempts with the identical prompt. The retry
//! decision is a match over [`ProviderErrorKind`]: credential problems stop
//! immediately, rate limits and server failures back off (8 s / 3 s),
//! malformed output retries without delay. Backoff sleeps run inside the
//! request's own task, so concurrent requests are unaffected.

use std::time::Duration;

use tracing::{debug, info, instrument, warn};

use researchbrief_shared::{Brief, BriefError, Result, SourceReference};

use crate::prompt::build_brief_prompt;
use crate::provider::{LlmClient, ProviderErrorKind};
use crate::repair::parse_brief;

/// Total attempt budget, first try included.
const MAX_ATTEMPTS: u32 = 3;

/// Output budget for one brief completion.
const MAX_COMPLETION_TOKENS: u32 = 4096;

/// Default delay before retrying a rate-limited attempt.
const RATE_LIMIT_BACKOFF: Duration = Duration::from_secs(8);

/// Default delay before retrying a provider-side server failure.
const SERVER_ERROR_BACKOFF: Duration = Duration::from_secs(3);

/// Calls the provider and repairs/parses its output into a [`Brief`].
pub struct BriefGenerator {
    client: LlmClient,
    rate_limit_backoff: Duration,
    server_error_backoff: Duration,
}

impl BriefGenerator {
    /// Create a generator with the standard backoff policy.
    pub fn new(client: LlmClient) -> Self {
        Self {
            client,
            rate_limit_backoff: RATE_LIMIT_BACKOFF,
            server_error_backoff: SERVER_ERROR_BACKOFF,
        }
    }

    /// Override the backoff delays (tests run with scaled-down values).
    pub fn with_backoff(mut self, rate_limit: Duration, server_error: Duration) -> Self {
        self.rate_limit_backoff = rate_limit;
        self.server_error_backoff = server_error;
        self
    }

    /// Generate a brief from the successful sources.
    ///
    /// Guarantees only syntactic validity of the parsed brief; citation
    /// index ranges are the caller's concern.
    #[instrument(skip_all, fields(sources = sources.len(), model = %self.client.model()))]
    pub async fn generate(&self, sources: &[SourceReference]) -> Result<Brief> {
        // One prompt, reused verbatim across attempts.
        let prompt = build_brief_prompt(sources);
        let mut last_error = String::from("no attempts made");

        for attempt in 1..=MAX_ATTEMPTS {
            debug!(attempt, "requesting brief completion");

            match self.client.complete(&prompt, MAX_COMPLETION_TOKENS).await {
                Ok(text) => match parse_brief(&text) {
                    Ok(brief) => {
                        info!(attempt, key_points = brief.key_points.len(), "brief generated");
                        return Ok(brief);
                    }
                    Err(e) => {
                        warn!(attempt, error = %e, "malformed model response");
                        last_error = e.message;
                    }
                },
                Err(e) => match e.kind {
                    ProviderErrorKind::Unauthorized => {
                        return Err(BriefError::Auth {
                            message: format!(
                                "provider rejected credentials ({}); check the configured API key",
                                e.message
                            ),
                        });
                    }
                    ProviderErrorKind::RateLimited => {
                        warn!(attempt, error = %e, "rate limited");
                        last_error = e.message;
                        if attempt < MAX_ATTEMPTS {
                            tokio::time::sleep(self.rate_limit_backoff).await;
                        }
                    }
                    ProviderErrorKind::Server => {
                        warn!(attempt, error = %e, "provider server error");
                        last_error = e.message;
                        if attempt < MAX_ATTEMPTS {
                            tokio::time::sleep(self.server_error_backoff).await;
                        }
                    }
                    ProviderErrorKind::Transport | ProviderErrorKind::Malformed => {
                        warn!(attempt, error = %e, "transient provider failure");
                        last_error = e.message;
                    }
                },
            }
        }

        Err(BriefError::generation(last_error))
    }
}
