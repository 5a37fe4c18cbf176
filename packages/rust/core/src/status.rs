//! Health probe for the two external dependencies: the store and the model
//! provider. Each is checked independently so one outage does not mask the
//! other.

use chrono::Utc;
use serde::Serialize;
use tracing::instrument;

use researchbrief_llm::LlmClient;
use researchbrief_storage::BriefStore;

#[derive(Debug, Clone, Serialize)]
pub struct ComponentStatus {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl ComponentStatus {
    fn up() -> Self {
        Self {
            ok: true,
            detail: None,
        }
    }

    fn down(detail: impl Into<String>) -> Self {
        Self {
            ok: false,
            detail: Some(detail.into()),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct StatusReport {
    pub store: ComponentStatus,
    pub llm: ComponentStatus,
    pub checked_at: String,
}

impl StatusReport {
    pub fn healthy(&self) -> bool {
        self.store.ok && self.llm.ok
    }
}

/// Probe both components and report per-component results.
#[instrument(skip_all)]
pub async fn check(store: &BriefStore, client: &LlmClient) -> StatusReport {
    let store_status = match store.ping().await {
        Ok(()) => ComponentStatus::up(),
        Err(e) => ComponentStatus::down(e.to_string()),
    };

    let llm_status = match client.check().await {
        Ok(()) => ComponentStatus::up(),
        Err(e) => ComponentStatus::down(e.to_string()),
    };

    StatusReport {
        store: store_status,
        llm: llm_status,
        checked_at: Utc::now().to_rfc3339(),
    }
}
