//! Search Capability Module
//!
//! External evidence gathering behind the [`SearchProvider`] trait. The
//! contract deliberately separates "found nothing" (an empty, valid
//! result list) from "the capability errored" ([`SearchError`]): only
//! genuine emptiness lets the allocation chain fall through to the next
//! tier.

mod tavily;

pub use tavily::TavilyClient;

use crate::types::EvidenceItem;
use async_trait::async_trait;

/// Search capability errors. Transport problems are retryable; a non-2xx
/// status from the provider is not treated as an empty result.
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    #[error("search transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("search provider returned status {0}")]
    Status(reqwest::StatusCode),
    #[error("failed to decode search response: {0}")]
    Decode(String),
}

impl SearchError {
    /// Whether another attempt at the same query could succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            SearchError::Transport(_) => true,
            SearchError::Status(status) => status.is_server_error(),
            SearchError::Decode(_) => false,
        }
    }
}

/// External search capability.
#[async_trait]
pub trait SearchProvider: Send + Sync {
    /// Run one query. `Ok(vec![])` means the provider answered and found
    /// nothing.
    async fn search(&self, query: &str) -> Result<Vec<EvidenceItem>, SearchError>;

    /// Provider name for logging.
    fn provider_name(&self) -> &'static str;
}
