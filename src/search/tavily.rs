//! Tavily-style search client.
//!
//! JSON POST API: `{"query": ...}` against `{base_url}/search` with a
//! bearer key, answering `{"results": [{"snippet"|"content", "score"}]}`.

use super::{SearchError, SearchProvider};
use crate::types::EvidenceItem;
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

/// HTTP client for the search provider.
#[derive(Clone)]
pub struct TavilyClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<RawResult>,
}

#[derive(Debug, Deserialize)]
struct RawResult {
    /// Tavily calls this field `content`; older responses used `snippet`.
    #[serde(default, alias = "content")]
    snippet: String,
    #[serde(default = "default_score")]
    score: f64,
}

/// Results without an explicit relevance score count with full weight.
fn default_score() -> f64 {
    1.0
}

impl TavilyClient {
    /// Build a client with a request-level timeout. The per-query
    /// deadline in the orchestrator is separate and usually tighter.
    pub fn new(base_url: &str, api_key: &str, timeout: Duration) -> Result<Self, SearchError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        })
    }
}

#[async_trait]
impl SearchProvider for TavilyClient {
    async fn search(&self, query: &str) -> Result<Vec<EvidenceItem>, SearchError> {
        let resp = self
            .http
            .post(format!("{}/search", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&serde_json::json!({ "query": query }))
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(SearchError::Status(status));
        }

        let body: SearchResponse = resp
            .json()
            .await
            .map_err(|e| SearchError::Decode(e.to_string()))?;

        let items: Vec<EvidenceItem> = body
            .results
            .into_iter()
            .map(|r| EvidenceItem {
                snippet: r.snippet,
                score: r.score,
            })
            .collect();
        debug!(results = items.len(), "Search query answered");
        Ok(items)
    }

    fn provider_name(&self) -> &'static str {
        "tavily"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_decoding_with_content_alias() {
        let body = r#"{"results": [{"content": "30% on google ads", "score": 0.8}]}"#;
        let parsed: SearchResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.results.len(), 1);
        assert_eq!(parsed.results[0].snippet, "30% on google ads");
        assert!((parsed.results[0].score - 0.8).abs() < 1e-9);
    }

    #[test]
    fn test_missing_score_defaults_to_full_weight() {
        let body = r#"{"results": [{"snippet": "seo gets 10%"}]}"#;
        let parsed: SearchResponse = serde_json::from_str(body).unwrap();
        assert!((parsed.results[0].score - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_empty_body_is_no_results() {
        let parsed: SearchResponse = serde_json::from_str("{}").unwrap();
        assert!(parsed.results.is_empty());
    }
}
