//! Allocation Orchestrator — the three-tier resolution chain.
//!
//! Issues up to three evidence-gathering queries in sequence and accepts
//! the first non-empty result list. There is no merging across queries:
//! once a query's results are accepted, later queries are never run, and
//! an extraction miss on accepted results goes straight to the
//! generative tier.
//!
//! Each query runs under a deadline (a timeout counts as "no result" for
//! that query) with bounded retries on transport errors. Exhausting the
//! retries surfaces a definitive failure instead of quietly pretending
//! the search found nothing.

use super::extractor::EvidenceExtractor;
use super::fallback::FallbackPredictor;
use super::AllocationError;
use crate::llm::LlmBackend;
use crate::search::SearchProvider;
use crate::types::{AllocationDistribution, AllocationSource, EvidenceItem};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Tunables for the resolution chain, sourced from `[search]` and
/// `[llm]` config at wiring time.
#[derive(Debug, Clone)]
pub struct ChainSettings {
    /// Per-query deadline.
    pub query_timeout: Duration,
    /// Attempts per query before declaring the capability unavailable.
    pub max_attempts: u32,
    /// Token budget for the fallback prediction completion.
    pub prediction_max_tokens: usize,
    pub temperature: f64,
}

impl Default for ChainSettings {
    fn default() -> Self {
        Self {
            query_timeout: Duration::from_secs(10),
            max_attempts: 2,
            prediction_max_tokens: 150,
            temperature: 0.7,
        }
    }
}

/// A resolved budget split plus which tier produced it.
#[derive(Debug, Clone, serde::Serialize)]
pub struct ResolvedAllocation {
    pub distribution: AllocationDistribution,
    pub source: AllocationSource,
}

/// Composes search, extraction, and the generative fallback into one
/// resolution chain.
pub struct AllocationOrchestrator {
    search: Arc<dyn SearchProvider>,
    llm: Arc<dyn LlmBackend>,
    settings: ChainSettings,
}

impl AllocationOrchestrator {
    pub fn new(
        search: Arc<dyn SearchProvider>,
        llm: Arc<dyn LlmBackend>,
        settings: ChainSettings,
    ) -> Self {
        Self {
            search,
            llm,
            settings,
        }
    }

    /// The three evidence-gathering queries, most specific first.
    pub fn build_queries(product: &str) -> [String; 3] {
        [
            format!(
                "Marketing spend distribution for {product} across Google Ads, Facebook Ads, \
                 LinkedIn Ads, YouTube Ads, TV Ads, SEO, and Email."
            ),
            format!(
                "How do companies allocate advertising budgets for {product} across different \
                 platforms?"
            ),
            format!(
                "Breakdown of advertising expenses for {product} in percentage across Google, \
                 Meta, TV, LinkedIn, and Email."
            ),
        ]
    }

    /// Resolve one final distribution for a product.
    pub async fn allocate(&self, product: &str) -> Result<ResolvedAllocation, AllocationError> {
        for (query_index, query) in Self::build_queries(product).iter().enumerate() {
            let Some(items) = self.run_query(query).await? else {
                continue;
            };
            if items.is_empty() {
                continue;
            }

            info!(
                query_index,
                results = items.len(),
                "Accepted search results for extraction"
            );
            // First usable result wins. If the accepted evidence has no
            // extractable signal, the chain moves to the generative tier
            // rather than to the remaining queries.
            if let Some(distribution) = EvidenceExtractor::extract(&items) {
                return Ok(ResolvedAllocation {
                    distribution,
                    source: AllocationSource::Evidence { query_index },
                });
            }
            warn!(query_index, "Accepted evidence carried no channel signal");
            break;
        }

        let (distribution, source) = FallbackPredictor::predict(
            product,
            self.llm.as_ref(),
            self.settings.prediction_max_tokens,
            self.settings.temperature,
        )
        .await?;
        Ok(ResolvedAllocation {
            distribution,
            source,
        })
    }

    /// Run one query with a deadline and bounded retries.
    ///
    /// `Ok(None)` means the query timed out — no result, move on.
    async fn run_query(&self, query: &str) -> Result<Option<Vec<EvidenceItem>>, AllocationError> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            let outcome =
                tokio::time::timeout(self.settings.query_timeout, self.search.search(query)).await;

            match outcome {
                Err(_elapsed) => {
                    warn!(
                        provider = self.search.provider_name(),
                        timeout_secs = self.settings.query_timeout.as_secs(),
                        "Search query timed out — treating as no result"
                    );
                    return Ok(None);
                }
                Ok(Ok(items)) => return Ok(Some(items)),
                Ok(Err(e)) if e.is_retryable() && attempt < self.settings.max_attempts => {
                    warn!(attempt, error = %e, "Search attempt failed — retrying");
                }
                Ok(Err(e)) => return Err(e.into()),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{LlmBackend, LlmError};
    use crate::search::{SearchError, SearchProvider};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Replays scripted per-query outcomes and records the queries asked.
    struct ScriptedSearch {
        outcomes: Mutex<Vec<Result<Vec<EvidenceItem>, SearchError>>>,
        calls: AtomicUsize,
    }

    impl ScriptedSearch {
        fn new(outcomes: Vec<Result<Vec<EvidenceItem>, SearchError>>) -> Self {
            let mut reversed = outcomes;
            reversed.reverse();
            Self {
                outcomes: Mutex::new(reversed),
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl SearchProvider for ScriptedSearch {
        async fn search(&self, _query: &str) -> Result<Vec<EvidenceItem>, SearchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.outcomes
                .lock()
                .unwrap()
                .pop()
                .unwrap_or_else(|| Ok(Vec::new()))
        }

        fn provider_name(&self) -> &'static str {
            "scripted"
        }
    }

    struct CannedLlm(&'static str);

    #[async_trait]
    impl LlmBackend for CannedLlm {
        async fn complete(
            &self,
            _prompt: &str,
            _max_tokens: usize,
            _temperature: f64,
        ) -> Result<String, LlmError> {
            Ok(self.0.to_string())
        }

        fn backend_name(&self) -> &'static str {
            "canned"
        }
    }

    struct FailingLlm;

    #[async_trait]
    impl LlmBackend for FailingLlm {
        async fn complete(
            &self,
            _prompt: &str,
            _max_tokens: usize,
            _temperature: f64,
        ) -> Result<String, LlmError> {
            Err(LlmError::MalformedResponse("backend down".to_string()))
        }

        fn backend_name(&self) -> &'static str {
            "failing"
        }
    }

    fn evidence(snippet: &str) -> Vec<EvidenceItem> {
        vec![EvidenceItem {
            snippet: snippet.to_string(),
            score: 1.0,
        }]
    }

    fn orchestrator(
        search: ScriptedSearch,
        llm: impl LlmBackend + 'static,
    ) -> AllocationOrchestrator {
        AllocationOrchestrator::new(
            Arc::new(search),
            Arc::new(llm),
            ChainSettings {
                query_timeout: Duration::from_millis(200),
                max_attempts: 2,
                ..ChainSettings::default()
            },
        )
    }

    #[tokio::test]
    async fn test_second_query_wins_after_empty_first() {
        let search = ScriptedSearch::new(vec![
            Ok(Vec::new()),
            Ok(evidence("put 70% into google ads and 30% into seo")),
        ]);
        let orchestrator = orchestrator(search, CannedLlm(""));

        let resolved = orchestrator.allocate("sneakers").await.unwrap();
        assert_eq!(
            resolved.source,
            AllocationSource::Evidence { query_index: 1 }
        );
        assert!(resolved.distribution.get(crate::types::Channel::GoogleAds).unwrap() > 0.0);
    }

    #[tokio::test]
    async fn test_first_usable_result_skips_remaining_queries() {
        let search = ScriptedSearch::new(vec![Ok(evidence("google ads takes 90%"))]);
        let orchestrator = orchestrator(search, CannedLlm(""));

        let resolved = orchestrator.allocate("sneakers").await.unwrap();
        assert_eq!(
            resolved.source,
            AllocationSource::Evidence { query_index: 0 }
        );
    }

    #[tokio::test]
    async fn test_all_empty_falls_to_generative_tier() {
        let search = ScriptedSearch::new(vec![Ok(Vec::new()), Ok(Vec::new()), Ok(Vec::new())]);
        let orchestrator = orchestrator(search, CannedLlm("30% 20% 15% 10% 15% 5% 5%"));

        let resolved = orchestrator.allocate("sneakers").await.unwrap();
        assert_eq!(resolved.source, AllocationSource::Generative);
    }

    #[tokio::test]
    async fn test_unextractable_evidence_goes_generative_not_next_query() {
        let search = ScriptedSearch::new(vec![
            Ok(evidence("market size grew 12% this year")),
            Ok(evidence("google ads takes 90%")),
        ]);
        let orchestrator = orchestrator(search, CannedLlm("no numbers"));

        let resolved = orchestrator.allocate("sneakers").await.unwrap();
        // Accepted query 0, extraction missed, chain went generative and
        // then defaulted — query 1's usable evidence is never consulted.
        assert_eq!(resolved.source, AllocationSource::DefaultSplit);
    }

    /// First query hangs well past the deadline; later queries answer
    /// instantly from the script.
    struct SlowFirstSearch {
        inner: ScriptedSearch,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl SearchProvider for SlowFirstSearch {
        async fn search(&self, query: &str) -> Result<Vec<EvidenceItem>, SearchError> {
            if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
                tokio::time::sleep(Duration::from_secs(5)).await;
            }
            self.inner.search(query).await
        }

        fn provider_name(&self) -> &'static str {
            "slow-first"
        }
    }

    #[tokio::test]
    async fn test_timed_out_query_counts_as_no_result() {
        let search = SlowFirstSearch {
            inner: ScriptedSearch::new(vec![Ok(evidence(
                "put 70% into google ads and 30% into seo",
            ))]),
            calls: AtomicUsize::new(0),
        };
        // A failing generative backend proves the chain resolved from
        // evidence alone: any fallback attempt would error the run.
        let orchestrator = AllocationOrchestrator::new(
            Arc::new(search),
            Arc::new(FailingLlm),
            ChainSettings {
                query_timeout: Duration::from_millis(100),
                max_attempts: 2,
                ..ChainSettings::default()
            },
        );

        let resolved = orchestrator.allocate("sneakers").await.unwrap();
        assert_eq!(
            resolved.source,
            AllocationSource::Evidence { query_index: 1 }
        );
        assert!(resolved.distribution.get(crate::types::Channel::GoogleAds).unwrap() > 0.0);
    }

    #[tokio::test]
    async fn test_transport_error_retries_then_succeeds() {
        let search = ScriptedSearch::new(vec![
            Err(SearchError::Status(reqwest::StatusCode::INTERNAL_SERVER_ERROR)),
            Ok(evidence("google ads takes 90%")),
        ]);
        let orchestrator = orchestrator(search, CannedLlm(""));

        let resolved = orchestrator.allocate("sneakers").await.unwrap();
        assert_eq!(
            resolved.source,
            AllocationSource::Evidence { query_index: 0 }
        );
    }

    #[tokio::test]
    async fn test_exhausted_retries_propagate_failure() {
        let search = ScriptedSearch::new(vec![
            Err(SearchError::Status(reqwest::StatusCode::INTERNAL_SERVER_ERROR)),
            Err(SearchError::Status(reqwest::StatusCode::INTERNAL_SERVER_ERROR)),
        ]);
        let orchestrator = orchestrator(search, CannedLlm("30% 20% 15% 10% 15% 5% 5%"));

        let err = orchestrator.allocate("sneakers").await.unwrap_err();
        assert!(matches!(err, AllocationError::SearchUnavailable(_)));
    }

    #[tokio::test]
    async fn test_generative_transport_failure_propagates() {
        let search = ScriptedSearch::new(vec![Ok(Vec::new()), Ok(Vec::new()), Ok(Vec::new())]);
        let orchestrator = orchestrator(search, FailingLlm);

        let err = orchestrator.allocate("sneakers").await.unwrap_err();
        assert!(matches!(err, AllocationError::GenerativeUnavailable(_)));
    }
}
