//! Generative Backend Module
//!
//! Unified interface for the generative completion capability. The
//! backend is an expensive, shared collaborator constructed once at
//! startup and dependency-injected — never an ambient global.
//!
//! Backends that share a single loaded model instance cannot serve
//! concurrent generations; wrap them in [`Exclusive`] to serialize
//! requests through one in-flight completion.

mod http_backend;

pub use http_backend::HttpCompletionBackend;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::trace;

/// Generative capability errors. Distinct from "the model produced
/// unusable text" — parsing problems are handled by the caller, these
/// mean the capability itself failed.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("generative transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("generative backend returned status {0}")]
    Status(reqwest::StatusCode),
    #[error("malformed completion response: {0}")]
    MalformedResponse(String),
}

/// Unified trait for generative completion backends.
#[async_trait]
pub trait LlmBackend: Send + Sync {
    /// Generate a completion for `prompt`.
    async fn complete(
        &self,
        prompt: &str,
        max_tokens: usize,
        temperature: f64,
    ) -> Result<String, LlmError>;

    /// Backend name for logging.
    fn backend_name(&self) -> &'static str;
}

/// Serializes access to a backend that must not run concurrent
/// generations (one loaded model instance, one request at a time).
pub struct Exclusive<B> {
    inner: B,
    gate: Mutex<()>,
}

impl<B> Exclusive<B> {
    pub fn new(inner: B) -> Self {
        Self {
            inner,
            gate: Mutex::new(()),
        }
    }
}

#[async_trait]
impl<B: LlmBackend> LlmBackend for Exclusive<B> {
    async fn complete(
        &self,
        prompt: &str,
        max_tokens: usize,
        temperature: f64,
    ) -> Result<String, LlmError> {
        let _guard = self.gate.lock().await;
        trace!("Acquired exclusive generation slot");
        self.inner.complete(prompt, max_tokens, temperature).await
    }

    fn backend_name(&self) -> &'static str {
        self.inner.backend_name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Counts how many completions run at once.
    struct ConcurrencyProbe {
        in_flight: Arc<AtomicUsize>,
        max_seen: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl LlmBackend for ConcurrencyProbe {
        async fn complete(
            &self,
            _prompt: &str,
            _max_tokens: usize,
            _temperature: f64,
        ) -> Result<String, LlmError> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_seen.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            Ok("ok".to_string())
        }

        fn backend_name(&self) -> &'static str {
            "probe"
        }
    }

    #[tokio::test]
    async fn test_exclusive_serializes_generations() {
        let in_flight = Arc::new(AtomicUsize::new(0));
        let max_seen = Arc::new(AtomicUsize::new(0));
        let backend = Arc::new(Exclusive::new(ConcurrencyProbe {
            in_flight: in_flight.clone(),
            max_seen: max_seen.clone(),
        }));

        let mut handles = Vec::new();
        for _ in 0..4 {
            let backend = backend.clone();
            handles.push(tokio::spawn(async move {
                backend.complete("p", 10, 0.7).await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }
        assert_eq!(max_seen.load(Ordering::SeqCst), 1);
    }
}
