//! OpenAI-style HTTP completion backend.
//!
//! Speaks the `/v1/completions` wire shape so any compatible server
//! (vLLM, TGI's OpenAI facade, llama.cpp server) can host the model.

use super::{LlmBackend, LlmError};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

/// Completion backend over HTTP.
pub struct HttpCompletionBackend {
    http: reqwest::Client,
    base_url: String,
    model: String,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    #[serde(default)]
    text: String,
}

impl HttpCompletionBackend {
    pub fn new(base_url: &str, model: &str, timeout: Duration) -> Result<Self, LlmError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
        })
    }
}

#[async_trait]
impl LlmBackend for HttpCompletionBackend {
    async fn complete(
        &self,
        prompt: &str,
        max_tokens: usize,
        temperature: f64,
    ) -> Result<String, LlmError> {
        let body = serde_json::json!({
            "model": self.model,
            "prompt": prompt,
            "max_tokens": max_tokens,
            "temperature": temperature,
        });

        let resp = self
            .http
            .post(format!("{}/v1/completions", self.base_url))
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(LlmError::Status(status));
        }

        let completion: CompletionResponse = resp
            .json()
            .await
            .map_err(|e| LlmError::MalformedResponse(e.to_string()))?;

        let text = completion
            .choices
            .into_iter()
            .next()
            .map(|c| c.text)
            .ok_or_else(|| LlmError::MalformedResponse("no choices in response".to_string()))?;

        debug!(chars = text.len(), model = %self.model, "Completion received");
        Ok(text)
    }

    fn backend_name(&self) -> &'static str {
        "http-completions"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_decoding() {
        let body = r#"{"choices": [{"text": "Google Ads: 30%"}]}"#;
        let parsed: CompletionResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.choices[0].text, "Google Ads: 30%");
    }

    #[test]
    fn test_empty_choices_decodes_but_is_rejected_upstream() {
        let parsed: CompletionResponse = serde_json::from_str("{}").unwrap();
        assert!(parsed.choices.is_empty());
    }
}
