//! Client for the local text-generation service.

use std::time::Duration;

use tracing::debug;

use crate::error::{NarrateError, Result};
use crate::prompt::{build_prompt, ExplanationSummaries};

/// Something that can turn a diagnosis and explainer summaries into a
/// clinician-readable narrative.
///
/// Implementations are treated as untrusted and unreliable: callers
/// must be prepared for any call to fail and substitute
/// [`fallback_narrative`](crate::fallback_narrative) themselves.
pub trait NarrativeGenerator {
    /// Generate 2-5 sentences of narrative text.
    fn generate(&self, label: &str, summaries: &ExplanationSummaries) -> Result<String>;
}

/// Client for a local Ollama-compatible chat endpoint.
///
/// Every request carries an explicit agent timeout; a hung service
/// degrades into a fallback narrative instead of blocking the request.
#[derive(Debug, Clone)]
pub struct OllamaClient {
    endpoint: String,
    model: String,
    timeout: Duration,
}

impl Default for OllamaClient {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:11434".into(),
            model: "deepseek-r1:8b".into(),
            timeout: Duration::from_secs(30),
        }
    }
}

impl OllamaClient {
    /// Create a client for an endpoint like `http://localhost:11434`.
    #[must_use]
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            ..Default::default()
        }
    }

    /// Set the model name.
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set the request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl NarrativeGenerator for OllamaClient {
    fn generate(&self, label: &str, summaries: &ExplanationSummaries) -> Result<String> {
        let prompt = build_prompt(label, summaries);
        let url = format!("{}/api/chat", self.endpoint.trim_end_matches('/'));

        debug!(model = %self.model, %url, "requesting narrative");

        let agent = ureq::AgentBuilder::new().timeout(self.timeout).build();
        let response = agent
            .post(&url)
            .send_json(serde_json::json!({
                "model": self.model,
                "messages": [{ "role": "user", "content": prompt }],
                "stream": false,
            }))
            .map_err(|e| NarrateError::Request(e.to_string()))?;

        let body: serde_json::Value = response
            .into_json()
            .map_err(|e| NarrateError::MalformedResponse(e.to_string()))?;

        let content = body
            .get("message")
            .and_then(|m| m.get("content"))
            .and_then(|c| c.as_str())
            .ok_or_else(|| {
                NarrateError::MalformedResponse("missing message.content field".into())
            })?;

        let text = content.trim().to_string();
        if text.is_empty() {
            return Err(NarrateError::EmptyResponse);
        }
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summaries() -> ExplanationSummaries {
        ExplanationSummaries {
            gradcam: "a".into(),
            surrogate: "b".into(),
            occlusion: "c".into(),
        }
    }

    #[test]
    fn test_unreachable_service_is_a_request_error() {
        // Nothing listens on this port; connection is refused immediately.
        let client = OllamaClient::new("http://127.0.0.1:1")
            .with_timeout(Duration::from_millis(200));

        let result = client.generate("Colon Benign Tissue", &summaries());
        assert!(matches!(result, Err(NarrateError::Request(_))));
    }

    #[test]
    fn test_builder_settings() {
        let client = OllamaClient::new("http://host:1234/")
            .with_model("llama3")
            .with_timeout(Duration::from_secs(5));
        assert_eq!(client.model, "llama3");
        assert_eq!(client.timeout, Duration::from_secs(5));
    }
}
