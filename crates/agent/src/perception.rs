//! Perception stage: asks the model for a structured reading of the task.
//!
//! The reply is expected to be a JSON object with `steps`, `operations`,
//! `parameters` and `dependencies`. It is kept as raw text either way and
//! parsed when it is valid JSON (optionally inside a ```json fence).

use std::sync::Arc;
use std::time::Duration;
use reckon_core::error::PerceptionError;
use reckon_core::message::Message;
use reckon_core::provider::{Provider, ProviderRequest};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// System prompt for fact extraction.
pub const SYSTEM_PROMPT: &str = "You extract structured facts from tasks. Reply with a single JSON object and nothing else.";

/// Extracted facts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Facts {
    pub raw: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parsed: Option<serde_json::Value>,
}

impl Facts {
    pub fn from_reply(raw: &str) -> Self {
        let raw = raw.trim().to_string();
        let parsed = serde_json::from_str::<serde_json::Value>(strip_fence(&raw))
            .ok()
            .filter(|v| v.is_object());
        Self { raw, parsed }
    }

    /// One-line summary for the context: compact JSON when parsed, raw text otherwise.
    pub fn summary(&self) -> String {
        let body = match &self.parsed {
            Some(v) => v.to_string(),
            None => self.raw.clone(),
        };
        format!("Facts extracted: {body}")
    }
}

fn strip_fence(text: &str) -> &str {
    let t = text.trim();
    let Some(inner) = t.strip_prefix("```") else {
        return t;
    };
    let inner = inner.strip_prefix("json").unwrap_or(inner);
    inner.strip_suffix("```").unwrap_or(inner).trim()
}

pub struct Perception {
    provider: Arc<dyn Provider>,
    model: String,
    temperature: f32,
    max_tokens: Option<u32>,
    timeout: Duration,
}

impl Perception {
    pub fn new(provider: Arc<dyn Provider>, model: impl Into<String>, timeout: Duration) -> Self {
        Self {
            provider,
            model: model.into(),
            temperature: 0.2,
            max_tokens: None,
            timeout,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max: u32) -> Self {
        self.max_tokens = Some(max);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn build_prompt(query: &str, history: &str) -> String {
        let progress = if history.is_empty() {
            String::new()
        } else {
            format!("\nProgress so far: {history}\n")
        };
        format!(
            r#"Analyze this query and extract key facts in JSON format:
- steps: List of distinct operations needed
- operations: Details about each operation
- parameters: Any specific values mentioned
- dependencies: What results are needed for which steps

Query: "{query}"
{progress}
Example output:
{{
    "steps": ["ascii_conversion", "exponential_sum", "create_image", "email"],
    "operations": {{
        "ascii_conversion": "Convert INDIA to ASCII values",
        "exponential_sum": "Calculate sum of exponentials",
        "create_image": "Render the result as an image",
        "email": "Send result via email"
    }},
    "parameters": {{
        "text": "INDIA"
    }},
    "dependencies": {{
        "exponential_sum": "needs ascii_values",
        "create_image": "needs exponential_sum",
        "email": "needs exponential_sum"
    }}
}}"#
        )
    }

    pub async fn perceive(&self, query: &str, history: &str) -> Result<Facts, PerceptionError> {
        let mut request = ProviderRequest::new(
            &self.model,
            vec![
                Message::system(SYSTEM_PROMPT),
                Message::user(Self::build_prompt(query, history)),
            ],
        );
        request.temperature = self.temperature;
        request.max_tokens = self.max_tokens;

        let response = match tokio::time::timeout(self.timeout, self.provider.complete(request)).await {
            Ok(result) => result?,
            Err(_) => return Err(PerceptionError::Timeout(self.timeout.as_secs())),
        };

        if response.message.content.trim().is_empty() {
            return Err(PerceptionError::EmptyResponse);
        }

        let facts = Facts::from_reply(&response.message.content);
        debug!(parsed = facts.parsed.is_some(), "Facts extracted");
        Ok(facts)
    }
}
