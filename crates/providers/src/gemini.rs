//! Google Gemini provider implementation.
//!
//! Uses the `generateContent` REST endpoint of the Generative Language API.
//!
//! - `x-goog-api-key` header authentication
//! - System prompt as a top-level `systemInstruction`
//! - Assistant turns are sent with the `model` role

use async_trait::async_trait;
use reckon_core::error::ProviderError;
use reckon_core::message::{Message, Role};
use reckon_core::provider::*;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;
use crate::http;

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Gemini `generateContent` provider.
pub struct GeminiProvider {
    name: String,
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl GeminiProvider {
    /// Create a new Gemini provider.
    pub fn new(api_key: impl Into<String>, timeout: Duration) -> Self {
        Self {
            name: "gemini".into(),
            base_url: DEFAULT_BASE_URL.into(),
            api_key: api_key.into(),
            client: http::client(timeout),
        }
    }

    /// Create with a custom base URL (e.g., for testing or proxies).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Split system messages out; Gemini takes them as `systemInstruction`.
    fn extract_system(messages: &[Message]) -> (Option<String>, Vec<&Message>) {
        let mut system_parts: Vec<&str> = Vec::new();
        let mut rest: Vec<&Message> = Vec::new();

        for msg in messages {
            match msg.role {
                Role::System => system_parts.push(&msg.content),
                _ => rest.push(msg),
            }
        }

        let system = if system_parts.is_empty() {
            None
        } else {
            Some(system_parts.join("\n\n"))
        };

        (system, rest)
    }

    fn to_api_contents(messages: &[&Message]) -> Vec<GeminiContent> {
        messages
            .iter()
            .map(|m| GeminiContent {
                role: Some(match m.role {
                    Role::Assistant => "model".into(),
                    _ => "user".into(),
                }),
                parts: vec![GeminiPart {
                    text: Some(m.content.clone()),
                }],
            })
            .collect()
    }

    fn build_body(request: &ProviderRequest) -> serde_json::Value {
        let (system, messages) = Self::extract_system(&request.messages);

        let mut generation_config = serde_json::json!({
            "temperature": request.temperature,
        });
        if let Some(max_tokens) = request.max_tokens {
            generation_config["maxOutputTokens"] = serde_json::json!(max_tokens);
        }
        if !request.stop.is_empty() {
            generation_config["stopSequences"] = serde_json::json!(request.stop);
        }

        let mut body = serde_json::json!({
            "contents": Self::to_api_contents(&messages),
            "generationConfig": generation_config,
        });

        if let Some(sys) = system {
            body["systemInstruction"] = serde_json::json!({ "parts": [{ "text": sys }] });
        }

        body
    }

    fn response_to_provider_response(
        requested_model: &str,
        api_response: GeminiResponse,
    ) -> Result<ProviderResponse, ProviderError> {
        let candidate =
            api_response
                .candidates
                .into_iter()
                .next()
                .ok_or_else(|| ProviderError::ApiError {
                    status_code: 200,
                    message: "No candidates in response".into(),
                })?;

        let text: String = candidate
            .content
            .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();

        let usage = api_response.usage_metadata.map(|u| Usage {
            prompt_tokens: u.prompt_token_count,
            completion_tokens: u.candidates_token_count,
            total_tokens: u.total_token_count,
        });

        Ok(ProviderResponse {
            message: Message::assistant(text),
            usage,
            model: api_response
                .model_version
                .unwrap_or_else(|| requested_model.to_string()),
        })
    }
}

#[async_trait]
impl Provider for GeminiProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn complete(
        &self,
        request: ProviderRequest,
    ) -> std::result::Result<ProviderResponse, ProviderError> {
        if self.api_key.is_empty() {
            return Err(ProviderError::NotConfigured(
                "no Gemini API key (set GEMINI_API_KEY or api_key in config)".into(),
            ));
        }

        let url = format!("{}/models/{}:generateContent", self.base_url, request.model);
        let body = Self::build_body(&request);

        debug!(provider = %self.name, model = %request.model, "Sending generateContent request");

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(http::send_error)?;

        let response = http::check_status(&self.name, response).await?;

        let api_response: GeminiResponse =
            response.json().await.map_err(|e| ProviderError::ApiError {
                status_code: 200,
                message: format!("Failed to parse response: {e}"),
            })?;

        Self::response_to_provider_response(&request.model, api_response)
    }
}

// --- Gemini API types (internal) ---

#[derive(Debug, Serialize, Deserialize)]
struct GeminiContent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiPart {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
    #[serde(default)]
    usage_metadata: Option<GeminiUsage>,
    #[serde(default)]
    model_version: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    #[serde(default)]
    content: Option<GeminiContent>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiUsage {
    #[serde(default)]
    prompt_token_count: u32,
    #[serde(default)]
    candidates_token_count: u32,
    #[serde(default)]
    total_token_count: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider() -> GeminiProvider {
        GeminiProvider::new("g-test", Duration::from_secs(10))
    }

    #[test]
    fn constructor() {
        let p = provider();
        assert_eq!(p.name(), "gemini");
        assert!(p.base_url.contains("generativelanguage.googleapis.com"));
    }

    #[test]
    fn constructor_with_base_url() {
        let p = provider().with_base_url("http://localhost:9999/v1beta/");
        assert_eq!(p.base_url, "http://localhost:9999/v1beta");
    }

    #[test]
    fn system_messages_become_system_instruction() {
        let request = ProviderRequest::new(
            "gemini-2.0-flash",
            vec![Message::system("Answer in one line"), Message::user("2+2?")],
        );
        let body = GeminiProvider::build_body(&request);
        assert_eq!(body["systemInstruction"]["parts"][0]["text"], "Answer in one line");
        assert_eq!(body["contents"].as_array().unwrap().len(), 1);
        assert_eq!(body["contents"][0]["role"], "user");
        assert_eq!(body["contents"][0]["parts"][0]["text"], "2+2?");
    }

    #[test]
    fn assistant_role_maps_to_model() {
        let binding = [Message::assistant("ok")];
        let (_, rest) = GeminiProvider::extract_system(&binding);
        let contents = GeminiProvider::to_api_contents(&rest);
        assert_eq!(contents[0].role.as_deref(), Some("model"));
    }

    #[test]
    fn generation_config_carries_limits() {
        let mut request = ProviderRequest::new("m", vec![Message::user("hi")]);
        request.max_tokens = Some(256);
        request.stop = vec!["\n\n".into()];
        let body = GeminiProvider::build_body(&request);
        assert_eq!(body["generationConfig"]["maxOutputTokens"], 256);
        assert_eq!(body["generationConfig"]["stopSequences"][0], "\n\n");
        assert!(body.get("systemInstruction").is_none());
    }

    #[test]
    fn parse_generate_content_response() {
        let data = r#"{
            "candidates": [{
                "content": {"role": "model", "parts": [{"text": "FINAL_ANSWER: "}, {"text": "[42]"}]},
                "finishReason": "STOP"
            }],
            "usageMetadata": {"promptTokenCount": 12, "candidatesTokenCount": 4, "totalTokenCount": 16},
            "modelVersion": "gemini-2.0-flash-001"
        }"#;
        let parsed: GeminiResponse = serde_json::from_str(data).unwrap();
        let response = GeminiProvider::response_to_provider_response("gemini-2.0-flash", parsed).unwrap();
        assert_eq!(response.message.content, "FINAL_ANSWER: [42]");
        assert_eq!(response.message.role, Role::Assistant);
        assert_eq!(response.model, "gemini-2.0-flash-001");
        assert_eq!(response.usage.unwrap().total_tokens, 16);
    }

    #[test]
    fn empty_candidates_is_api_error() {
        let parsed: GeminiResponse = serde_json::from_str(r#"{"candidates": []}"#).unwrap();
        let err = GeminiProvider::response_to_provider_response("m", parsed).unwrap_err();
        assert!(matches!(err, ProviderError::ApiError { .. }));
    }

    #[tokio::test]
    async fn missing_key_is_not_configured() {
        let p = GeminiProvider::new("", Duration::from_secs(1));
        let err = p
            .complete(ProviderRequest::new("m", vec![Message::user("hi")]))
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::NotConfigured(_)));
    }
}
