//! Decision stage: asks the model for the next step.
//!
//! The system prompt lists the tool catalogue and demands a single line,
//! either `FUNCTION_CALL: name|arg|…` or `FINAL_ANSWER: text`. This module
//! builds the prompts and fetches the reply; [`crate::parser`] turns the
//! reply into a [`crate::parser::Decision`].

use std::sync::Arc;
use std::time::Duration;
use reckon_core::error::ProviderError;
use reckon_core::message::Message;
use reckon_core::provider::{Provider, ProviderRequest};
use tracing::debug;

/// Everything the decision prompt is built from.
pub struct DecisionInput<'a> {
    pub query: &'a str,
    pub facts: Option<&'a str>,
    pub preferences: &'a str,
    pub history: &'a str,
}

pub struct Decider {
    provider: Arc<dyn Provider>,
    model: String,
    temperature: f32,
    max_tokens: Option<u32>,
    timeout: Duration,
}

impl Decider {
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

    pub fn system_prompt(catalogue: &str) -> String {
        format!(
            r#"You are a math agent solving problems iteratively using reasoning and mathematical tools.
First show your reasoning by calling appropriate tools, then calculate and verify each step.

Available tools:
{catalogue}

You must respond with EXACTLY ONE line in one of these formats (no additional text):
1. For function calls:
   FUNCTION_CALL: function_name|value1|value2|...

2. For final answers:
   FINAL_ANSWER: [number or text]

Mandatory Rules:
- Think step-by-step before each tool call. Show your reasoning by calling appropriate tools.
- Always process and understand all values returned by a function before moving to the next step.
- Pass all required parameters for each function call, in the order shown.
- Only output FINAL_ANSWER after all calculations are verified.
- Never repeat function calls with identical parameters.
- Call exactly one function at a time.

Error Handling:
- If a tool fails or output seems inconsistent, verify the last result or re-evaluate inputs.
- If your previous reply could not be used, answer again in the required format.

Examples:
User: Find the ASCII values of characters in INDIA and calculate sum of exponentials
Assistant: FUNCTION_CALL: show_reasoning|["1. Convert each character in INDIA to ASCII values", "2. Calculate exponential of each ASCII value", "3. Sum all exponentials", "4. Create image with result", "5. Send email with final answer"]
User: Start with the conversion.
Assistant: FUNCTION_CALL: strings_to_chars_to_int|INDIA
User: Now calculate the exponential sum.
Assistant: FUNCTION_CALL: int_list_to_exponential_sum|[73,78,68,73,65]
User: Create image with the result.
Assistant: FUNCTION_CALL: create_image_with_text|7.599822246093079e+33|result.png
User: Open it in the viewer.
Assistant: FUNCTION_CALL: open_image_in_preview|result.png
User: Send email with the result.
Assistant: FUNCTION_CALL: send_email|Final answer: 7.599822246093079e+33
Assistant: FINAL_ANSWER: ALL TASKS COMPLETED

DO NOT include any explanations or additional text.
Your entire response should be a single line starting with either FUNCTION_CALL: or FINAL_ANSWER:"#
        )
    }

    /// The per-iteration prompt: query, extracted facts, preferences, then history.
    pub fn build_prompt(input: &DecisionInput<'_>) -> String {
        let facts = input.facts.unwrap_or("Facts extracted: none");
        let mut prompt = format!(
            "{}\n\nContext:\n{facts}\nUser preferences: {}",
            input.query, input.preferences
        );
        if !input.history.is_empty() {
            prompt.push_str("\n\n");
            prompt.push_str(input.history);
            prompt.push_str("  What should I do next?");
        }
        prompt
    }

    /// Send one decision request; a slow provider becomes `ProviderError::Timeout`.
    pub async fn request(&self, system_prompt: &str, input: &DecisionInput<'_>) -> Result<String, ProviderError> {
        let mut request = ProviderRequest::new(
            &self.model,
            vec![Message::system(system_prompt), Message::user(Self::build_prompt(input))],
        );
        request.temperature = self.temperature;
        request.max_tokens = self.max_tokens;

        let response = tokio::time::timeout(self.timeout, self.provider.complete(request))
            .await
            .map_err(|_| {
                ProviderError::Timeout(format!("no reply within {}s", self.timeout.as_secs()))
            })??;

        debug!(model = %response.model, reply = %response.message.content, "Decision reply");
        Ok(response.message.content)
    }
}
