//! Shared test helpers for loop tests.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;
use async_trait::async_trait;
use reckon_core::args::{ArgKind, ArgValue, Param};
use reckon_core::error::{ProviderError, ToolError};
use reckon_core::message::{Message, Role};
use reckon_core::provider::{Provider, ProviderRequest, ProviderResponse, Usage};
use reckon_core::tool::Tool;
use reckon_core::value::ToolValue;

use crate::perception;

/// A mock provider with a scripted sequence of decision replies.
///
/// Perception requests (recognised by their system prompt) always get the
/// same facts reply and do not consume the script. Once the script runs
/// out the last entry is repeated if `repeat_last` was set; otherwise the
/// provider panics.
pub struct ScriptedProvider {
    script: Mutex<VecDeque<Result<String, ProviderError>>>,
    last: Mutex<Option<Result<String, ProviderError>>>,
    repeat_last: bool,
    facts: String,
    delay: Option<Duration>,
    decision_prompts: Mutex<Vec<String>>,
    perception_calls: Mutex<usize>,
}

impl ScriptedProvider {
    pub fn new<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::from_results(replies.into_iter().map(|r| Ok(r.into())).collect())
    }

    pub fn from_results(replies: Vec<Result<String, ProviderError>>) -> Self {
        Self {
            script: Mutex::new(replies.into()),
            last: Mutex::new(None),
            repeat_last: false,
            facts: r#"{"steps": ["compute"]}"#.into(),
            delay: None,
            decision_prompts: Mutex::new(vec![]),
            perception_calls: Mutex::new(0),
        }
    }

    pub fn repeat_last(mut self) -> Self {
        self.repeat_last = true;
        self
    }

    pub fn with_facts(mut self, facts: &str) -> Self {
        self.facts = facts.into();
        self
    }

    /// Every request sleeps this long before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// User prompts of every decision request, in order.
    pub fn decision_prompts(&self) -> Vec<String> {
        self.decision_prompts.lock().unwrap().clone()
    }

    pub fn perception_calls(&self) -> usize {
        *self.perception_calls.lock().unwrap()
    }

    /// Total requests received, perception included.
    pub fn calls(&self) -> usize {
        self.perception_calls() + self.decision_prompts.lock().unwrap().len()
    }

    fn next_reply(&self) -> Result<String, ProviderError> {
        let next = self.script.lock().unwrap().pop_front();
        let mut last = self.last.lock().unwrap();
        match next {
            Some(reply) => {
                *last = Some(reply.clone());
                reply
            }
            None if self.repeat_last => last.clone().expect("script was empty"),
            None => panic!("ScriptedProvider: no more replies"),
        }
    }
}

#[async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        let is_perception = request
            .messages
            .iter()
            .any(|m| m.role == Role::System && m.content == perception::SYSTEM_PROMPT);
        let prompt = request
            .messages
            .iter()
            .rev()
            .find(|m| m.role == Role::User)
            .map(|m| m.content.clone())
            .unwrap_or_default();

        let reply = if is_perception {
            *self.perception_calls.lock().unwrap() += 1;
            Ok(self.facts.clone())
        } else {
            self.decision_prompts.lock().unwrap().push(prompt);
            self.next_reply()
        };

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        reply.map(|text| make_text_response(&text))
    }
}

pub fn make_text_response(text: &str) -> ProviderResponse {
    ProviderResponse {
        message: Message::assistant(text),
        usage: Some(Usage {
            prompt_tokens: 10,
            completion_tokens: 5,
            total_tokens: 15,
        }),
        model: "mock-model".into(),
    }
}

/// A tool that never finishes in test time.
pub struct SlowTool;

const SLOW_PARAMS: &[Param] = &[Param::new("input", ArgKind::Text)];

#[async_trait]
impl Tool for SlowTool {
    fn name(&self) -> &str {
        "slow"
    }

    fn description(&self) -> &str {
        "Sleeps for an hour."
    }

    fn params(&self) -> &[Param] {
        SLOW_PARAMS
    }

    async fn execute(&self, _args: Vec<ArgValue>) -> Result<ToolValue, ToolError> {
        tokio::time::sleep(Duration::from_secs(3600)).await;
        Ok(ToolValue::Text("done".into()))
    }
}
