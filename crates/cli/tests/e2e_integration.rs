//! End-to-end integration tests for the Reckon agent.
//!
//! These drive the full loop (perception, decision, tool dispatch, context,
//! memory) with a scripted model and the real tool registry. The image and
//! e-mail tools are swapped for recording fakes so no font, display or SMTP
//! server is needed.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use reckon_agent::{EntryKind, FailureReason, Orchestrator, RunOutcome};
use reckon_config::{AgentSettings, AppConfig};
use reckon_core::args::{ArgKind, ArgValue, Param};
use reckon_core::error::{ProviderError, ToolError};
use reckon_core::memory;
use reckon_core::message::{Message, Role};
use reckon_core::provider::{Provider, ProviderRequest, ProviderResponse};
use reckon_core::tool::{Tool, ToolRegistry};
use reckon_core::value::ToolValue;
use reckon_tools::default_registry;
use tokio_util::sync::CancellationToken;

// ── Mock Provider ────────────────────────────────────────────────────────

/// Answers perception requests with fixed facts and decision requests from
/// a script, recording every decision prompt.
struct ScriptedProvider {
    replies: Mutex<VecDeque<String>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedProvider {
    fn new(replies: &[&str]) -> Self {
        Self {
            replies: Mutex::new(replies.iter().map(|r| r.to_string()).collect()),
            prompts: Mutex::new(vec![]),
        }
    }

    fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        "e2e_mock"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        let is_perception = request
            .messages
            .iter()
            .any(|m| m.role == Role::System && m.content == reckon_agent::perception::SYSTEM_PROMPT);

        let text = if is_perception {
            r#"{"steps": ["ascii_conversion", "exponential_sum", "create_image", "email"], "parameters": {"text": "INDIA"}}"#
                .to_string()
        } else {
            let prompt = request.messages.last().map(|m| m.content.clone()).unwrap_or_default();
            self.prompts.lock().unwrap().push(prompt);
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .expect("ScriptedProvider exhausted")
        };

        Ok(ProviderResponse {
            message: Message::assistant(text),
            usage: None,
            model: "mock".into(),
        })
    }
}

// ── Recording fakes for side-effecting tools ─────────────────────────────

#[derive(Default)]
struct Outbox(Mutex<Vec<Vec<String>>>);

impl Outbox {
    fn record(&self, args: &[ArgValue]) {
        let texts = args
            .iter()
            .map(|a| a.as_text().unwrap_or_default().to_string())
            .collect();
        self.0.lock().unwrap().push(texts);
    }

    fn calls(&self) -> Vec<Vec<String>> {
        self.0.lock().unwrap().clone()
    }
}

const IMAGE_PARAMS: &[Param] = &[Param::new("text", ArgKind::Text), Param::new("path", ArgKind::Text)];
const TEXT_PARAM: &[Param] = &[Param::new("text", ArgKind::Text)];

struct FakeImage(Arc<Outbox>);

#[async_trait::async_trait]
impl Tool for FakeImage {
    fn name(&self) -> &str { "create_image_with_text" }
    fn description(&self) -> &str { "Render text into an image." }
    fn params(&self) -> &[Param] { IMAGE_PARAMS }
    async fn execute(&self, args: Vec<ArgValue>) -> Result<ToolValue, ToolError> {
        self.0.record(&args);
        let path = args[1].as_text().unwrap_or_default();
        Ok(ToolValue::Text(format!("Image created successfully: {path}")))
    }
}

struct FakeViewer;

#[async_trait::async_trait]
impl Tool for FakeViewer {
    fn name(&self) -> &str { "open_image_in_preview" }
    fn description(&self) -> &str { "Open an image." }
    fn params(&self) -> &[Param] { TEXT_PARAM }
    async fn execute(&self, args: Vec<ArgValue>) -> Result<ToolValue, ToolError> {
        let path = args[0].as_text().unwrap_or_default();
        Ok(ToolValue::Text(format!("Opened {path} in the image viewer")))
    }
}

struct FakeEmail(Arc<Outbox>);

#[async_trait::async_trait]
impl Tool for FakeEmail {
    fn name(&self) -> &str { "send_email" }
    fn description(&self) -> &str { "Send an email." }
    fn params(&self) -> &[Param] { TEXT_PARAM }
    async fn execute(&self, args: Vec<ArgValue>) -> Result<ToolValue, ToolError> {
        self.0.record(&args);
        Ok(ToolValue::Text("Email sent successfully!".into()))
    }
}

struct Harness {
    tools: Arc<ToolRegistry>,
    images: Arc<Outbox>,
    emails: Arc<Outbox>,
}

fn harness() -> Harness {
    let images = Arc::new(Outbox::default());
    let emails = Arc::new(Outbox::default());
    let mut tools = default_registry(&AppConfig::default());
    tools.register(Box::new(FakeImage(images.clone())));
    tools.register(Box::new(FakeViewer));
    tools.register(Box::new(FakeEmail(emails.clone())));
    Harness {
        tools: Arc::new(tools),
        images,
        emails,
    }
}

/// Σ eˣ over the code points of INDIA, as the tool renders it.
const INDIA_SUM: &str = "7.599822246093079e+33";

// ── E2E: the INDIA scenario ──────────────────────────────────────────────

#[tokio::test]
async fn e2e_india_ascii_exponential_sum_image_and_email() {
    let sum = INDIA_SUM;
    let dir = tempfile::tempdir().unwrap();
    let image_path = dir.path().join("result.png").display().to_string();

    let image_call = format!("FUNCTION_CALL: create_image_with_text|{sum}|{image_path}");
    let view_call = format!("FUNCTION_CALL: open_image_in_preview|{image_path}");
    let email_call = format!("FUNCTION_CALL: send_email|Final answer: {sum}");
    let provider = Arc::new(ScriptedProvider::new(&[
        "FUNCTION_CALL: strings_to_chars_to_int|INDIA",
        "FUNCTION_CALL: int_list_to_exponential_sum|[73, 78, 68, 73, 65]",
        &image_call,
        &view_call,
        &email_call,
        "FINAL_ANSWER: [ALL TASKS COMPLETED]",
    ]));
    let h = harness();

    let config = AppConfig::default();
    let agent = Orchestrator::from_config(provider.clone(), h.tools.clone(), &config);
    let report = agent
        .run(
            "Find the ASCII values of characters in INDIA and then return sum of exponentials of those values.",
            CancellationToken::new(),
        )
        .await;

    assert_eq!(report.answer(), Some("[ALL TASKS COMPLETED]"));
    assert_eq!(report.iterations, 5);

    let results: Vec<&str> = report
        .context
        .entries()
        .iter()
        .filter(|e| e.kind == EntryKind::ToolResult)
        .map(|e| e.summary.as_str())
        .collect();
    assert_eq!(results.len(), 5);
    assert_eq!(
        results[0],
        "In the 1 iteration you called strings_to_chars_to_int with parameters ['INDIA'] \
         and the function returned [73, 78, 68, 73, 65]."
    );
    assert_eq!(
        results[1],
        format!(
            "In the 2 iteration you called int_list_to_exponential_sum with parameters \
             ['[73, 78, 68, 73, 65]'] and the function returned {sum}."
        )
    );
    assert!(results[2].ends_with(&format!("the function returned Image created successfully: {image_path}.")));
    assert!(results[3].contains("open_image_in_preview"));
    assert!(results[4].ends_with("the function returned Email sent successfully!."));

    assert_eq!(h.images.calls(), vec![vec![sum.to_string(), image_path.clone()]]);
    assert_eq!(h.emails.calls(), vec![vec![format!("Final answer: {sum}")]]);

    assert_eq!(report.memory.get(memory::LAST_TOOL), Some("send_email"));
    assert_eq!(report.memory.get(memory::LAST_RESULT), Some("Email sent successfully!"));
    assert_eq!(report.memory.get(memory::FINAL_ANSWER), Some("[ALL TASKS COMPLETED]"));

    // Each decision prompt carries preferences, facts and everything so far.
    let prompts = provider.prompts();
    assert_eq!(prompts.len(), 6);
    assert!(prompts[0].contains("User preferences: user likes blue color and bold text"));
    assert!(prompts[0].contains("Facts extracted: {"));
    assert!(!prompts[0].contains("What should I do next?"));
    assert!(prompts[5].contains(results[3]));
    assert!(prompts[5].ends_with("What should I do next?"));
}

#[tokio::test]
async fn e2e_model_recovers_from_a_bad_call() {
    let provider = Arc::new(ScriptedProvider::new(&[
        "Let me think about this first.",
        "FUNCTION_CALL: fibonacci_numbers|-1",
        "FUNCTION_CALL: fibonacci_numbers|5",
        "FINAL_ANSWER: [0, 1, 1, 2, 3]",
    ]));
    let h = harness();
    let agent = Orchestrator::from_config(provider, h.tools, &AppConfig::default());

    let report = agent.run("First five Fibonacci numbers", CancellationToken::new()).await;

    assert_eq!(report.answer(), Some("[0, 1, 1, 2, 3]"));
    assert_eq!(report.iterations, 3);
    let kinds: Vec<EntryKind> = report
        .context
        .entries()
        .iter()
        .map(|e| e.kind)
        .filter(|k| *k != EntryKind::Perception)
        .collect();
    assert_eq!(
        kinds,
        vec![EntryKind::DecisionError, EntryKind::ToolError, EntryKind::ToolResult]
    );
    assert_eq!(report.memory.get(memory::LAST_RESULT), Some("[0, 1, 1, 2, 3]"));
}

#[tokio::test]
async fn e2e_iteration_cap_stops_a_looping_model() {
    let provider = Arc::new(ScriptedProvider::new(&[
        "FUNCTION_CALL: add|1|1",
        "FUNCTION_CALL: add|2|2",
        "FUNCTION_CALL: add|3|3",
    ]));
    let h = harness();
    let agent = Orchestrator::from_config(provider.clone(), h.tools, &AppConfig::default())
        .with_settings(AgentSettings {
            max_iterations: 3,
            ..AgentSettings::default()
        });

    let report = agent.run("count forever", CancellationToken::new()).await;

    assert_eq!(
        report.outcome,
        RunOutcome::Failed {
            reason: FailureReason::MaxIterationsExceeded,
            last_error: None,
            iteration: 3,
        }
    );
    assert_eq!(report.memory.get(memory::LAST_RESULT), Some("6"));
    assert_eq!(provider.prompts().len(), 3);
}
