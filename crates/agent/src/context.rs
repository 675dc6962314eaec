//! Iteration context: the running record the model sees.
//!
//! One context per run, append-only, owned by the orchestrator. Every entry
//! is tagged with the attempt it was produced in and rendered as a single
//! sentence so the model can read back what already happened, including
//! its own mistakes.

use chrono::{DateTime, Utc};
use reckon_core::tool::FunctionCall;
use serde::{Deserialize, Serialize};

/// What produced a context entry.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    /// Facts extracted by the perception stage.
    Perception,
    /// A tool call that returned a value.
    ToolResult,
    /// A tool call that failed (bad arguments, external failure, timeout).
    ToolError,
    /// A reply that did not parse into a decision.
    DecisionError,
    /// The decision call itself failed or timed out.
    LlmError,
}

/// A single entry in the context.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextEntry {
    pub attempt: u32,
    pub kind: EntryKind,
    pub summary: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IterationContext {
    entries: Vec<ContextEntry>,
}

impl IterationContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, attempt: u32, kind: EntryKind, summary: impl Into<String>) {
        self.entries.push(ContextEntry {
            attempt,
            kind,
            summary: summary.into(),
            timestamp: Utc::now(),
        });
    }

    pub fn record_tool_result(&mut self, attempt: u32, call: &FunctionCall, result: &str) {
        self.push(
            attempt,
            EntryKind::ToolResult,
            format!(
                "In the {attempt} iteration you called {} with parameters {} and the function returned {result}.",
                call.name,
                render_params(&call.arguments)
            ),
        );
    }

    pub fn record_tool_error(&mut self, attempt: u32, call: &FunctionCall, error: &str) {
        self.push(
            attempt,
            EntryKind::ToolError,
            format!(
                "In the {attempt} iteration you called {} with parameters {} and the function failed: {error}.",
                call.name,
                render_params(&call.arguments)
            ),
        );
    }

    pub fn record_decision_error(&mut self, attempt: u32, error: &str) {
        self.push(
            attempt,
            EntryKind::DecisionError,
            format!(
                "In the {attempt} iteration your reply could not be used ({error}). \
                 Reply with exactly one FUNCTION_CALL: or FINAL_ANSWER: line."
            ),
        );
    }

    pub fn record_llm_error(&mut self, attempt: u32, error: &str) {
        self.push(
            attempt,
            EntryKind::LlmError,
            format!("In the {attempt} iteration the model call failed: {error}."),
        );
    }

    pub fn entries(&self) -> &[ContextEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The most recent perception summary, if any.
    pub fn latest_facts(&self) -> Option<&str> {
        self.entries
            .iter()
            .rev()
            .find(|e| e.kind == EntryKind::Perception)
            .map(|e| e.summary.as_str())
    }

    /// Everything except perception entries, in order, space-separated.
    pub fn history(&self) -> String {
        self.entries
            .iter()
            .filter(|e| e.kind != EntryKind::Perception)
            .map(|e| e.summary.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// `['INDIA']`-style rendering of raw argument tokens.
fn render_params(args: &[String]) -> String {
    let quoted: Vec<String> = args.iter().map(|a| format!("'{a}'")).collect();
    format!("[{}]", quoted.join(", "))
}
