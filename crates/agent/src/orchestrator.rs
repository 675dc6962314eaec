//! The orchestration loop: Perceive → Decide → CallTool, until the model
//! gives a final answer, the iteration cap is hit, or the run is cancelled.
//!
//! Recoverable failures (bad replies, model errors and timeouts, tool
//! errors) become context entries so the model can correct itself; each
//! one uses up an iteration. The cap is checked after the iteration's
//! work is done. A run never returns an error: every outcome is a
//! [`RunReport`].

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use reckon_config::{AgentSettings, AppConfig};
use reckon_core::error::{ProviderError, ToolError};
use reckon_core::memory::{self, MemoryRecord};
use reckon_core::provider::Provider;
use reckon_core::tool::{FunctionCall, ToolRegistry};
use reckon_core::value::ToolValue;
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, debug, error, info, info_span, warn};
use uuid::Uuid;

use crate::context::{EntryKind, IterationContext};
use crate::decision::{Decider, DecisionInput};
use crate::parser::{self, Decision, FinalAnswer};
use crate::perception::Perception;

/// Why a run ended without an answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureReason {
    MaxIterationsExceeded,
    Cancelled,
}

impl std::fmt::Display for FailureReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FailureReason::MaxIterationsExceeded => f.write_str("maximum iterations exceeded"),
            FailureReason::Cancelled => f.write_str("cancelled"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RunOutcome {
    Finished {
        answer: FinalAnswer,
    },
    Failed {
        reason: FailureReason,
        /// The most recent recoverable error, if any occurred.
        last_error: Option<String>,
        /// Iteration the run stopped at.
        iteration: u32,
    },
}

/// Everything a run produced.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub run_id: Uuid,
    pub query: String,
    pub outcome: RunOutcome,
    /// Iterations used (tool calls plus failed attempts).
    pub iterations: u32,
    pub context: IterationContext,
    pub memory: MemoryRecord,
}

impl RunReport {
    pub fn is_finished(&self) -> bool {
        matches!(self.outcome, RunOutcome::Finished { .. })
    }

    pub fn answer(&self) -> Option<&str> {
        match &self.outcome {
            RunOutcome::Finished { answer } => Some(&answer.value),
            RunOutcome::Failed { .. } => None,
        }
    }
}

/// Drives one query to completion.
pub struct Orchestrator {
    perception: Perception,
    decider: Decider,
    tools: Arc<ToolRegistry>,
    settings: AgentSettings,
    preferences: Vec<(String, String)>,
}

/// Mutable per-run state, owned by the loop.
struct RunState {
    context: IterationContext,
    memory: MemoryRecord,
    iteration: u32,
    last_error: Option<String>,
    last_reply: Option<String>,
    last_call: Option<FunctionCall>,
}

impl Orchestrator {
    pub fn new(provider: Arc<dyn Provider>, model: impl Into<String>, tools: Arc<ToolRegistry>) -> Self {
        let model = model.into();
        let settings = AgentSettings::default();
        Self {
            perception: Perception::new(provider.clone(), &model, settings.request_timeout()),
            decider: Decider::new(provider, &model, settings.request_timeout()),
            tools,
            settings,
            preferences: vec![],
        }
    }

    /// Build from application config: model, sampling, limits and preferences.
    pub fn from_config(provider: Arc<dyn Provider>, tools: Arc<ToolRegistry>, config: &AppConfig) -> Self {
        let model = config
            .providers
            .get(&config.default_provider)
            .and_then(|p| p.default_model.clone())
            .unwrap_or_else(|| config.default_model.clone());
        let timeout = config.agent.request_timeout();

        Self {
            perception: Perception::new(provider.clone(), &model, timeout)
                .with_temperature(config.temperature)
                .with_max_tokens(config.max_tokens),
            decider: Decider::new(provider, &model, timeout)
                .with_temperature(config.temperature)
                .with_max_tokens(config.max_tokens),
            tools,
            settings: config.agent.clone(),
            preferences: config
                .preferences
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        }
    }

    /// Replace limits and timeouts.
    pub fn with_settings(mut self, settings: AgentSettings) -> Self {
        let timeout = settings.request_timeout();
        self.perception = self.perception.with_timeout(timeout);
        self.decider = self.decider.with_timeout(timeout);
        self.settings = settings;
        self
    }

    /// Override the iteration cap. The first iteration always runs, so a
    /// cap of 0 stops after it; `AppConfig::validate` and the CLI reject 0.
    pub fn with_max_iterations(mut self, max: u32) -> Self {
        self.settings.max_iterations = max;
        self
    }

    pub fn with_preference(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.preferences.push((key.into(), value.into()));
        self
    }

    pub fn settings(&self) -> &AgentSettings {
        &self.settings
    }

    /// Run a query. Never fails; the outcome is in the report.
    pub async fn run(&self, query: &str, cancel: CancellationToken) -> RunReport {
        let run_id = Uuid::new_v4();
        let span = info_span!("run", %run_id);
        self.run_inner(run_id, query, cancel).instrument(span).await
    }

    async fn run_inner(&self, run_id: Uuid, query: &str, cancel: CancellationToken) -> RunReport {
        let max = self.settings.max_iterations;
        info!(max_iterations = max, tools = self.tools.len(), "Run starting");

        let mut state = RunState {
            context: IterationContext::new(),
            memory: MemoryRecord::from_preferences(self.preferences.iter().cloned()),
            iteration: 0,
            last_error: None,
            last_reply: None,
            last_call: None,
        };
        let system_prompt = Decider::system_prompt(&self.tools.catalogue());

        let outcome = loop {
            if cancel.is_cancelled() {
                break self.fail(&state, FailureReason::Cancelled);
            }
            let attempt = state.iteration + 1;
            debug!(attempt, "Iteration starting");

            // ── Perceive ──
            if attempt == 1 || self.settings.perceive_each_iteration {
                let history = state.context.history();
                match cancellable(&cancel, self.perception.perceive(query, &history)).await {
                    None => break self.fail(&state, FailureReason::Cancelled),
                    Some(Ok(facts)) => state.context.push(attempt, EntryKind::Perception, facts.summary()),
                    Some(Err(e)) => warn!(attempt, error = %e, "Perception failed, continuing without new facts"),
                }
            }

            // ── Decide ──
            let history = state.context.history();
            let preferences = state.memory.preferences_text();
            let input = DecisionInput {
                query,
                facts: state.context.latest_facts(),
                preferences: &preferences,
                history: &history,
            };
            let reply = match cancellable(&cancel, self.decider.request(&system_prompt, &input)).await {
                None => break self.fail(&state, FailureReason::Cancelled),
                Some(Ok(reply)) => reply,
                Some(Err(e)) => {
                    let kind = if matches!(e, ProviderError::Timeout(_)) { "timed out" } else { "failed" };
                    warn!(attempt, error = %e, "Decision call {kind}");
                    state.context.record_llm_error(attempt, &e.to_string());
                    state.last_error = Some(e.to_string());
                    if let Some(outcome) = self.finish_iteration(&mut state) {
                        break outcome;
                    }
                    continue;
                }
            };
            state.last_reply = Some(reply.clone());

            let call = match parser::parse(&reply, &self.tools) {
                Ok(Decision::FinalAnswer(answer)) => {
                    state.memory.set(memory::FINAL_ANSWER, answer.value.clone());
                    info!(iterations = state.iteration, answer = %answer.value, "Final answer");
                    break RunOutcome::Finished { answer };
                }
                Ok(Decision::FunctionCall(call)) => call,
                Err(e) => {
                    warn!(attempt, error = %e, reply = %reply, "Unusable decision reply");
                    state.context.record_decision_error(attempt, &e.to_string());
                    state.last_error = Some(e.to_string());
                    if let Some(outcome) = self.finish_iteration(&mut state) {
                        break outcome;
                    }
                    continue;
                }
            };

            // ── Call tool ──
            info!(attempt, call = %call, "Calling tool");
            state.last_call = Some(call.clone());
            let tool_timeout = self.settings.tool_timeout();
            let result = match cancellable(&cancel, self.call_tool(&call, tool_timeout)).await {
                None => break self.fail(&state, FailureReason::Cancelled),
                Some(result) => result,
            };

            state.memory.set(memory::LAST_TOOL, call.name.clone());
            match result {
                Ok(value) => {
                    let rendered = value.to_string();
                    info!(attempt, tool = %call.name, result = %rendered, "Tool returned");
                    state.context.record_tool_result(attempt, &call, &rendered);
                    state.memory.set(memory::LAST_RESULT, rendered);
                }
                Err(e) => {
                    warn!(attempt, tool = %call.name, error = %e, "Tool failed");
                    state.context.record_tool_error(attempt, &call, &e.to_string());
                    state.last_error = Some(e.to_string());
                }
            }

            if let Some(outcome) = self.finish_iteration(&mut state) {
                break outcome;
            }
        };

        RunReport {
            run_id,
            query: query.to_string(),
            outcome,
            iterations: state.iteration,
            context: state.context,
            memory: state.memory,
        }
    }

    async fn call_tool(
        &self,
        call: &FunctionCall,
        timeout: Duration,
    ) -> Result<ToolValue, ToolError> {
        match tokio::time::timeout(timeout, self.tools.execute(call)).await {
            Ok(result) => result,
            Err(_) => Err(ToolError::Timeout {
                tool_name: call.name.clone(),
                timeout_secs: timeout.as_secs(),
            }),
        }
    }

    /// Count the iteration; past the cap the run fails.
    fn finish_iteration(&self, state: &mut RunState) -> Option<RunOutcome> {
        state.iteration += 1;
        (state.iteration >= self.settings.max_iterations)
            .then(|| self.fail(state, FailureReason::MaxIterationsExceeded))
    }

    fn fail(&self, state: &RunState, reason: FailureReason) -> RunOutcome {
        error!(
            iteration = state.iteration,
            reason = %reason,
            last_error = ?state.last_error,
            last_reply = ?state.last_reply,
            last_call = ?state.last_call,
            "Run failed"
        );
        RunOutcome::Failed {
            reason,
            last_error: state.last_error.clone(),
            iteration: state.iteration,
        }
    }
}

/// Race `fut` against cancellation; `None` means cancelled first.
async fn cancellable<F: Future>(cancel: &CancellationToken, fut: F) -> Option<F::Output> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => None,
        out = fut => Some(out),
    }
}
