//! `show_reasoning`: lets the model narrate its plan into the log.

use async_trait::async_trait;
use reckon_core::args::{ArgKind, ArgValue, Param};
use reckon_core::error::ToolError;
use reckon_core::tool::Tool;
use reckon_core::value::ToolValue;
use tracing::info;

pub struct ShowReasoningTool;

const STEPS: &[Param] = &[Param::new("steps", ArgKind::TextList)];

#[async_trait]
impl Tool for ShowReasoningTool {
    fn name(&self) -> &str {
        "show_reasoning"
    }

    fn description(&self) -> &str {
        "Show the step-by-step reasoning for the current task."
    }

    fn params(&self) -> &[Param] {
        STEPS
    }

    async fn execute(&self, args: Vec<ArgValue>) -> Result<ToolValue, ToolError> {
        let steps = args
            .first()
            .and_then(ArgValue::as_text_list)
            .ok_or_else(|| ToolError::invalid(self.name(), "expected a list of steps"))?;

        for (i, step) in split_steps(steps).iter().enumerate() {
            info!(step = i + 1, "{step}");
        }
        Ok(ToolValue::Text("Reasoning shown".into()))
    }
}

/// A single semicolon-separated string counts as several steps.
fn split_steps(steps: &[String]) -> Vec<&str> {
    match steps {
        [only] if only.contains(';') => only
            .split(';')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect(),
        _ => steps.iter().map(|s| s.trim()).collect(),
    }
}
