//! Tool trait: the abstraction over agent capabilities.
//!
//! Tools are the fixed set of local functions the model can ask for by
//! name: arithmetic, sequences, image rendering, e-mail. Each one declares
//! an ordered argument schema that the registry uses to coerce the raw
//! tokens of a [`FunctionCall`] before invoking it.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use crate::args::{self, ArgValue, Param};
use crate::error::ToolError;
use crate::value::ToolValue;

/// A request to execute a tool, as parsed from the model's reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionCall {
    /// Name of the tool to execute
    pub name: String,

    /// Raw argument tokens, in order
    pub arguments: Vec<String>,
}

impl FunctionCall {
    pub fn new(name: impl Into<String>, arguments: Vec<String>) -> Self {
        Self {
            name: name.into(),
            arguments,
        }
    }
}

impl fmt::Display for FunctionCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.name, self.arguments.join(", "))
    }
}

/// The core Tool trait.
///
/// Tools are registered in the [`ToolRegistry`] and made available to the
/// decision stage through the catalogue.
#[async_trait]
pub trait Tool: Send + Sync {
    /// The unique name of this tool (e.g., "add", "send_email").
    fn name(&self) -> &str;

    /// A one-line description of what this tool does (sent to the LLM).
    fn description(&self) -> &str;

    /// The ordered argument schema.
    fn params(&self) -> &[Param];

    /// Execute the tool with arguments already coerced to `params()`.
    async fn execute(&self, args: Vec<ArgValue>) -> Result<ToolValue, ToolError>;

    /// Catalogue line, e.g. `- add(a: number, b: number) - Add two numbers.`
    fn signature(&self) -> String {
        let params: Vec<String> = self
            .params()
            .iter()
            .map(|p| format!("{}: {}", p.name, p.kind))
            .collect();
        format!("- {}({}) - {}", self.name(), params.join(", "), self.description())
    }
}

/// A registry of available tools.
///
/// The loop uses this to:
/// 1. Render the tool catalogue for the decision prompt
/// 2. Validate tool names while parsing decisions
/// 3. Coerce arguments and execute tools
pub struct ToolRegistry {
    tools: HashMap<String, Box<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
        }
    }

    /// Register a tool. Replaces any existing tool with the same name.
    pub fn register(&mut self, tool: Box<dyn Tool>) {
        let name = tool.name().to_string();
        self.tools.insert(name, tool);
    }

    /// Get a tool by name.
    pub fn get(&self, name: &str) -> Option<&dyn Tool> {
        self.tools.get(name).map(|t| t.as_ref())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// The tool catalogue, one signature per line, sorted alphabetically.
    pub fn catalogue(&self) -> String {
        let mut lines: Vec<String> = self.tools.values().map(|t| t.signature()).collect();
        lines.sort();
        lines.join("\n")
    }

    /// Coerce the call's raw arguments against the tool schema and run it.
    pub async fn execute(&self, call: &FunctionCall) -> Result<ToolValue, ToolError> {
        let tool = self
            .tools
            .get(&call.name)
            .ok_or_else(|| ToolError::NotFound(call.name.clone()))?;
        let args = args::coerce(&call.name, tool.params(), &call.arguments)?;
        tracing::debug!(tool = %call.name, ?args, "Executing tool");
        tool.execute(args).await
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}
