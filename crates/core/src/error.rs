//! Error types for the Reckon domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each stage of the loop has its own error enum; the top-level
//! [`Error`] wraps them for callers that do not care which stage failed.

use thiserror::Error;

/// The top-level error type for all Reckon operations.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("Tool error: {0}")]
    Tool(#[from] ToolError),

    #[error("Decision error: {0}")]
    Decision(#[from] DecisionError),

    #[error("Perception error: {0}")]
    Perception(#[from] PerceptionError),

    #[error("Configuration error: {message}")]
    Config { message: String },
}

impl Error {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Stage errors ---

#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError { status_code: u16, message: String },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),
}

/// Failures raised by a tool or by the dispatch step in front of it.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ToolError {
    #[error("Tool not found: {0}")]
    NotFound(String),

    #[error("Invalid argument for {tool_name}: {reason}")]
    InvalidArgument { tool_name: String, reason: String },

    #[error("External service failure in {tool_name}: {reason}")]
    ExternalService { tool_name: String, reason: String },

    #[error("Tool timed out: {tool_name} after {timeout_secs}s")]
    Timeout { tool_name: String, timeout_secs: u64 },
}

impl ToolError {
    pub fn invalid(tool_name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            tool_name: tool_name.into(),
            reason: reason.into(),
        }
    }

    pub fn external(tool_name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ExternalService {
            tool_name: tool_name.into(),
            reason: reason.into(),
        }
    }
}

/// The decision text could not be turned into a function call or a final answer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecisionError {
    #[error("LLM returned an empty response")]
    EmptyResponse,

    #[error("no FUNCTION_CALL: or FINAL_ANSWER: line found in response")]
    NoMarker,

    #[error("FUNCTION_CALL line has no function name")]
    MissingFunctionName,

    #[error("unknown tool '{0}'")]
    UnknownTool(String),

    #[error("FINAL_ANSWER line has no answer text")]
    EmptyFinalAnswer,
}

#[derive(Debug, Clone, Error)]
pub enum PerceptionError {
    #[error("LLM returned an empty fact summary")]
    EmptyResponse,

    #[error("fact extraction timed out after {0}s")]
    Timeout(u64),

    #[error("fact extraction failed: {0}")]
    Provider(#[from] ProviderError),
}
