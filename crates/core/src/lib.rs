//! # Reckon Core
//!
//! Domain types, traits, and error definitions for the Reckon tool-calling
//! agent. This crate has **no framework dependencies**: it defines the
//! domain model that the provider, tool and agent crates implement against.
//!
//! ## Design Philosophy
//!
//! Every external collaborator (LLM backend, tool) is a trait here.
//! Implementations live in their respective crates, which keeps the loop
//! testable with scripted mocks.

pub mod args;
pub mod error;
pub mod memory;
pub mod message;
pub mod provider;
pub mod tool;
pub mod value;

// Re-export key types at crate root for ergonomics
pub use args::{ArgKind, ArgValue, Number, Param};
pub use error::{DecisionError, Error, PerceptionError, ProviderError, Result, ToolError};
pub use memory::MemoryRecord;
pub use message::{Message, Role};
pub use provider::{Provider, ProviderRequest, ProviderResponse, Usage};
pub use tool::{FunctionCall, Tool, ToolRegistry};
pub use value::ToolValue;
