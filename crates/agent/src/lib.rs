//! The orchestration loop: the heart of Reckon.
//!
//! Each iteration follows a **Perceive → Decide → Call tool** cycle:
//!
//! 1. **Perceive**: ask the model for structured facts about the query
//! 2. **Decide**: send the query, facts, preferences and history and get
//!    back one `FUNCTION_CALL:` or `FINAL_ANSWER:` line
//! 3. **Call tool**: execute the named tool and record the result in the
//!    running context
//!
//! The loop ends on a final answer, when the iteration cap is reached, or
//! when the run is cancelled.

pub mod context;
pub mod decision;
pub mod orchestrator;
pub mod parser;
pub mod perception;

#[cfg(test)]
mod test_helpers;

pub use context::{ContextEntry, EntryKind, IterationContext};
pub use decision::{Decider, DecisionInput};
pub use orchestrator::{FailureReason, Orchestrator, RunOutcome, RunReport};
pub use parser::{Decision, FinalAnswer};
pub use perception::{Facts, Perception};
