//! Per-run memory record.
//!
//! Holds user preferences and a little run context (last tool, last
//! result, final answer). The record is created at the start of a run,
//! owned by the loop while it runs, and handed back in the run report.
//! Nothing is persisted.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const LAST_TOOL: &str = "last_tool";
pub const LAST_RESULT: &str = "last_result";
pub const FINAL_ANSWER: &str = "final_answer";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryRecord {
    entries: BTreeMap<String, String>,
}

impl MemoryRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a record from configured preferences.
    pub fn from_preferences<I, K, V>(preferences: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            entries: preferences
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Insert or overwrite a value, returning the previous one.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.entries.insert(key.into(), value.into())
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Preferences as prompt text, skipping the run bookkeeping keys.
    pub fn preferences_text(&self) -> String {
        self.iter()
            .filter(|(k, _)| ![LAST_TOOL, LAST_RESULT, FINAL_ANSWER].contains(k))
            .map(|(_, v)| v)
            .collect::<Vec<_>>()
            .join("; ")
    }
}
