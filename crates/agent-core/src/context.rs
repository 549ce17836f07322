//! Execution context shared by the agents of a crew run
//!
//! The `Context` carries the crew inputs (the values interpolated into agent
//! and task prompts) and the outputs of the tasks completed so far.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Well-known input keys
pub mod keys {
    /// Exchange ticker under research (e.g., "AAPL")
    pub const TICKER: &str = "ticker";
    /// Start of the research window, `YYYY-MM-DD`
    pub const START_DATE: &str = "start_date";
    /// End of the research window, `YYYY-MM-DD`
    pub const END_DATE: &str = "end_date";
}

/// Output of one completed task
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskRecord {
    /// Task name
    pub task: String,
    /// Role of the agent that produced the output
    pub agent: String,
    /// Raw output text
    pub output: String,
}

/// Context passed to agents during a crew run
///
/// # Example
///
/// ```
/// use agent_core::Context;
///
/// let ctx = Context::new()
///     .with_input("ticker", "AAPL")
///     .with_input("start_date", "2024-01-01");
///
/// assert_eq!(ctx.ticker(), Some("AAPL"));
/// assert_eq!(ctx.start_date(), Some("2024-01-01"));
/// assert!(ctx.end_date().is_none());
/// ```
#[derive(Debug, Clone, Default)]
pub struct Context {
    inputs: BTreeMap<String, String>,
    tasks: Vec<TaskRecord>,
}

impl Context {
    /// Create a new empty context
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a context from an input map
    pub fn from_inputs<I, K, V>(inputs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            inputs: inputs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
            tasks: Vec::new(),
        }
    }

    // =========== Inputs ===========

    /// Add an input value
    pub fn with_input(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert_input(key, value);
        self
    }

    /// Insert or replace an input value
    pub fn insert_input(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.inputs.insert(key.into(), value.into());
    }

    /// Get an input value
    pub fn input(&self, key: &str) -> Option<&str> {
        self.inputs.get(key).map(String::as_str)
    }

    /// Get an input value, failing with [`crate::Error::MissingInput`]
    pub fn require_input(&self, key: &str) -> crate::Result<&str> {
        self.input(key)
            .ok_or_else(|| crate::Error::MissingInput(key.to_string()))
    }

    /// The ticker under research
    pub fn ticker(&self) -> Option<&str> {
        self.input(keys::TICKER)
    }

    /// Start of the research window
    pub fn start_date(&self) -> Option<&str> {
        self.input(keys::START_DATE)
    }

    /// End of the research window
    pub fn end_date(&self) -> Option<&str> {
        self.input(keys::END_DATE)
    }

    /// All inputs as a JSON object, ready for template rendering
    pub fn inputs_json(&self) -> Value {
        let map: Map<String, Value> = self
            .inputs
            .iter()
            .map(|(k, v)| (k.clone(), Value::String(v.clone())))
            .collect();
        Value::Object(map)
    }

    /// Number of inputs
    pub fn input_count(&self) -> usize {
        self.inputs.len()
    }

    // =========== Task outputs ===========

    /// Record the output of a finished task
    pub fn record_task(&mut self, record: TaskRecord) {
        tracing::debug!(task = %record.task, agent = %record.agent, "Task output recorded");
        self.tasks.push(record);
    }

    /// Output of a task by name (latest wins if a name repeats)
    pub fn task_output(&self, task: &str) -> Option<&str> {
        self.tasks
            .iter()
            .rev()
            .find(|r| r.task == task)
            .map(|r| r.output.as_str())
    }

    /// Output of the most recently completed task
    pub fn last_output(&self) -> Option<&str> {
        self.tasks.last().map(|r| r.output.as_str())
    }

    /// All task records in completion order
    pub fn task_records(&self) -> &[TaskRecord] {
        &self.tasks
    }

    /// Consume the context, returning its task records
    pub fn into_task_records(self) -> Vec<TaskRecord> {
        self.tasks
    }
}
