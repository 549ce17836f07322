//! Task definitions

use agent_core::Context;
use async_trait::async_trait;
use std::sync::Arc;

/// Data fetched before a task's agent runs
///
/// The fetched text is placed in the task's context block, so the agent
/// starts with the data instead of having to ask a tool for it.
#[async_trait]
pub trait Prefetch: Send + Sync {
    /// Fetch the data for this run
    async fn fetch(&self, context: &Context) -> agent_core::Result<String>;
}

/// A unit of work for the crew
///
/// `description` and `expected_output` may reference crew inputs
/// (`{{ ticker }}`); they are rendered at kickoff.
#[derive(Clone)]
pub struct Task {
    pub(crate) name: String,
    pub(crate) description: String,
    pub(crate) expected_output: String,
    pub(crate) agent: Option<String>,
    pub(crate) context: Vec<String>,
    pub(crate) prefetch: Option<Arc<dyn Prefetch>>,
}

impl Task {
    /// Start building a task
    pub fn builder(name: impl Into<String>) -> TaskBuilder {
        TaskBuilder::new(name)
    }

    /// Task name, unique within a crew
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Description template
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Expected output template
    pub fn expected_output(&self) -> &str {
        &self.expected_output
    }

    /// Role of the assigned agent
    pub fn agent(&self) -> Option<&str> {
        self.agent.as_deref()
    }

    /// Names of the tasks whose outputs form this task's context
    pub fn context(&self) -> &[String] {
        &self.context
    }

    /// Whether the task fetches data before running
    pub fn has_prefetch(&self) -> bool {
        self.prefetch.is_some()
    }
}

impl std::fmt::Debug for Task {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Task")
            .field("name", &self.name)
            .field("agent", &self.agent)
            .field("context", &self.context)
            .field("prefetch", &self.prefetch.is_some())
            .finish_non_exhaustive()
    }
}

/// Builder for [`Task`]
pub struct TaskBuilder {
    task: Task,
}

impl TaskBuilder {
    /// Create a builder for a task with the given name
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            task: Task {
                name: name.into(),
                description: String::new(),
                expected_output: String::new(),
                agent: None,
                context: Vec::new(),
                prefetch: None,
            },
        }
    }

    /// Set the description
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.task.description = description.into();
        self
    }

    /// Set the expected output
    pub fn expected_output(mut self, expected_output: impl Into<String>) -> Self {
        self.task.expected_output = expected_output.into();
        self
    }

    /// Assign the task to the agent with this role
    pub fn agent(mut self, role: impl Into<String>) -> Self {
        self.task.agent = Some(role.into());
        self
    }

    /// Use the output of an earlier task as context
    pub fn context(mut self, task: impl Into<String>) -> Self {
        self.task.context.push(task.into());
        self
    }

    /// Fetch data before the agent runs
    pub fn prefetch(mut self, prefetch: Arc<dyn Prefetch>) -> Self {
        self.task.prefetch = Some(prefetch);
        self
    }

    /// Finish the task
    pub fn build(self) -> Task {
        self.task
    }
}
