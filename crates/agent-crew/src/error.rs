//! Error types for crew assembly and execution

use thiserror::Error;

/// Result type for crew operations
pub type Result<T> = std::result::Result<T, CrewError>;

/// Errors raised while building or running a crew
#[derive(Error, Debug)]
pub enum CrewError {
    /// A crew needs at least one task
    #[error("Crew has no tasks")]
    NoTasks,

    /// Two tasks share a name
    #[error("Duplicate task name '{0}'")]
    DuplicateTask(String),

    /// Two agents share a role
    #[error("Duplicate agent role '{0}'")]
    DuplicateAgent(String),

    /// A task names an agent that is not part of the crew
    #[error("Task '{task}' is assigned to unknown agent '{agent}'")]
    UnknownAgent { task: String, agent: String },

    /// A sequential task without an agent
    #[error("Task '{0}' has no agent; sequential crews need one per task")]
    UnassignedTask(String),

    /// A context reference that is not an earlier task
    #[error("Task '{task}' uses '{context}' as context, which is not an earlier task")]
    InvalidContext { task: String, context: String },

    /// Hierarchical crews need an LLM for their manager
    #[error("Hierarchical process requires a manager provider")]
    ManagerNotConfigured,

    /// Agent, tool or prompt failure while running
    #[error(transparent)]
    Agent(#[from] agent_core::Error),
}

impl From<agent_prompt::PromptError> for CrewError {
    fn from(err: agent_prompt::PromptError) -> Self {
        CrewError::Agent(err.into())
    }
}

impl From<CrewError> for agent_core::Error {
    fn from(err: CrewError) -> Self {
        match err {
            CrewError::Agent(inner) => inner,
            other => agent_core::Error::ProcessingFailed(other.to_string()),
        }
    }
}
