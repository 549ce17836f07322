//! Crew run results

use agent_llm::TokenUsage;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Output of one task
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskOutput {
    /// Task name
    pub name: String,
    /// Rendered task description
    pub description: String,
    /// Role of the agent that produced the output
    pub agent: String,
    /// Raw output text
    pub raw: String,
}

/// Result of a crew kickoff
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrewOutput {
    /// Run identifier
    pub id: Uuid,
    /// Output of the last task
    pub final_output: String,
    /// Every task output, in execution order
    pub tasks_output: Vec<TaskOutput>,
    /// Tokens spent across all agents, delegated work included
    pub token_usage: TokenUsage,
}

impl CrewOutput {
    /// Output of a task by name
    pub fn task(&self, name: &str) -> Option<&TaskOutput> {
        self.tasks_output.iter().find(|t| t.name == name)
    }
}

impl std::fmt::Display for CrewOutput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.final_output)
    }
}
