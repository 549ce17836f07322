//! Agent runtime for the research crew
//!
//! [`AgentExecutor`] drives the LLM loop: call the model with the agent's
//! tools, run whatever tools it asks for, feed the results back, repeat until
//! it answers. [`RoleAgent`] is a crew member: a role, a goal and a backstory
//! wrapped around an executor.

pub mod executor;
pub mod role;

pub use executor::{
    AgentExecutor, AgentExecutorBuilder, ExecutionOutcome, ExecutorConfig, ExecutorEventHandler,
    NoOpEventHandler,
};
pub use role::{RoleAgent, RoleAgentBuilder};
