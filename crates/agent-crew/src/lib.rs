//! Multi-agent orchestration for the research crew
//!
//! A [`Crew`] is a set of [`RoleAgent`](agent_runtime::RoleAgent)s and an
//! ordered list of [`Task`]s. Kicking it off runs every task once, in order,
//! either on the task's own agent ([`Process::Sequential`]) or through a
//! manager agent that delegates to the crew members
//! ([`Process::Hierarchical`]).

pub mod crew;
pub mod delegation;
pub mod error;
pub mod output;
pub mod task;

pub use crew::{Crew, CrewBuilder, CrewEventHandler, Process};
pub use delegation::{AskQuestionTool, DelegateWorkTool, UsageMeter};
pub use error::{CrewError, Result};
pub use output::{CrewOutput, TaskOutput};
pub use task::{Prefetch, Task, TaskBuilder};
