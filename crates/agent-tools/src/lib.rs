//! Tool management and execution framework for the research crew
//!
//! Tools are the functions agents can call while working on a task. A
//! [`ToolRegistry`] holds the tools one agent may use; [`CachingTool`]
//! memoizes results of identical calls for a limited time.

pub mod cache;
pub mod registry;
pub mod tool;

pub use cache::{CachingTool, ToolCache};
pub use registry::ToolRegistry;
pub use tool::{Tool, optional_str, required_str};
