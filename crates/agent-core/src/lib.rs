//! Core abstractions for crew-based research agents
//!
//! This crate defines the traits and types shared by the LLM, tool, runtime
//! and crew crates: the [`Agent`] trait, the per-run [`Context`] and the
//! common [`Error`] type.

pub mod agent;
pub mod context;
pub mod error;

pub use agent::Agent;
pub use context::{Context, TaskRecord};
pub use error::{Error, Result};
