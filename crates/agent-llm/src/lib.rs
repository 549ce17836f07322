//! LLM provider abstraction layer for the research crew
//!
//! This crate provides provider-agnostic types for talking to chat models:
//!
//! - Message types, including assistant tool calls and tool results
//! - Completion request/response types
//! - Tool definitions for function calling
//! - The [`LLMProvider`] trait
//! - An OpenAI-compatible provider (behind the `openai` feature)

pub mod completion;
pub mod error;
pub mod messages;
pub mod provider;
pub mod tools;

// Re-export main types
pub use completion::{CompletionRequest, CompletionResponse, StopReason, TokenUsage};
pub use error::{LLMError, Result};
pub use messages::{Message, Role, ToolCall};
pub use provider::LLMProvider;
#[cfg(any(test, feature = "mock"))]
pub use provider::MockLLMProvider;
pub use tools::ToolDefinition;

/// Model used when nothing else is configured
pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";

// Provider implementations (feature-gated)
#[cfg(feature = "openai")]
pub mod providers;
