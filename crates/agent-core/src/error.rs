//! Error types for agent-core

use thiserror::Error;

/// Result type alias for agent-core
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for agent operations
#[derive(Error, Debug)]
pub enum Error {
    /// Generic error message
    #[error("{0}")]
    Generic(String),

    /// Agent or crew construction failed
    #[error("Initialization failed: {0}")]
    InitializationFailed(String),

    /// Agent processing failed
    #[error("Agent processing failed: {0}")]
    ProcessingFailed(String),

    /// A tool rejected its input or failed while running
    #[error("Tool '{tool}' failed: {reason}")]
    ToolFailed {
        /// Tool name
        tool: String,
        /// Failure description
        reason: String,
    },

    /// A required crew input was not supplied
    #[error("Missing input: {0}")]
    MissingInput(String),
}

impl Error {
    /// Shorthand for a [`Error::ToolFailed`]
    pub fn tool(tool: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ToolFailed {
            tool: tool.into(),
            reason: reason.into(),
        }
    }
}
