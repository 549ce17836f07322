//! Tool definition types for LLM function calling

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Tool definition sent to the model
///
/// Describes a callable tool: its name, what it does, and the JSON schema of
/// its arguments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// Tool name (must match the tool in the agent's registry)
    pub name: String,

    /// Description of what the tool does
    pub description: String,

    /// JSON schema for the tool's input parameters
    pub input_schema: Value,
}

impl ToolDefinition {
    /// Create a new tool definition
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        input_schema: Value,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            input_schema,
        }
    }
}

/// Helpers to build JSON schemas for tools
pub mod schema {
    use serde_json::{Value, json};

    /// Object schema with properties and required keys
    ///
    /// ```
    /// use agent_llm::tools::schema;
    /// use serde_json::json;
    ///
    /// let schema = schema::object(
    ///     json!({ "ticker": schema::string("Ticker symbol") }),
    ///     &["ticker"],
    /// );
    /// assert_eq!(schema["required"][0], "ticker");
    /// ```
    pub fn object(properties: Value, required: &[&str]) -> Value {
        json!({
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }

    /// String property schema
    pub fn string(description: &str) -> Value {
        json!({
            "type": "string",
            "description": description,
        })
    }

    /// Date string property schema (`YYYY-MM-DD`)
    pub fn date(description: &str) -> Value {
        json!({
            "type": "string",
            "format": "date",
            "description": description,
        })
    }
}
