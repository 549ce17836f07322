//! Tool trait definition

use agent_core::Result;
use async_trait::async_trait;
use serde_json::Value;

/// Trait for tools that agents can execute
///
/// Each tool provides a name, a description the model reads to decide when
/// to call it, and a JSON schema for its input.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Execute the tool with given parameters
    ///
    /// `params` is whatever the model sent. It should match
    /// [`input_schema`](Tool::input_schema) but tools must not assume so;
    /// malformed input is reported as an error, never a panic.
    async fn execute(&self, params: Value) -> Result<Value>;

    /// Get the tool's name
    ///
    /// Must be unique within a [`ToolRegistry`](crate::ToolRegistry).
    fn name(&self) -> &str;

    /// Get the tool's description
    fn description(&self) -> &str;

    /// Get the tool's input schema (JSON Schema format)
    ///
    /// ```
    /// use serde_json::json;
    ///
    /// let schema = json!({
    ///     "type": "object",
    ///     "properties": {
    ///         "ticker": { "type": "string", "description": "Exchange ticker" }
    ///     },
    ///     "required": ["ticker"]
    /// });
    /// assert_eq!(schema["required"][0], "ticker");
    /// ```
    fn input_schema(&self) -> Value;
}

/// Read a required string argument from tool input
pub fn required_str<'a>(tool: &str, params: &'a Value, key: &str) -> Result<&'a str> {
    params
        .get(key)
        .and_then(Value::as_str)
        .ok_or_else(|| agent_core::Error::tool(tool, format!("missing string argument '{key}'")))
}

/// Read an optional string argument; empty strings count as absent
pub fn optional_str<'a>(params: &'a Value, key: &str) -> Option<&'a str> {
    params
        .get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}
