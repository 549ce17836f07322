//! OpenAI chat-completions provider
//!
//! Implements [`LLMProvider`] against `POST {api_base}/chat/completions`.
//! Any OpenAI-compatible server (Azure deployments, vLLM, LM Studio, ...)
//! works by pointing `api_base` at it.
//!
//! ```no_run
//! use agent_llm::{CompletionRequest, LLMProvider, Message};
//! use agent_llm::providers::{OpenAIConfig, OpenAIProvider};
//!
//! # async fn run() -> agent_llm::Result<()> {
//! let provider = OpenAIProvider::with_config(
//!     OpenAIConfig::new("sk-...").with_timeout(60),
//! )?;
//!
//! let request = CompletionRequest::builder("gpt-3.5-turbo")
//!     .add_message(Message::user("Is AAPL trending up?"))
//!     .build();
//!
//! let response = provider.complete(request).await?;
//! println!("{}", response.message.text().unwrap_or_default());
//! # Ok(())
//! # }
//! ```

use crate::{
    CompletionRequest, CompletionResponse, LLMError, LLMProvider, Message, Result, Role,
    StopReason, TokenUsage, ToolCall, ToolDefinition,
};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, instrument, warn};

const DEFAULT_OPENAI_API_BASE: &str = "https://api.openai.com/v1";
const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Configuration for the OpenAI provider
#[derive(Debug, Clone)]
pub struct OpenAIConfig {
    /// API key for authentication
    pub api_key: String,

    /// Base URL of the API (default: "https://api.openai.com/v1")
    pub api_base: String,

    /// Request timeout in seconds (default: 120)
    pub timeout_secs: u64,
}

impl OpenAIConfig {
    /// Create a new config with the given API key and default settings
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            ..Self::default()
        }
    }

    /// Create config from the environment
    ///
    /// Reads `OPENAI_API_KEY` (required) and `OPENAI_API_BASE` (optional).
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("OPENAI_API_KEY").map_err(|_| {
            LLMError::ConfigurationError(
                "OPENAI_API_KEY not found. Check your .env file".to_string(),
            )
        })?;

        let mut config = Self::new(api_key);
        if let Ok(base) = std::env::var("OPENAI_API_BASE") {
            config.api_base = base;
        }
        Ok(config)
    }

    /// Set a custom API base URL
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    /// Set request timeout in seconds
    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.api_base.trim_end_matches('/'))
    }
}

impl Default for OpenAIConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            api_base: DEFAULT_OPENAI_API_BASE.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

/// OpenAI provider
pub struct OpenAIProvider {
    client: Client,
    config: OpenAIConfig,
}

impl OpenAIProvider {
    /// Create a provider with custom configuration
    pub fn with_config(config: OpenAIConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { client, config })
    }

    /// Create a provider with an API key and default settings
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Self::with_config(OpenAIConfig::new(api_key))
    }

    /// Create a provider from the environment (see [`OpenAIConfig::from_env`])
    pub fn from_env() -> Result<Self> {
        Self::with_config(OpenAIConfig::from_env()?)
    }

    /// Get the current configuration
    pub fn config(&self) -> &OpenAIConfig {
        &self.config
    }
}

#[async_trait]
impl LLMProvider for OpenAIProvider {
    #[instrument(skip(self, request), fields(model = %request.model, api_base = %self.config.api_base))]
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse> {
        let body = ChatRequest {
            model: request.model.clone(),
            messages: build_chat_messages(request.system, request.messages),
            max_tokens: request.max_tokens,
            temperature: request.temperature,
            tools: request.tools.as_deref().map(convert_tools),
            stop: request.stop_sequences,
        };

        debug!(message_count = body.messages.len(), "Sending chat completion");

        let response = self
            .client
            .post(self.config.completions_url())
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();

            return Err(match status.as_u16() {
                401 => LLMError::AuthenticationFailed,
                429 => LLMError::RateLimitExceeded(error_text),
                400 => LLMError::InvalidRequest(error_text),
                404 => LLMError::ModelNotFound(request.model),
                _ => LLMError::RequestFailed(format!("HTTP {status}: {error_text}")),
            });
        }

        let chat: ChatResponse = response
            .json()
            .await
            .map_err(|e| LLMError::UnexpectedResponse(format!("Failed to parse response: {e}")))?;

        let choice = chat
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| LLMError::UnexpectedResponse("No choices in response".to_string()))?;

        let stop_reason = map_stop_reason(choice.finish_reason.as_deref());
        let usage = TokenUsage::single(chat.usage.prompt_tokens, chat.usage.completion_tokens);

        debug!(?stop_reason, tokens = usage.total(), "Chat completion received");

        Ok(CompletionResponse {
            message: parse_response_message(choice.message),
            stop_reason,
            usage,
        })
    }

    fn name(&self) -> &str {
        "openai"
    }
}

// ============================================================================
// Wire types
// ============================================================================

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    max_tokens: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<ChatTool>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stop: Option<Vec<String>>,
}

#[derive(Debug, Serialize, PartialEq)]
struct ChatMessage {
    role: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tool_calls: Vec<ChatToolCall>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<String>,
}

#[derive(Debug, Serialize, PartialEq)]
struct ChatToolCall {
    id: String,
    #[serde(rename = "type")]
    call_type: &'static str,
    function: ChatFunctionCall,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
struct ChatFunctionCall {
    name: String,
    arguments: String,
}

#[derive(Debug, Serialize)]
struct ChatTool {
    #[serde(rename = "type")]
    tool_type: &'static str,
    function: ChatFunction,
}

#[derive(Debug, Serialize)]
struct ChatFunction {
    name: String,
    description: String,
    parameters: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
    #[serde(default)]
    usage: ChatUsage,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
    #[serde(default)]
    tool_calls: Vec<ChatResponseToolCall>,
}

#[derive(Debug, Deserialize)]
struct ChatResponseToolCall {
    id: String,
    function: ChatFunctionCall,
}

#[derive(Debug, Default, Deserialize)]
struct ChatUsage {
    #[serde(default)]
    prompt_tokens: usize,
    #[serde(default)]
    completion_tokens: usize,
}

// ============================================================================
// Conversion functions
// ============================================================================

fn role_name(role: Role) -> &'static str {
    match role {
        Role::System => "system",
        Role::User => "user",
        Role::Assistant => "assistant",
        Role::Tool => "tool",
    }
}

/// Build the wire message list; the system prompt goes first
fn build_chat_messages(system: Option<String>, messages: Vec<Message>) -> Vec<ChatMessage> {
    let system = system.map(|text| ChatMessage {
        role: "system",
        content: Some(text),
        tool_calls: Vec::new(),
        tool_call_id: None,
    });

    system
        .into_iter()
        .chain(messages.into_iter().map(convert_message))
        .collect()
}

fn convert_message(msg: Message) -> ChatMessage {
    let tool_calls = msg
        .tool_calls
        .into_iter()
        .map(|call| ChatToolCall {
            id: call.id,
            call_type: "function",
            function: ChatFunctionCall {
                name: call.name,
                arguments: call.arguments.to_string(),
            },
        })
        .collect::<Vec<_>>();

    // Tool-only assistant turns carry null content; every other turn needs text.
    let content = match msg.content {
        Some(text) => Some(text),
        None if !tool_calls.is_empty() => None,
        None => Some(String::new()),
    };

    ChatMessage {
        role: role_name(msg.role),
        content,
        tool_calls,
        tool_call_id: msg.tool_call_id,
    }
}

fn convert_tools(tools: &[ToolDefinition]) -> Vec<ChatTool> {
    tools
        .iter()
        .map(|tool| ChatTool {
            tool_type: "function",
            function: ChatFunction {
                name: tool.name.clone(),
                description: tool.description.clone(),
                parameters: tool.input_schema.clone(),
            },
        })
        .collect()
}

/// Convert the wire answer into our message model
///
/// Arguments that are not valid JSON are kept as a JSON string so the tool
/// can report the problem back to the model.
fn parse_response_message(msg: ChatResponseMessage) -> Message {
    let tool_calls = msg
        .tool_calls
        .into_iter()
        .map(|call| {
            let arguments = serde_json::from_str(&call.function.arguments).unwrap_or_else(|e| {
                warn!(tool = %call.function.name, error = %e, "Tool arguments are not valid JSON");
                serde_json::Value::String(call.function.arguments.clone())
            });
            ToolCall {
                id: call.id,
                name: call.function.name,
                arguments,
            }
        })
        .collect::<Vec<_>>();

    let content = msg.content.filter(|c| !c.is_empty());

    if tool_calls.is_empty() {
        Message::assistant(content.unwrap_or_default())
    } else {
        Message::assistant_tool_calls(content, tool_calls)
    }
}

fn map_stop_reason(reason: Option<&str>) -> StopReason {
    match reason {
        Some("stop") | None => StopReason::EndTurn,
        Some("length") => StopReason::MaxTokens,
        Some("tool_calls" | "function_call") => StopReason::ToolUse,
        Some("content_filter") => StopReason::ContentFilter,
        Some(other) => {
            debug!(reason = other, "Unknown finish reason");
            StopReason::EndTurn
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_provider_creation() {
        let provider = OpenAIProvider::new("test-key").unwrap();
        assert_eq!(provider.name(), "openai");
        assert_eq!(provider.config().api_base, "https://api.openai.com/v1");
        assert_eq!(provider.config().timeout_secs, 120);
    }

    #[test]
    fn test_completions_url_trims_slash() {
        let config = OpenAIConfig::new("k").with_api_base("http://localhost:1234/v1/");
        assert_eq!(
            config.completions_url(),
            "http://localhost:1234/v1/chat/completions"
        );
    }

    #[test]
    fn test_system_prompt_goes_first() {
        let messages = build_chat_messages(
            Some("You are a Risk Analyst".to_string()),
            vec![Message::user("Assess TSLA")],
        );

        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, "system");
        assert_eq!(messages[1].role, "user");
        assert_eq!(messages[1].content.as_deref(), Some("Assess TSLA"));
    }

    #[test]
    fn test_tool_round_trip_messages() {
        let call = Message::assistant_tool_calls(
            None,
            vec![ToolCall {
                id: "call_1".to_string(),
                name: "risk_assessment".to_string(),
                arguments: json!({ "ticker": "TSLA" }),
            }],
        );
        let wire = convert_message(call);
        assert_eq!(wire.role, "assistant");
        assert!(wire.content.is_none());
        assert_eq!(wire.tool_calls[0].function.arguments, r#"{"ticker":"TSLA"}"#);

        let result = convert_message(Message::tool_result("call_1", "{}"));
        assert_eq!(result.role, "tool");
        assert_eq!(result.tool_call_id.as_deref(), Some("call_1"));
        assert_eq!(
            serde_json::to_value(&result).unwrap(),
            json!({ "role": "tool", "content": "{}", "tool_call_id": "call_1" })
        );
    }

    #[test]
    fn test_tool_definition_conversion() {
        let tools = convert_tools(&[ToolDefinition::new(
            "news_search",
            "Search market news",
            json!({ "type": "object" }),
        )]);

        let wire = serde_json::to_value(&tools).unwrap();
        assert_eq!(wire[0]["type"], "function");
        assert_eq!(wire[0]["function"]["name"], "news_search");
        assert_eq!(wire[0]["function"]["parameters"]["type"], "object");
    }

    #[test]
    fn test_parse_response_with_tool_calls() {
        let raw = json!({
            "content": null,
            "tool_calls": [{
                "id": "call_9",
                "type": "function",
                "function": { "name": "fetch_stock_prices", "arguments": "{\"ticker\":\"AAPL\"}" }
            }]
        });
        let msg: ChatResponseMessage = serde_json::from_value(raw).unwrap();
        let message = parse_response_message(msg);

        assert_eq!(message.role, Role::Assistant);
        assert_eq!(message.tool_calls.len(), 1);
        assert_eq!(message.tool_calls[0].arguments["ticker"], "AAPL");
    }

    #[test]
    fn test_parse_response_with_bad_arguments() {
        let raw = json!({
            "content": "",
            "tool_calls": [{
                "id": "call_1",
                "function": { "name": "risk_assessment", "arguments": "ticker=AAPL" }
            }]
        });
        let msg: ChatResponseMessage = serde_json::from_value(raw).unwrap();
        let message = parse_response_message(msg);

        assert!(message.text().is_none());
        assert_eq!(message.tool_calls[0].arguments, json!("ticker=AAPL"));
    }

    #[test]
    fn test_response_without_usage() {
        let raw = json!({
            "choices": [{ "message": { "content": "ok" }, "finish_reason": "stop" }]
        });
        let response: ChatResponse = serde_json::from_value(raw).unwrap();
        assert_eq!(response.usage.prompt_tokens, 0);
        assert_eq!(response.choices.len(), 1);
    }

    #[test]
    fn test_stop_reason_mapping() {
        assert_eq!(map_stop_reason(Some("stop")), StopReason::EndTurn);
        assert_eq!(map_stop_reason(None), StopReason::EndTurn);
        assert_eq!(map_stop_reason(Some("length")), StopReason::MaxTokens);
        assert_eq!(map_stop_reason(Some("tool_calls")), StopReason::ToolUse);
        assert_eq!(
            map_stop_reason(Some("content_filter")),
            StopReason::ContentFilter
        );
        assert_eq!(map_stop_reason(Some("unknown")), StopReason::EndTurn);
    }
}
