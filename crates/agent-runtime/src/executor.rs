//! Agent executor for running agent loops
//!
//! The AgentExecutor implements the core agent loop pattern:
//! 1. Call the LLM with the conversation and the agent's tools
//! 2. If it asks for tools, run them and append the results
//! 3. Repeat until it answers or the iteration budget is spent
//! 4. On exhaustion, ask once more, without tools, for the best final answer

use agent_core::Result;
use agent_llm::{
    CompletionRequest, DEFAULT_MODEL, LLMProvider, Message, StopReason, TokenUsage, ToolCall,
    ToolDefinition,
};
use agent_tools::ToolRegistry;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

const FALLBACK_FINAL_ANSWER_PROMPT: &str =
    "Now it's time you MUST give your absolute best final answer. Stop using any tools.";

/// Event handler for agent execution events
#[async_trait]
pub trait ExecutorEventHandler: Send + Sync {
    /// Called when a tool execution starts
    async fn on_tool_start(&self, _agent: &str, _tool: &str, _input: &Value) {}

    /// Called when a tool execution completes
    async fn on_tool_done(
        &self,
        _agent: &str,
        _tool: &str,
        _result: std::result::Result<&Value, &str>,
        _duration_ms: u64,
    ) {
    }

    /// Called when the agent produced its final answer
    async fn on_complete(&self, _agent: &str, _output: &str) {}
}

/// No-op event handler for when events are not needed
pub struct NoOpEventHandler;

#[async_trait]
impl ExecutorEventHandler for NoOpEventHandler {}

/// Configuration for agent execution
#[derive(Debug, Clone)]
pub struct ExecutorConfig {
    /// Name reported in logs and events
    pub agent_name: String,

    /// Maximum number of LLM round trips before a final answer is forced
    pub max_iterations: usize,

    /// Model to use
    pub model: String,

    /// System prompt
    pub system_prompt: Option<String>,

    /// Max tokens per completion
    pub max_tokens: usize,

    /// Temperature; `None` leaves the provider default
    pub temperature: Option<f32>,

    /// Instruction sent when the iteration budget is spent
    pub force_final_answer_prompt: String,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            agent_name: "agent".to_string(),
            max_iterations: 15,
            model: DEFAULT_MODEL.to_string(),
            system_prompt: None,
            max_tokens: 2048,
            temperature: None,
            force_final_answer_prompt: FALLBACK_FINAL_ANSWER_PROMPT.to_string(),
        }
    }
}

/// Result of one executor run
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionOutcome {
    /// Final answer text
    pub output: String,

    /// Tokens spent across every LLM call of the run
    pub usage: TokenUsage,

    /// LLM round trips made, including a forced final call
    pub iterations: usize,

    /// Whether the answer had to be forced after the budget ran out
    pub forced: bool,
}

/// Executes an agent loop: LLM -> tool calls -> execution -> loop back
pub struct AgentExecutor {
    provider: Arc<dyn LLMProvider>,
    tool_registry: Arc<ToolRegistry>,
    config: ExecutorConfig,
    event_handler: Option<Arc<dyn ExecutorEventHandler>>,
}

impl AgentExecutor {
    /// Create a new agent executor
    pub fn new(
        provider: Arc<dyn LLMProvider>,
        tool_registry: Arc<ToolRegistry>,
        config: ExecutorConfig,
    ) -> Self {
        Self {
            provider,
            tool_registry,
            config,
            event_handler: None,
        }
    }

    /// Create a builder
    pub fn builder() -> AgentExecutorBuilder {
        AgentExecutorBuilder::new()
    }

    /// Set the event handler for receiving execution events
    pub fn with_event_handler(mut self, handler: Arc<dyn ExecutorEventHandler>) -> Self {
        self.event_handler = Some(handler);
        self
    }

    /// Get the configuration
    pub fn config(&self) -> &ExecutorConfig {
        &self.config
    }

    /// Execute the agent loop for one user message
    pub async fn run(&self, user_message: String) -> Result<ExecutionOutcome> {
        let mut conversation = vec![Message::user(user_message)];
        let mut usage = TokenUsage::default();
        let tools = self.build_tool_definitions();
        let agent = self.config.agent_name.as_str();

        for iteration in 1..=self.config.max_iterations {
            info!(
                agent,
                iteration,
                max_iterations = self.config.max_iterations,
                tool_count = tools.len(),
                "Agent iteration started"
            );

            let request = self.request(conversation.clone(), tools.clone());
            let response = self.provider.complete(request).await?;
            usage += response.usage;

            info!(
                agent,
                stop_reason = ?response.stop_reason,
                input_tokens = response.usage.input_tokens,
                output_tokens = response.usage.output_tokens,
                "LLM response received"
            );

            let message = response.message;
            let preview: String = message.text().unwrap_or("").chars().take(300).collect();
            debug!(agent, response_preview = %preview, "LLM response content preview");

            if message.has_tool_calls() {
                let calls = message.tool_calls.clone();
                conversation.push(message);
                let results = self.execute_tools(&calls).await;
                conversation.extend(results);
                continue;
            }

            match response.stop_reason {
                StopReason::ContentFilter => {
                    return Err(agent_core::Error::ProcessingFailed(format!(
                        "{agent}: response withheld by the content filter"
                    )));
                }
                StopReason::MaxTokens => {
                    warn!(agent, "Hit max tokens in LLM response, answer may be truncated");
                }
                StopReason::EndTurn | StopReason::StopSequence | StopReason::ToolUse => {}
            }

            let output = message.text().unwrap_or_default().to_string();
            return Ok(self
                .finish(output, usage, iteration, false)
                .await);
        }

        warn!(
            agent,
            max_iterations = self.config.max_iterations,
            "Max iterations reached, forcing final answer"
        );

        conversation.push(Message::user(self.config.force_final_answer_prompt.clone()));
        let response = self
            .provider
            .complete(self.request(conversation, Vec::new()))
            .await?;
        usage += response.usage;

        let output = response.message.text().unwrap_or_default().to_string();
        Ok(self
            .finish(output, usage, self.config.max_iterations + 1, true)
            .await)
    }

    fn request(&self, messages: Vec<Message>, tools: Vec<ToolDefinition>) -> CompletionRequest {
        let mut builder = CompletionRequest::builder(&self.config.model)
            .messages(messages)
            .max_tokens(self.config.max_tokens)
            .tools(tools);

        if let Some(system) = &self.config.system_prompt {
            builder = builder.system(system.clone());
        }
        if let Some(temperature) = self.config.temperature {
            builder = builder.temperature(temperature);
        }

        builder.build()
    }

    async fn finish(
        &self,
        output: String,
        usage: TokenUsage,
        iterations: usize,
        forced: bool,
    ) -> ExecutionOutcome {
        info!(
            agent = %self.config.agent_name,
            iterations,
            forced,
            total_tokens = usage.total(),
            response_length = output.len(),
            "Agent completed"
        );

        if let Some(handler) = &self.event_handler {
            handler.on_complete(&self.config.agent_name, &output).await;
        }

        ExecutionOutcome {
            output,
            usage,
            iterations,
            forced,
        }
    }

    /// Build tool definitions from the registry
    fn build_tool_definitions(&self) -> Vec<ToolDefinition> {
        self.tool_registry
            .list_tools()
            .iter()
            .map(|tool| ToolDefinition::new(tool.name(), tool.description(), tool.input_schema()))
            .collect()
    }

    /// Run the requested tools in order, one result message per call
    ///
    /// Failures, including calls to tools this agent does not have, become
    /// error results the model can react to.
    async fn execute_tools(&self, calls: &[ToolCall]) -> Vec<Message> {
        let agent = self.config.agent_name.as_str();
        let mut results = Vec::with_capacity(calls.len());

        for call in calls {
            let input_preview: String = call.arguments.to_string().chars().take(500).collect();
            info!(
                agent,
                tool_name = %call.name,
                tool_id = %call.id,
                input_preview = %input_preview,
                "Executing tool"
            );

            if let Some(handler) = &self.event_handler {
                handler.on_tool_start(agent, &call.name, &call.arguments).await;
            }

            let start_time = Instant::now();
            let outcome = self
                .tool_registry
                .execute(&call.name, call.arguments.clone())
                .await;
            let duration_ms = start_time.elapsed().as_millis() as u64;

            match outcome {
                Ok(result) => {
                    let result_str = match &result {
                        Value::String(text) => text.clone(),
                        other => other.to_string(),
                    };
                    let result_preview: String = result_str.chars().take(500).collect();
                    info!(
                        agent,
                        tool_name = %call.name,
                        duration_ms,
                        result_length = result_str.len(),
                        result_preview = %result_preview,
                        "Tool execution succeeded"
                    );

                    if let Some(handler) = &self.event_handler {
                        handler
                            .on_tool_done(agent, &call.name, Ok(&result), duration_ms)
                            .await;
                    }

                    results.push(Message::tool_result(call.id.clone(), result_str));
                }
                Err(e) => {
                    let error_str = e.to_string();
                    warn!(
                        agent,
                        tool_name = %call.name,
                        duration_ms,
                        error = %e,
                        "Tool execution failed"
                    );

                    if let Some(handler) = &self.event_handler {
                        handler
                            .on_tool_done(agent, &call.name, Err(&error_str), duration_ms)
                            .await;
                    }

                    results.push(Message::tool_error(call.id.clone(), format!("Error: {e}")));
                }
            }
        }

        results
    }
}

/// Builder for AgentExecutor
pub struct AgentExecutorBuilder {
    provider: Option<Arc<dyn LLMProvider>>,
    tool_registry: Arc<ToolRegistry>,
    config: ExecutorConfig,
    event_handler: Option<Arc<dyn ExecutorEventHandler>>,
}

impl AgentExecutorBuilder {
    /// Create a new builder
    pub fn new() -> Self {
        Self {
            provider: None,
            tool_registry: Arc::new(ToolRegistry::new()),
            config: ExecutorConfig::default(),
            event_handler: None,
        }
    }

    /// Set the LLM provider
    pub fn provider(mut self, provider: Arc<dyn LLMProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    /// Set the tool registry
    pub fn tool_registry(mut self, registry: Arc<ToolRegistry>) -> Self {
        self.tool_registry = registry;
        self
    }

    /// Set the full configuration
    pub fn config(mut self, config: ExecutorConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the agent name used in logs and events
    pub fn agent_name(mut self, name: impl Into<String>) -> Self {
        self.config.agent_name = name.into();
        self
    }

    /// Set maximum iterations
    pub fn max_iterations(mut self, max: usize) -> Self {
        self.config.max_iterations = max;
        self
    }

    /// Set the model
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    /// Set the system prompt
    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.system_prompt = Some(prompt.into());
        self
    }

    /// Set max tokens
    pub fn max_tokens(mut self, max_tokens: usize) -> Self {
        self.config.max_tokens = max_tokens;
        self
    }

    /// Set temperature
    pub fn temperature(mut self, temperature: f32) -> Self {
        self.config.temperature = Some(temperature);
        self
    }

    /// Set the instruction used to force a final answer
    pub fn force_final_answer_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.force_final_answer_prompt = prompt.into();
        self
    }

    /// Set the event handler
    pub fn event_handler(mut self, handler: Arc<dyn ExecutorEventHandler>) -> Self {
        self.event_handler = Some(handler);
        self
    }

    /// Build the executor
    pub fn build(self) -> Result<AgentExecutor> {
        let provider = self.provider.ok_or_else(|| {
            agent_core::Error::InitializationFailed("Provider not set".to_string())
        })?;

        if self.config.max_iterations == 0 {
            return Err(agent_core::Error::InitializationFailed(
                "max_iterations must be at least 1".to_string(),
            ));
        }

        Ok(AgentExecutor {
            provider,
            tool_registry: self.tool_registry,
            config: self.config,
            event_handler: self.event_handler,
        })
    }
}

impl Default for AgentExecutorBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agent_llm::{CompletionResponse, MockLLMProvider};
    use agent_tools::Tool;
    use mockall::Sequence;
    use serde_json::json;
    use std::sync::Mutex;

    struct PriceTool;

    #[async_trait]
    impl Tool for PriceTool {
        async fn execute(&self, params: Value) -> Result<Value> {
            let ticker = agent_tools::required_str("fetch_stock_prices", &params, "ticker")?;
            Ok(json!({ "ticker": ticker, "trend": "up" }))
        }

        fn name(&self) -> &str {
            "fetch_stock_prices"
        }

        fn description(&self) -> &str {
            "Fetch a price summary"
        }

        fn input_schema(&self) -> Value {
            json!({ "type": "object", "properties": { "ticker": { "type": "string" } } })
        }
    }

    fn answer(text: &str) -> CompletionResponse {
        CompletionResponse {
            message: Message::assistant(text),
            stop_reason: StopReason::EndTurn,
            usage: TokenUsage::single(10, 5),
        }
    }

    fn tool_call(name: &str, arguments: Value) -> CompletionResponse {
        CompletionResponse {
            message: Message::assistant_tool_calls(
                None,
                vec![ToolCall {
                    id: "call_1".to_string(),
                    name: name.to_string(),
                    arguments,
                }],
            ),
            stop_reason: StopReason::ToolUse,
            usage: TokenUsage::single(20, 3),
        }
    }

    fn registry() -> Arc<ToolRegistry> {
        Arc::new(ToolRegistry::from_tools([Arc::new(PriceTool) as Arc<dyn Tool>]))
    }

    #[derive(Default)]
    struct Recorder {
        events: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl ExecutorEventHandler for Recorder {
        async fn on_tool_start(&self, agent: &str, tool: &str, _input: &Value) {
            self.events.lock().unwrap().push(format!("start:{agent}:{tool}"));
        }

        async fn on_tool_done(
            &self,
            _agent: &str,
            tool: &str,
            result: std::result::Result<&Value, &str>,
            _duration_ms: u64,
        ) {
            let status = if result.is_ok() { "ok" } else { "err" };
            self.events.lock().unwrap().push(format!("done:{tool}:{status}"));
        }

        async fn on_complete(&self, _agent: &str, output: &str) {
            self.events.lock().unwrap().push(format!("complete:{output}"));
        }
    }

    #[test]
    fn test_builder() {
        let builder = AgentExecutorBuilder::new()
            .model("test-model")
            .max_iterations(5)
            .agent_name("Risk Analyst")
            .system_prompt("Test prompt");

        assert_eq!(builder.config.model, "test-model");
        assert_eq!(builder.config.max_iterations, 5);
        assert_eq!(builder.config.agent_name, "Risk Analyst");
        assert_eq!(builder.config.system_prompt, Some("Test prompt".to_string()));
    }

    #[test]
    fn test_build_requires_provider() {
        assert!(AgentExecutorBuilder::new().build().is_err());

        let zero = AgentExecutorBuilder::new()
            .provider(Arc::new(MockLLMProvider::new()))
            .max_iterations(0)
            .build();
        assert!(zero.is_err());
    }

    #[test]
    fn test_default_config() {
        let config = ExecutorConfig::default();
        assert_eq!(config.max_iterations, 15);
        assert_eq!(config.model, "gpt-3.5-turbo");
        assert!(config.temperature.is_none());
    }

    #[tokio::test]
    async fn test_plain_answer() {
        let mut provider = MockLLMProvider::new();
        provider
            .expect_complete()
            .withf(|req| req.system.as_deref() == Some("You are terse.") && req.tools.is_some())
            .times(1)
            .returning(|_| Ok(answer("Done")));

        let executor = AgentExecutor::builder()
            .provider(Arc::new(provider))
            .tool_registry(registry())
            .system_prompt("You are terse.")
            .build()
            .unwrap();

        let outcome = executor.run("Go".to_string()).await.unwrap();
        assert_eq!(outcome.output, "Done");
        assert_eq!(outcome.iterations, 1);
        assert!(!outcome.forced);
        assert_eq!(outcome.usage, TokenUsage::single(10, 5));
    }

    #[tokio::test]
    async fn test_tool_round_trip() {
        let mut seq = Sequence::new();
        let mut provider = MockLLMProvider::new();
        provider
            .expect_complete()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(tool_call("fetch_stock_prices", json!({ "ticker": "AAPL" }))));
        provider
            .expect_complete()
            .withf(|req| {
                let last = req.messages.last().unwrap();
                last.tool_call_id.as_deref() == Some("call_1")
                    && !last.is_error
                    && last.text().unwrap().contains("\"trend\":\"up\"")
            })
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(answer("AAPL is trending up")));

        let recorder = Arc::new(Recorder::default());
        let executor = AgentExecutor::builder()
            .provider(Arc::new(provider))
            .tool_registry(registry())
            .agent_name("Senior Stock Price Analyst")
            .event_handler(recorder.clone())
            .build()
            .unwrap();

        let outcome = executor.run("Check AAPL".to_string()).await.unwrap();
        assert_eq!(outcome.output, "AAPL is trending up");
        assert_eq!(outcome.iterations, 2);
        assert_eq!(outcome.usage.total(), 38);
        assert_eq!(outcome.usage.requests, 2);

        let events = recorder.events.lock().unwrap().clone();
        assert_eq!(
            events,
            vec![
                "start:Senior Stock Price Analyst:fetch_stock_prices",
                "done:fetch_stock_prices:ok",
                "complete:AAPL is trending up",
            ]
        );
    }

    #[tokio::test]
    async fn test_unknown_tool_is_reported_to_model() {
        let mut seq = Sequence::new();
        let mut provider = MockLLMProvider::new();
        provider
            .expect_complete()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(tool_call("web_browse", json!({}))));
        provider
            .expect_complete()
            .withf(|req| {
                let last = req.messages.last().unwrap();
                last.is_error && last.text().unwrap().starts_with("Error: Tool 'web_browse'")
            })
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(answer("I could not browse")));

        let executor = AgentExecutor::builder()
            .provider(Arc::new(provider))
            .tool_registry(registry())
            .build()
            .unwrap();

        let outcome = executor.run("Browse".to_string()).await.unwrap();
        assert_eq!(outcome.output, "I could not browse");
    }

    #[tokio::test]
    async fn test_exhaustion_forces_final_answer() {
        let mut seq = Sequence::new();
        let mut provider = MockLLMProvider::new();
        provider
            .expect_complete()
            .withf(|req| req.tools.is_some())
            .times(2)
            .in_sequence(&mut seq)
            .returning(|_| Ok(tool_call("fetch_stock_prices", json!({ "ticker": "MSFT" }))));
        provider
            .expect_complete()
            .withf(|req| {
                req.tools.is_none()
                    && req.messages.last().and_then(Message::text) == Some("Final, now.")
            })
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(answer("Best effort answer")));

        let executor = AgentExecutor::builder()
            .provider(Arc::new(provider))
            .tool_registry(registry())
            .max_iterations(2)
            .force_final_answer_prompt("Final, now.")
            .build()
            .unwrap();

        let outcome = executor.run("Loop".to_string()).await.unwrap();
        assert_eq!(outcome.output, "Best effort answer");
        assert!(outcome.forced);
        assert_eq!(outcome.iterations, 3);
        assert_eq!(outcome.usage.requests, 3);
    }

    #[tokio::test]
    async fn test_provider_error_propagates() {
        let mut provider = MockLLMProvider::new();
        provider
            .expect_complete()
            .returning(|_| Err(agent_llm::LLMError::AuthenticationFailed));

        let executor = AgentExecutor::builder()
            .provider(Arc::new(provider))
            .build()
            .unwrap();

        let err = executor.run("Hi".to_string()).await.unwrap_err();
        assert!(matches!(err, agent_core::Error::ProcessingFailed(_)));
    }

    #[tokio::test]
    async fn test_content_filter_is_error() {
        let mut provider = MockLLMProvider::new();
        provider.expect_complete().returning(|_| {
            Ok(CompletionResponse {
                message: Message::assistant(""),
                stop_reason: StopReason::ContentFilter,
                usage: TokenUsage::default(),
            })
        });

        let executor = AgentExecutor::builder()
            .provider(Arc::new(provider))
            .build()
            .unwrap();

        assert!(executor.run("Hi".to_string()).await.is_err());
    }
}
