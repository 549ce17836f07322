//! Role-playing crew member

use crate::executor::{AgentExecutor, ExecutionOutcome, ExecutorConfig, ExecutorEventHandler};
use agent_core::{Agent, Context, Result};
use agent_llm::{DEFAULT_MODEL, LLMProvider};
use agent_prompt::{CrewPrompts, JinjaTemplate, ToolSummary};
use agent_tools::{Tool, ToolCache, ToolRegistry};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info};

const DEFAULT_MAX_ITER: usize = 15;

/// An agent defined by a role, a goal and a backstory
///
/// The persona fields may reference crew inputs (`{{ ticker }}`); they are
/// rendered against the [`Context`] inputs at execution time.
///
/// ```no_run
/// use agent_runtime::RoleAgent;
/// # fn provider() -> std::sync::Arc<dyn agent_llm::LLMProvider> { unimplemented!() }
///
/// let analyst = RoleAgent::builder("Risk Analyst")
///     .goal("Assess the risks of {{ ticker }}")
///     .backstory("You have a keen eye for risk.")
///     .max_iter(5)
///     .provider(provider())
///     .build()
///     .unwrap();
///
/// assert_eq!(analyst.role(), "Risk Analyst");
/// ```
pub struct RoleAgent {
    role: String,
    goal: String,
    backstory: String,
    tools: Vec<Arc<dyn Tool>>,
    max_iter: usize,
    allow_delegation: bool,
    verbose: bool,
    model: String,
    provider: Arc<dyn LLMProvider>,
    prompts: Arc<CrewPrompts>,
    tool_cache: Option<ToolCache>,
    event_handler: Option<Arc<dyn ExecutorEventHandler>>,
}

impl RoleAgent {
    /// Start building an agent with the given role
    pub fn builder(role: impl Into<String>) -> RoleAgentBuilder {
        RoleAgentBuilder::new(role)
    }

    /// The agent's role (unrendered)
    pub fn role(&self) -> &str {
        &self.role
    }

    /// The agent's goal (unrendered)
    pub fn goal(&self) -> &str {
        &self.goal
    }

    /// The agent's backstory (unrendered)
    pub fn backstory(&self) -> &str {
        &self.backstory
    }

    /// Tools the agent owns
    pub fn tools(&self) -> &[Arc<dyn Tool>] {
        &self.tools
    }

    /// Iteration budget per task
    pub fn max_iter(&self) -> usize {
        self.max_iter
    }

    /// Whether the agent may hand work to co-workers
    pub fn allow_delegation(&self) -> bool {
        self.allow_delegation
    }

    /// Whether the agent logs its answers at info level
    pub fn verbose(&self) -> bool {
        self.verbose
    }

    /// Model the agent talks to
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Prompt slices shared with the crew
    pub fn prompts(&self) -> &Arc<CrewPrompts> {
        &self.prompts
    }

    /// Route the agent's own tools through a shared result cache
    pub fn set_tool_cache(&mut self, cache: ToolCache) {
        self.tool_cache = Some(cache);
    }

    /// Run one piece of work
    ///
    /// `prompt` is the task prompt; `extra_tools` are added to the agent's
    /// own tools for this run only (the crew passes delegation tools here).
    pub async fn execute_task(
        &self,
        prompt: &str,
        context: &Context,
        extra_tools: &[Arc<dyn Tool>],
    ) -> Result<ExecutionOutcome> {
        let inputs = context.inputs_json();
        let role = render_field("role", &self.role, &inputs)?;
        let goal = render_field("goal", &self.goal, &inputs)?;
        let backstory = render_field("backstory", &self.backstory, &inputs)?;

        let own_tools = self.tools.iter().map(|tool| match &self.tool_cache {
            Some(cache) => cache.wrap(tool.clone()),
            None => tool.clone(),
        });
        let registry = ToolRegistry::from_tools(own_tools.chain(extra_tools.iter().cloned()));
        let summaries: Vec<ToolSummary> = registry
            .list_tools()
            .iter()
            .map(|tool| ToolSummary {
                name: tool.name().to_string(),
                description: tool.description().to_string(),
            })
            .collect();

        let system_prompt = self
            .prompts
            .system_prompt(&role, &goal, &backstory, &summaries)?;

        debug!(agent = %self.role, tools = ?registry.names(), "Starting agent execution");

        let config = ExecutorConfig {
            agent_name: self.role.clone(),
            max_iterations: self.max_iter,
            model: self.model.clone(),
            system_prompt: Some(system_prompt),
            force_final_answer_prompt: self.prompts.force_final_answer()?,
            ..ExecutorConfig::default()
        };

        let mut executor = AgentExecutor::new(self.provider.clone(), Arc::new(registry), config);
        if let Some(handler) = &self.event_handler {
            executor = executor.with_event_handler(handler.clone());
        }

        let outcome = executor.run(prompt.to_string()).await?;

        if self.verbose {
            info!(agent = %self.role, output = %outcome.output, "Agent final answer");
        } else {
            debug!(agent = %self.role, output_length = outcome.output.len(), "Agent final answer");
        }

        Ok(outcome)
    }
}

fn render_field(field: &str, source: &str, inputs: &serde_json::Value) -> Result<String> {
    if !source.contains("{{") && !source.contains("{%") {
        return Ok(source.to_string());
    }
    Ok(JinjaTemplate::new(field, source)?.render(inputs)?)
}

#[async_trait]
impl Agent for RoleAgent {
    async fn process(&self, input: String, context: &mut Context) -> Result<String> {
        let outcome = self.execute_task(&input, context, &[]).await?;
        Ok(outcome.output)
    }

    fn name(&self) -> &str {
        &self.role
    }

    fn role(&self) -> &str {
        &self.role
    }
}

impl std::fmt::Debug for RoleAgent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoleAgent")
            .field("role", &self.role)
            .field("max_iter", &self.max_iter)
            .field("allow_delegation", &self.allow_delegation)
            .field(
                "tools",
                &self.tools.iter().map(|t| t.name()).collect::<Vec<_>>(),
            )
            .finish_non_exhaustive()
    }
}

/// Builder for [`RoleAgent`]
pub struct RoleAgentBuilder {
    role: String,
    goal: String,
    backstory: String,
    tools: Vec<Arc<dyn Tool>>,
    max_iter: usize,
    allow_delegation: bool,
    verbose: bool,
    model: String,
    provider: Option<Arc<dyn LLMProvider>>,
    prompts: Option<Arc<CrewPrompts>>,
    event_handler: Option<Arc<dyn ExecutorEventHandler>>,
}

impl RoleAgentBuilder {
    /// Create a builder for the given role
    pub fn new(role: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            goal: String::new(),
            backstory: String::new(),
            tools: Vec::new(),
            max_iter: DEFAULT_MAX_ITER,
            allow_delegation: false,
            verbose: false,
            model: DEFAULT_MODEL.to_string(),
            provider: None,
            prompts: None,
            event_handler: None,
        }
    }

    /// Set the goal
    pub fn goal(mut self, goal: impl Into<String>) -> Self {
        self.goal = goal.into();
        self
    }

    /// Set the backstory
    pub fn backstory(mut self, backstory: impl Into<String>) -> Self {
        self.backstory = backstory.into();
        self
    }

    /// Give the agent a tool
    pub fn tool(mut self, tool: Arc<dyn Tool>) -> Self {
        self.tools.push(tool);
        self
    }

    /// Give the agent several tools
    pub fn tools(mut self, tools: impl IntoIterator<Item = Arc<dyn Tool>>) -> Self {
        self.tools.extend(tools);
        self
    }

    /// Set the iteration budget per task
    pub fn max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    /// Allow delegating work to co-workers
    pub fn allow_delegation(mut self, allow: bool) -> Self {
        self.allow_delegation = allow;
        self
    }

    /// Log answers at info level
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Set the model
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set the LLM provider
    pub fn provider(mut self, provider: Arc<dyn LLMProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    /// Share already parsed prompt slices
    pub fn prompts(mut self, prompts: Arc<CrewPrompts>) -> Self {
        self.prompts = Some(prompts);
        self
    }

    /// Set the event handler
    pub fn event_handler(mut self, handler: Arc<dyn ExecutorEventHandler>) -> Self {
        self.event_handler = Some(handler);
        self
    }

    /// Build the agent
    pub fn build(self) -> Result<RoleAgent> {
        let provider = self.provider.ok_or_else(|| {
            agent_core::Error::InitializationFailed(format!("{}: provider not set", self.role))
        })?;

        if self.role.trim().is_empty() {
            return Err(agent_core::Error::InitializationFailed(
                "agent role must not be empty".to_string(),
            ));
        }
        if self.max_iter == 0 {
            return Err(agent_core::Error::InitializationFailed(format!(
                "{}: max_iter must be at least 1",
                self.role
            )));
        }

        let prompts = match self.prompts {
            Some(prompts) => prompts,
            None => Arc::new(CrewPrompts::new()?),
        };

        Ok(RoleAgent {
            role: self.role,
            goal: self.goal,
            backstory: self.backstory,
            tools: self.tools,
            max_iter: self.max_iter,
            allow_delegation: self.allow_delegation,
            verbose: self.verbose,
            model: self.model,
            provider,
            prompts,
            tool_cache: None,
            event_handler: self.event_handler,
        })
    }
}
