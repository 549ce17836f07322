//! Delegation tools: let one agent hand work or questions to a co-worker

use agent_core::{Context, Result};
use agent_llm::TokenUsage;
use agent_prompt::CrewPrompts;
use agent_runtime::RoleAgent;
use agent_tools::{Tool, optional_str, required_str};
use async_trait::async_trait;
use serde_json::{Value, json};
use std::sync::{Arc, Mutex, PoisonError};
use tracing::info;

const DELEGATED_EXPECTED_OUTPUT: &str =
    "Your best answer to your coworker asking you this, accounting for the context shared.";

/// Shared token counter for work done outside the main task loop
#[derive(Debug, Clone, Default)]
pub struct UsageMeter {
    inner: Arc<Mutex<TokenUsage>>,
}

impl UsageMeter {
    /// Create an empty meter
    pub fn new() -> Self {
        Self::default()
    }

    /// Add usage
    pub fn add(&self, usage: TokenUsage) {
        let mut total = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        *total += usage;
    }

    /// Usage recorded so far
    pub fn total(&self) -> TokenUsage {
        *self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// The co-workers a delegating agent can reach
#[derive(Clone)]
struct Coworkers {
    agents: Vec<Arc<RoleAgent>>,
    context: Context,
    usage: UsageMeter,
    prompts: Arc<CrewPrompts>,
}

impl Coworkers {
    fn roles(&self) -> Vec<&str> {
        self.agents.iter().map(|a| a.role()).collect()
    }

    fn find(&self, tool: &str, name: &str) -> Result<&Arc<RoleAgent>> {
        let wanted = normalize(name);
        self.agents
            .iter()
            .find(|a| normalize(a.role()) == wanted)
            .ok_or_else(|| {
                agent_core::Error::tool(
                    tool,
                    format!(
                        "Co-worker '{name}' not found, it must be one of the following options: {}",
                        self.roles().join(", ")
                    ),
                )
            })
    }

    async fn run(&self, tool: &str, params: &Value, request_key: &str) -> Result<Value> {
        let coworker = required_str(tool, params, "coworker")?;
        let request = required_str(tool, params, request_key)?;
        let shared = optional_str(params, "context");

        let agent = self.find(tool, coworker)?;
        info!(tool, coworker = agent.role(), "Delegating to co-worker");

        let prompt = self
            .prompts
            .task_prompt(request, DELEGATED_EXPECTED_OUTPUT, shared)?;
        let outcome = agent.execute_task(&prompt, &self.context, &[]).await?;
        self.usage.add(outcome.usage);

        Ok(Value::String(outcome.output))
    }
}

fn normalize(role: &str) -> String {
    role.trim()
        .trim_matches(|c| c == '"' || c == '\'')
        .trim()
        .to_lowercase()
}

fn input_schema(request_key: &str, request_description: &str) -> Value {
    json!({
        "type": "object",
        "properties": {
            request_key: { "type": "string", "description": request_description },
            "context": {
                "type": "string",
                "description": "Everything the co-worker needs to know to help"
            },
            "coworker": {
                "type": "string",
                "description": "Role of the co-worker to ask"
            }
        },
        "required": [request_key, "context", "coworker"]
    })
}

/// `delegate_work`: hand a task to a co-worker and return their answer
pub struct DelegateWorkTool {
    coworkers: Coworkers,
    description: String,
}

impl DelegateWorkTool {
    /// Create the tool over the given co-workers
    ///
    /// Delegated work runs with the crew inputs from `context` and adds its
    /// token usage to `usage`.
    pub fn new(
        agents: Vec<Arc<RoleAgent>>,
        context: Context,
        usage: UsageMeter,
        prompts: Arc<CrewPrompts>,
    ) -> Result<Self> {
        let roles: Vec<&str> = agents.iter().map(|a| a.role()).collect();
        let description = prompts.delegate_work_description(&roles)?;
        Ok(Self {
            coworkers: Coworkers {
                agents,
                context,
                usage,
                prompts,
            },
            description,
        })
    }
}

#[async_trait]
impl Tool for DelegateWorkTool {
    async fn execute(&self, params: Value) -> Result<Value> {
        self.coworkers.run(self.name(), &params, "task").await
    }

    fn name(&self) -> &str {
        "delegate_work"
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn input_schema(&self) -> Value {
        input_schema("task", "The task to delegate")
    }
}

/// `ask_question`: ask a co-worker a question and return their answer
pub struct AskQuestionTool {
    coworkers: Coworkers,
    description: String,
}

impl AskQuestionTool {
    /// Create the tool over the given co-workers
    pub fn new(
        agents: Vec<Arc<RoleAgent>>,
        context: Context,
        usage: UsageMeter,
        prompts: Arc<CrewPrompts>,
    ) -> Result<Self> {
        let roles: Vec<&str> = agents.iter().map(|a| a.role()).collect();
        let description = prompts.ask_question_description(&roles)?;
        Ok(Self {
            coworkers: Coworkers {
                agents,
                context,
                usage,
                prompts,
            },
            description,
        })
    }
}

#[async_trait]
impl Tool for AskQuestionTool {
    async fn execute(&self, params: Value) -> Result<Value> {
        self.coworkers.run(self.name(), &params, "question").await
    }

    fn name(&self) -> &str {
        "ask_question"
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn input_schema(&self) -> Value {
        input_schema("question", "The question to ask")
    }
}

/// Both delegation tools over the same co-workers
pub(crate) fn delegation_tools(
    agents: Vec<Arc<RoleAgent>>,
    context: &Context,
    usage: &UsageMeter,
    prompts: &Arc<CrewPrompts>,
) -> Result<Vec<Arc<dyn Tool>>> {
    Ok(vec![
        Arc::new(DelegateWorkTool::new(
            agents.clone(),
            context.clone(),
            usage.clone(),
            prompts.clone(),
        )?),
        Arc::new(AskQuestionTool::new(
            agents,
            context.clone(),
            usage.clone(),
            prompts.clone(),
        )?),
    ])
}
