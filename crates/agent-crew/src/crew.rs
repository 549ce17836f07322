//! Crew assembly and kickoff

use crate::delegation::{UsageMeter, delegation_tools};
use crate::{CrewError, CrewOutput, Result, Task, TaskOutput};
use agent_core::{Context, TaskRecord};
use agent_llm::{DEFAULT_MODEL, LLMProvider, TokenUsage};
use agent_prompt::{CrewPrompts, JinjaTemplate, ManagerPersona};
use agent_runtime::RoleAgent;
use agent_tools::ToolCache;
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use uuid::Uuid;

const DEFAULT_MANAGER_MAX_ITER: usize = 10;
const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(600);

/// How tasks are assigned to agents
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Process {
    /// Each task runs on its own agent, in order
    #[default]
    Sequential,
    /// A manager agent runs every task, delegating to crew members
    Hierarchical,
}

/// Callbacks around task execution
#[async_trait]
pub trait CrewEventHandler: Send + Sync {
    /// A task is about to run
    async fn on_task_start(&self, _task: &str, _agent: &str) {}

    /// A task finished
    async fn on_task_done(&self, _output: &TaskOutput) {}
}

/// A team of agents working through an ordered list of tasks
pub struct Crew {
    agents: Vec<Arc<RoleAgent>>,
    tasks: Vec<Task>,
    process: Process,
    manager: Option<Arc<RoleAgent>>,
    prompts: Arc<CrewPrompts>,
    cache: Option<ToolCache>,
    event_handler: Option<Arc<dyn CrewEventHandler>>,
}

impl Crew {
    /// Start building a crew
    pub fn builder() -> CrewBuilder {
        CrewBuilder::new()
    }

    /// Crew members
    pub fn agents(&self) -> &[Arc<RoleAgent>] {
        &self.agents
    }

    /// Tasks in execution order
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    /// The process in use
    pub fn process(&self) -> Process {
        self.process
    }

    /// The manager agent of a hierarchical crew
    pub fn manager(&self) -> Option<&Arc<RoleAgent>> {
        self.manager.as_ref()
    }

    /// Shared tool result cache, if enabled
    pub fn cache(&self) -> Option<&ToolCache> {
        self.cache.as_ref()
    }

    fn agent(&self, role: &str) -> Option<&Arc<RoleAgent>> {
        self.agents.iter().find(|a| a.role() == role)
    }

    /// Run every task once, in order
    ///
    /// `inputs` are interpolated into task descriptions, expected outputs and
    /// agent personas.
    pub async fn kickoff<I, K, V>(&self, inputs: I) -> Result<CrewOutput>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let id = Uuid::new_v4();
        let mut context = Context::from_inputs(inputs);
        let meter = UsageMeter::new();
        let mut usage = TokenUsage::default();
        let mut tasks_output = Vec::with_capacity(self.tasks.len());

        info!(
            crew_id = %id,
            process = ?self.process,
            task_count = self.tasks.len(),
            input_count = context.input_count(),
            "Crew kickoff"
        );

        for task in &self.tasks {
            let output = self.run_task(task, &context, &meter, &mut usage).await?;

            context.record_task(TaskRecord {
                task: output.name.clone(),
                agent: output.agent.clone(),
                output: output.raw.clone(),
            });

            if let Some(handler) = &self.event_handler {
                handler.on_task_done(&output).await;
            }
            tasks_output.push(output);
        }

        usage += meter.total();
        let final_output = tasks_output
            .last()
            .map(|t| t.raw.clone())
            .unwrap_or_default();

        info!(
            crew_id = %id,
            total_tokens = usage.total(),
            requests = usage.requests,
            "Crew finished"
        );

        Ok(CrewOutput {
            id,
            final_output,
            tasks_output,
            token_usage: usage,
        })
    }

    async fn run_task(
        &self,
        task: &Task,
        context: &Context,
        meter: &UsageMeter,
        usage: &mut TokenUsage,
    ) -> Result<TaskOutput> {
        let inputs = context.inputs_json();
        let description = JinjaTemplate::new(format!("{}.description", task.name), &task.description)?
            .render(&inputs)?;
        let expected_output =
            JinjaTemplate::new(format!("{}.expected_output", task.name), &task.expected_output)?
                .render(&inputs)?;

        let mut blocks = Vec::new();
        if let Some(prefetch) = &task.prefetch {
            match prefetch.fetch(context).await {
                Ok(data) => blocks.push(data),
                Err(e) => {
                    warn!(task = %task.name, error = %e, "Prefetch failed");
                    blocks.push(format!("Data fetch failed: {e}"));
                }
            }
        }
        blocks.extend(self.context_for(task, context));
        let context_text = blocks.join("\n\n");

        let mut prompt =
            self.prompts
                .task_prompt(&description, &expected_output, Some(&context_text))?;

        let (agent, extra_tools) = match self.process {
            Process::Sequential => {
                let agent = task
                    .agent
                    .as_deref()
                    .and_then(|role| self.agent(role))
                    .ok_or_else(|| CrewError::UnassignedTask(task.name.clone()))?;

                let extra_tools = if agent.allow_delegation() {
                    let coworkers: Vec<_> = self
                        .agents
                        .iter()
                        .filter(|a| a.role() != agent.role())
                        .cloned()
                        .collect();
                    if coworkers.is_empty() {
                        Vec::new()
                    } else {
                        delegation_tools(coworkers, context, meter, &self.prompts)?
                    }
                } else {
                    Vec::new()
                };
                (agent, extra_tools)
            }
            Process::Hierarchical => {
                let manager = self.manager.as_ref().ok_or(CrewError::ManagerNotConfigured)?;
                if let Some(role) = &task.agent {
                    prompt.push_str(&format!(
                        "\n\nThe co-worker best suited for this task is: {role}"
                    ));
                }
                let tools = delegation_tools(self.agents.clone(), context, meter, &self.prompts)?;
                (manager, tools)
            }
        };

        info!(task = %task.name, agent = agent.role(), "Task started");
        if let Some(handler) = &self.event_handler {
            handler.on_task_start(&task.name, agent.role()).await;
        }

        let outcome = agent.execute_task(&prompt, context, &extra_tools).await?;
        *usage += outcome.usage;

        info!(
            task = %task.name,
            agent = agent.role(),
            iterations = outcome.iterations,
            forced = outcome.forced,
            "Task completed"
        );

        Ok(TaskOutput {
            name: task.name.clone(),
            description,
            agent: agent.role().to_string(),
            raw: outcome.output,
        })
    }

    /// Outputs feeding a task: its named context tasks, else the previous task
    fn context_for(&self, task: &Task, context: &Context) -> Vec<String> {
        if task.context.is_empty() {
            return context.last_output().map(str::to_string).into_iter().collect();
        }

        task.context
            .iter()
            .filter_map(|name| {
                let output = context.task_output(name);
                if output.is_none() {
                    debug!(task = %task.name, context = %name, "Context task produced no output");
                }
                output.map(str::to_string)
            })
            .collect()
    }
}

impl std::fmt::Debug for Crew {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Crew")
            .field("process", &self.process)
            .field("agents", &self.agents.iter().map(|a| a.role()).collect::<Vec<_>>())
            .field("tasks", &self.tasks.iter().map(Task::name).collect::<Vec<_>>())
            .field("cache", &self.cache.is_some())
            .finish_non_exhaustive()
    }
}

/// Builder for [`Crew`]
pub struct CrewBuilder {
    agents: Vec<RoleAgent>,
    tasks: Vec<Task>,
    process: Process,
    manager_provider: Option<Arc<dyn LLMProvider>>,
    manager_model: String,
    max_iter: usize,
    cache: Option<ToolCache>,
    prompts: Option<Arc<CrewPrompts>>,
    event_handler: Option<Arc<dyn CrewEventHandler>>,
}

impl CrewBuilder {
    /// Create an empty builder
    pub fn new() -> Self {
        Self {
            agents: Vec::new(),
            tasks: Vec::new(),
            process: Process::Sequential,
            manager_provider: None,
            manager_model: DEFAULT_MODEL.to_string(),
            max_iter: DEFAULT_MANAGER_MAX_ITER,
            cache: Some(ToolCache::new(DEFAULT_CACHE_TTL)),
            prompts: None,
            event_handler: None,
        }
    }

    /// Add a crew member
    pub fn agent(mut self, agent: RoleAgent) -> Self {
        self.agents.push(agent);
        self
    }

    /// Add a task; tasks run in the order they are added
    pub fn task(mut self, task: Task) -> Self {
        self.tasks.push(task);
        self
    }

    /// Set the process
    pub fn process(mut self, process: Process) -> Self {
        self.process = process;
        self
    }

    /// LLM used by the manager of a hierarchical crew
    pub fn manager_provider(mut self, provider: Arc<dyn LLMProvider>) -> Self {
        self.manager_provider = Some(provider);
        self
    }

    /// Model used by the manager
    pub fn manager_model(mut self, model: impl Into<String>) -> Self {
        self.manager_model = model.into();
        self
    }

    /// Iteration budget of the manager per task
    pub fn max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    /// Share a tool result cache between the agents
    pub fn cache(mut self, cache: ToolCache) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Disable tool result caching
    pub fn without_cache(mut self) -> Self {
        self.cache = None;
        self
    }

    /// Share already parsed prompt slices
    pub fn prompts(mut self, prompts: Arc<CrewPrompts>) -> Self {
        self.prompts = Some(prompts);
        self
    }

    /// Receive task callbacks
    pub fn event_handler(mut self, handler: Arc<dyn CrewEventHandler>) -> Self {
        self.event_handler = Some(handler);
        self
    }

    /// Validate and build the crew
    pub fn build(self) -> Result<Crew> {
        if self.tasks.is_empty() {
            return Err(CrewError::NoTasks);
        }

        let mut roles = HashSet::new();
        for agent in &self.agents {
            if !roles.insert(agent.role().to_string()) {
                return Err(CrewError::DuplicateAgent(agent.role().to_string()));
            }
        }

        let mut seen = HashSet::new();
        for task in &self.tasks {
            match (&task.agent, self.process) {
                (Some(agent), _) if !roles.contains(agent) => {
                    return Err(CrewError::UnknownAgent {
                        task: task.name.clone(),
                        agent: agent.clone(),
                    });
                }
                (None, Process::Sequential) => {
                    return Err(CrewError::UnassignedTask(task.name.clone()));
                }
                _ => {}
            }

            if let Some(context) = task.context.iter().find(|c| !seen.contains(c.as_str())) {
                return Err(CrewError::InvalidContext {
                    task: task.name.clone(),
                    context: context.clone(),
                });
            }

            if !seen.insert(task.name.as_str()) {
                return Err(CrewError::DuplicateTask(task.name.clone()));
            }
        }

        let prompts = match self.prompts {
            Some(prompts) => prompts,
            None => Arc::new(CrewPrompts::new()?),
        };

        let manager = match self.process {
            Process::Sequential => None,
            Process::Hierarchical => {
                let provider = self.manager_provider.ok_or(CrewError::ManagerNotConfigured)?;
                let persona = ManagerPersona::DEFAULT;
                let manager = RoleAgent::builder(persona.role)
                    .goal(persona.goal)
                    .backstory(persona.backstory)
                    .allow_delegation(true)
                    .max_iter(self.max_iter)
                    .model(self.manager_model)
                    .provider(provider)
                    .prompts(prompts.clone())
                    .build()?;
                Some(Arc::new(manager))
            }
        };

        let agents = self
            .agents
            .into_iter()
            .map(|mut agent| {
                if let Some(cache) = &self.cache {
                    agent.set_tool_cache(cache.clone());
                }
                Arc::new(agent)
            })
            .collect();

        Ok(Crew {
            agents,
            tasks: self.tasks,
            process: self.process,
            manager,
            prompts,
            cache: self.cache,
            event_handler: self.event_handler,
        })
    }
}

impl Default for CrewBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Prefetch;
    use agent_llm::{CompletionResponse, Message, MockLLMProvider, StopReason, ToolCall};
    use agent_tools::Tool;
    use mockall::Sequence;
    use serde_json::{Value, json};
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn answer(text: &str) -> CompletionResponse {
        CompletionResponse {
            message: Message::assistant(text),
            stop_reason: StopReason::EndTurn,
            usage: TokenUsage::single(10, 5),
        }
    }

    fn call(id: &str, name: &str, arguments: Value) -> CompletionResponse {
        CompletionResponse {
            message: Message::assistant_tool_calls(
                None,
                vec![ToolCall {
                    id: id.to_string(),
                    name: name.to_string(),
                    arguments,
                }],
            ),
            stop_reason: StopReason::ToolUse,
            usage: TokenUsage::single(10, 5),
        }
    }

    fn agent_answering(role: &str, reply: &'static str) -> RoleAgent {
        let mut provider = MockLLMProvider::new();
        provider.expect_complete().returning(move |_| Ok(answer(reply)));
        RoleAgent::builder(role)
            .goal("Do the job")
            .provider(Arc::new(provider))
            .build()
            .unwrap()
    }

    fn task(name: &str, agent: &str) -> crate::TaskBuilder {
        Task::builder(name)
            .description(format!("{name} for {{{{ ticker }}}}"))
            .expected_output("Text")
            .agent(agent)
    }

    #[test]
    fn test_validation() {
        let empty = Crew::builder().agent(agent_answering("A", "x")).build();
        assert!(matches!(empty, Err(CrewError::NoTasks)));

        let unknown = Crew::builder()
            .agent(agent_answering("A", "x"))
            .task(task("t1", "B").build())
            .build();
        assert!(matches!(unknown, Err(CrewError::UnknownAgent { .. })));

        let forward = Crew::builder()
            .agent(agent_answering("A", "x"))
            .task(task("t1", "A").context("t2").build())
            .task(task("t2", "A").build())
            .build();
        assert!(matches!(forward, Err(CrewError::InvalidContext { .. })));

        let duplicate = Crew::builder()
            .agent(agent_answering("A", "x"))
            .task(task("t1", "A").build())
            .task(task("t1", "A").build())
            .build();
        assert!(matches!(duplicate, Err(CrewError::DuplicateTask(_))));

        let unassigned = Crew::builder()
            .agent(agent_answering("A", "x"))
            .task(Task::builder("t1").description("d").build())
            .build();
        assert!(matches!(unassigned, Err(CrewError::UnassignedTask(_))));

        let twins = Crew::builder()
            .agent(agent_answering("A", "x"))
            .agent(agent_answering("A", "y"))
            .task(task("t1", "A").build())
            .build();
        assert!(matches!(twins, Err(CrewError::DuplicateAgent(_))));

        let no_manager = Crew::builder()
            .agent(agent_answering("A", "x"))
            .task(task("t1", "A").build())
            .process(Process::Hierarchical)
            .build();
        assert!(matches!(no_manager, Err(CrewError::ManagerNotConfigured)));
    }

    #[tokio::test]
    async fn test_sequential_context_wiring() {
        let mut writer_provider = MockLLMProvider::new();
        writer_provider
            .expect_complete()
            .withf(|req| {
                let prompt = req.messages[0].text().unwrap_or_default();
                prompt.starts_with("Current Task: write for MSFT")
                    && prompt.contains("price up\n\nnews calm")
            })
            .times(1)
            .returning(|_| Ok(answer("Final report")));
        let writer = RoleAgent::builder("Writer")
            .provider(Arc::new(writer_provider))
            .build()
            .unwrap();

        let mut news_provider = MockLLMProvider::new();
        news_provider
            .expect_complete()
            .withf(|req| {
                // no named context: previous task output is used
                req.messages[0].text().unwrap_or_default().ends_with("price up")
            })
            .times(1)
            .returning(|_| Ok(answer("news calm")));
        let news = RoleAgent::builder("News")
            .provider(Arc::new(news_provider))
            .build()
            .unwrap();

        let crew = Crew::builder()
            .agent(agent_answering("Price", "price up"))
            .agent(news)
            .agent(writer)
            .task(task("price", "Price").build())
            .task(task("news", "News").build())
            .task(task("write", "Writer").context("price").context("news").build())
            .build()
            .unwrap();

        let output = crew.kickoff([("ticker", "MSFT")]).await.unwrap();

        assert_eq!(output.final_output, "Final report");
        assert_eq!(output.tasks_output.len(), 3);
        assert_eq!(output.task("price").unwrap().raw, "price up");
        assert_eq!(output.task("news").unwrap().description, "news for MSFT");
        assert_eq!(output.token_usage.requests, 3);
        assert_eq!(output.token_usage.total(), 45);
    }

    #[tokio::test]
    async fn test_missing_input_is_error() {
        let crew = Crew::builder()
            .agent(agent_answering("A", "x"))
            .task(task("t1", "A").build())
            .build()
            .unwrap();

        let err = crew.kickoff([("symbol", "MSFT")]).await.unwrap_err();
        assert!(matches!(err, CrewError::Agent(_)));
    }

    struct FixedData(AtomicUsize);

    #[async_trait]
    impl Prefetch for FixedData {
        async fn fetch(&self, context: &Context) -> agent_core::Result<String> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(format!("{{\"ticker\":\"{}\"}}", context.require_input("ticker")?))
        }
    }

    #[tokio::test]
    async fn test_prefetch_lands_in_context() {
        let mut provider = MockLLMProvider::new();
        provider
            .expect_complete()
            .withf(|req| {
                req.messages[0]
                    .text()
                    .unwrap_or_default()
                    .ends_with("This is the context you're working with:\n{\"ticker\":\"NVDA\"}")
            })
            .times(1)
            .returning(|_| Ok(answer("NVDA up")));
        let agent = RoleAgent::builder("Price")
            .provider(Arc::new(provider))
            .build()
            .unwrap();

        let fetcher = Arc::new(FixedData(AtomicUsize::new(0)));
        let crew = Crew::builder()
            .agent(agent)
            .task(task("price", "Price").prefetch(fetcher.clone()).build())
            .build()
            .unwrap();

        let output = crew.kickoff([("ticker", "NVDA")]).await.unwrap();
        assert_eq!(output.final_output, "NVDA up");
        assert_eq!(fetcher.0.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_hierarchical_manager_delegates() {
        let mut seq = Sequence::new();
        let mut manager = MockLLMProvider::new();
        manager
            .expect_complete()
            .withf(|req| {
                let tools: Vec<_> = req
                    .tools
                    .as_ref()
                    .map(|t| t.iter().map(|d| d.name.clone()).collect())
                    .unwrap_or_default();
                tools == ["ask_question", "delegate_work"]
                    && req.messages[0]
                        .text()
                        .unwrap_or_default()
                        .contains("best suited for this task is: Risk Analyst")
            })
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| {
                Ok(call(
                    "call_1",
                    "delegate_work",
                    json!({
                        "task": "Assess AAPL",
                        "context": "Beta matters",
                        "coworker": "Risk Analyst"
                    }),
                ))
            });
        manager
            .expect_complete()
            .withf(|req| req.messages.last().and_then(Message::text) == Some("Risk is moderate"))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(answer("Manager summary: risk is moderate")));

        let crew = Crew::builder()
            .agent(agent_answering("Risk Analyst", "Risk is moderate"))
            .task(task("get_risks", "Risk Analyst").build())
            .process(Process::Hierarchical)
            .manager_provider(Arc::new(manager))
            .build()
            .unwrap();

        assert_eq!(crew.manager().unwrap().role(), "Crew Manager");

        let output = crew.kickoff([("ticker", "AAPL")]).await.unwrap();
        assert_eq!(output.final_output, "Manager summary: risk is moderate");
        assert_eq!(output.tasks_output[0].agent, "Crew Manager");
        // two manager calls plus the delegated one
        assert_eq!(output.token_usage.requests, 3);
    }

    struct CountingTool(AtomicUsize);

    #[async_trait]
    impl Tool for CountingTool {
        async fn execute(&self, _params: Value) -> agent_core::Result<Value> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(json!({ "beta": 1.2 }))
        }

        fn name(&self) -> &str {
            "risk_assessment"
        }

        fn description(&self) -> &str {
            "Risk"
        }

        fn input_schema(&self) -> Value {
            json!({ "type": "object" })
        }
    }

    #[tokio::test]
    async fn test_tool_results_are_cached_across_tasks() {
        let mut provider = MockLLMProvider::new();
        let turns = Mutex::new(0usize);
        provider.expect_complete().returning(move |_| {
            let mut n = turns.lock().unwrap();
            *n += 1;
            // odd turns call the tool, even turns answer
            if *n % 2 == 1 {
                Ok(call("c", "risk_assessment", json!({ "ticker": "AAPL" })))
            } else {
                Ok(answer("done"))
            }
        });

        let tool = Arc::new(CountingTool(AtomicUsize::new(0)));
        let agent = RoleAgent::builder("Risk Analyst")
            .tool(tool.clone())
            .provider(Arc::new(provider))
            .build()
            .unwrap();

        let crew = Crew::builder()
            .agent(agent)
            .task(task("first", "Risk Analyst").build())
            .task(task("second", "Risk Analyst").build())
            .build()
            .unwrap();

        crew.kickoff([("ticker", "AAPL")]).await.unwrap();
        assert_eq!(tool.0.load(Ordering::SeqCst), 1);
        assert_eq!(crew.cache().unwrap().len().await, 1);
    }

    #[derive(Default)]
    struct Events(Mutex<Vec<String>>);

    #[async_trait]
    impl CrewEventHandler for Events {
        async fn on_task_start(&self, task: &str, agent: &str) {
            self.0.lock().unwrap().push(format!("start {task} {agent}"));
        }

        async fn on_task_done(&self, output: &TaskOutput) {
            self.0.lock().unwrap().push(format!("done {}", output.name));
        }
    }

    #[tokio::test]
    async fn test_event_handler() {
        let events = Arc::new(Events::default());
        let crew = Crew::builder()
            .agent(agent_answering("A", "x"))
            .task(task("t1", "A").build())
            .event_handler(events.clone())
            .without_cache()
            .build()
            .unwrap();

        crew.kickoff([("ticker", "X")]).await.unwrap();
        assert_eq!(*events.0.lock().unwrap(), vec!["start t1 A", "done t1"]);
        assert!(crew.cache().is_none());
    }
}
