//! Built-in prompt slices agents and tasks are assembled from

use crate::{PromptRegistry, Result};
use serde::Serialize;
use serde_json::json;

const ROLE_PLAYING: &str = "role_playing";
const TOOLS: &str = "tools";
const NO_TOOLS: &str = "no_tools";
const TASK: &str = "task";
const CONTEXT: &str = "context";
const FORCE_FINAL_ANSWER: &str = "force_final_answer";
const DELEGATE_WORK: &str = "delegate_work";
const ASK_QUESTION: &str = "ask_question";

const SLICES: &[(&str, &str)] = &[
    (
        ROLE_PLAYING,
        "You are {{ role }}. {{ backstory }}\nYour personal goal is: {{ goal }}",
    ),
    (
        TOOLS,
        "You ONLY have access to the following tools, and should NEVER make up tools that are not listed here:\n\n\
{% for tool in tools %}Tool Name: {{ tool.name }}\nTool Description: {{ tool.description }}\n\n{% endfor %}\
Call a tool whenever you need information it provides. Once you know the final answer, reply with it directly without calling any tool.",
    ),
    (
        NO_TOOLS,
        "To give my best complete final answer to the task, reply with the final answer directly.",
    ),
    (
        TASK,
        "Current Task: {{ description }}\n\n\
This is the expected criteria for your final answer: {{ expected_output }}\n\
You MUST return the actual complete content as the final answer, not a summary.",
    ),
    (
        CONTEXT,
        "This is the context you're working with:\n{{ context }}",
    ),
    (
        FORCE_FINAL_ANSWER,
        "Now it's time you MUST give your absolute best final answer. \
Stop using any tools and just return your absolute BEST final answer.",
    ),
    (
        DELEGATE_WORK,
        "Delegate a specific task to one of the following coworkers: {{ coworkers }}\n\
The input to this tool should be the coworker, the task you want them to do, and ALL necessary context to execute the task. \
They know nothing about the task, so share absolutely everything you know; don't reference things but instead explain them.",
    ),
    (
        ASK_QUESTION,
        "Ask a specific question to one of the following coworkers: {{ coworkers }}\n\
The input to this tool should be the coworker, the question you have for them, and ALL necessary context to ask the question properly. \
They know nothing about the question, so share absolutely everything you know; don't reference things but instead explain them.",
    ),
];

/// Name and description of a tool, as shown in an agent's system prompt
#[derive(Debug, Clone, Serialize)]
pub struct ToolSummary {
    pub name: String,
    pub description: String,
}

/// Persona of the manager agent that runs hierarchical crews
#[derive(Debug, Clone, Copy)]
pub struct ManagerPersona {
    pub role: &'static str,
    pub goal: &'static str,
    pub backstory: &'static str,
}

impl ManagerPersona {
    /// The default crew manager
    pub const DEFAULT: Self = Self {
        role: "Crew Manager",
        goal: "Manage the team to complete the task in the best way possible.",
        backstory: "You are a seasoned manager with a knack for getting the best out of your team.\n\
You are also known for your ability to delegate work to the right people, and to ask the right questions to get the best out of your team.\n\
Even though you don't perform tasks by yourself, you have a lot of experience in the field, which allows you to properly evaluate the work of your team members.",
    };
}

/// The crew prompt slices, parsed once
#[derive(Debug)]
pub struct CrewPrompts {
    registry: PromptRegistry,
}

impl CrewPrompts {
    /// Parse the built-in slices
    pub fn new() -> Result<Self> {
        let registry = PromptRegistry::new();
        for (name, source) in SLICES {
            registry.register_source(name, source)?;
        }
        Ok(Self { registry })
    }

    /// System prompt of an agent: persona plus the tool listing
    pub fn system_prompt(
        &self,
        role: &str,
        goal: &str,
        backstory: &str,
        tools: &[ToolSummary],
    ) -> Result<String> {
        let persona = self.registry.render(
            ROLE_PLAYING,
            &json!({ "role": role, "goal": goal, "backstory": backstory }),
        )?;

        let tooling = if tools.is_empty() {
            self.registry.render(NO_TOOLS, &json!({}))?
        } else {
            self.registry.render(TOOLS, &json!({ "tools": tools }))?
        };

        Ok(format!("{persona}\n\n{tooling}"))
    }

    /// User prompt of a task, with the optional context block appended
    pub fn task_prompt(
        &self,
        description: &str,
        expected_output: &str,
        context: Option<&str>,
    ) -> Result<String> {
        let mut prompt = self.registry.render(
            TASK,
            &json!({ "description": description, "expected_output": expected_output }),
        )?;

        if let Some(context) = context.filter(|c| !c.trim().is_empty()) {
            prompt.push_str("\n\n");
            prompt.push_str(&self.registry.render(CONTEXT, &json!({ "context": context }))?);
        }

        Ok(prompt)
    }

    /// Instruction sent once the iteration budget is spent
    pub fn force_final_answer(&self) -> Result<String> {
        self.registry.render(FORCE_FINAL_ANSWER, &json!({}))
    }

    /// Description of the `delegate_work` tool
    pub fn delegate_work_description(&self, coworkers: &[&str]) -> Result<String> {
        self.registry
            .render(DELEGATE_WORK, &json!({ "coworkers": coworkers.join(", ") }))
    }

    /// Description of the `ask_question` tool
    pub fn ask_question_description(&self, coworkers: &[&str]) -> Result<String> {
        self.registry
            .render(ASK_QUESTION, &json!({ "coworkers": coworkers.join(", ") }))
    }
}
