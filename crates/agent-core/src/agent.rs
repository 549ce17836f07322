//! Core Agent trait definition

use crate::{Context, Result};
use async_trait::async_trait;

/// Core trait that all agents must implement
///
/// An agent receives a fully rendered prompt (the task description plus any
/// context gathered from earlier tasks) and produces a text answer. Agents
/// are addressed by their role when work is delegated between them.
#[async_trait]
pub trait Agent: Send + Sync {
    /// Process input and return output
    async fn process(&self, input: String, context: &mut Context) -> Result<String>;

    /// Get the agent's name
    fn name(&self) -> &str;

    /// Get the agent's role, used to address it from other agents
    ///
    /// Defaults to the agent name.
    fn role(&self) -> &str {
        self.name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Echo;

    #[async_trait]
    impl Agent for Echo {
        async fn process(&self, input: String, _context: &mut Context) -> Result<String> {
            Ok(input)
        }

        fn name(&self) -> &str {
            "echo"
        }
    }

    #[test]
    fn test_role_defaults_to_name() {
        let agent = Echo;
        assert_eq!(agent.role(), "echo");

        let mut ctx = Context::new();
        let out = tokio_test::block_on(agent.process("hi".to_string(), &mut ctx)).unwrap();
        assert_eq!(out, "hi");
    }
}
