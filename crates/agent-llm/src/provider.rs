//! LLM provider trait definition

use crate::{CompletionRequest, CompletionResponse, Result};
use async_trait::async_trait;

/// Trait for LLM providers
///
/// Implementations turn a provider-agnostic [`CompletionRequest`] into a call
/// against a concrete model API and map the answer back.
#[cfg_attr(any(test, feature = "mock"), mockall::automock)]
#[async_trait]
pub trait LLMProvider: Send + Sync {
    /// Generate a completion from the LLM
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse>;

    /// Get the provider name (e.g., "openai")
    fn name(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Message, StopReason, TokenUsage};

    #[tokio::test]
    async fn test_mock_provider() {
        let mut provider = MockLLMProvider::new();
        provider
            .expect_complete()
            .withf(|req| req.model == "gpt-3.5-turbo")
            .times(1)
            .returning(|_| {
                Ok(CompletionResponse {
                    message: Message::assistant("AAPL closed higher"),
                    stop_reason: StopReason::EndTurn,
                    usage: TokenUsage::single(12, 4),
                })
            });

        let request = CompletionRequest::builder("gpt-3.5-turbo")
            .add_message(Message::user("How did AAPL do?"))
            .build();
        let response = provider.complete(request).await.unwrap();

        assert_eq!(response.message.text(), Some("AAPL closed higher"));
        assert_eq!(response.usage.total(), 16);
    }
}
