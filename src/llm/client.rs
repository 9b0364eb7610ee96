//! LLM client abstraction.
//!
//! The research agent talks to any backend implementing this trait; the
//! Anthropic client is the default implementation.

use async_trait::async_trait;

use crate::error::Result;
use crate::llm::types::{CompletionRequest, CompletionResponse};

/// A text-generation backend.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Send a completion request and return the response.
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse>;

    /// The model this client targets.
    fn model(&self) -> &str;

    /// Whether the client is configured and able to make calls.
    fn is_ready(&self) -> bool;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::types::{StopReason, Usage};

    struct EchoClient;

    #[async_trait]
    impl LlmClient for EchoClient {
        async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse> {
            Ok(CompletionResponse {
                content: request.messages.last().map(|m| m.content.clone()).unwrap_or_default(),
                stop_reason: StopReason::EndTurn,
                usage: Usage::default(),
            })
        }

        fn model(&self) -> &str {
            "echo"
        }

        fn is_ready(&self) -> bool {
            true
        }
    }

    #[tokio::test]
    async fn test_trait_object_usable() {
        let client: Box<dyn LlmClient> = Box::new(EchoClient);
        let response = client
            .complete(CompletionRequest::new("").with_user_message("ping"))
            .await
            .unwrap();
        assert_eq!(response.content, "ping");
        assert_eq!(client.model(), "echo");
    }
}
