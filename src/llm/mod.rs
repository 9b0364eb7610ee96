//! LLM integration: client abstraction, the Anthropic backend, and the
//! research agent built on top of them.

pub use self::agent::{AgentReview, CitationFinding, CitationReview, ResearchAgent, StructureReview};
pub use self::anthropic::{AnthropicClient, AnthropicConfig};
pub use self::client::LlmClient;
pub use self::types::{CompletionRequest, CompletionResponse, Message, Role, StopReason, Usage};

mod agent;
mod anthropic;
mod client;
mod types;
