pub mod groq;

pub use groq::GroqClient;

use async_trait::async_trait;
use serde::Serialize;

use crate::error::CompletionError;
use crate::state::ChatMessage;

/// Model used for every request.
pub const MODEL: &str = "openai/gpt-oss-120b";
/// Upper bound on the reply length, in tokens.
pub const MAX_TOKENS: u32 = 5000;
pub const TEMPERATURE: f32 = 0.7;

/// Body of one chat-completion call. Built fresh for every turn.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompletionRequest {
    model: &'static str,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
    temperature: f32,
}

impl CompletionRequest {
    pub fn new(messages: Vec<ChatMessage>) -> Self {
        Self {
            model: MODEL,
            messages,
            max_tokens: MAX_TOKENS,
            temperature: TEMPERATURE,
        }
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn model(&self) -> &str {
        self.model
    }
}

/// A hosted chat-completion service.
///
/// Implementations are stateless per call and shared between sessions.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Performs one call and returns the text of the first choice.
    async fn complete(&self, request: &CompletionRequest) -> Result<String, CompletionError>;

    fn provider_name(&self) -> &'static str;
}
