//! UI-agnostic conversation state
//!
//! This module contains the data structures shared between front-ends (the
//! terminal UI and the one-shot `ask` command). A [`Conversation`] only holds
//! user and assistant entries; the persona is added when a request is
//! assembled.

use serde::Serialize;

use crate::error::MessageError;

/// The role of a chat message sender
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

impl ChatRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChatRole::System => "system",
            ChatRole::User => "user",
            ChatRole::Assistant => "assistant",
        }
    }
}

/// A single chat message. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatMessage {
    role: ChatRole,
    content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Result<Self, MessageError> {
        Self::non_empty(ChatRole::User, content.into())
    }

    pub fn assistant(content: impl Into<String>) -> Result<Self, MessageError> {
        Self::non_empty(ChatRole::Assistant, content.into())
    }

    /// Only the persona module builds system messages.
    pub(crate) fn system(content: &'static str) -> Self {
        Self {
            role: ChatRole::System,
            content: content.to_string(),
        }
    }

    fn non_empty(role: ChatRole, content: String) -> Result<Self, MessageError> {
        if content.trim().is_empty() {
            return Err(MessageError::EmptyContent);
        }
        Ok(Self { role, content })
    }

    pub fn role(&self) -> ChatRole {
        self.role
    }

    pub fn content(&self) -> &str {
        &self.content
    }
}

/// Ordered, append-only transcript of one session.
///
/// Insertion order is chronological order is display order.
#[derive(Debug, Clone, Default)]
pub struct Conversation {
    messages: Vec<ChatMessage>,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a message and returns its position.
    pub fn append(&mut self, message: ChatMessage) -> Result<usize, MessageError> {
        if message.role == ChatRole::System {
            return Err(MessageError::SystemInHistory);
        }
        self.messages.push(message);
        Ok(self.messages.len() - 1)
    }

    pub fn snapshot(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn last(&self) -> Option<&ChatMessage> {
        self.messages.last()
    }
}
