pub mod ai;
pub mod config;
pub mod error;
pub mod logging;
pub mod persona;
pub mod state;
pub mod turn;

// Re-export main types for convenience
pub use ai::{CompletionClient, CompletionRequest, GroqClient};
pub use config::{Config, Credential, KeySource};
pub use error::{ClientInitError, CompletionError, ConfigError, MessageError};
pub use persona::{persona_message, PERSONA};
pub use state::{ChatMessage, ChatRole, Conversation};
pub use turn::{PendingTurn, TurnController, TurnFailure, TurnOutcome, TurnResult};
