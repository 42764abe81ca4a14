//! Error taxonomy for the assistant core.
//!
//! Display strings of the client-facing errors are shown to the user verbatim
//! (startup notices and in-band chat replies), so they are written in
//! Portuguese like the rest of the interface.

use thiserror::Error;

/// Violations of the [`ChatMessage`](crate::ChatMessage) and
/// [`Conversation`](crate::Conversation) invariants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MessageError {
    #[error("message content must not be empty")]
    EmptyContent,

    #[error("system messages are injected per request and never stored in the conversation")]
    SystemInHistory,
}

/// Failures while constructing the completion client at startup.
///
/// Any of these leaves the session in degraded mode.
#[derive(Debug, Error)]
pub enum ClientInitError {
    #[error("API key não encontrada. Verifique se a variável GROQ_API_KEY está definida no arquivo .env.")]
    MissingCredential,

    #[error("Erro ao inicializar o cliente Groq: chave da API inválida ({0})")]
    InvalidCredential(String),

    #[error("Erro ao inicializar o cliente Groq: {0}")]
    Http(#[from] reqwest::Error),
}

impl ClientInitError {
    /// A missing credential is a configuration problem; everything else is a
    /// failed initialization.
    pub fn is_configuration(&self) -> bool {
        matches!(self, ClientInitError::MissingCredential)
    }
}

/// Failures of a single completion call.
#[derive(Debug, Error)]
pub enum CompletionError {
    #[error("falha de comunicação com o serviço: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("credencial rejeitada pelo serviço ({status}): {message}")]
    Unauthorized { status: u16, message: String },

    #[error("limite de uso excedido: {message}")]
    QuotaExceeded { message: String },

    #[error("erro do provedor ({status}): {message}")]
    Provider { status: u16, message: String },

    #[error("resposta inválida do serviço: {0}")]
    MalformedResponse(String),

    #[error("o serviço não retornou nenhuma resposta")]
    EmptyResponse,
}

/// Failures reading or writing the on-disk configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not determine config directory")]
    NoConfigDir,

    #[error("config IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid config file: {0}")]
    Parse(#[from] serde_json::Error),
}
