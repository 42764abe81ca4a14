//! One request/response cycle of the chat.
//!
//! A turn appends the user's message, assembles `[persona] ++ history ++
//! [current]`, calls the completion service, and appends the reply. Failures
//! never escape: they become an assistant message in the transcript.
//!
//! The cycle is split into [`TurnController::begin`],
//! [`TurnController::complete`] and [`TurnController::finish`] so a front-end
//! can run the network call on a background task while the [`Conversation`]
//! stays with the session. [`TurnController::submit`] runs all three.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::ai::{CompletionClient, CompletionRequest, GroqClient};
use crate::config::Credential;
use crate::error::{ClientInitError, CompletionError, MessageError};
use crate::persona::persona_message;
use crate::state::{ChatMessage, Conversation};

/// Reply shown for every turn while no client is available.
pub const UNAVAILABLE_NOTICE: &str =
    "Não foi possível inicializar o cliente Groq. Verifique sua chave da API.";

const INTERRUPTED_NOTICE: &str = "a solicitação foi interrompida antes de terminar";

/// Work produced by [`TurnController::begin`].
#[derive(Debug, Clone, PartialEq)]
pub enum PendingTurn {
    Ready(CompletionRequest),
    /// Degraded mode: nothing will be sent.
    Unavailable,
}

/// Why a turn produced no real reply.
#[derive(Debug)]
pub enum TurnFailure {
    Unavailable,
    Completion(CompletionError),
    /// The background task running the call died.
    Interrupted,
}

impl TurnFailure {
    /// Text of the assistant message that reports this failure.
    pub fn describe(&self) -> String {
        match self {
            TurnFailure::Unavailable => UNAVAILABLE_NOTICE.to_string(),
            TurnFailure::Completion(e) => format!("Ocorreu um erro: {}", e),
            TurnFailure::Interrupted => format!("Ocorreu um erro: {}", INTERRUPTED_NOTICE),
        }
    }
}

pub type TurnResult = Result<String, TurnFailure>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnOutcome {
    Answered,
    Unavailable,
    Failed,
}

impl TurnOutcome {
    pub fn is_answered(&self) -> bool {
        matches!(self, TurnOutcome::Answered)
    }
}

/// Builds the payload for the message at `position` of `history`.
///
/// Everything before `position` is prior history; the current message is the
/// entry at `position` itself. Exclusion is by position, so an earlier message
/// with the same text is still sent.
pub fn assemble_request(history: &[ChatMessage], position: usize) -> Option<CompletionRequest> {
    let current = history.get(position)?;

    let mut messages = Vec::with_capacity(position + 2);
    messages.push(persona_message());
    messages.extend_from_slice(&history[..position]);
    messages.push(current.clone());

    Some(CompletionRequest::new(messages))
}

#[derive(Clone)]
pub struct TurnController {
    client: Option<Arc<dyn CompletionClient>>,
    init_error: Option<Arc<ClientInitError>>,
}

impl TurnController {
    /// Takes the outcome of client initialization. An error puts the
    /// controller in degraded mode for its whole lifetime.
    pub fn new(client: Result<Arc<dyn CompletionClient>, ClientInitError>) -> Self {
        match client {
            Ok(client) => Self::with_client(client),
            Err(e) => Self::degraded(e),
        }
    }

    pub fn with_client(client: Arc<dyn CompletionClient>) -> Self {
        info!("completion client ready ({})", client.provider_name());
        Self {
            client: Some(client),
            init_error: None,
        }
    }

    pub fn degraded(reason: ClientInitError) -> Self {
        warn!("running without a completion client: {}", reason);
        Self {
            client: None,
            init_error: Some(Arc::new(reason)),
        }
    }

    /// Builds the Groq client from the startup credential, if any.
    pub fn from_credential(credential: Option<&Credential>, timeout: Option<Duration>) -> Self {
        let client = match credential {
            Some(credential) => GroqClient::with_timeout(credential.secret(), timeout)
                .map(|client| Arc::new(client) as Arc<dyn CompletionClient>),
            None => Err(ClientInitError::MissingCredential),
        };
        Self::new(client)
    }

    pub fn is_degraded(&self) -> bool {
        self.client.is_none()
    }

    /// Why the client could not be built, for a one-time startup notice.
    pub fn startup_diagnostic(&self) -> Option<&ClientInitError> {
        self.init_error.as_deref()
    }

    /// Appends the user's message and assembles the request for it.
    ///
    /// Blank text is rejected before the conversation is touched.
    pub fn begin(
        &self,
        conversation: &mut Conversation,
        text: &str,
    ) -> Result<PendingTurn, MessageError> {
        let message = ChatMessage::user(text)?;
        let position = conversation.append(message)?;

        if self.client.is_none() {
            debug!("degraded mode, turn {} will not be sent", position);
            return Ok(PendingTurn::Unavailable);
        }

        match assemble_request(conversation.snapshot(), position) {
            Some(request) => {
                debug!(
                    "turn at position {} assembled with {} messages",
                    position,
                    request.messages().len()
                );
                Ok(PendingTurn::Ready(request))
            }
            None => Ok(PendingTurn::Unavailable),
        }
    }

    /// Performs the network call, if there is one to make.
    pub async fn complete(&self, pending: PendingTurn) -> TurnResult {
        let request = match pending {
            PendingTurn::Ready(request) => request,
            PendingTurn::Unavailable => return Err(TurnFailure::Unavailable),
        };
        let Some(client) = &self.client else {
            return Err(TurnFailure::Unavailable);
        };

        match client.complete(&request).await {
            Ok(reply) if reply.trim().is_empty() => {
                Err(TurnFailure::Completion(CompletionError::EmptyResponse))
            }
            Ok(reply) => Ok(reply),
            Err(e) => Err(TurnFailure::Completion(e)),
        }
    }

    /// Appends the assistant's reply, or the description of what went wrong.
    pub fn finish(&self, conversation: &mut Conversation, result: TurnResult) -> TurnOutcome {
        let (content, outcome) = match result {
            Ok(reply) => (reply, TurnOutcome::Answered),
            Err(TurnFailure::Unavailable) => {
                (TurnFailure::Unavailable.describe(), TurnOutcome::Unavailable)
            }
            Err(failure) => {
                warn!("turn failed: {:?}", failure);
                (failure.describe(), TurnOutcome::Failed)
            }
        };

        let message = match ChatMessage::assistant(content) {
            Ok(message) => message,
            Err(_) => {
                let empty = TurnFailure::Completion(CompletionError::EmptyResponse);
                return self.finish(conversation, Err(empty));
            }
        };
        if let Err(e) = conversation.append(message) {
            warn!("could not record assistant reply: {}", e);
        }

        info!("turn finished: {:?} ({} messages)", outcome, conversation.len());
        outcome
    }

    /// Runs a whole turn.
    pub async fn submit(
        &self,
        conversation: &mut Conversation,
        text: &str,
    ) -> Result<TurnOutcome, MessageError> {
        let pending = self.begin(conversation, text)?;
        let result = self.complete(pending).await;
        Ok(self.finish(conversation, result))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persona::PERSONA;
    use crate::state::ChatRole;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Replays scripted replies and records every request it receives.
    #[derive(Default)]
    struct ScriptedClient {
        replies: Mutex<VecDeque<Result<String, CompletionError>>>,
        requests: Mutex<Vec<CompletionRequest>>,
    }

    impl ScriptedClient {
        fn replying(replies: &[&str]) -> Arc<Self> {
            let client = Self::default();
            for reply in replies {
                client.push(Ok(reply.to_string()));
            }
            Arc::new(client)
        }

        fn push(&self, reply: Result<String, CompletionError>) {
            self.replies.lock().unwrap().push_back(reply);
        }

        fn requests(&self) -> Vec<CompletionRequest> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl CompletionClient for ScriptedClient {
        async fn complete(&self, request: &CompletionRequest) -> Result<String, CompletionError> {
            self.requests.lock().unwrap().push(request.clone());
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok("ok".to_string()))
        }

        fn provider_name(&self) -> &'static str {
            "scripted"
        }
    }

    fn pairs(messages: &[ChatMessage]) -> Vec<(ChatRole, &str)> {
        messages.iter().map(|m| (m.role(), m.content())).collect()
    }

    #[tokio::test]
    async fn test_first_turn_sends_persona_and_question() {
        let client = ScriptedClient::replying(&["Python, SQL e Pandas."]);
        let controller = TurnController::with_client(client.clone());
        let mut conversation = Conversation::new();

        let outcome = controller
            .submit(&mut conversation, "Quais tecnologias usar para análise de dados?")
            .await
            .unwrap();

        assert_eq!(outcome, TurnOutcome::Answered);
        let requests = client.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(
            pairs(requests[0].messages()),
            vec![
                (ChatRole::System, PERSONA),
                (ChatRole::User, "Quais tecnologias usar para análise de dados?"),
            ]
        );
        assert_eq!(
            pairs(conversation.snapshot()),
            vec![
                (ChatRole::User, "Quais tecnologias usar para análise de dados?"),
                (ChatRole::Assistant, "Python, SQL e Pandas."),
            ]
        );
    }

    #[tokio::test]
    async fn test_follow_up_includes_history_once() {
        let client = ScriptedClient::replying(&["T", "Comece com Python."]);
        let controller = TurnController::with_client(client.clone());
        let mut conversation = Conversation::new();

        controller
            .submit(&mut conversation, "Quais tecnologias usar para análise de dados?")
            .await
            .unwrap();
        controller.submit(&mut conversation, "E para IA?").await.unwrap();

        let requests = client.requests();
        assert_eq!(
            pairs(requests[1].messages()),
            vec![
                (ChatRole::System, PERSONA),
                (ChatRole::User, "Quais tecnologias usar para análise de dados?"),
                (ChatRole::Assistant, "T"),
                (ChatRole::User, "E para IA?"),
            ]
        );
    }

    #[tokio::test]
    async fn test_payload_on_turn_k_is_persona_history_and_current() {
        let client = ScriptedClient::replying(&[]);
        let controller = TurnController::with_client(client.clone());
        let mut conversation = Conversation::new();

        for k in 1..=5 {
            let before: Vec<ChatMessage> = conversation.snapshot().to_vec();
            let question = format!("pergunta {}", k);
            controller.submit(&mut conversation, &question).await.unwrap();

            let requests = client.requests();
            let sent = requests[k - 1].messages();
            assert_eq!(sent.len(), 2 * k);
            assert_eq!(sent[0], persona_message());
            assert_eq!(&sent[1..sent.len() - 1], before.as_slice());
            assert_eq!(sent.last().unwrap().content(), question);
            assert_eq!(
                sent.iter().filter(|m| m.content() == question).count(),
                1,
                "current message must be sent exactly once"
            );
            assert_eq!(
                sent.iter().filter(|m| m.role() == ChatRole::System).count(),
                1
            );
        }
    }

    #[tokio::test]
    async fn test_repeated_question_keeps_earlier_copy() {
        let client = ScriptedClient::replying(&["primeira resposta", "segunda resposta"]);
        let controller = TurnController::with_client(client.clone());
        let mut conversation = Conversation::new();

        controller.submit(&mut conversation, "oi").await.unwrap();
        controller.submit(&mut conversation, "oi").await.unwrap();

        assert_eq!(
            pairs(client.requests()[1].messages()),
            vec![
                (ChatRole::System, PERSONA),
                (ChatRole::User, "oi"),
                (ChatRole::Assistant, "primeira resposta"),
                (ChatRole::User, "oi"),
            ]
        );
    }

    #[tokio::test]
    async fn test_failed_turn_records_error_in_band() {
        let client = ScriptedClient::replying(&[]);
        client.push(Err(CompletionError::QuotaExceeded {
            message: "Rate limit reached".to_string(),
        }));
        client.push(Ok("voltei".to_string()));
        let controller = TurnController::with_client(client.clone());
        let mut conversation = Conversation::new();

        let outcome = controller.submit(&mut conversation, "Olá").await.unwrap();
        assert_eq!(outcome, TurnOutcome::Failed);
        assert_eq!(conversation.len(), 2);
        let reply = conversation.last().unwrap();
        assert_eq!(reply.role(), ChatRole::Assistant);
        assert!(reply.content().starts_with("Ocorreu um erro: "));
        assert!(reply.content().contains("Rate limit reached"));

        // the failed pair stays in history for the next request
        controller.submit(&mut conversation, "De novo").await.unwrap();
        assert_eq!(conversation.len(), 4);
        assert_eq!(client.requests()[1].messages().len(), 4);
    }

    #[tokio::test]
    async fn test_blank_reply_is_a_failure() {
        let client = ScriptedClient::replying(&["   "]);
        let controller = TurnController::with_client(client);
        let mut conversation = Conversation::new();

        let outcome = controller.submit(&mut conversation, "Olá").await.unwrap();
        assert_eq!(outcome, TurnOutcome::Failed);
        assert_eq!(conversation.len(), 2);
        assert!(conversation.last().unwrap().content().starts_with("Ocorreu um erro: "));
    }

    #[tokio::test]
    async fn test_degraded_mode_never_calls_the_client() {
        let controller = TurnController::degraded(ClientInitError::MissingCredential);
        assert!(controller.is_degraded());
        assert!(controller.startup_diagnostic().unwrap().is_configuration());

        let mut conversation = Conversation::new();
        for (i, text) in ["a", "b", "c"].iter().enumerate() {
            let outcome = controller.submit(&mut conversation, text).await.unwrap();
            assert_eq!(outcome, TurnOutcome::Unavailable);
            assert_eq!(conversation.len(), 2 * (i + 1));
            let snapshot = conversation.snapshot();
            assert_eq!(snapshot[2 * i].content(), *text);
            assert_eq!(snapshot[2 * i + 1].role(), ChatRole::Assistant);
            assert_eq!(snapshot[2 * i + 1].content(), UNAVAILABLE_NOTICE);
        }
    }

    #[tokio::test]
    async fn test_missing_credential_builds_degraded_controller() {
        let controller = TurnController::from_credential(None, None);
        assert!(controller.is_degraded());
        assert!(matches!(
            controller.startup_diagnostic(),
            Some(ClientInitError::MissingCredential)
        ));
    }

    #[tokio::test]
    async fn test_blank_input_leaves_conversation_untouched() {
        let client = ScriptedClient::replying(&[]);
        let controller = TurnController::with_client(client.clone());
        let mut conversation = Conversation::new();

        let err = controller.submit(&mut conversation, "  \n").await.unwrap_err();
        assert_eq!(err, MessageError::EmptyContent);
        assert!(conversation.is_empty());
        assert!(client.requests().is_empty());
    }

    #[tokio::test]
    async fn test_split_cycle_matches_submit() {
        let client = ScriptedClient::replying(&["resposta"]);
        let controller = TurnController::with_client(client.clone());
        let mut conversation = Conversation::new();

        let pending = controller.begin(&mut conversation, "Como começar com IA?").unwrap();
        assert_eq!(conversation.len(), 1);
        assert!(matches!(pending, PendingTurn::Ready(_)));

        let worker = controller.clone();
        let result = tokio::spawn(async move { worker.complete(pending).await })
            .await
            .unwrap();
        let outcome = controller.finish(&mut conversation, result);

        assert!(outcome.is_answered());
        assert_eq!(
            pairs(conversation.snapshot()),
            vec![
                (ChatRole::User, "Como começar com IA?"),
                (ChatRole::Assistant, "resposta"),
            ]
        );
    }

    #[test]
    fn test_interrupted_turn_is_described() {
        let mut conversation = Conversation::new();
        let controller = TurnController::degraded(ClientInitError::MissingCredential);
        conversation.append(ChatMessage::user("oi").unwrap()).unwrap();

        let outcome = controller.finish(&mut conversation, Err(TurnFailure::Interrupted));
        assert_eq!(outcome, TurnOutcome::Failed);
        assert!(conversation.last().unwrap().content().contains("interrompida"));
    }

    #[test]
    fn test_assemble_request_out_of_range() {
        assert!(assemble_request(&[], 0).is_none());
    }
}
