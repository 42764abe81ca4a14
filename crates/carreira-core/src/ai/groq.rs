use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::HeaderValue;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::debug;

use super::{CompletionClient, CompletionRequest};
use crate::error::{ClientInitError, CompletionError};

const DEFAULT_BASE_URL: &str = "https://api.groq.com/openai/v1";

#[derive(Deserialize)]
struct GroqChoice {
    message: GroqResponseMessage,
}

#[derive(Deserialize)]
struct GroqResponseMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct GroqResponse {
    choices: Vec<GroqChoice>,
}

#[derive(Deserialize)]
struct GroqErrorBody {
    error: GroqErrorDetail,
}

#[derive(Deserialize)]
struct GroqErrorDetail {
    message: String,
}

#[derive(Clone)]
pub struct GroqClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl GroqClient {
    pub fn new(api_key: &str) -> Result<Self, ClientInitError> {
        Self::with_timeout(api_key, None)
    }

    /// Builds a client whose requests give up after `timeout`, if set.
    pub fn with_timeout(api_key: &str, timeout: Option<Duration>) -> Result<Self, ClientInitError> {
        let api_key = api_key.trim();
        if api_key.is_empty() {
            return Err(ClientInitError::MissingCredential);
        }
        if HeaderValue::from_str(&format!("Bearer {}", api_key)).is_err() {
            return Err(ClientInitError::InvalidCredential(
                "contém caracteres não permitidos".to_string(),
            ));
        }

        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
            api_key: api_key.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
        })
    }

    /// Points the client at another OpenAI-compatible endpoint root.
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }
}

impl fmt::Debug for GroqClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GroqClient")
            .field("base_url", &self.base_url)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

#[async_trait]
impl CompletionClient for GroqClient {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, CompletionError> {
        debug!(
            model = request.model(),
            messages = request.messages().len(),
            "sending chat completion"
        );

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(request)
            .send()
            .await
            .map_err(CompletionError::Transport)?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(classify_failure(status, &text));
        }

        let body = response.text().await.map_err(CompletionError::Transport)?;
        let groq_response: GroqResponse = serde_json::from_str(&body)
            .map_err(|e| CompletionError::MalformedResponse(e.to_string()))?;

        groq_response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or(CompletionError::EmptyResponse)
    }

    fn provider_name(&self) -> &'static str {
        "groq"
    }
}

/// Maps a non-success HTTP status and its body to a call error.
fn classify_failure(status: StatusCode, body: &str) -> CompletionError {
    let message = provider_message(status, body);
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => CompletionError::Unauthorized {
            status: status.as_u16(),
            message,
        },
        StatusCode::TOO_MANY_REQUESTS => CompletionError::QuotaExceeded { message },
        _ => CompletionError::Provider {
            status: status.as_u16(),
            message,
        },
    }
}

fn provider_message(status: StatusCode, body: &str) -> String {
    if let Ok(parsed) = serde_json::from_str::<GroqErrorBody>(body) {
        return parsed.error.message;
    }
    let trimmed = body.trim();
    if trimmed.is_empty() {
        status.canonical_reason().unwrap_or("unknown error").to_string()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::ChatMessage;
    use mockito::Matcher;
    use serde_json::json;

    fn request() -> CompletionRequest {
        CompletionRequest::new(vec![
            crate::persona::persona_message(),
            ChatMessage::user("Quais tecnologias usar para análise de dados?").unwrap(),
        ])
    }

    #[test]
    fn test_blank_key_is_a_missing_credential() {
        let err = GroqClient::new("   ").unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_key_with_control_characters_is_invalid() {
        let err = GroqClient::new("gsk_abc\ndef").unwrap_err();
        assert!(matches!(err, ClientInitError::InvalidCredential(_)));
        assert!(!err.is_configuration());
    }

    #[test]
    fn test_debug_output_hides_the_key() {
        let client = GroqClient::new("gsk_secret_value").unwrap();
        let printed = format!("{:?}", client);
        assert!(!printed.contains("gsk_secret_value"));
        assert!(printed.contains("<redacted>"));
    }

    #[test]
    fn test_classify_failure() {
        let body = r#"{"error":{"message":"Invalid API Key","type":"invalid_request_error"}}"#;
        match classify_failure(StatusCode::UNAUTHORIZED, body) {
            CompletionError::Unauthorized { status, message } => {
                assert_eq!(status, 401);
                assert_eq!(message, "Invalid API Key");
            }
            other => panic!("unexpected {other:?}"),
        }

        assert!(matches!(
            classify_failure(StatusCode::TOO_MANY_REQUESTS, "slow down"),
            CompletionError::QuotaExceeded { message } if message == "slow down"
        ));

        match classify_failure(StatusCode::BAD_GATEWAY, "") {
            CompletionError::Provider { status, message } => {
                assert_eq!(status, 502);
                assert_eq!(message, "Bad Gateway");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_complete_returns_first_choice() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/chat/completions")
            .match_header("authorization", "Bearer gsk_test")
            .match_body(Matcher::PartialJson(json!({
                "model": "openai/gpt-oss-120b",
                "max_tokens": 5000,
                "temperature": 0.7,
                "messages": [
                    {"role": "system", "content": crate::persona::PERSONA},
                    {"role": "user", "content": "Quais tecnologias usar para análise de dados?"}
                ]
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"choices":[{"index":0,"message":{"role":"assistant","content":"Python e SQL!"}},
                               {"index":1,"message":{"role":"assistant","content":"ignored"}}]}"#,
            )
            .create_async()
            .await;

        let client = GroqClient::new("gsk_test").unwrap().with_base_url(&server.url());
        let reply = client.complete(&request()).await.unwrap();

        assert_eq!(reply, "Python e SQL!");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_complete_classifies_quota_errors() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/chat/completions")
            .with_status(429)
            .with_body(r#"{"error":{"message":"Rate limit reached"}}"#)
            .create_async()
            .await;

        let client = GroqClient::new("gsk_test").unwrap().with_base_url(&server.url());
        let err = client.complete(&request()).await.unwrap_err();

        assert!(matches!(err, CompletionError::QuotaExceeded { ref message } if message == "Rate limit reached"));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_complete_rejects_malformed_body() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/chat/completions")
            .with_status(200)
            .with_body("<html>oops</html>")
            .create_async()
            .await;

        let client = GroqClient::new("gsk_test").unwrap().with_base_url(&server.url());
        let err = client.complete(&request()).await.unwrap_err();
        assert!(matches!(err, CompletionError::MalformedResponse(_)));
    }

    #[tokio::test]
    async fn test_complete_rejects_empty_choices() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/chat/completions")
            .with_status(200)
            .with_body(r#"{"choices":[]}"#)
            .create_async()
            .await;

        let client = GroqClient::new("gsk_test").unwrap().with_base_url(&server.url());
        let err = client.complete(&request()).await.unwrap_err();
        assert!(matches!(err, CompletionError::EmptyResponse));
    }

    #[tokio::test]
    async fn test_unreachable_service_is_a_transport_error() {
        let client = GroqClient::with_timeout("gsk_test", Some(Duration::from_secs(5)))
            .unwrap()
            .with_base_url("http://127.0.0.1:1");
        let err = client.complete(&request()).await.unwrap_err();
        assert!(matches!(err, CompletionError::Transport(_)));
    }
}
