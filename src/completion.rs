//! Chat-completion API client.
//!
//! Sends one user message (instruction, blank line, selected text) to an
//! OpenAI-compatible `/chat/completions` endpoint and returns the content of
//! the first choice. One request per call, no retry or streaming.

use crate::config::Settings;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Request timeout in seconds.
const REQUEST_TIMEOUT_SECS: u64 = 60;

/// Cap on the error body echoed back in `CompletionError::Status`.
const MAX_ERROR_BODY_CHARS: usize = 2000;

#[derive(Debug, Error)]
pub enum CompletionError {
    #[error("Error calling API: {0}")]
    Request(#[from] reqwest::Error),
    #[error("Error calling API: API returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("Error calling API: failed to parse response: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("No response received from the API")]
    EmptyResponse,
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f64,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    #[serde(default)]
    message: Option<ChoiceMessage>,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

impl ChatResponse {
    /// Content of the first choice, if it has any.
    fn into_first_content(self) -> Option<String> {
        self.choices
            .into_iter()
            .next()?
            .message?
            .content
            .filter(|c| !c.is_empty())
    }
}

/// Instruction and selection as a single user message.
pub(crate) fn combine_prompt(prompt: &str, selected_text: &str) -> String {
    format!("{prompt}\n\n{selected_text}")
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct CompletionClient {
    http: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
    temperature: f64,
}

impl CompletionClient {
    pub fn new(api_key: impl Into<String>, settings: &Settings) -> Result<Self, CompletionError> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            http,
            endpoint: settings.api_endpoint.clone(),
            api_key: api_key.into(),
            model: settings.model.clone(),
            temperature: settings.temperature,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Ask the model `prompt` about `selected_text` and return its reply.
    pub async fn complete(
        &self,
        prompt: &str,
        selected_text: &str,
    ) -> Result<String, CompletionError> {
        let body = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: combine_prompt(prompt, selected_text),
            }],
            temperature: self.temperature,
        };

        tracing::debug!(endpoint = %self.endpoint, model = %self.model, "sending chat completion request");

        let resp = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        let text = resp.text().await?;

        if !status.is_success() {
            let body: String = text.chars().take(MAX_ERROR_BODY_CHARS).collect();
            return Err(CompletionError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: ChatResponse = serde_json::from_str(&text).map_err(|e| {
            tracing::warn!("chat completion parse error: {e}\nBody: {text}");
            e
        })?;

        tracing::debug!(choices = parsed.choices.len(), "chat completion response received");

        parsed
            .into_first_content()
            .ok_or(CompletionError::EmptyResponse)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use serde_json::json;

    fn settings_for(server: &mockito::ServerGuard) -> Settings {
        Settings {
            api_endpoint: format!("{}/v1/chat/completions", server.url()),
            ..Settings::default()
        }
    }

    fn reply_body(content: &str) -> String {
        json!({
            "id": "chatcmpl-1",
            "object": "chat.completion",
            "choices": [{
                "index": 0,
                "message": { "role": "assistant", "content": content },
                "finish_reason": "stop"
            }]
        })
        .to_string()
    }

    #[test]
    fn combine_prompt_separates_with_blank_line() {
        assert_eq!(combine_prompt("Explain", "let x = 1;"), "Explain\n\nlet x = 1;");
    }

    #[test]
    fn first_choice_content_is_extracted() {
        let resp: ChatResponse = serde_json::from_str(&reply_body("hi")).unwrap();
        assert_eq!(resp.into_first_content().as_deref(), Some("hi"));
    }

    #[test]
    fn missing_choices_yield_none() {
        let resp: ChatResponse = serde_json::from_str(r#"{"choices":[]}"#).unwrap();
        assert!(resp.into_first_content().is_none());
        let resp: ChatResponse = serde_json::from_str(r#"{"object":"x"}"#).unwrap();
        assert!(resp.into_first_content().is_none());
        let resp: ChatResponse =
            serde_json::from_str(r#"{"choices":[{"message":{"role":"assistant","content":null}}]}"#)
                .unwrap();
        assert!(resp.into_first_content().is_none());
    }

    #[tokio::test]
    async fn sends_bearer_auth_and_combined_prompt() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/chat/completions")
            .match_header("authorization", "Bearer sk-test")
            .match_header("content-type", "application/json")
            .match_body(Matcher::Json(json!({
                "model": "gpt-3.5-turbo",
                "messages": [{ "role": "user", "content": "Summarize\n\nfn main() {}" }],
                "temperature": 0.7
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(reply_body("It does nothing."))
            .create_async()
            .await;

        let client = CompletionClient::new("sk-test", &settings_for(&server)).unwrap();
        let reply = client.complete("Summarize", "fn main() {}").await.unwrap();

        assert_eq!(reply, "It does nothing.");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn uses_configured_model_and_temperature() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/chat/completions")
            .match_body(Matcher::PartialJson(json!({ "model": "gpt-4o", "temperature": 0.1 })))
            .with_status(200)
            .with_body(reply_body("ok"))
            .create_async()
            .await;

        let settings = Settings {
            model: "gpt-4o".into(),
            temperature: 0.1,
            ..settings_for(&server)
        };
        let client = CompletionClient::new("k", &settings).unwrap();
        assert_eq!(client.complete("p", "s").await.unwrap(), "ok");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn non_success_status_is_an_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/v1/chat/completions")
            .with_status(401)
            .with_body(r#"{"error":{"message":"Incorrect API key provided"}}"#)
            .create_async()
            .await;

        let client = CompletionClient::new("bad", &settings_for(&server)).unwrap();
        let err = client.complete("p", "s").await.unwrap_err();
        match &err {
            CompletionError::Status { status, body } => {
                assert_eq!(*status, 401);
                assert!(body.contains("Incorrect API key"));
            }
            other => panic!("expected Status error, got {other:?}"),
        }
        assert!(err.to_string().starts_with("Error calling API: API returned 401"));
    }

    #[tokio::test]
    async fn empty_choices_is_empty_response() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/v1/chat/completions")
            .with_status(200)
            .with_body(r#"{"choices":[]}"#)
            .create_async()
            .await;

        let client = CompletionClient::new("k", &settings_for(&server)).unwrap();
        assert!(matches!(
            client.complete("p", "s").await,
            Err(CompletionError::EmptyResponse)
        ));
    }

    #[tokio::test]
    async fn invalid_json_is_parse_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/v1/chat/completions")
            .with_status(200)
            .with_body("<html>gateway</html>")
            .create_async()
            .await;

        let client = CompletionClient::new("k", &settings_for(&server)).unwrap();
        assert!(matches!(
            client.complete("p", "s").await,
            Err(CompletionError::Parse(_))
        ));
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_request_error() {
        let settings = Settings {
            api_endpoint: "http://127.0.0.1:9/v1/chat/completions".into(),
            ..Settings::default()
        };
        let client = CompletionClient::new("k", &settings).unwrap();
        let err = client.complete("p", "s").await.unwrap_err();
        assert!(matches!(err, CompletionError::Request(_)));
        assert!(err.to_string().starts_with("Error calling API:"));
    }
}
