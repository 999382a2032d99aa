//! Chat-completions model implementation.
//!
//! Talks to any endpoint that accepts the chat-completions request body
//! (`{"model": ..., "messages": [...]}`) and answers with
//! `{"choices": [{"message": {"content": ...}}], ...}`. This covers hosted providers as well as
//! the Omniverse chat relay, which forwards the body upstream and returns the answer verbatim.
//!
//! A reply without a usable first choice is not an error here: the model returns an empty
//! `content` and leaves the fallback wording to the caller.

use std::time::Duration;

use async_trait::async_trait;
use omniverse_abstraction::{ChatMessage, Model, ModelError, ModelParameters, ModelResponse, ModelUsage};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

/// Default request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

/// Chat-completions model implementation.
#[derive(Debug, Clone)]
pub struct ChatCompletionsModel {
    /// The model identifier sent in the request body.
    model_id: String,
    /// Full URL requests are POSTed to.
    endpoint: String,
    /// Optional bearer token; the relay does not need one.
    api_key: Option<String>,
    /// Per-request timeout.
    timeout: Duration,
    /// HTTP client for requests.
    client: Client,
}

impl ChatCompletionsModel {
    /// Creates a model without authentication.
    ///
    /// # Arguments
    /// * `model_id` - The model identifier (e.g., "GPT-5.2")
    /// * `endpoint` - The full URL to POST to (e.g., "http://127.0.0.1:54321/")
    #[must_use]
    pub fn new(model_id: impl Into<String>, endpoint: impl Into<String>) -> Self {
        Self {
            model_id: model_id.into(),
            endpoint: endpoint.into(),
            api_key: None,
            timeout: DEFAULT_TIMEOUT,
            client: build_client(DEFAULT_TIMEOUT),
        }
    }

    /// Sets a bearer API key.
    #[must_use]
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Sets the per-request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self.client = build_client(timeout);
        self
    }

    /// The endpoint requests are sent to.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn map_send_error(&self, e: &reqwest::Error) -> ModelError {
        if e.is_timeout() {
            ModelError::Timeout(self.timeout.as_millis() as u64)
        } else {
            ModelError::RequestError(format!("Network error: {}", e))
        }
    }
}

fn build_client(timeout: Duration) -> Client {
    Client::builder().timeout(timeout).build().unwrap_or_else(|_| Client::new())
}

#[async_trait]
impl Model for ChatCompletionsModel {
    async fn generate_chat_completion(
        &self,
        messages: &[ChatMessage],
        parameters: Option<ModelParameters>,
    ) -> Result<ModelResponse, ModelError> {
        debug!(
            model_id = %self.model_id,
            endpoint = %self.endpoint,
            message_count = messages.len(),
            parameters = ?parameters,
            "ChatCompletionsModel generating chat completion"
        );

        let mut request_body = ChatCompletionsRequest {
            model: &self.model_id,
            messages,
            temperature: None,
            top_p: None,
            max_tokens: None,
            stop: None,
        };

        if let Some(params) = parameters {
            request_body.temperature = params.temperature;
            request_body.top_p = params.top_p;
            request_body.max_tokens = params.max_tokens;
            request_body.stop = params.stop_sequences;
        }

        let mut request = self.client.post(&self.endpoint).json(&request_body);
        if let Some(api_key) = &self.api_key {
            request = request.bearer_auth(api_key);
        }

        let response = request.send().await.map_err(|e| {
            error!(error = %e, endpoint = %self.endpoint, "Failed to send chat completion request");
            self.map_send_error(&e)
        })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_else(|_| "Unknown error".to_string());
            error!(status = %status, error = %error_text, "Chat completion endpoint returned error status");
            return Err(ModelError::ModelResponseError(format!(
                "API error ({}): {}",
                status, error_text
            )));
        }

        let parsed: ChatCompletionsResponse = response.json().await.map_err(|e| {
            error!(error = %e, "Failed to parse chat completion response");
            ModelError::SerializationError(format!("Failed to parse response: {}", e))
        })?;

        if let Some(upstream_error) = &parsed.error {
            debug!(error = %upstream_error, "Chat completion response carried an error payload");
        }

        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message)
            .and_then(|message| message.content)
            .unwrap_or_default();

        if content.is_empty() {
            debug!("No content in chat completion response");
        }

        let usage = parsed.usage.map(|u| ModelUsage {
            prompt_tokens: u.prompt_tokens,
            completion_tokens: u.completion_tokens,
            total_tokens: u.total_tokens,
        });

        Ok(ModelResponse { content, model_id: Some(self.model_id.clone()), usage })
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }
}

// Chat-completions request/response structures

#[derive(Debug, Serialize)]
struct ChatCompletionsRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stop: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionsResponse {
    #[serde(default)]
    choices: Vec<ChatCompletionsChoice>,
    #[serde(default)]
    usage: Option<ChatCompletionsUsage>,
    #[serde(default)]
    error: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionsChoice {
    #[serde(default)]
    message: Option<ChatCompletionsMessage>,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionsMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
#[allow(clippy::struct_field_names)] // Matches API naming
struct ChatCompletionsUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use serde_json::json;

    #[test]
    fn test_model_creation() {
        let model = ChatCompletionsModel::new("GPT-5.2", "http://localhost:54321/");
        assert_eq!(model.model_id(), "GPT-5.2");
        assert_eq!(model.endpoint(), "http://localhost:54321/");
        assert!(model.api_key.is_none());
        assert_eq!(model.timeout, DEFAULT_TIMEOUT);
    }

    #[tokio::test]
    async fn test_generate_chat_completion_success() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/chat/completions")
            .match_header("authorization", "Bearer test-key")
            .match_body(Matcher::PartialJson(json!({
                "model": "test-model",
                "messages": [{"role": "user", "content": "Say hello"}]
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{
                "choices": [{"message": {"role": "assistant", "content": "Hello, world!"}}],
                "usage": {"prompt_tokens": 10, "completion_tokens": 20, "total_tokens": 30}
            }"#,
            )
            .create_async()
            .await;

        let model = ChatCompletionsModel::new("test-model", format!("{}/v1/chat/completions", server.url()))
            .with_api_key("test-key");

        let response =
            model.generate_chat_completion(&[ChatMessage::user("Say hello")], None).await.unwrap();

        assert_eq!(response.content, "Hello, world!");
        assert_eq!(response.model_id.as_deref(), Some("test-model"));
        let usage = response.usage.unwrap();
        assert_eq!(usage.total_tokens, 30);

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_missing_choices_yields_empty_content() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"error": {"message": "invalid api key"}}"#)
            .create_async()
            .await;

        let model = ChatCompletionsModel::new("relay", format!("{}/", server.url()));
        let response = model.generate_chat_completion(&[ChatMessage::user("hi")], None).await.unwrap();

        assert_eq!(response.content, "");
        assert!(response.usage.is_none());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_null_content_yields_empty_content() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/")
            .with_status(200)
            .with_body(r#"{"choices": [{"message": {"content": null}}]}"#)
            .create_async()
            .await;

        let model = ChatCompletionsModel::new("relay", format!("{}/", server.url()));
        let response = model.generate_chat_completion(&[ChatMessage::user("hi")], None).await.unwrap();
        assert!(response.content.is_empty());
    }

    #[tokio::test]
    async fn test_error_status_is_reported() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/")
            .with_status(500)
            .with_body(r#"{"error": "upstream exploded"}"#)
            .create_async()
            .await;

        let model = ChatCompletionsModel::new("relay", format!("{}/", server.url()));
        let err = model.generate_chat_completion(&[ChatMessage::user("hi")], None).await.unwrap_err();

        match err {
            ModelError::ModelResponseError(msg) => {
                assert!(msg.contains("500"));
                assert!(msg.contains("upstream exploded"));
            }
            other => panic!("Expected ModelResponseError, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_non_json_body_is_serialization_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server.mock("POST", "/").with_status(200).with_body("<html>").create_async().await;

        let model = ChatCompletionsModel::new("relay", format!("{}/", server.url()));
        let err = model.generate_chat_completion(&[ChatMessage::user("hi")], None).await.unwrap_err();
        assert!(matches!(err, ModelError::SerializationError(_)));
    }

    #[tokio::test]
    async fn test_parameters_are_forwarded() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/")
            .match_body(Matcher::PartialJson(json!({"max_tokens": 64, "stop": ["END"]})))
            .with_status(200)
            .with_body(r#"{"choices": [{"message": {"content": "ok"}}]}"#)
            .create_async()
            .await;

        let params = ModelParameters {
            temperature: None,
            top_p: None,
            max_tokens: Some(64),
            stop_sequences: Some(vec!["END".to_string()]),
        };
        let model = ChatCompletionsModel::new("relay", format!("{}/", server.url()));
        let response =
            model.generate_chat_completion(&[ChatMessage::user("hi")], Some(params)).await.unwrap();

        assert_eq!(response.content, "ok");
        mock.assert_async().await;
    }
}
