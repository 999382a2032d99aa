//! Model implementations for Omniverse.
//!
//! This crate provides concrete implementations of the `Model` trait.
//!
//! # Supported Providers
//!
//! - **ChatCompletions**: any endpoint that accepts a chat-completions request body and answers
//!   with `{"choices": [{"message": {"content": ...}}]}`, including the Omniverse chat relay
//! - **Mock**: scripted replies for tests and offline demos

pub mod chat_completions;

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use omniverse_abstraction::{ChatMessage, Model, ModelError, ModelParameters, ModelResponse, ModelUsage};
use tracing::debug;

pub use chat_completions::ChatCompletionsModel;

/// A mock implementation of the `Model` trait.
///
/// Replies queued with [`MockModel::with_reply`] / [`MockModel::with_failure`] are returned in
/// order; once the queue is drained the model echoes the last user message.
#[derive(Debug, Default)]
pub struct MockModel {
    id: String,
    script: Mutex<VecDeque<Result<String, ModelError>>>,
}

impl MockModel {
    /// Creates a new `MockModel` with the given ID.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into(), script: Mutex::new(VecDeque::new()) }
    }

    /// Queues a successful reply.
    #[must_use]
    pub fn with_reply(self, content: impl Into<String>) -> Self {
        self.push(Ok(content.into()));
        self
    }

    /// Queues a failed call.
    #[must_use]
    pub fn with_failure(self, error: ModelError) -> Self {
        self.push(Err(error));
        self
    }

    fn push(&self, entry: Result<String, ModelError>) {
        if let Ok(mut script) = self.script.lock() {
            script.push_back(entry);
        }
    }

    fn next_scripted(&self) -> Option<Result<String, ModelError>> {
        self.script.lock().ok().and_then(|mut script| script.pop_front())
    }
}

#[async_trait]
impl Model for MockModel {
    async fn generate_chat_completion(
        &self,
        messages: &[ChatMessage],
        parameters: Option<ModelParameters>,
    ) -> Result<ModelResponse, ModelError> {
        debug!(
            model_id = %self.id,
            message_count = messages.len(),
            parameters = ?parameters,
            "MockModel generating chat completion"
        );

        let content = match self.next_scripted() {
            Some(entry) => entry?,
            None => {
                let last = messages.last().map_or("", |m| m.content.as_str());
                format!("Mock response for: {last}")
            }
        };

        let prompt_tokens = messages.iter().map(|m| count_tokens(&m.content)).sum::<u32>();
        let completion_tokens = count_tokens(&content);

        Ok(ModelResponse {
            content,
            model_id: Some(self.id.clone()),
            usage: Some(ModelUsage {
                prompt_tokens,
                completion_tokens,
                total_tokens: prompt_tokens + completion_tokens,
            }),
        })
    }

    fn model_id(&self) -> &str {
        &self.id
    }
}

/// Count tokens in a string (simplified: word count).
fn count_tokens(text: &str) -> u32 {
    text.split_whitespace().count() as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_model_replays_script_in_order() {
        let model = MockModel::new("mock")
            .with_reply("first")
            .with_failure(ModelError::RequestError("offline".to_string()));

        let messages = vec![ChatMessage::user("hello")];
        let first = model.generate_chat_completion(&messages, None).await.unwrap();
        assert_eq!(first.content, "first");

        let second = model.generate_chat_completion(&messages, None).await;
        assert_eq!(second.unwrap_err(), ModelError::RequestError("offline".to_string()));
    }

    #[tokio::test]
    async fn test_mock_model_echoes_when_script_is_empty() {
        let model = MockModel::new("mock");
        let messages = vec![ChatMessage::assistant("greeting"), ChatMessage::user("make a button")];

        let response = model.generate_chat_completion(&messages, None).await.unwrap();
        assert_eq!(response.content, "Mock response for: make a button");
        assert_eq!(response.model_id.as_deref(), Some("mock"));

        let usage = response.usage.unwrap();
        assert_eq!(usage.prompt_tokens, 4);
        assert_eq!(usage.total_tokens, usage.prompt_tokens + usage.completion_tokens);
    }

    #[tokio::test]
    async fn test_generate_text_wraps_prompt_as_user_message() {
        let model = MockModel::new("mock");
        let response = model.generate_text("ping", None).await.unwrap();
        assert_eq!(response.content, "Mock response for: ping");
    }

    #[test]
    fn test_count_tokens() {
        assert_eq!(count_tokens(""), 0);
        assert_eq!(count_tokens("one  two\nthree"), 3);
    }
}
