//! Runs reducer effects against a model and the clock.

use std::sync::Arc;

use omniverse_abstraction::{ChatMessage, Model, ModelError};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::reducer::{Action, Effect, reduce};
use super::state::WorkspaceState;
use crate::config::AgentConfig;
use crate::error::Result;
use crate::file_tree::export_archive;

/// What running an action produced, beyond the state change itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The model answered and the reply was applied.
    Replied,
    /// The model call failed; the notice is set on the state.
    ChatFailed(ModelError),
    /// The deploy finished at this URL.
    Deployed(String),
    /// The deploy was cancelled before it finished.
    DeployCancelled,
    /// A gzip-compressed tar of the tree.
    Archive(Vec<u8>),
}

/// A builder workspace wired to a model.
///
/// Cancelling the token from [`AgentSession::cancellation_token`] aborts in-flight model
/// calls and deploys. Once cancelled it stays cancelled for the life of the session.
pub struct AgentSession {
    state: WorkspaceState,
    model: Arc<dyn Model>,
    config: AgentConfig,
    cancel: CancellationToken,
}

impl AgentSession {
    /// Creates a session over the seed project.
    pub fn new(model: Arc<dyn Model>, config: AgentConfig) -> Self {
        Self::with_state(WorkspaceState::new(), model, config)
    }

    /// Creates a session over an existing state.
    pub fn with_state(state: WorkspaceState, model: Arc<dyn Model>, config: AgentConfig) -> Self {
        Self { state, model, config, cancel: CancellationToken::new() }
    }

    /// Current state.
    pub fn state(&self) -> &WorkspaceState {
        &self.state
    }

    /// Consumes the session, returning its state.
    pub fn into_state(self) -> WorkspaceState {
        self.state
    }

    /// Token that aborts outstanding work when cancelled.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Applies `action` and runs every effect it produces to completion.
    ///
    /// # Errors
    ///
    /// Returns an error only if writing an archive fails. Model failures are reported as
    /// [`Outcome::ChatFailed`].
    pub async fn run(&mut self, action: Action) -> Result<Vec<Outcome>> {
        let effects = reduce(&mut self.state, action);
        let mut outcomes = Vec::with_capacity(effects.len());
        for effect in effects {
            outcomes.push(self.execute(effect).await?);
        }
        Ok(outcomes)
    }

    /// Types `prompt` into the input and sends it.
    ///
    /// Returns no outcome when the send was ignored (blank input or a request in flight).
    pub async fn send(&mut self, prompt: &str) -> Result<Option<Outcome>> {
        reduce(&mut self.state, Action::EditInput(prompt.to_string()));
        Ok(self.run(Action::Send).await?.into_iter().next())
    }

    async fn execute(&mut self, effect: Effect) -> Result<Outcome> {
        match effect {
            Effect::SubmitChat { messages, model } => Ok(self.submit_chat(&messages, &model).await),
            Effect::StartDeploy => Ok(self.deploy().await),
            Effect::ExportArchive { tree } => {
                let bytes = export_archive(&tree, Vec::new())?;
                info!(bytes = bytes.len(), "Exported project archive");
                Ok(Outcome::Archive(bytes))
            }
        }
    }

    async fn submit_chat(&mut self, messages: &[ChatMessage], selected: &str) -> Outcome {
        let timeout = self.config.request_timeout();
        debug!(
            model_id = %self.model.model_id(),
            selected_model = %selected,
            message_count = messages.len(),
            "Submitting chat"
        );

        let call = tokio::time::timeout(timeout, self.model.generate_chat_completion(messages, None));
        let result = tokio::select! {
            () = self.cancel.cancelled() => Err(ModelError::Other("Request cancelled".to_string())),
            res = call => res.unwrap_or_else(|_| Err(ModelError::Timeout(timeout.as_millis() as u64))),
        };

        match result {
            Ok(response) => {
                reduce(&mut self.state, Action::ChatSucceeded(response.content));
                Outcome::Replied
            }
            Err(e) => {
                warn!(error = %e, "Model call failed");
                reduce(&mut self.state, Action::ChatFailed(e.to_string()));
                Outcome::ChatFailed(e)
            }
        }
    }

    async fn deploy(&mut self) -> Outcome {
        let delay = self.config.deploy_delay();
        info!(delay_ms = delay.as_millis() as u64, "Deploying");

        tokio::select! {
            () = self.cancel.cancelled() => {
                info!("Deploy cancelled");
                reduce(&mut self.state, Action::DeployCancelled);
                Outcome::DeployCancelled
            }
            () = tokio::time::sleep(delay) => {
                let url = self.config.deploy_url.clone();
                info!(url = %url, "Deploy finished");
                reduce(&mut self.state, Action::DeployFinished(url.clone()));
                Outcome::Deployed(url)
            }
        }
    }
}
