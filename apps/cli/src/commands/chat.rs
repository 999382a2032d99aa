//! `omni chat`: one agent turn against a chat-completions endpoint.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Result, bail};
use colored::Colorize;
use omniverse_core::agent::{AgentSession, Outcome, WorkspaceState};
use omniverse_core::OmniverseConfig;
use omniverse_models::ChatCompletionsModel;
use serde_json::json;

use super::load_tree;

/// Execute the chat command.
pub async fn execute(
    config: &OmniverseConfig,
    prompt: &str,
    endpoint: Option<String>,
    model: Option<String>,
    tree_path: Option<&Path>,
    json_output: bool,
) -> Result<()> {
    let mut agent = config.agent.clone();
    if let Some(endpoint) = endpoint {
        agent.endpoint = endpoint;
    }
    if let Some(model) = model {
        agent.model = model;
    }

    let model = ChatCompletionsModel::new(agent.model.clone(), agent.endpoint.clone())
        .with_timeout(agent.request_timeout());
    let state = WorkspaceState::with_files(load_tree(tree_path)?);
    let mut session = AgentSession::with_state(state, Arc::new(model), agent);

    let Some(outcome) = session.send(prompt).await? else {
        bail!("Nothing to send: the prompt is empty");
    };
    let state = session.state();

    if json_output {
        let error = match &outcome {
            Outcome::ChatFailed(e) => Some(e.to_string()),
            _ => None,
        };
        let value = json!({
            "reply": state.last_reply().map(|m| m.content.as_str()),
            "changed": state.last_changes,
            "active": state.active_file,
            "notice": state.notice,
            "error": error,
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
    } else if let Outcome::ChatFailed(e) = &outcome {
        eprintln!("{} {}", "✗".red(), state.notice.as_deref().unwrap_or_default().red());
        eprintln!("  {}", e.to_string().dimmed());
    } else {
        if let Some(reply) = state.last_reply() {
            println!("{}", reply.content);
        }
        println!();
        if state.last_changes.is_empty() {
            println!("  {} No files changed", "•".dimmed());
        } else {
            println!("{}", "Changed:".bold());
            for path in &state.last_changes {
                println!("  {} {}", "✓".green(), path);
            }
        }
    }

    if let Outcome::ChatFailed(e) = outcome {
        bail!("Chat request failed: {}", e);
    }
    Ok(())
}
