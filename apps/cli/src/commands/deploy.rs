//! `omni deploy`: run the simulated deploy.

use std::sync::Arc;

use anyhow::Result;
use colored::Colorize;
use omniverse_core::agent::{Action, AgentSession, Outcome};
use omniverse_core::OmniverseConfig;
use omniverse_models::ChatCompletionsModel;

/// Execute the deploy command.
pub async fn execute(config: &OmniverseConfig, delay_ms: Option<u64>) -> Result<()> {
    let mut agent = config.agent.clone();
    if let Some(delay_ms) = delay_ms {
        agent.deploy_delay_ms = delay_ms;
    }

    let model = ChatCompletionsModel::new(agent.model.clone(), agent.endpoint.clone());
    let mut session = AgentSession::new(Arc::new(model), agent);

    let token = session.cancellation_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            token.cancel();
        }
    });

    println!("{}", "Deploying...".bold());
    for outcome in session.run(Action::Deploy).await? {
        match outcome {
            Outcome::Deployed(url) => println!("{} Live at {}", "✓".green(), url.cyan()),
            Outcome::DeployCancelled => println!("{} Deploy cancelled", "•".yellow()),
            _ => {}
        }
    }
    Ok(())
}
