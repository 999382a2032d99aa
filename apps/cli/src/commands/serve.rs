//! `omni serve`: run the chat relay.

use std::net::SocketAddr;

use anyhow::{Context, Result};
use colored::Colorize;
use omniverse_core::{ChatRelay, OmniverseConfig};
use tokio_util::sync::CancellationToken;

/// Execute the serve command.
pub async fn execute(config: &OmniverseConfig, address: Option<SocketAddr>) -> Result<()> {
    let mut relay_config = config.relay.clone();
    if let Some(address) = address {
        relay_config.address = address;
    }

    println!("{} {}", "Chat relay on".bold(), format!("http://{}", relay_config.address).cyan());
    println!("  Upstream: {}", relay_config.upstream_url);
    println!("  Model: {}", relay_config.default_model);
    println!("  {}", "Press Ctrl-C to stop".dimmed());

    let shutdown = CancellationToken::new();
    let signal = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            signal.cancel();
        }
    });

    ChatRelay::new(relay_config)?.serve(shutdown).await.context("Chat relay failed")?;
    println!("{}", "Relay stopped".dimmed());
    Ok(())
}
