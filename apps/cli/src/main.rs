//! Omniverse CLI - command-line front end for the Omniverse app builder.
//!
//! Provides the `omni` command: inspect and apply assistant replies to a project tree, talk to a
//! chat endpoint, run the chat relay, export the project and run the simulated deploy.

mod commands;
mod config;

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use commands::{apply, chat, deploy, export, extract, serve, tree};

/// Omniverse CLI - build apps from chat replies
#[derive(Parser, Debug)]
#[command(
    name = "omni",
    author,
    version,
    about = "Omniverse - turn assistant replies into project files",
    long_about = "Omniverse (omni) extracts fenced code blocks from assistant replies, applies them to a project file tree,\nand runs the chat relay that forwards browser requests to an upstream model provider."
)]
struct Args {
    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, global = true)]
    log_level: Option<String>,

    /// Configuration file (defaults to ~/.omniverse/config.toml and ./.omniverserc)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the code blocks in a reply
    ///
    /// Reads markdown from FILE (or stdin) and shows each fenced block with the file it
    /// resolves to and how that name was chosen.
    Extract {
        /// Markdown file (stdin when omitted)
        file: Option<PathBuf>,

        /// Output results as JSON
        #[arg(long)]
        json: bool,
    },

    /// Apply a reply to a project tree
    ///
    /// Patches the tree with every code block in the reply and prints the result together
    /// with the newly active file.
    Apply {
        /// Markdown file (stdin when omitted)
        file: Option<PathBuf>,

        /// Tree JSON file (defaults to the starter project)
        #[arg(long)]
        tree: Option<PathBuf>,

        /// Path of the active file before the patch
        #[arg(long)]
        active: Option<String>,

        /// Write the patched tree JSON here
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output results as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print a project tree
    Tree {
        /// Tree JSON file (defaults to the starter project)
        #[arg(long)]
        tree: Option<PathBuf>,

        /// Output the tree as JSON
        #[arg(long)]
        json: bool,
    },

    /// Run one agent turn against a chat-completions endpoint
    Chat {
        /// Message to send
        prompt: String,

        /// Endpoint URL (defaults to agent.endpoint from the config)
        #[arg(long)]
        endpoint: Option<String>,

        /// Model id sent with the request
        #[arg(long)]
        model: Option<String>,

        /// Tree JSON file (defaults to the starter project)
        #[arg(long)]
        tree: Option<PathBuf>,

        /// Output results as JSON
        #[arg(long)]
        json: bool,
    },

    /// Run the chat relay until Ctrl-C
    Serve {
        /// Address to listen on (defaults to relay.address from the config)
        #[arg(long)]
        address: Option<SocketAddr>,
    },

    /// Export a project tree as a tar.gz archive
    Export {
        /// Tree JSON file (defaults to the starter project)
        #[arg(long)]
        tree: Option<PathBuf>,

        /// Archive path (defaults to project-alpha.tar.gz)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Run the simulated deploy (Ctrl-C cancels)
    Deploy {
        /// Deploy duration in milliseconds
        #[arg(long)]
        delay_ms: Option<u64>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let config = config::load_config(args.config.as_deref())?;

    let level = match args.log_level.as_deref().or(config.log_level.as_deref()).unwrap_or("warn") {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "error" => Level::ERROR,
        _ => Level::WARN,
    };

    // Logs go to stderr so `--json` output stays parseable.
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .without_time()
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match args.command {
        Command::Extract { file, json } => extract::execute(file.as_deref(), json)?,
        Command::Apply { file, tree, active, output, json } => {
            apply::execute(file.as_deref(), tree.as_deref(), active.as_deref(), output.as_deref(), json)?;
        }
        Command::Tree { tree, json } => tree::execute(tree.as_deref(), json)?,
        Command::Chat { prompt, endpoint, model, tree, json } => {
            chat::execute(&config, &prompt, endpoint, model, tree.as_deref(), json).await?;
        }
        Command::Serve { address } => serve::execute(&config, address).await?,
        Command::Export { tree, output } => export::execute(tree.as_deref(), output.as_deref())?,
        Command::Deploy { delay_ms } => deploy::execute(&config, delay_ms).await?,
    }

    Ok(())
}
