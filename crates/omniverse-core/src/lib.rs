//! Omniverse Core - the engine behind the Omniverse app builder.
//!
//! This crate provides:
//! - Code-block extraction and filename resolution for assistant replies
//! - The project file tree, patching and archive export
//! - The builder workspace state, its reducer and an effect-running session
//! - API key management state and its reducer
//! - A chat relay that forwards browser requests to an upstream provider
//! - Configuration management and error handling
//!
//! # Example
//!
//! ```rust
//! use omniverse_core::code_blocks::extract;
//! use omniverse_core::file_tree::{ActiveFile, FileTree, apply_blocks};
//!
//! let tree = FileTree::seed();
//! let active = ActiveFile::from_tree(&tree, FileTree::SEED_ACTIVE_PATH);
//! let reply = "```ts utils.ts\nexport const x = 1;\n```";
//!
//! let outcome = apply_blocks(&tree, active.as_ref(), extract(reply));
//! assert_eq!(outcome.tree.file_content("src/utils.ts"), Some("export const x = 1;\n"));
//! ```

pub mod agent;
pub mod api_keys;
pub mod code_blocks;
pub mod config;
pub mod error;
pub mod file_tree;
pub mod relay;

pub use agent::{Action, AgentSession, Effect, Outcome, WorkspaceState, reduce};
pub use api_keys::{ApiKey, ApiKeysState, NewKey};
pub use code_blocks::{CodeBlock, FileUpdates, extract};
pub use config::{AgentConfig, ConfigError, OmniverseConfig, RelayConfig};
pub use error::{OmniverseError, Result};
pub use file_tree::{ActiveFile, FileNode, FileTree, PatchOutcome, apply_blocks, apply_updates};
pub use relay::{ChatRelay, RelayError, RelayHandle};
