//! Command implementations for the Omniverse CLI.

pub mod apply;
pub mod chat;
pub mod deploy;
pub mod export;
pub mod extract;
pub mod serve;
pub mod tree;

use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};
use omniverse_core::FileTree;

/// Reads FILE, or stdin when no file is given.
pub fn read_input(file: Option<&Path>) -> Result<String> {
    match file {
        Some(path) => {
            std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
        }
        None => {
            let mut text = String::new();
            std::io::stdin().read_to_string(&mut text).context("Failed to read stdin")?;
            Ok(text)
        }
    }
}

/// Loads a tree from its JSON file, or the starter project when no file is given.
pub fn load_tree(path: Option<&Path>) -> Result<FileTree> {
    let Some(path) = path else {
        return Ok(FileTree::seed());
    };
    let json = std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    FileTree::from_json(&json).with_context(|| format!("{} is not a valid tree", path.display()))
}
