//! `omni apply`: patch a tree with the code blocks of a reply.

use std::path::Path;

use anyhow::{Context, Result, bail};
use colored::Colorize;
use omniverse_core::file_tree::{ActiveFile, Activation, FileTree, apply_blocks};
use omniverse_core::extract;
use serde_json::json;

use super::{load_tree, read_input};

/// Execute the apply command.
pub fn execute(
    file: Option<&Path>,
    tree_path: Option<&Path>,
    active_path: Option<&str>,
    output: Option<&Path>,
    json_output: bool,
) -> Result<()> {
    let text = read_input(file)?;
    let tree = load_tree(tree_path)?;

    let active = match active_path {
        Some(path) => match ActiveFile::from_tree(&tree, path) {
            Some(active) => Some(active),
            None => bail!("Active file '{}' is not a file in the tree", path),
        },
        None => ActiveFile::from_tree(&tree, FileTree::SEED_ACTIVE_PATH),
    };

    let outcome = apply_blocks(&tree, active.as_ref(), extract(&text));

    if let Some(output) = output {
        let json = serde_json::to_string_pretty(&outcome.tree)?;
        std::fs::write(output, json).with_context(|| format!("Failed to write {}", output.display()))?;
    }

    if json_output {
        let value = json!({
            "tree": outcome.tree,
            "active": outcome.active,
            "activation": outcome.activation,
            "updated": outcome.updated,
            "unmatched": outcome.unmatched,
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    if outcome.updated.is_empty() {
        println!("  {} No files changed", "•".dimmed());
    } else {
        println!("{}", "Updated:".bold());
        for path in &outcome.updated {
            println!("  {} {}", "✓".green(), path);
        }
    }
    for key in &outcome.unmatched {
        println!("  {} {} matches no file in the tree", "!".yellow(), key.yellow());
    }
    println!();

    if let Some(active) = &outcome.active {
        let label = match outcome.activation {
            Activation::Unchanged => "unchanged",
            Activation::Refreshed => "refreshed",
            Activation::Switched => "switched",
        };
        println!("{} {} ({})", "Active:".bold(), active.path.cyan(), label.dimmed());
        println!();
    }

    println!("{}", "Tree:".bold());
    print!("{}", outcome.tree.render());
    Ok(())
}
