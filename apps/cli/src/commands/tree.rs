//! `omni tree`: print a project tree.

use std::path::Path;

use anyhow::Result;
use colored::Colorize;

use super::load_tree;

/// Execute the tree command.
pub fn execute(tree_path: Option<&Path>, json_output: bool) -> Result<()> {
    let tree = load_tree(tree_path)?;

    if json_output {
        println!("{}", serde_json::to_string_pretty(&tree)?);
        return Ok(());
    }

    print!("{}", tree.render());
    let count = tree.files().len();
    println!();
    println!("{}", format!("{} files", count).dimmed());
    Ok(())
}
